use crate::api::{FileHistoryRequest, PageLimit, ValuationApi};
use crate::constants::{CONSENSUS_RUN_COLUMN, CONSENSUS_RUN_FORMAT, UPLOADED_TIME_COLUMN};
use crate::errors::{AppError, AppResult};
use crate::table::{flatten_response, Table};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde_json::Value;

/// Accepted layouts for naive timestamps, tried in order after RFC 3339.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One upload row of an asset's file history.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHistoryRecord {
    /// Consensus runs computed from this upload, empty and null entries removed.
    /// Naive values carry a zero offset.
    pub consensus_runs: Vec<DateTime<FixedOffset>>,
    /// Raw "Uploaded Time" cell.
    pub uploaded_time: Value,
}

impl FileHistoryRecord {
    /// Returns the upload time as sent back to the export endpoint.
    ///
    /// Strings are passed through untouched; a missing or null cell yields `None`.
    pub fn submission_timestamp(&self) -> AppResult<Option<String>> {
        match &self.uploaded_time {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(AppError::SchemaError(format!(
                "'{UPLOADED_TIME_COLUMN}' holds {other}, expected a timestamp string"
            ))),
        }
    }
}

/// Requests the first page of upload history for `asset_id` on `file_date`.
pub async fn fetch_file_history<A: ValuationApi>(
    api: &A,
    client: &str,
    asset_id: &str,
    file_date: &str,
    page_size: u32,
) -> AppResult<Table> {
    let request = FileHistoryRequest {
        client: client.to_string(),
        asset_id: asset_id.to_string(),
        file_date: file_date.to_string(),
        limit: PageLimit { value: page_size },
        offset: 0,
    };
    let body = api.file_history(&request).await?;
    flatten_response(&body)
}

/// Parses each history row's consensus-run timestamps.
///
/// A table without the consensus-run column has no runs; a missing upload-time
/// column leaves every record without a submission timestamp.
pub fn records_from_table(table: &Table) -> AppResult<Vec<FileHistoryRecord>> {
    table
        .rows()
        .map(|row| {
            Ok(FileHistoryRecord {
                consensus_runs: parse_run_cell(row.get(CONSENSUS_RUN_COLUMN))?,
                uploaded_time: row.get(UPLOADED_TIME_COLUMN).cloned().unwrap_or(Value::Null),
            })
        })
        .collect()
}

fn parse_run_cell(cell: Option<&Value>) -> AppResult<Vec<DateTime<FixedOffset>>> {
    match cell {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => parse_run_entries(std::iter::once(s.as_str())),
        Some(Value::Array(entries)) => {
            let mut texts = Vec::with_capacity(entries.len());
            for entry in entries {
                match entry {
                    Value::Null => {}
                    Value::String(s) => texts.push(s.as_str()),
                    other => {
                        return Err(AppError::SchemaError(format!(
                            "'{CONSENSUS_RUN_COLUMN}' entry {other} is not a timestamp string"
                        )))
                    }
                }
            }
            parse_run_entries(texts.into_iter())
        }
        Some(other) => Err(AppError::SchemaError(format!(
            "'{CONSENSUS_RUN_COLUMN}' holds {other}, expected a list"
        ))),
    }
}

fn parse_run_entries<'a>(
    entries: impl Iterator<Item = &'a str>,
) -> AppResult<Vec<DateTime<FixedOffset>>> {
    entries
        .filter(|s| !s.trim().is_empty())
        .map(parse_timestamp)
        .collect()
}

/// Parses a vendor timestamp.
///
/// RFC 3339 values keep their own offset; naive values get a zero offset.
/// Ordering and equality on the result compare instants.
pub fn parse_timestamp(raw: &str) -> AppResult<DateTime<FixedOffset>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    let naive = NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| AppError::SchemaError(format!("unrecognized timestamp '{raw}'")))?;
    Ok(Utc.fix().from_utc_datetime(&naive))
}

/// Formats a consensus run the way the export endpoint expects it.
///
/// # Arguments
///
/// * `ts` - Parsed run timestamp
///
/// # Returns
///
/// The wall-clock time in the timestamp's own offset, as
/// `YYYY-MM-DD HH:MM:SS.ffffff`. The offset itself is not rendered.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.naive_local().format(CONSENSUS_RUN_FORMAT).to_string()
}

/// Latest consensus run across every row, or `None` when no row has one.
///
/// Runs are compared by instant, so offsets do not affect which one wins.
pub fn resolve_consensus_run(records: &[FileHistoryRecord]) -> Option<DateTime<FixedOffset>> {
    records
        .iter()
        .flat_map(|r| r.consensus_runs.iter())
        .max()
        .copied()
}

/// Upload time of the first row, in original order, that produced `run`.
pub fn resolve_submission_timestamp(
    records: &[FileHistoryRecord],
    run: &DateTime<FixedOffset>,
) -> AppResult<Option<String>> {
    match records.iter().find(|r| r.consensus_runs.contains(run)) {
        Some(record) => record.submission_timestamp(),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn history(rows: Value) -> Vec<FileHistoryRecord> {
        let body = json!({
            "data": {
                "columns": [
                    {"columnName": "File Name"},
                    {"columnName": "Consensus Run Timestamps"},
                    {"columnName": "Uploaded Time"}
                ],
                "rows": rows
            }
        });
        records_from_table(&flatten_response(&body).unwrap()).unwrap()
    }

    #[test]
    fn latest_run_wins_and_empty_entries_are_ignored() {
        let records = history(json!([
            {"values": ["a.csv", ["2024-01-01T00:00:00"], "2024-01-01 08:00:00"]},
            {"values": ["b.csv", ["2024-01-02T00:00:00", ""], "2024-01-02 08:00:00"]}
        ]));
        let run = resolve_consensus_run(&records).unwrap();
        assert_eq!(format_timestamp(&run), "2024-01-02 00:00:00.000000");
    }

    #[test]
    fn no_timestamps_means_no_run() {
        let records = history(json!([
            {"values": ["a.csv", [], "2024-01-01 08:00:00"]},
            {"values": ["b.csv", ["", null], "2024-01-02 08:00:00"]},
            {"values": ["c.csv", null, "2024-01-03 08:00:00"]}
        ]));
        assert!(resolve_consensus_run(&records).is_none());
        assert!(resolve_consensus_run(&[]).is_none());
    }

    #[test]
    fn missing_run_column_means_no_run() {
        let body = json!({"data": {"columns": ["Uploaded Time"], "rows": [["2024-01-01"]]}});
        let records = records_from_table(&flatten_response(&body).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(resolve_consensus_run(&records).is_none());
    }

    #[test]
    fn submission_comes_from_first_matching_row() {
        let records = history(json!([
            {"values": ["a.csv", ["2024-01-01T00:00:00"], "first-upload"]},
            {"values": ["b.csv", ["2024-01-02 00:00:00"], "second-upload"]},
            {"values": ["c.csv", ["2024-01-02T00:00:00Z"], "third-upload"]}
        ]));
        let run = resolve_consensus_run(&records).unwrap();
        assert_eq!(
            resolve_submission_timestamp(&records, &run).unwrap(),
            Some("second-upload".to_string())
        );
    }

    #[test]
    fn unmatched_run_yields_no_submission() {
        let records = history(json!([
            {"values": ["a.csv", ["2024-01-01T00:00:00"], "2024-01-01 08:00:00"]}
        ]));
        let other = parse_timestamp("2030-01-01").unwrap();
        assert_eq!(resolve_submission_timestamp(&records, &other).unwrap(), None);
    }

    #[test]
    fn null_upload_time_yields_no_submission() {
        let records = history(json!([
            {"values": ["a.csv", ["2024-01-01T00:00:00"], null]}
        ]));
        let run = resolve_consensus_run(&records).unwrap();
        assert_eq!(resolve_submission_timestamp(&records, &run).unwrap(), None);
    }

    #[test]
    fn parse_timestamp_accepts_vendor_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 31)
            .unwrap()
            .and_hms_micro_opt(16, 0, 0, 123_456)
            .unwrap();
        let naive = parse_timestamp("2024-07-31T16:00:00.123456").unwrap();
        assert_eq!(naive.naive_local(), expected);
        assert_eq!(naive.offset().local_minus_utc(), 0);
        assert_eq!(parse_timestamp("2024-07-31 16:00:00.123456").unwrap(), naive);
        assert_eq!(
            format_timestamp(&parse_timestamp("2024-07-31").unwrap()),
            "2024-07-31 00:00:00.000000"
        );
    }

    #[test]
    fn offset_timestamp_keeps_its_wall_clock() {
        let run = parse_timestamp("2024-07-31T18:00:00.123456+02:00").unwrap();
        assert_eq!(format_timestamp(&run), "2024-07-31 18:00:00.123456");
        assert_eq!(run.offset().local_minus_utc(), 2 * 3600);
        // Same instant as 16:00 UTC.
        assert_eq!(run, parse_timestamp("2024-07-31T16:00:00.123456").unwrap());
    }

    #[test]
    fn latest_run_is_chosen_by_instant_and_formatted_in_its_offset() {
        let records = history(json!([
            {"values": ["a.csv", ["2024-07-31T18:00:00+02:00"], "2024-07-31 15:30:00"]},
            {"values": ["b.csv", ["2024-07-31T17:00:00Z"], "2024-07-31 16:30:00"]},
            {"values": ["c.csv", ["2024-07-31T12:00:00-04:00"], "2024-07-31 11:30:00"]}
        ]));
        let run = resolve_consensus_run(&records).unwrap();
        assert_eq!(format_timestamp(&run), "2024-07-31 17:00:00.000000");

        let records = history(json!([
            {"values": ["a.csv", ["2024-07-31T18:00:00+02:00"], "2024-07-31 15:30:00"]},
            {"values": ["b.csv", ["2024-07-31T15:00:00"], "2024-07-31 14:30:00"]}
        ]));
        let run = resolve_consensus_run(&records).unwrap();
        assert_eq!(format_timestamp(&run), "2024-07-31 18:00:00.000000");
        assert_eq!(
            resolve_submission_timestamp(&records, &run).unwrap(),
            Some("2024-07-31 15:30:00".to_string())
        );
    }

    #[test]
    fn garbage_timestamp_is_schema_error() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(AppError::SchemaError(_))
        ));
    }

    #[test]
    fn scalar_run_cell_is_single_entry() {
        let records = history(json!([
            {"values": ["a.csv", "2024-03-01T12:30:00", "up"]}
        ]));
        assert_eq!(records[0].consensus_runs.len(), 1);
    }
}
