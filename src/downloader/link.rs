use crate::api::{ExportRequest, ValuationApi};
use crate::constants::INCLUDE_HEADER_FLAG;
use crate::errors::AppResult;
use serde_json::Value;

/// Asks the export endpoint for a one-off download link.
///
/// Returns `Ok(None)` when the response carries no `data.getRequestUrl`; an
/// unavailable link is an expected outcome, not an error.
pub async fn request_download_link<A: ValuationApi>(
    api: &A,
    asset_id: &str,
    consensus_run_timestamp: &str,
    submission_date: &str,
) -> AppResult<Option<String>> {
    let request = ExportRequest {
        asset_id: asset_id.to_string(),
        consensus_run_timestamp: consensus_run_timestamp.to_string(),
        submission_date: submission_date.to_string(),
        include_header: INCLUDE_HEADER_FLAG.to_string(),
    };
    let body = api.export(&request).await?;
    Ok(extract_request_url(&body))
}

/// Reads `data.getRequestUrl`, treating null and blank values as absent.
pub fn extract_request_url(body: &Value) -> Option<String> {
    body.get("data")
        .and_then(|data| data.get("getRequestUrl"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}
