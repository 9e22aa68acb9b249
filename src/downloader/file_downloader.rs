use crate::api::ValuationApi;
use crate::constants::{DQ_RESULTS_SUFFIX, VALUATION_RESULTS_SUFFIX};
use crate::errors::{AppError, AppResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::MultiGzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Builds the output filename for one asset export.
///
/// `<client>_<trace_name>_<snap_date>_<snap_time>_<suffix>.csv`, with dashes in the
/// date and spaces in the snapshot time replaced by underscores. The suffix is
/// `valuation_results` when a consensus run was found and `dq_results` otherwise.
pub fn build_filename(
    client: &str,
    trace_name: &str,
    snap_date: &str,
    snap_time: &str,
    has_consensus_run: bool,
) -> String {
    let suffix = if has_consensus_run {
        VALUATION_RESULTS_SUFFIX
    } else {
        DQ_RESULTS_SUFFIX
    };
    format!(
        "{client}_{trace_name}_{}_{}_{suffix}.csv",
        snap_date.replace('-', "_"),
        snap_time.replace(' ', "_")
    )
}

/// Decodes an export body: base64 text wrapping gzip-compressed bytes.
///
/// Characters outside the base64 alphabet (line breaks, surrounding quotes) are
/// discarded before decoding.
pub fn decode_export(text: &str) -> AppResult<Vec<u8>> {
    let encoded: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();
    let compressed = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| AppError::DecodeError(format!("Invalid base64 export payload: {e}")))?;

    let mut decoder = MultiGzDecoder::new(compressed.as_slice());
    let mut contents = Vec::new();
    decoder
        .read_to_end(&mut contents)
        .map_err(|e| AppError::DecodeError(format!("Invalid gzip export payload: {e}")))?;
    Ok(contents)
}

/// Writes `contents` to `output_dir/filename`.
///
/// The bytes go to a `.part` file first and are renamed into place, so an
/// interrupted write never leaves a truncated file under the final name.
pub async fn write_export(output_dir: &Path, filename: &str, contents: &[u8]) -> AppResult<PathBuf> {
    // No-op for an existing directory or an empty path.
    fs::create_dir_all(output_dir).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to create directory {}: {e}",
            output_dir.display()
        ))
    })?;

    let file_path = output_dir.join(filename);
    let tmp_path = output_dir.join(format!("{filename}.part"));

    if let Err(e) = fs::write(&tmp_path, contents).await {
        if let Err(cleanup) = fs::remove_file(&tmp_path).await {
            warn!(
                file_path = %tmp_path.display(),
                error = %cleanup,
                "Failed to remove partial temp file"
            );
        }
        return Err(AppError::IoError(format!(
            "Failed to write temp file {}: {e}",
            tmp_path.display()
        )));
    }

    fs::rename(&tmp_path, &file_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to rename temp file {} to {}: {}",
            tmp_path.display(),
            file_path.display(),
            e
        ))
    })?;

    Ok(file_path)
}

/// Fetches an export link, decodes the payload and materializes it on disk.
pub async fn download_export<A: ValuationApi>(
    api: &A,
    link: &str,
    output_dir: &Path,
    filename: &str,
) -> AppResult<PathBuf> {
    let body = api.fetch_export(link).await?;
    let contents = decode_export(&body)?;
    debug!(filename, bytes = contents.len(), "Export payload decoded");
    write_export(output_dir, filename, &contents).await
}
