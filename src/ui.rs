use crate::errors::{AppError, AppResult};
use indicatif::{ProgressBar, ProgressStyle};

/// Creates the per-snapshot-time progress bar over the assets to process.
///
/// The bar is prefixed with the snapshot time label and hides itself when stderr
/// is not a terminal.
///
/// # Example
///
/// ```no_run
/// use valuation_dl::ui;
///
/// # fn main() -> Result<(), valuation_dl::errors::AppError> {
/// let pb = ui::asset_progress_bar(12, "London 4 PM")?;
/// pb.inc(1);
/// pb.finish_with_message("Done");
/// # Ok(())
/// # }
/// ```
pub fn asset_progress_bar(total: u64, snap_time: &str) -> AppResult<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| AppError::IoError(format!("Failed to create progress bar template: {e}")))?
            .progress_chars("#>-"),
    );
    pb.set_prefix(snap_time.to_string());
    Ok(pb)
}
