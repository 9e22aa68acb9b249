//! Asset discovery and per-asset export downloads.
//!
//! The main entry points are [`fetch_asset_list`], which lists the assets of a snapshot
//! time, and [`DownloadState`], which walks one asset from file history to a CSV on disk.

mod catalog;
mod file_downloader;
mod history;
mod link;
mod workflow;

// Re-export public API
pub use catalog::{assets_from_table, fetch_asset_list};
pub use file_downloader::{build_filename, decode_export, download_export, write_export};
pub use history::{
    fetch_file_history, format_timestamp, parse_timestamp, records_from_table,
    resolve_consensus_run, resolve_submission_timestamp, FileHistoryRecord,
};
pub use link::{extract_request_url, request_download_link};
pub use workflow::{DownloadContext, DownloadOutcome, DownloadStage, DownloadState};
