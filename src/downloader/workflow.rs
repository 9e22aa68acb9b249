//! Per-asset download workflow.
//!
//! ```text
//! Uninitialized -> StatusFetched -> RunResolved -> LinkResolved -> Downloaded
//!                                \-> NoConsensusRun  \-> NoLink
//! ```
//!
//! A [`DownloadState`] lives for one asset in one snapshot time and is discarded
//! afterwards. Each step needs the output of the previous one.

use super::file_downloader::{build_filename, download_export};
use super::history::{
    fetch_file_history, format_timestamp, records_from_table, resolve_consensus_run,
    resolve_submission_timestamp, FileHistoryRecord,
};
use super::link::request_download_link;
use crate::api::ValuationApi;
use crate::errors::{AppError, AppResult};
use crate::models::Asset;
use crate::table::Table;
use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Run-wide parameters shared by every asset of one snapshot time.
#[derive(Debug, Clone)]
pub struct DownloadContext {
    pub client: String,
    /// `YYYY-MM-DD`
    pub snap_date: String,
    /// e.g. `"London 4 PM"`
    pub snap_time: String,
    pub page_size: u32,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStage {
    Uninitialized,
    StatusFetched,
    RunResolved,
    LinkResolved,
    Downloaded,
    /// No valuation data for the date yet.
    NoConsensusRun,
    /// Run resolved, but the export link is unavailable.
    NoLink,
}

/// Final result of a workflow that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { path: PathBuf },
    NoConsensusRun,
    NoLink,
}

#[derive(Debug)]
pub struct DownloadState<'a> {
    asset: &'a Asset,
    context: &'a DownloadContext,
    stage: DownloadStage,
    current_status: Option<Table>,
    records: Vec<FileHistoryRecord>,
    consensus_run: Option<DateTime<FixedOffset>>,
    consensus_run_timestamp: Option<String>,
    submission_timestamp: Option<String>,
    download_link: Option<String>,
}

impl<'a> DownloadState<'a> {
    pub fn new(asset: &'a Asset, context: &'a DownloadContext) -> Self {
        Self {
            asset,
            context,
            stage: DownloadStage::Uninitialized,
            current_status: None,
            records: Vec::new(),
            consensus_run: None,
            consensus_run_timestamp: None,
            submission_timestamp: None,
            download_link: None,
        }
    }

    pub fn stage(&self) -> DownloadStage {
        self.stage
    }

    pub fn current_status(&self) -> Option<&Table> {
        self.current_status.as_ref()
    }

    pub fn consensus_run_timestamp(&self) -> Option<&str> {
        self.consensus_run_timestamp.as_deref()
    }

    pub fn submission_timestamp(&self) -> Option<&str> {
        self.submission_timestamp.as_deref()
    }

    pub fn download_link(&self) -> Option<&str> {
        self.download_link.as_deref()
    }

    pub fn filename(&self) -> String {
        build_filename(
            &self.context.client,
            &self.asset.trace_name,
            &self.context.snap_date,
            &self.context.snap_time,
            self.consensus_run_timestamp.is_some(),
        )
    }

    /// Step 1: loads the asset's file history for the snapshot date.
    pub async fn fetch_status<A: ValuationApi>(&mut self, api: &A) -> AppResult<()> {
        let table = fetch_file_history(
            api,
            &self.context.client,
            &self.asset.asset_id,
            &self.context.snap_date,
            self.context.page_size,
        )
        .await?;
        self.records = records_from_table(&table)?;
        debug!(
            asset_id = %self.asset.asset_id,
            rows = table.len(),
            "File history fetched"
        );
        self.current_status = Some(table);
        self.stage = DownloadStage::StatusFetched;
        Ok(())
    }

    /// Step 2: picks the latest consensus run across all history rows.
    pub fn resolve_consensus_run(&mut self) -> AppResult<Option<&str>> {
        self.require_status("resolve consensus run")?;

        self.consensus_run = resolve_consensus_run(&self.records);
        self.consensus_run_timestamp = self.consensus_run.as_ref().map(format_timestamp);
        self.stage = if self.consensus_run.is_some() {
            DownloadStage::RunResolved
        } else {
            DownloadStage::NoConsensusRun
        };
        Ok(self.consensus_run_timestamp.as_deref())
    }

    /// Step 3: finds the upload that produced the resolved run.
    pub fn resolve_submission_timestamp(&mut self) -> AppResult<Option<&str>> {
        self.require_status("resolve submission timestamp")?;

        self.submission_timestamp = match &self.consensus_run {
            Some(run) => resolve_submission_timestamp(&self.records, run)?,
            None => None,
        };
        if self.consensus_run.is_some() && self.submission_timestamp.is_none() {
            warn!(
                asset_id = %self.asset.asset_id,
                consensus_run = self.consensus_run_timestamp.as_deref().unwrap_or_default(),
                "Consensus run has no matching upload row"
            );
        }
        Ok(self.submission_timestamp.as_deref())
    }

    /// Step 4: requests the export link once asset id, run and submission are known.
    pub async fn resolve_download_link<A: ValuationApi>(
        &mut self,
        api: &A,
    ) -> AppResult<Option<&str>> {
        let (run, submission) = match (
            &self.consensus_run_timestamp,
            &self.submission_timestamp,
        ) {
            (Some(run), Some(submission)) if !self.asset.asset_id.is_empty() => {
                (run.clone(), submission.clone())
            }
            _ => {
                self.download_link = None;
                return Ok(None);
            }
        };

        self.download_link =
            request_download_link(api, &self.asset.asset_id, &run, &submission).await?;
        self.stage = if self.download_link.is_some() {
            DownloadStage::LinkResolved
        } else {
            DownloadStage::NoLink
        };
        Ok(self.download_link.as_deref())
    }

    /// Runs steps 1-4.
    pub async fn initialize_download<A: ValuationApi>(&mut self, api: &A) -> AppResult<()> {
        self.fetch_status(api).await?;
        self.resolve_consensus_run()?;
        self.resolve_submission_timestamp()?;
        self.resolve_download_link(api).await?;
        Ok(())
    }

    /// Step 5: downloads, decodes and writes the export.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if no download link has been resolved.
    pub async fn download_file<A: ValuationApi>(&mut self, api: &A) -> AppResult<PathBuf> {
        let link = self
            .download_link
            .clone()
            .ok_or_else(|| AppError::IllegalState("Download link not available".into()))?;

        let path = download_export(api, &link, &self.context.output_dir, &self.filename()).await?;
        self.stage = DownloadStage::Downloaded;
        Ok(path)
    }

    /// Drives the whole workflow and classifies how it ended.
    pub async fn run<A: ValuationApi>(&mut self, api: &A) -> AppResult<DownloadOutcome> {
        self.initialize_download(api).await?;

        if self.submission_timestamp.is_none() {
            return Ok(DownloadOutcome::NoConsensusRun);
        }
        if self.download_link.is_none() {
            return Ok(DownloadOutcome::NoLink);
        }
        let path = self.download_file(api).await?;
        Ok(DownloadOutcome::Downloaded { path })
    }

    fn require_status(&self, step: &str) -> AppResult<()> {
        if self.current_status.is_none() {
            return Err(AppError::IllegalState(format!(
                "Cannot {step} before file history is fetched"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> Asset {
        Asset {
            name: "USD".into(),
            sub_asset: "Swaptions".into(),
            service: "Rates".into(),
            asset_id: "a1".into(),
            trace_name: "USD-SOFR".into(),
        }
    }

    fn context() -> DownloadContext {
        DownloadContext {
            client: "ACME".into(),
            snap_date: "2024-07-31".into(),
            snap_time: "London 4 PM".into(),
            page_size: 100,
            output_dir: PathBuf::from("."),
        }
    }

    #[test]
    fn new_state_is_uninitialized() {
        let asset = asset();
        let context = context();
        let state = DownloadState::new(&asset, &context);
        assert_eq!(state.stage(), DownloadStage::Uninitialized);
        assert!(state.current_status().is_none());
        assert!(state.consensus_run_timestamp().is_none());
        assert!(state.submission_timestamp().is_none());
        assert!(state.download_link().is_none());
    }

    #[test]
    fn resolving_before_fetch_is_illegal() {
        let asset = asset();
        let context = context();
        let mut state = DownloadState::new(&asset, &context);
        assert!(matches!(
            state.resolve_consensus_run(),
            Err(AppError::IllegalState(_))
        ));
        assert!(matches!(
            state.resolve_submission_timestamp(),
            Err(AppError::IllegalState(_))
        ));
    }

    #[test]
    fn filename_without_run_uses_dq_suffix() {
        let asset = asset();
        let context = context();
        let state = DownloadState::new(&asset, &context);
        assert_eq!(
            state.filename(),
            "ACME_USD-SOFR_2024_07_31_London_4_PM_dq_results.csv"
        );
    }
}
