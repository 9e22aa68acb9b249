use crate::api::ValuationApi;
use crate::config::RunConfig;
use crate::downloader::{fetch_asset_list, DownloadContext, DownloadOutcome, DownloadState};
use crate::ui;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// What happened to every asset of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Files written, in download order
    pub downloaded: Vec<PathBuf>,
    /// Assets skipped because no consensus run exists for the date
    pub no_valuation_results: usize,
    /// Assets skipped because the export link was unavailable
    pub no_link: usize,
    /// Assets whose workflow returned an error
    pub failed_assets: usize,
    /// Catalog entries outside the sub-asset allow-list
    pub filtered_out: usize,
    /// Snapshot times whose catalog could not be fetched
    pub failed_snap_times: Vec<String>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.downloaded.len() + self.no_valuation_results + self.no_link + self.failed_assets
    }
}

/// Downloads the valuation results of every allow-listed asset, one snapshot time
/// after the other.
///
/// Failures never escape: a catalog error skips its snapshot time and a workflow error
/// skips its asset, both logged and counted in the returned [`BatchReport`].
pub async fn download_all_files<A: ValuationApi>(api: &A, config: &RunConfig) -> BatchReport {
    let mut report = BatchReport::default();

    for snap_time in &config.snap_times {
        info!(snap_time = %snap_time, "Processing snap time");

        let assets = match fetch_asset_list(api, snap_time).await {
            Ok(assets) => assets,
            Err(e) => {
                error!(snap_time = %snap_time, error = %e, "Failed to fetch asset list, skipping snap time");
                report.failed_snap_times.push(snap_time.clone());
                continue;
            }
        };

        let (selected, skipped): (Vec<_>, Vec<_>) = assets
            .into_iter()
            .partition(|asset| config.allows_sub_asset(&asset.sub_asset));
        report.filtered_out += skipped.len();

        let context = DownloadContext {
            client: config.client.clone(),
            snap_date: config.snap_date.clone(),
            snap_time: snap_time.clone(),
            page_size: config.page_size,
            output_dir: config.output_dir.clone(),
        };

        let pb = match ui::asset_progress_bar(selected.len() as u64, snap_time) {
            Ok(pb) => Some(pb),
            Err(e) => {
                warn!(error = %e, "Progress bar unavailable");
                None
            }
        };

        for asset in &selected {
            if let Some(pb) = &pb {
                pb.set_message(asset.to_string());
            }

            let mut state = DownloadState::new(asset, &context);
            match state.run(api).await {
                Ok(DownloadOutcome::Downloaded { path }) => {
                    info!(
                        asset = %asset.name,
                        sub_asset = %asset.sub_asset,
                        file = %path.display(),
                        "Downloaded file"
                    );
                    report.downloaded.push(path);
                }
                Ok(DownloadOutcome::NoConsensusRun) => {
                    info!(
                        asset = %asset.name,
                        sub_asset = %asset.sub_asset,
                        "Skipping - no valuation results found"
                    );
                    report.no_valuation_results += 1;
                }
                Ok(DownloadOutcome::NoLink) => {
                    warn!(
                        asset = %asset.name,
                        sub_asset = %asset.sub_asset,
                        "Download link not available"
                    );
                    report.no_link += 1;
                }
                Err(e) => {
                    error!(
                        asset = %asset.name,
                        sub_asset = %asset.sub_asset,
                        asset_id = %asset.asset_id,
                        error = %e,
                        "Error processing asset, skipping"
                    );
                    report.failed_assets += 1;
                }
            }

            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message(format!("{snap_time} done"));
        }
    }

    report
}
