use crate::api::{AssetListRequest, ValuationApi};
use crate::errors::AppResult;
use crate::models::Asset;
use crate::table::{flatten_response, Table};
use tracing::info;

/// Fetches the asset catalog available at `snap_time`.
///
/// Any failure (HTTP status, transport, unrecognized envelope) is returned to the
/// caller, which is expected to skip the whole snapshot time.
///
/// # Example
///
/// ```no_run
/// use valuation_dl::api::ApiClient;
/// use valuation_dl::downloader;
/// use valuation_dl::models::{ApiMode, Credentials};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = ApiClient::new(&ApiMode::Prod.base_url(), Credentials::new("key", "secret"))?;
/// let assets = downloader::fetch_asset_list(&api, "London 4 PM").await?;
/// println!("Found {} assets", assets.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_asset_list<A: ValuationApi>(api: &A, snap_time: &str) -> AppResult<Vec<Asset>> {
    let request = AssetListRequest {
        snap_time: snap_time.to_string(),
    };
    let body = api.list_assets(&request).await?;
    let assets = assets_from_table(&flatten_response(&body)?)?;
    info!(snap_time, assets_found = assets.len(), "Asset catalog fetched");
    Ok(assets)
}

/// Converts a flattened catalog table into assets, preserving row order.
pub fn assets_from_table(table: &Table) -> AppResult<Vec<Asset>> {
    table
        .rows()
        .map(|row| {
            Ok(Asset {
                name: row.require_text("Asset")?,
                sub_asset: row.require_text("SubAsset")?,
                service: row.require_text("Service")?,
                asset_id: row.require_text("ID")?,
                trace_name: row.require_text("TraceName")?,
            })
        })
        .collect()
}
