//! Common test utilities for integration tests

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Mutex;
use valuation_dl::api::{AssetListRequest, ExportRequest, FileHistoryRequest, ValuationApi};
use valuation_dl::errors::{AppError, AppResult};

/// A request seen by [`MockApi`].
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListAssets(String),
    FileHistory {
        client: String,
        asset_id: String,
        file_date: String,
        limit: u32,
        offset: u32,
    },
    Export {
        asset_id: String,
        consensus_run_timestamp: String,
        submission_date: String,
        include_header: String,
    },
    FetchExport(String),
}

/// In-memory vendor API that records every call.
///
/// Unknown snapshot times, assets and links answer with an HTTP 404.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockApi {
    pub catalogs: HashMap<String, Value>,
    pub failing_catalogs: HashSet<String>,
    pub histories: HashMap<String, Value>,
    pub exports: HashMap<String, Value>,
    pub files: HashMap<String, String>,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl MockApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn history_calls_for(&self, asset_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::FileHistory { asset_id: id, .. } if id == asset_id))
            .count()
    }

    pub fn export_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Export { .. }))
            .collect()
    }

    pub fn fetch_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::FetchExport(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn not_found(what: &str) -> AppError {
    AppError::HttpError {
        status: 404,
        url: format!("https://mock.test/{what}"),
        body: "not found".to_string(),
    }
}

impl ValuationApi for MockApi {
    async fn list_assets(&self, request: &AssetListRequest) -> AppResult<Value> {
        self.record(Call::ListAssets(request.snap_time.clone()));
        if self.failing_catalogs.contains(&request.snap_time) {
            return Err(AppError::HttpError {
                status: 500,
                url: "https://mock.test/assets/list".to_string(),
                body: "internal error".to_string(),
            });
        }
        self.catalogs
            .get(&request.snap_time)
            .cloned()
            .ok_or_else(|| not_found("assets/list"))
    }

    async fn file_history(&self, request: &FileHistoryRequest) -> AppResult<Value> {
        self.record(Call::FileHistory {
            client: request.client.clone(),
            asset_id: request.asset_id.clone(),
            file_date: request.file_date.clone(),
            limit: request.limit.value,
            offset: request.offset,
        });
        self.histories
            .get(&request.asset_id)
            .cloned()
            .ok_or_else(|| not_found("file-history"))
    }

    async fn export(&self, request: &ExportRequest) -> AppResult<Value> {
        self.record(Call::Export {
            asset_id: request.asset_id.clone(),
            consensus_run_timestamp: request.consensus_run_timestamp.clone(),
            submission_date: request.submission_date.clone(),
            include_header: request.include_header.clone(),
        });
        self.exports
            .get(&request.asset_id)
            .cloned()
            .ok_or_else(|| not_found("export"))
    }

    async fn fetch_export(&self, link: &str) -> AppResult<String> {
        self.record(Call::FetchExport(link.to_string()));
        self.files.get(link).cloned().ok_or_else(|| not_found(link))
    }
}

/// Catalog envelope from `(asset, service, sub_asset, id, trace_name)` leaves.
#[allow(dead_code)]
pub fn catalog_json(leaves: &[(&str, &str, &str, &str, &str)]) -> Value {
    let assets: Vec<Value> = leaves
        .iter()
        .map(|(asset, service, sub_asset, id, trace)| {
            json!({
                "name": asset,
                "services": [{
                    "name": service,
                    "subAssets": [{"name": sub_asset, "id": id, "traceName": trace}]
                }]
            })
        })
        .collect();
    json!({"data": {"assets": assets}})
}

/// File-history envelope from `(consensus runs, uploaded time)` rows.
#[allow(dead_code)]
pub fn history_json(rows: &[(&[&str], &str)]) -> Value {
    let rows: Vec<Value> = rows
        .iter()
        .enumerate()
        .map(|(i, (runs, uploaded))| json!({"values": [format!("upload_{i}.csv"), runs, uploaded]}))
        .collect();
    json!({
        "data": {
            "columns": [
                {"columnName": "File Name"},
                {"columnName": "Consensus Run Timestamps"},
                {"columnName": "Uploaded Time"}
            ],
            "rows": rows
        }
    })
}

#[allow(dead_code)]
pub fn export_json(link: Option<&str>) -> Value {
    match link {
        Some(link) => json!({"data": {"getRequestUrl": link}}),
        None => json!({"data": {}}),
    }
}

/// Base64 text of the gzip-compressed `data`, as served by export links.
#[allow(dead_code)]
pub fn gzip_base64(data: &[u8]) -> String {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    STANDARD.encode(encoder.finish().unwrap())
}
