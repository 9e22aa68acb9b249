//! HTTP access to the vendor API.
//!
//! [`ValuationApi`] is the seam the download workflow talks to; [`ApiClient`] is the
//! `reqwest` implementation used by the binary. Each call returns the raw JSON envelope
//! so that flattening stays in one place ([`crate::table`]).

use crate::auth::create_token_now;
use crate::constants::*;
use crate::errors::{AppError, AppResult};
use crate::models::Credentials;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

/// Body of an `assets/list` request.
#[derive(Debug, Clone, Serialize)]
pub struct AssetListRequest {
    pub snap_time: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PageLimit {
    pub value: u32,
}

/// Body of a `file-history` request.
#[derive(Debug, Clone, Serialize)]
pub struct FileHistoryRequest {
    pub client: String,
    pub asset_id: String,
    pub file_date: String,
    pub limit: PageLimit,
    pub offset: u32,
}

/// Body of an `export` request.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest {
    pub asset_id: String,
    pub consensus_run_timestamp: String,
    pub submission_date: String,
    #[serde(rename = "includeHeader")]
    pub include_header: String,
}

/// Operations the vendor exposes. Implementations must sign every authenticated call
/// with a fresh token and turn non-2xx statuses into errors.
#[allow(async_fn_in_trait)]
pub trait ValuationApi {
    /// POST `assets/list`; returns the catalog envelope.
    async fn list_assets(&self, request: &AssetListRequest) -> AppResult<Value>;

    /// POST `file-history`; returns the tabular envelope.
    async fn file_history(&self, request: &FileHistoryRequest) -> AppResult<Value>;

    /// POST `export`; returns `{data: {getRequestUrl}}`.
    async fn export(&self, request: &ExportRequest) -> AppResult<Value>;

    /// Plain GET of an export link. The link is the capability, so no auth headers are sent.
    async fn fetch_export(&self, link: &str) -> AppResult<String>;
}

/// `reqwest`-backed [`ValuationApi`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `https://clearconsensus.io/apigw/api/v1/`).
    ///
    /// # Errors
    ///
    /// Returns `UrlError` if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str, credentials: Credentials) -> AppResult<Self> {
        Self::with_http_client(reqwest::Client::new(), base_url, credentials)
    }

    /// Creates a client that sends through an existing `reqwest::Client`.
    ///
    /// # Arguments
    ///
    /// * `http` - Client to reuse (connection pool, proxy and TLS settings)
    /// * `base_url` - API root; a trailing `/` is added when missing
    /// * `credentials` - Key and secret used to sign every POST
    ///
    /// # Errors
    ///
    /// Returns `UrlError` if `base_url` is not a valid absolute URL.
    pub fn with_http_client(
        http: reqwest::Client,
        base_url: &str,
        credentials: Credentials,
    ) -> AppResult<Self> {
        // Url::join drops the last path segment unless the base ends in '/'
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Resolves an endpoint such as `assets/list` against the base URL.
    ///
    /// # Returns
    ///
    /// The absolute endpoint URL, or `UrlError` if the join fails.
    pub fn endpoint_url(&self, endpoint: &str) -> AppResult<Url> {
        Ok(self.base_url.join(endpoint)?)
    }

    /// Builds the authenticated JSON headers with a freshly signed token.
    pub fn request_headers(&self) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            header_value(&self.credentials.api_key)?,
        );
        headers.insert(
            HeaderName::from_static(API_TOKEN_HEADER),
            header_value(&create_token_now(&self.credentials))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn post_json<T: Serialize>(
        &self,
        url: &Url,
        headers: HeaderMap,
        payload: &T,
    ) -> AppResult<Value> {
        debug!(url = %url, "POST");
        let response = self
            .http
            .post(url.clone())
            .headers(headers)
            .json(payload)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<Value>().await?)
    }
}

impl ValuationApi for ApiClient {
    async fn list_assets(&self, request: &AssetListRequest) -> AppResult<Value> {
        let url = self.endpoint_url(ASSET_LIST_ENDPOINT)?;
        let headers = self.request_headers()?;

        match self.post_json(&url, headers.clone(), request).await {
            Ok(body) => Ok(body),
            Err(e) => {
                let (status, body) = match &e {
                    AppError::HttpError { status, body, .. } => (Some(*status), body.as_str()),
                    _ => (None, ""),
                };
                let payload = serde_json::to_string_pretty(request).unwrap_or_default();
                error!(
                    status = ?status,
                    response = body,
                    url = %url,
                    headers = ?headers,
                    payload = %payload,
                    error = %e,
                    "Asset list request failed"
                );
                Err(e)
            }
        }
    }

    async fn file_history(&self, request: &FileHistoryRequest) -> AppResult<Value> {
        let url = self.endpoint_url(FILE_HISTORY_ENDPOINT)?;
        self.post_json(&url, self.request_headers()?, request).await
    }

    async fn export(&self, request: &ExportRequest) -> AppResult<Value> {
        let url = self.endpoint_url(EXPORT_ENDPOINT)?;
        self.post_json(&url, self.request_headers()?, request).await
    }

    async fn fetch_export(&self, link: &str) -> AppResult<String> {
        let url = Url::parse(link)?;
        debug!(host = url.host_str().unwrap_or_default(), "GET export link");
        let response = self.http.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }
}

/// Turns a non-2xx response into `HttpError`, keeping the body for diagnostics.
async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::HttpError {
        status: status.as_u16(),
        url,
        body,
    })
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::InvalidInput(format!("Invalid header value: {e}")))
}
