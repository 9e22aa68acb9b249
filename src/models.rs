use crate::constants::*;
use serde::Deserialize;
use std::fmt;

/// Vendor environment the run talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum ApiMode {
    #[default]
    Prod,
    Metadata,
}

impl ApiMode {
    /// Returns the host name serving this mode.
    pub fn host(&self) -> &'static str {
        match self {
            Self::Prod => PROD_HOST,
            Self::Metadata => METADATA_HOST,
        }
    }

    /// Returns the API base URL, always ending in `/` so endpoints can be joined onto it.
    pub fn base_url(&self) -> String {
        format!("https://{}{}", self.host(), API_PATH_PREFIX)
    }

    /// Short lowercase name used in log output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Metadata => "metadata",
        }
    }
}

impl From<&str> for ApiMode {
    fn from(value: &str) -> Self {
        let lower = value.trim().to_lowercase();

        if METADATA_MODE_ALIASES.contains(&lower.as_str()) {
            Self::Metadata
        } else if PROD_MODE_ALIASES.contains(&lower.as_str()) {
            Self::Prod
        } else {
            // Unknown modes fall back to production; callers can decide to log if needed.
            Self::Prod
        }
    }
}

impl From<String> for ApiMode {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

/// API key and secret. The secret only ever keys the token HMAC.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.trim().is_empty() || self.api_secret.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// One downloadable leaf of the vendor's asset catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub sub_asset: String,
    pub service: String,
    /// Opaque identifier used by every downstream lookup.
    pub asset_id: String,
    /// Used to build output filenames.
    pub trace_name: String,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.sub_asset)
    }
}
