use crate::constants::{API_KEY_ENV, API_SECRET_ENV};
use crate::errors::{AppError, AppResult};
use crate::models::{ApiMode, Credentials};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything one run needs, validated once before any network call.
///
/// Deserialized from TOML by [`RunConfig::from_toml_file`]. Every key is optional and
/// falls back to [`RunConfig::default`]; unknown keys are rejected to catch typos.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Vendor environment: `"prod"` or `"metadata"`. Unknown values select prod.
    pub mode: ApiMode,
    pub api_key: String,
    /// Only used to sign tokens; never sent over the wire.
    pub api_secret: String,
    /// Valuation date in `YYYY-MM-DD` format
    pub snap_date: String,
    /// Snapshot-time labels, processed in order
    pub snap_times: Vec<String>,
    /// Client identifier sent to the file-history endpoint and used in filenames
    pub client: String,
    /// Sub-asset allow-list; catalog entries outside it are never downloaded
    pub asset_types: Vec<String>,
    /// Directory receiving the CSV exports
    pub output_dir: PathBuf,
    /// Rows requested from the file-history endpoint
    pub page_size: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: ApiMode::Prod,
            api_key: String::new(),
            api_secret: String::new(),
            snap_date: String::new(),
            snap_times: vec!["London 4 PM".to_string(), "New York 4 PM".to_string()],
            client: String::new(),
            asset_types: ["Swaptions", "Caps & Floors", "Forwards", "Options"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output_dir: PathBuf::from("."),
            page_size: 100,
        }
    }
}

impl RunConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Validation is left to [`RunConfig::validate`] so that credentials can still be
    /// filled in from the environment.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read and `InvalidInput` if the TOML is
    /// malformed or contains unknown keys.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> AppResult<Self> {
        toml::from_str(contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))
    }

    /// Fills empty credentials from `VALUATION_API_KEY` / `VALUATION_API_SECRET`.
    pub fn with_env_credentials(mut self) -> Self {
        if self.api_key.trim().is_empty() {
            self.api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        }
        if self.api_secret.trim().is_empty() {
            self.api_secret = std::env::var(API_SECRET_ENV).unwrap_or_default();
        }
        self
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.api_key.clone(), self.api_secret.clone())
    }

    pub fn allows_sub_asset(&self, sub_asset: &str) -> bool {
        self.asset_types.iter().any(|t| t == sub_asset)
    }

    /// Checks the run can start.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if the key or secret is empty, and `InvalidInput`
    /// for a malformed snap date, an empty snapshot-time list, client or asset-type
    /// allow-list, or a zero page size.
    pub fn validate(&self) -> AppResult<()> {
        if self.credentials().is_empty() {
            return Err(AppError::MissingCredentials);
        }
        NaiveDate::parse_from_str(&self.snap_date, "%Y-%m-%d").map_err(|_| {
            AppError::InvalidInput(format!(
                "Snap date must be YYYY-MM-DD, got: '{}'",
                self.snap_date
            ))
        })?;
        if self.snap_times.is_empty() || self.snap_times.iter().any(|t| t.trim().is_empty()) {
            return Err(AppError::InvalidInput(
                "At least one non-empty snap time is required".into(),
            ));
        }
        if self.client.trim().is_empty() {
            return Err(AppError::InvalidInput("Client must not be empty".into()));
        }
        if self.asset_types.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one asset type is required".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(AppError::InvalidInput(
                "Page size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RunConfig {
        RunConfig {
            api_key: "key".into(),
            api_secret: "secret".into(),
            snap_date: "2024-07-31".into(),
            client: "ACME".into(),
            ..RunConfig::default()
        }
    }

    #[test]
    fn default_config_values() {
        let config = RunConfig::default();
        assert_eq!(config.mode, ApiMode::Prod);
        assert_eq!(config.snap_times, ["London 4 PM", "New York 4 PM"]);
        assert_eq!(
            config.asset_types,
            ["Swaptions", "Caps & Floors", "Forwards", "Options"]
        );
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let config = RunConfig {
            api_secret: String::new(),
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::MissingCredentials)
        ));
    }

    #[test]
    fn malformed_snap_date_is_rejected() {
        let config = RunConfig {
            snap_date: "_SNAP_DATE_".into(),
            ..valid()
        };
        assert!(matches!(config.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn empty_snap_times_are_rejected() {
        let config = RunConfig {
            snap_times: Vec::new(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_client_and_zero_page_size_are_rejected() {
        assert!(RunConfig {
            client: " ".into(),
            ..valid()
        }
        .validate()
        .is_err());
        assert!(RunConfig {
            page_size: 0,
            ..valid()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn allow_list_is_exact_match() {
        let config = valid();
        assert!(config.allows_sub_asset("Caps & Floors"));
        assert!(!config.allows_sub_asset("swaptions"));
        assert!(!config.allows_sub_asset("Bonds"));
    }

    #[test]
    fn minimal_toml_applies_defaults() {
        let config = RunConfig::from_toml_str(
            r#"
            snap_date = "2024-07-31"
            client = "ACME"
            mode = "metadata"
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, ApiMode::Metadata);
        assert_eq!(config.client, "ACME");
        assert_eq!(config.snap_times.len(), 2);
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn unknown_key_errors() {
        let result = RunConfig::from_toml_str(
            r#"
            client = "ACME"
            extra_flag = true
            "#,
        );
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
