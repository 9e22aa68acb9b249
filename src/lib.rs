//! valuation-dl library
//!
//! This crate provides the core functionality for the `valuation-dl` binary.
//! Keep the crate root minimal; implementation and tests live in their modules.
//!
//! ## Overview
//!
//! - [`auth`] - Signs the per-request `x-api-token`
//! - [`table`] - Flattens the vendor's JSON envelopes into a typed [`table::Table`]
//! - [`api`] - The [`api::ValuationApi`] seam and its `reqwest` implementation
//! - [`downloader`] - Asset catalog lookup and the per-asset download workflow
//! - [`batch`] - Iterates snapshot times and assets and reports outcomes
//! - [`cli`] - Command-line interface
//! - [`config`] - Run configuration and its validation
//! - [`models`] - Assets, credentials and API modes
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use valuation_dl::{api::ApiClient, batch, config::RunConfig, errors::AppResult};
//!
//! # async fn example() -> AppResult<()> {
//! let config = RunConfig {
//!     api_key: "key".into(),
//!     api_secret: "secret".into(),
//!     snap_date: "2024-07-31".into(),
//!     client: "ACME".into(),
//!     ..RunConfig::default()
//! };
//! config.validate()?;
//!
//! let api = ApiClient::new(&config.mode.base_url(), config.credentials())?;
//! let report = batch::download_all_files(&api, &config).await;
//! println!("Downloaded {} file(s)", report.downloaded.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod batch;
pub mod cli;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod errors;
pub mod logging;
pub mod models;
pub mod table;
pub mod ui;
