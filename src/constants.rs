// Vendor hosts
pub const PROD_HOST: &str = "clearconsensus.io";
pub const METADATA_HOST: &str = "metadata.cfvr.io";
pub const API_PATH_PREFIX: &str = "/apigw/api/v1/";

// Endpoints, relative to the API base URL
pub const ASSET_LIST_ENDPOINT: &str = "assets/list";
pub const FILE_HISTORY_ENDPOINT: &str = "file-history";
pub const EXPORT_ENDPOINT: &str = "export";

// Request headers
pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_TOKEN_HEADER: &str = "x-api-token";

// File-history table columns
pub const CONSENSUS_RUN_COLUMN: &str = "Consensus Run Timestamps";
pub const UPLOADED_TIME_COLUMN: &str = "Uploaded Time";

// Asset catalog table columns
pub const CATALOG_COLUMNS: [&str; 5] = ["Asset", "Service", "SubAsset", "ID", "TraceName"];

// Export request
pub const INCLUDE_HEADER_FLAG: &str = "True";

// Timestamp sent to the export endpoint and used to match history rows
pub const CONSENSUS_RUN_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// Output filename suffixes
pub const VALUATION_RESULTS_SUFFIX: &str = "valuation_results";
pub const DQ_RESULTS_SUFFIX: &str = "dq_results";

// Environment fallbacks for credentials
pub const API_KEY_ENV: &str = "VALUATION_API_KEY";
pub const API_SECRET_ENV: &str = "VALUATION_API_SECRET";

// API mode aliases
pub const PROD_MODE_ALIASES: &[&str] = &["prod", "production"];
pub const METADATA_MODE_ALIASES: &[&str] = &["metadata", "meta", "staging"];
