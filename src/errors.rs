use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Request could not be sent or the response body could not be read
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Vendor endpoint answered with a non-2xx status
    #[error("HTTP {status} from {url}: {body}")]
    HttpError {
        status: u16,
        url: String,
        body: String,
    },
    /// Response JSON matches none of the recognized envelope shapes
    #[error("Schema error: {0}")]
    SchemaError(String),
    /// Operation called before the state it depends on was resolved
    #[error("Illegal state: {0}")]
    IllegalState(String),
    /// Export payload could not be base64-decoded or decompressed
    #[error("Decode error: {0}")]
    DecodeError(String),
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    UrlError(String),
    /// Invalid input or configuration value
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// API key or secret is empty
    #[error("API key or API secret is empty. Please provide valid credentials.")]
    MissingCredentials,
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        // Body arrived but was not the JSON we asked for
        if err.is_decode() {
            AppError::SchemaError(err.to_string())
        } else {
            AppError::NetworkError(err.to_string())
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::UrlError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SchemaError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
