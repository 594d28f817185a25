use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Bilibili API error: {0}")]
    BiliApi(#[from] BiliApiError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Error, Debug, Clone)]
pub enum BiliApiError {
    #[error("Request blocked by server (status {status_code}) at {endpoint}")]
    Blocked { status_code: u16, endpoint: String },

    #[error("Unexpected status {status_code} from {endpoint}")]
    HttpStatus { status_code: u16, endpoint: String },

    #[error("API returned code {code}: {message}")]
    ApiCode { code: i64, message: String },

    #[error("Empty response body from {endpoint}")]
    EmptyResponse { endpoint: String },

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Malformed comment document: {details}")]
    MalformedDocument { details: String },

    #[error("Request timeout")]
    RequestTimeout,
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache file unreadable: {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Cache file unwritable: {path}: {reason}")]
    Unwritable { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report sink {sink} failed: {reason}")]
    OutputFailed { sink: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Permission denied accessing config: {path}")]
    PermissionDenied { path: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
