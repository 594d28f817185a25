use crate::error::*;
use std::time::Duration;
use tracing::{error, info, warn};

/// Where a failure sits in the crawl's degradation taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Network/transport failure; the request counts as zero results.
    Transport,
    /// The server rejected the request as automated traffic.
    Blocked,
    /// The payload could not be parsed; treated as an empty result.
    Malformed,
    /// Cache missing or empty; falls back to a fresh crawl.
    CacheMiss,
    /// Anything the pipeline cannot degrade around.
    Fatal,
}

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
    fn failure_class(&self) -> FailureClass;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::BiliApi(e) => {
                error!("Bilibili API error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            CoreError::Cache(e) => {
                error!("Cache error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::BiliApi(e) => e.is_retryable(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::BiliApi(e) => e.retry_after(),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::BiliApi(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Cache(CacheError::Unreadable { path, .. }) => {
                format!("Could not read the comment cache at {}.", path)
            }
            CoreError::Cache(CacheError::Unwritable { path, .. }) => {
                format!("Could not write the comment cache at {}.", path)
            }
            CoreError::Report(ReportError::OutputFailed { sink, .. }) => {
                format!("The {} report could not be written.", sink)
            }
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Serialization(_) => {
                "The report data could not be serialized.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::BiliApi(_) => "BILI_API".to_string(),
            CoreError::Cache(_) => "CACHE".to_string(),
            CoreError::Report(_) => "REPORT".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
        }
    }

    fn failure_class(&self) -> FailureClass {
        match self {
            CoreError::BiliApi(e) => e.failure_class(),
            CoreError::Network(_) => FailureClass::Transport,
            CoreError::Serialization(_) => FailureClass::Malformed,
            CoreError::Cache(CacheError::Unreadable { .. }) => FailureClass::CacheMiss,
            _ => FailureClass::Fatal,
        }
    }
}

impl ErrorExt for BiliApiError {
    fn log_error(&self) -> &Self {
        error!("BiliApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("BiliApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(self, BiliApiError::Blocked { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            BiliApiError::Blocked { .. } => Some(Duration::from_secs(5)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            BiliApiError::Blocked { .. } => {
                "Bilibili flagged the requests as automated. Wait a few minutes, check the \
                 network connection, or open the site in a browser to refresh cookies."
                    .to_string()
            }
            BiliApiError::HttpStatus { status_code, .. } => {
                format!("Bilibili answered with HTTP {}.", status_code)
            }
            BiliApiError::ApiCode { message, .. } => {
                format!("Bilibili rejected the request: {}", message)
            }
            BiliApiError::EmptyResponse { .. } => "Bilibili returned an empty page.".to_string(),
            BiliApiError::InvalidResponse { .. } | BiliApiError::MalformedDocument { .. } => {
                "Bilibili returned data in an unexpected format.".to_string()
            }
            BiliApiError::RequestTimeout => {
                "The request to Bilibili timed out. Please try again.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            BiliApiError::Blocked { .. } => "BILI_BLOCKED".to_string(),
            BiliApiError::HttpStatus { .. } => "BILI_HTTP_STATUS".to_string(),
            BiliApiError::ApiCode { .. } => "BILI_API_CODE".to_string(),
            BiliApiError::EmptyResponse { .. } => "BILI_EMPTY_RESPONSE".to_string(),
            BiliApiError::InvalidResponse { .. } => "BILI_INVALID_RESPONSE".to_string(),
            BiliApiError::MalformedDocument { .. } => "BILI_MALFORMED_DOCUMENT".to_string(),
            BiliApiError::RequestTimeout => "BILI_TIMEOUT".to_string(),
        }
    }

    fn failure_class(&self) -> FailureClass {
        match self {
            BiliApiError::Blocked { .. } => FailureClass::Blocked,
            BiliApiError::HttpStatus { .. }
            | BiliApiError::ApiCode { .. }
            | BiliApiError::RequestTimeout => FailureClass::Transport,
            BiliApiError::EmptyResponse { .. }
            | BiliApiError::InvalidResponse { .. }
            | BiliApiError::MalformedDocument { .. } => FailureClass::Malformed,
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file {} not found.", path)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::ValidationFailed { reason } => {
                format!("Configuration is not usable: {}", reason)
            }
            ConfigError::PermissionDenied { .. } => {
                "Permission denied accessing configuration. Please check file permissions."
                    .to_string()
            }
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
            ConfigError::PermissionDenied { .. } => "CONFIG_PERMISSION_DENIED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }

    fn failure_class(&self) -> FailureClass {
        FailureClass::Fatal
    }
}

/// Logs a run-ending error with its code and source chain.
#[derive(Debug, Default)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report_error(&self, error: &CoreError) {
        error.log_error();
        info!("Error code: {}", error.error_code());
        info!("User message: {}", error.user_friendly_message());
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            error!("  caused by: {}", cause);
            source = cause.source();
        }
    }
}
