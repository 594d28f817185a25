use insight_core::{
    BiliApiError, CacheError, ConfigError, CoreError, ErrorExt, ErrorReporter, FailureClass,
    ReportError,
};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let blocked = CoreError::BiliApi(BiliApiError::Blocked {
        status_code: 412,
        endpoint: "/x/web-interface/search/type".to_string(),
    });
    assert_eq!(blocked.error_code(), "BILI_API");

    let config_error = CoreError::Config(ConfigError::InvalidValue {
        field: "top_n".to_string(),
        value: "0".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let cache_error = CoreError::Cache(CacheError::Unwritable {
        path: "danmaku_cache.txt".to_string(),
        reason: "read-only file system".to_string(),
    });
    assert_eq!(cache_error.error_code(), "CACHE");

    assert_eq!(BiliApiError::RequestTimeout.error_code(), "BILI_TIMEOUT");
}

#[test]
fn test_only_blocks_are_retryable() {
    let blocked = CoreError::BiliApi(BiliApiError::Blocked {
        status_code: 412,
        endpoint: "search".to_string(),
    });
    assert!(blocked.is_retryable());
    assert_eq!(blocked.retry_after(), Some(Duration::from_secs(5)));

    let status = CoreError::BiliApi(BiliApiError::HttpStatus {
        status_code: 500,
        endpoint: "search".to_string(),
    });
    assert!(!status.is_retryable());
    assert_eq!(status.retry_after(), None);

    let config_error = CoreError::Config(ConfigError::ValidationFailed {
        reason: "no keywords".to_string(),
    });
    assert!(!config_error.is_retryable());
}

#[test]
fn test_failure_classes() {
    let blocked = CoreError::BiliApi(BiliApiError::Blocked {
        status_code: 412,
        endpoint: "search".to_string(),
    });
    assert_eq!(blocked.failure_class(), FailureClass::Blocked);

    let malformed = CoreError::BiliApi(BiliApiError::InvalidResponse {
        details: "expected value at line 1 column 1".to_string(),
    });
    assert_eq!(malformed.failure_class(), FailureClass::Malformed);

    let timeout = CoreError::BiliApi(BiliApiError::RequestTimeout);
    assert_eq!(timeout.failure_class(), FailureClass::Transport);

    let cache_miss = CoreError::Cache(CacheError::Unreadable {
        path: "danmaku_cache.txt".to_string(),
        reason: "invalid utf-8".to_string(),
    });
    assert_eq!(cache_miss.failure_class(), FailureClass::CacheMiss);

    let report = CoreError::Report(ReportError::OutputFailed {
        sink: "statistics export".to_string(),
        reason: "disk full".to_string(),
    });
    assert_eq!(report.failure_class(), FailureClass::Fatal);
}

#[test]
fn test_user_friendly_messages() {
    let blocked = CoreError::BiliApi(BiliApiError::Blocked {
        status_code: 412,
        endpoint: "search".to_string(),
    });
    let message = blocked.user_friendly_message();
    assert!(message.contains("automated"));

    let config_error = CoreError::Config(ConfigError::InvalidValue {
        field: "crawl.page_size".to_string(),
        value: "0".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("crawl.page_size"));
}

#[test]
fn test_error_reporter() {
    let error = CoreError::Config(ConfigError::Parse(
        toml::from_str::<toml::Value>("top_n = ").unwrap_err(),
    ));

    // Walks the source chain without panicking
    ErrorReporter::new().report_error(&error);
}
