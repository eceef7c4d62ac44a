//! Tests for error types

use resource_scheduler::core::LoaderError;

#[test]
fn test_fetch_error() {
    let err = LoaderError::fetch("/img/a.png", "404 Not Found");
    assert_eq!(format!("{}", err), "fetch failed for `/img/a.png`: 404 Not Found");
    assert!(err.is_retryable());
}

#[test]
fn test_timeout_error() {
    let err = LoaderError::Timeout {
        identity: "app.js".to_string(),
        timeout_ms: 15000,
    };
    assert_eq!(format!("{}", err), "timed out after 15000 ms loading `app.js`");
    assert!(err.is_retryable());
}

#[test]
fn test_unsupported_kind_error() {
    let err = LoaderError::UnsupportedKind("font".to_string());
    assert_eq!(format!("{}", err), "no fetcher registered for resource kind `font`");
    assert!(!err.is_retryable());
}

#[test]
fn test_shutdown_and_config_errors_are_terminal() {
    assert_eq!(format!("{}", LoaderError::Shutdown), "scheduler shut down");
    assert_eq!(
        format!("{}", LoaderError::Config("bad".into())),
        "invalid configuration: bad"
    );
    assert!(!LoaderError::Shutdown.is_retryable());
    assert!(!LoaderError::InvalidInput("x".into()).is_retryable());
}
