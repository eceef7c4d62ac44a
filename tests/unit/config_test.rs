//! Tests for configuration validation

use resource_scheduler::config::{ConfigPatch, LoaderConfig};
use std::time::Duration;

#[test]
fn test_loader_config_defaults() {
    let config = LoaderConfig::default();
    assert!(config.cache_enabled);
    assert_eq!(config.timeout_ms, 15000);
    assert_eq!(config.max_concurrent, 6);
    assert_eq!(config.max_attempts, 2);
    assert!(config.validate().is_ok());
}

#[test]
fn test_loader_config_invalid_max_concurrent() {
    let invalid = LoaderConfig {
        max_concurrent: 0,
        ..LoaderConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_loader_config_invalid_timeout() {
    let invalid = LoaderConfig {
        timeout_ms: 0,
        ..LoaderConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_loader_config_from_json() {
    let json = r#"{
        "cacheEnabled": false,
        "timeoutMs": 2000,
        "maxConcurrent": 3
    }"#;

    let config = LoaderConfig::from_json_str(json).unwrap();
    assert!(!config.cache_enabled);
    assert_eq!(config.timeout(), Duration::from_secs(2));
    assert_eq!(config.max_concurrent, 3);
    assert_eq!(config.max_attempts, 2);
}

#[test]
fn test_loader_config_from_json_rejects_invalid() {
    assert!(LoaderConfig::from_json_str(r#"{"max_concurrent": 0}"#).is_err());
    assert!(LoaderConfig::from_json_str("not json").is_err());
}

#[test]
fn test_patch_leaves_unset_fields() {
    let mut config = LoaderConfig::default();
    let patch = ConfigPatch::from_json_str(r#"{"maxAttempts": 5}"#).unwrap();
    config.apply(&patch).unwrap();
    assert_eq!(config.max_attempts, 5);
    assert_eq!(config.max_concurrent, 6);
}

#[test]
fn test_retry_delay_doubles_and_caps() {
    let config = LoaderConfig {
        retry_delay_ms: 100,
        max_retry_delay_ms: 350,
        ..LoaderConfig::default()
    };
    assert_eq!(config.retry_delay(1), Duration::from_millis(100));
    assert_eq!(config.retry_delay(2), Duration::from_millis(200));
    assert_eq!(config.retry_delay(3), Duration::from_millis(350));
    assert_eq!(config.retry_delay(40), Duration::from_millis(350));
}
