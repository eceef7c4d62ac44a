//! Tests for builder modules

use resource_scheduler::builders::SchedulerBuilder;
use resource_scheduler::config::{ConfigPatch, LoaderConfig};
use resource_scheduler::core::{LoaderError, ResourceDescriptor};
use resource_scheduler::runtime::TokioSpawner;

#[test]
fn test_scheduler_builder_defaults() {
    let builder = SchedulerBuilder::new();
    assert_eq!(builder.config(), &LoaderConfig::default());
}

#[test]
fn test_scheduler_builder_configure() {
    let builder = SchedulerBuilder::new()
        .configure(&ConfigPatch {
            max_concurrent: Some(2),
            cache_enabled: Some(false),
            ..ConfigPatch::default()
        })
        .unwrap();
    assert_eq!(builder.config().max_concurrent, 2);
    assert!(!builder.config().cache_enabled);
}

#[test]
fn test_scheduler_builder_rejects_invalid_config() {
    let invalid = LoaderConfig {
        max_concurrent: 0,
        ..LoaderConfig::default()
    };
    let rt = tokio::runtime::Runtime::new().unwrap();
    let spawner = TokioSpawner::new(rt.handle().clone());
    let err = SchedulerBuilder::new()
        .with_config(invalid)
        .build_with_spawner(spawner)
        .err()
        .unwrap();
    assert!(matches!(err, LoaderError::Config(_)));
}

#[tokio::test]
async fn test_scheduler_without_fetchers_reports_unsupported() {
    let scheduler = SchedulerBuilder::new().build().unwrap();
    let err = scheduler
        .enqueue_one(ResourceDescriptor::picture("a.png"))
        .await
        .unwrap_err();
    assert_eq!(err, LoaderError::UnsupportedKind("picture".to_string()));
}
