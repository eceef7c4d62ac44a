//! Batch coordination tests: ordered results, partial failure, progress events
//! and the JSON batch surface, against the built-in fetchers.

use parking_lot::Mutex;
use resource_scheduler::builders::SchedulerBuilder;
use resource_scheduler::config::ConfigPatch;
use resource_scheduler::core::{
    EventKind, LoadEvent, LoadedResource, LoaderError, PictureFormat, ResourceDescriptor,
    ResourceScheduler,
};
use resource_scheduler::infra::{InMemorySurface, MemorySource, SlotKind};
use resource_scheduler::runtime::api::load_json_batch;
use serde_json::json;
use std::sync::Arc;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&13_u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}

struct Fixture {
    scheduler: ResourceScheduler,
    source: MemorySource,
    surface: Arc<InMemorySurface>,
}

fn fixture(max_attempts: u32) -> Fixture {
    let source = MemorySource::new();
    source.insert("/img/logo.png", png(64, 32));
    source.insert("/js/app.js", "export const ready = true;");
    source.insert("/css/theme.css", "body { margin: 0 } .a, .b { color: red }");

    let surface = Arc::new(InMemorySurface::new());
    let scheduler = SchedulerBuilder::new()
        .configure(&ConfigPatch {
            max_attempts: Some(max_attempts),
            retry_delay_ms: Some(0),
            ..ConfigPatch::default()
        })
        .unwrap()
        .with_default_fetchers(Arc::new(source.clone()), Arc::clone(&surface))
        .build()
        .unwrap();

    Fixture {
        scheduler,
        source,
        surface,
    }
}

fn record(scheduler: &ResourceScheduler, kind: EventKind) -> Arc<Mutex<Vec<LoadEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    scheduler.on(kind, move |event| sink.lock().push(event.clone()));
    events
}

#[tokio::test]
async fn test_empty_batch_resolves_empty() {
    let f = fixture(2);
    let progress = record(&f.scheduler, EventKind::Progress);

    let batch = f.scheduler.load_batch(Vec::new());
    assert!(batch.is_empty());
    assert!(batch.await.is_empty());
    assert!(progress.lock().is_empty());
}

#[tokio::test]
async fn test_batch_loads_every_kind_in_input_order() {
    let f = fixture(2);

    let results = f
        .scheduler
        .load_batch(vec![
            ResourceDescriptor::picture("/img/logo.png"),
            ResourceDescriptor::module("/js/app.js"),
            ResourceDescriptor::stylesheet("/css/theme.css").with_priority(10),
        ])
        .await;

    assert_eq!(results.len(), 3);
    match results[0].as_deref().unwrap() {
        LoadedResource::Picture {
            format,
            width,
            height,
            ..
        } => {
            assert_eq!(*format, PictureFormat::Png);
            assert_eq!((*width, *height), (Some(64), Some(32)));
        }
        other => panic!("expected picture, got {other:?}"),
    }
    assert!(matches!(
        results[1].as_deref().unwrap(),
        LoadedResource::Module { source_len: 26, .. }
    ));
    assert!(matches!(
        results[2].as_deref().unwrap(),
        LoadedResource::Stylesheet { rule_count: 2, .. }
    ));

    let mounts = f.surface.mounts();
    assert_eq!(mounts.len(), 2);
    assert!(mounts
        .iter()
        .any(|m| m.slot == SlotKind::Stylesheet && m.identity == "/css/theme.css"));
    assert!(mounts
        .iter()
        .any(|m| m.slot == SlotKind::Module && m.identity == "/js/app.js"));
}

#[tokio::test]
async fn test_partial_failure_keeps_batch_alive() {
    let f = fixture(2);
    let retries = record(&f.scheduler, EventKind::Retry);
    let errors = record(&f.scheduler, EventKind::Error);

    let results = f
        .scheduler
        .load_batch(vec![
            ResourceDescriptor::picture("/img/logo.png"),
            ResourceDescriptor::picture("/img/missing.png"),
            ResourceDescriptor::module("/js/app.js"),
        ])
        .await;

    assert!(results[0].is_ok());
    assert!(results[2].is_ok());
    match &results[1] {
        Err(LoaderError::Fetch { identity, reason }) => {
            assert_eq!(identity, "/img/missing.png");
            assert!(reason.contains("/img/missing.png"));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
    assert_eq!(retries.lock().len(), 2);
    assert_eq!(errors.lock().len(), 1);
    assert!(f.scheduler.get_cached("/img/missing.png").is_none());
    assert_eq!(f.scheduler.stats().cached, 2);
}

#[tokio::test]
async fn test_progress_counts_every_member() {
    let f = fixture(0);
    let progress = record(&f.scheduler, EventKind::Progress);

    let results = f
        .scheduler
        .load_batch(vec![
            ResourceDescriptor::picture("/img/logo.png"),
            ResourceDescriptor::picture("/img/nope.png"),
            ResourceDescriptor::stylesheet("/css/theme.css"),
        ])
        .await;
    assert_eq!(results.len(), 3);

    let progress = progress.lock();
    assert_eq!(progress.len(), 3);
    let counts: Vec<(usize, usize)> = progress
        .iter()
        .map(|e| {
            let p = e.progress.unwrap();
            (p.completed, p.total)
        })
        .collect();
    assert_eq!(counts, [(1, 3), (2, 3), (3, 3)]);

    let batch_id = progress[0].progress.unwrap().batch_id;
    assert!(progress
        .iter()
        .all(|e| e.progress.unwrap().batch_id == batch_id));
}

#[tokio::test]
async fn test_batch_members_share_cache_and_duplicates() {
    let f = fixture(2);
    let first = f
        .scheduler
        .enqueue_one(ResourceDescriptor::picture("/img/logo.png"))
        .await
        .unwrap();

    let results = f
        .scheduler
        .load_batch(vec![
            ResourceDescriptor::picture("/img/logo.png"),
            ResourceDescriptor::stylesheet("/css/theme.css"),
            ResourceDescriptor::stylesheet("/css/theme.css"),
        ])
        .await;

    assert!(Arc::ptr_eq(results[0].as_ref().unwrap(), &first));
    assert!(Arc::ptr_eq(
        results[1].as_ref().unwrap(),
        results[2].as_ref().unwrap()
    ));
    assert_eq!(f.surface.mount_count("/css/theme.css"), 1);
}

#[tokio::test]
async fn test_stale_cache_entry_is_refetched_after_clear() {
    let f = fixture(0);
    f.scheduler
        .enqueue_one(ResourceDescriptor::module("/js/app.js"))
        .await
        .unwrap();

    f.source.insert("/js/app.js", "export const ready = false;");
    assert_eq!(f.scheduler.clear_cache(Some("/js/app.js")), 1);

    let reloaded = f
        .scheduler
        .enqueue_one(ResourceDescriptor::module("/js/app.js"))
        .await
        .unwrap();
    assert!(matches!(*reloaded, LoadedResource::Module { source_len: 27, .. }));
    assert_eq!(f.surface.mount_count("/js/app.js"), 2);
}

#[tokio::test]
async fn test_json_batch() {
    let f = fixture(0);
    let progress = record(&f.scheduler, EventKind::Progress);

    let results = load_json_batch(
        &f.scheduler,
        &json!([
            {"url": "/img/logo.png", "priority": 5},
            {"url": "/css/theme.css"},
            {"url": "/fonts/x.woff", "type": "font"},
            {"priority": 1}
        ]),
    )
    .await;

    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert_eq!(
        results[2].as_ref().unwrap_err(),
        &LoaderError::UnsupportedKind("font".into())
    );
    assert!(matches!(results[3], Err(LoaderError::InvalidInput(_))));
    assert_eq!(progress.lock().len(), 4);

    let empty = load_json_batch(&f.scheduler, &json!({"url": "/img/logo.png"})).await;
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_json_batch_keeps_results_aligned_with_input() {
    let f = fixture(0);

    let results = load_json_batch(
        &f.scheduler,
        &json!([
            {"url": "/img/logo.png"},
            {"bogus": 1},
            {"url": "/css/theme.css"}
        ]),
    )
    .await;

    assert_eq!(results.len(), 3);
    assert!(matches!(
        results[0].as_deref().unwrap(),
        LoadedResource::Picture { .. }
    ));
    assert!(matches!(results[1], Err(LoaderError::InvalidInput(_))));
    assert!(matches!(
        results[2].as_deref().unwrap(),
        LoadedResource::Stylesheet { rule_count: 2, .. }
    ));
    assert_eq!(f.surface.mount_count("/css/theme.css"), 1);
}

#[tokio::test]
async fn test_batch_after_shutdown_resolves_with_shutdown() {
    let f = fixture(2);
    f.scheduler.shutdown();

    let results = f
        .scheduler
        .load_batch(vec![
            ResourceDescriptor::picture("/img/logo.png"),
            ResourceDescriptor::module("/js/app.js"),
        ])
        .await;

    assert_eq!(
        results,
        vec![Err(LoaderError::Shutdown), Err(LoaderError::Shutdown)]
    );
}
