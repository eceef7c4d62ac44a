//! Tests for descriptors and shared utilities

use resource_scheduler::core::{LoadedResource, MountId, ResourceDescriptor, ResourceKind};
use resource_scheduler::util::init_tracing;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_descriptor_json_round_trip() {
    let d = ResourceDescriptor::module("js/app.js")
        .with_identity("app")
        .with_max_attempts(4)
        .with_timeout(Duration::from_millis(750));

    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(json["kind"], "module");
    assert_eq!(json["identity"], "app");

    let back: ResourceDescriptor = serde_json::from_value(json).unwrap();
    assert_eq!(back, d);
}

#[test]
fn test_descriptor_with_custom_kind() {
    let d = ResourceDescriptor::new("fonts/ui.woff2", ResourceKind::Other("font".to_string()));
    assert_eq!(d.kind.to_string(), "font");
    assert_eq!(d.identity, "fonts/ui.woff2");
}

#[test]
fn test_loaded_resource_mount() {
    let module = LoadedResource::Module {
        mount: MountId(3),
        source_len: 10,
    };
    let raw = LoadedResource::Raw {
        bytes: Arc::from(&b"x"[..]),
    };
    assert_eq!(module.mount(), Some(MountId(3)));
    assert_eq!(raw.mount(), None);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
