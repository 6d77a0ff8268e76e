//! Concurrent access to a file-backed registry.

use forgeflow_core::{ComponentKind, ComponentRecord};
use forgeflow_registry::{JsonFileStore, RecordStore, Registry, record_feedback};
use rstest::rstest;
use tempfile::TempDir;

fn tool(name: &str) -> ComponentRecord {
    ComponentRecord::new(name, ComponentKind::Tool, format!("builtin.test.{name}"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_are_all_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.json");
    let registry = Registry::builder().with_file(&path).build().unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let registry = registry.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            registry.register(tool(&format!("Tool{i}")))
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(registry.len(), 16);
    let on_disk = JsonFileStore::new(&path).load().unwrap();
    assert_eq!(on_disk.len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_feedback_is_not_lost() {
    let registry = Registry::in_memory();
    registry
        .register(ComponentRecord::new(
            "EchoAgent",
            ComponentKind::Agent,
            "builtin.echo.EchoAgent",
        ))
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..20u8 {
        let registry = registry.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            record_feedback(&registry, "EchoAgent", i % 5 + 1, "", "load")
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let record = registry.get_metadata("EchoAgent").unwrap();
    assert_eq!(record.feedback_log.len(), 20);
}

#[rstest]
#[case("EchoTool", true)]
#[case("Missing", false)]
fn metadata_lookup(#[case] name: &str, #[case] present: bool) {
    let registry = Registry::in_memory();
    registry.register(tool("EchoTool")).unwrap();
    assert_eq!(registry.get_metadata(name).is_some(), present);
    assert!(registry.resolve(name).is_none());
}
