//! Registry fixtures wired for test doubles.

use std::path::Path;
use std::sync::Arc;

use forgeflow_core::{Component, ComponentRecord};
use forgeflow_registry::{FactoryTable, Registry, RegistryBuilder};

/// A record paired with the instance its factory should return.
#[derive(Clone)]
pub struct Registration {
    pub record: ComponentRecord,
    pub component: Arc<dyn Component>,
}

impl Registration {
    pub fn new(record: ComponentRecord, component: Arc<dyn Component>) -> Self {
        Self { record, component }
    }
}

/// Factory table returning the given instances by implementation reference.
pub fn factories_for(registrations: &[Registration]) -> FactoryTable {
    let mut table = FactoryTable::new();
    for registration in registrations {
        let component = Arc::clone(&registration.component);
        table.register(
            registration.record.implementation_ref.clone(),
            move |_: &ComponentRecord, _: &Registry| Ok(Arc::clone(&component)),
        );
    }
    table
}

fn build(builder: RegistryBuilder, registrations: Vec<Registration>) -> Registry {
    let registry = builder
        .with_factories(factories_for(&registrations))
        .build()
        .unwrap_or_else(|e| panic!("fixture registry failed to open: {e}"));
    let records = registrations.into_iter().map(|r| r.record).collect();
    if let Err(e) = registry.register_all(records) {
        panic!("fixture records failed to register: {e}");
    }
    registry
}

/// In-memory registry with each registration recorded and resolvable.
pub fn registry_with(registrations: Vec<Registration>) -> Registry {
    build(Registry::builder(), registrations)
}

/// File-backed variant of [`registry_with`], persisted at `path`.
pub fn file_registry_with(path: impl AsRef<Path>, registrations: Vec<Registration>) -> Registry {
    build(
        Registry::builder().with_file(path.as_ref().to_path_buf()),
        registrations,
    )
}

/// A fresh temp directory with a registry file path inside it.
///
/// Keep the returned [`tempfile::TempDir`] alive for the test's duration.
pub fn temp_registry_path() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::TempDir::new().unwrap_or_else(|e| panic!("temp dir: {e}"));
    let path = dir.path().join("registry.json");
    (dir, path)
}
