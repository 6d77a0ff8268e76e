//! The registry handle.

use std::sync::{Arc, Mutex, RwLock};

use forgeflow_core::{
    Component, ComponentKind, ComponentRecord, RecordError, RegistryError, RegistryResult,
};

use crate::factory::FactoryTable;
use crate::manifest::Manifest;
use crate::store::{InMemoryStore, JsonFileStore, RecordMap, RecordStore};

/// Cheap-to-clone handle to a shared component registry.
///
/// Every clone sees the same records. Pass the handle explicitly to the
/// planner, composer, evaluator and executor.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    /// Current committed snapshot. Readers clone the `Arc` and drop the guard.
    records: RwLock<Arc<RecordMap>>,
    /// Serializes writers across the clone-persist-swap sequence.
    writer: Mutex<()>,
    store: Box<dyn RecordStore>,
    factories: FactoryTable,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Empty registry with no persistence and no factories.
    pub fn in_memory() -> Self {
        Self::from_parts(Box::new(InMemoryStore::new()), FactoryTable::new(), RecordMap::new())
    }

    fn from_parts(store: Box<dyn RecordStore>, factories: FactoryTable, records: RecordMap) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                records: RwLock::new(Arc::new(records)),
                writer: Mutex::new(()),
                store,
                factories,
            }),
        }
    }

    fn snapshot(&self) -> Arc<RecordMap> {
        match self.inner.records.read() {
            Ok(guard) => Arc::clone(&guard),
            // A swap is one assignment; a poisoned map is still whole.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Clone the current map, apply `mutate`, persist, then swap it in.
    fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut RecordMap) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let _writer = self
            .inner
            .writer
            .lock()
            .map_err(|_| RegistryError::LockPoisoned)?;

        let mut next = (*self.snapshot()).clone();
        let out = mutate(&mut next)?;

        self.inner.store.persist(&next)?;

        let mut guard = self
            .inner
            .records
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        *guard = Arc::new(next);
        Ok(out)
    }

    /// Insert or replace a record, last write wins.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if the record is invalid or the
    /// store cannot be written.
    pub fn register(&self, record: ComponentRecord) -> RegistryResult<()> {
        record.validate()?;
        let name = record.name.clone();
        let kind = record.kind;
        let replaced = self.commit(move |records| Ok(records.insert(record.name.clone(), record)))?;

        tracing::info!(
            component = %name,
            kind = %kind,
            replaced = replaced.is_some(),
            "Registered component"
        );
        Ok(())
    }

    /// Register a batch of records under a single persisted write.
    pub fn register_all(&self, records: Vec<ComponentRecord>) -> RegistryResult<usize> {
        for record in &records {
            record.validate()?;
        }
        let count = records.len();
        self.commit(move |map| {
            for record in records {
                map.insert(record.name.clone(), record);
            }
            Ok(())
        })?;
        tracing::info!(count, "Registered component batch");
        Ok(count)
    }

    /// Seed the registry from a manifest.
    pub fn seed(&self, manifest: &Manifest) -> RegistryResult<usize> {
        self.register_all(manifest.to_records()?)
    }

    /// Replace an existing record in full.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] when `name` is not registered, and a
    /// validation error when `record.name` differs from `name`.
    pub fn update(&self, name: &str, record: ComponentRecord) -> RegistryResult<()> {
        if record.name != name {
            return Err(RecordError::KeyMismatch {
                key: name.to_string(),
                name: record.name,
            }
            .into());
        }
        record.validate()?;
        self.commit(|records| match records.get_mut(name) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(RegistryError::NotFound(name.to_string())),
        })?;
        tracing::debug!(component = %name, "Updated component record");
        Ok(())
    }

    /// Read-modify-write a record under the writer lock.
    ///
    /// Concurrent callers cannot lose each other's changes, unlike a
    /// `get_metadata` followed by `update`.
    pub fn update_with<F>(&self, name: &str, mutate: F) -> RegistryResult<ComponentRecord>
    where
        F: FnOnce(&mut ComponentRecord),
    {
        self.commit(|records| {
            let slot = records
                .get_mut(name)
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
            let mut candidate = slot.clone();
            mutate(&mut candidate);
            if candidate.name != name {
                return Err(RecordError::KeyMismatch {
                    key: name.to_string(),
                    name: candidate.name,
                }
                .into());
            }
            candidate.validate()?;
            *slot = candidate.clone();
            Ok(candidate)
        })
    }

    pub fn get_metadata(&self, name: &str) -> Option<ComponentRecord> {
        self.snapshot().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshot().contains_key(name)
    }

    pub fn list_all(&self) -> Vec<ComponentRecord> {
        self.snapshot().values().cloned().collect()
    }

    pub fn list_by_kind(&self, kind: ComponentKind) -> Vec<ComponentRecord> {
        self.snapshot()
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.snapshot().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Resolve a name into a runnable instance.
    ///
    /// Never fails loudly: unknown names, unknown implementation references
    /// and factory errors are logged and yield `None`.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Component>> {
        match self.try_resolve(name) {
            Ok(component) => Some(component),
            Err(RegistryError::NotFound(_)) => {
                tracing::debug!(component = %name, "Component not registered");
                None
            }
            Err(e) => {
                tracing::warn!(
                    component = %name,
                    error = %e,
                    code = e.error_code(),
                    "Failed to resolve component"
                );
                None
            }
        }
    }

    /// Resolve a name, reporting why resolution failed.
    pub fn try_resolve(&self, name: &str) -> RegistryResult<Arc<dyn Component>> {
        let record = self
            .get_metadata(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        let factory = self
            .inner
            .factories
            .lookup(&record.implementation_ref)
            .ok_or_else(|| RegistryError::UnknownFactory {
                name: record.name.clone(),
                implementation_ref: record.implementation_ref.clone(),
            })?;

        factory(&record, self)
    }

    /// Whether `name` is registered and has a factory for its reference.
    pub fn is_resolvable(&self, name: &str) -> bool {
        self.get_metadata(name)
            .is_some_and(|r| self.inner.factories.contains(&r.implementation_ref))
    }

    pub fn factories(&self) -> &FactoryTable {
        &self.inner.factories
    }

    /// Where the registry persists its records.
    pub fn location(&self) -> String {
        self.inner.store.location()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("location", &self.location())
            .field("components", &self.len())
            .field("factories", &self.inner.factories)
            .finish()
    }
}

/// Builder for a [`Registry`] with a chosen store and factory table.
pub struct RegistryBuilder {
    store: Option<Box<dyn RecordStore>>,
    factories: FactoryTable,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            factories: FactoryTable::new(),
        }
    }

    /// Persist to a JSON file at `path`.
    pub fn with_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.store = Some(Box::new(JsonFileStore::new(path)));
        self
    }

    pub fn with_store(mut self, store: impl RecordStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_factories(mut self, factories: FactoryTable) -> Self {
        self.factories.extend(factories);
        self
    }

    /// Load the store and build the handle.
    ///
    /// # Errors
    ///
    /// Fails when the existing store cannot be read or parsed.
    pub fn build(self) -> RegistryResult<Registry> {
        let store = self
            .store
            .unwrap_or_else(|| Box::new(InMemoryStore::new()));
        let records = store.load()?;
        tracing::info!(
            location = %store.location(),
            components = records.len(),
            factories = self.factories.len(),
            "Registry opened"
        );
        Ok(Registry::from_parts(store, self.factories, records))
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgeflow_core::{ComponentError, ReusabilityTier};
    use serde_json::{Value, json};
    use tempfile::TempDir;

    struct Echo(String);

    impl Component for Echo {
        fn name(&self) -> &str {
            &self.0
        }
        fn kind(&self) -> ComponentKind {
            ComponentKind::Tool
        }
        fn run(&self, input: Value) -> Result<Value, ComponentError> {
            Ok(input)
        }
    }

    fn factories() -> FactoryTable {
        FactoryTable::new().with(
            "builtin.echo.EchoTool",
            |record: &ComponentRecord, _: &Registry| -> RegistryResult<Arc<dyn Component>> {
                Ok(Arc::new(Echo(record.name.clone())))
            },
        )
    }

    fn echo_record() -> ComponentRecord {
        ComponentRecord::new("EchoTool", ComponentKind::Tool, "builtin.echo.EchoTool")
    }

    #[test]
    fn test_register_overwrites() {
        let registry = Registry::in_memory();
        registry
            .register(echo_record().with_description("first"))
            .unwrap();
        registry
            .register(echo_record().with_description("second"))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get_metadata("EchoTool").unwrap().description,
            "second"
        );
    }

    #[test]
    fn test_register_rejects_invalid_team() {
        let registry = Registry::in_memory();
        let mut bad = ComponentRecord::new("Crew", ComponentKind::Team, "builtin.crew.Crew");
        bad.decision_point_count = 1;
        bad.reusability_tier = ReusabilityTier::B;

        let err = registry.register(bad).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RECORD");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_is_safe() {
        let registry = Registry::builder()
            .with_factories(factories())
            .build()
            .unwrap();
        registry.register(echo_record()).unwrap();
        registry
            .register(ComponentRecord::new(
                "Ghost",
                ComponentKind::Agent,
                "nowhere.ghost.Ghost",
            ))
            .unwrap();

        let echo = registry.resolve("EchoTool").unwrap();
        assert_eq!(echo.run(json!({"x": 1})).unwrap(), json!({"x": 1}));

        assert!(registry.resolve("Ghost").is_none());
        assert!(registry.resolve("Missing").is_none());
        assert!(matches!(
            registry.try_resolve("Ghost"),
            Err(RegistryError::UnknownFactory { .. })
        ));
        assert!(registry.is_resolvable("EchoTool"));
        assert!(!registry.is_resolvable("Ghost"));
    }

    #[test]
    fn test_update_requires_existing_record() {
        let registry = Registry::in_memory();
        assert!(matches!(
            registry.update("EchoTool", echo_record()),
            Err(RegistryError::NotFound(_))
        ));

        registry.register(echo_record()).unwrap();
        let mut changed = echo_record();
        changed.tags.insert("core".into());
        registry.update("EchoTool", changed).unwrap();
        assert!(registry.get_metadata("EchoTool").unwrap().tags.contains("core"));

        assert!(matches!(
            registry.update("Other", echo_record()),
            Err(RegistryError::InvalidRecord(RecordError::KeyMismatch { .. }))
        ));
    }

    #[test]
    fn test_update_with_validates_result() {
        let registry = Registry::in_memory();
        registry.register(echo_record()).unwrap();

        let err = registry
            .update_with("EchoTool", |r| r.decision_point_count = 3)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidRecord(_)));
        assert_eq!(registry.get_metadata("EchoTool").unwrap().decision_point_count, 0);
    }

    #[test]
    fn test_list_by_kind() {
        let registry = Registry::in_memory();
        registry.register(echo_record()).unwrap();
        registry
            .register(ComponentRecord::new(
                "EchoAgent",
                ComponentKind::Agent,
                "builtin.echo.EchoAgent",
            ))
            .unwrap();

        let tools = registry.list_by_kind(ComponentKind::Tool);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "EchoTool");
        assert!(registry.list_by_kind(ComponentKind::Team).is_empty());
        assert_eq!(registry.names(), vec!["EchoAgent", "EchoTool"]);
    }

    #[test]
    fn test_reopen_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        {
            let registry = Registry::builder().with_file(&path).build().unwrap();
            registry.register(echo_record()).unwrap();
        }
        let reopened = Registry::builder().with_file(&path).build().unwrap();
        assert_eq!(reopened.get_metadata("EchoTool"), Some(echo_record()));
    }

    #[test]
    fn test_failed_persist_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let registry = Registry::builder()
            .with_file(blocker.join("registry.json"))
            .build()
            .unwrap();
        let err = registry.register(echo_record()).unwrap_err();
        assert!(err.is_retryable());
        assert!(registry.get_metadata("EchoTool").is_none());
    }
}
