//! Explicit implementation-reference to constructor mapping.

use std::collections::HashMap;
use std::sync::Arc;

use forgeflow_core::{Component, ComponentRecord, RegistryError};

use crate::registry::Registry;

/// Constructor for a component instance.
///
/// Factories receive the record being resolved and a registry handle, so
/// composite components can resolve their children by name.
pub type ComponentFactory = Arc<
    dyn Fn(&ComponentRecord, &Registry) -> Result<Arc<dyn Component>, RegistryError>
        + Send
        + Sync,
>;

/// Lookup table from implementation references to factories.
///
/// Exact references win over scheme prefixes. The scheme of
/// `generated.uppercase.Shouter` is `generated`.
#[derive(Clone, Default)]
pub struct FactoryTable {
    exact: HashMap<String, ComponentFactory>,
    schemes: HashMap<String, ComponentFactory>,
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for one exact implementation reference.
    pub fn register<F>(&mut self, implementation_ref: impl Into<String>, factory: F)
    where
        F: Fn(&ComponentRecord, &Registry) -> Result<Arc<dyn Component>, RegistryError>
            + Send
            + Sync
            + 'static,
    {
        self.exact.insert(implementation_ref.into(), Arc::new(factory));
    }

    /// Register a factory for every reference starting with `scheme.`.
    pub fn register_scheme<F>(&mut self, scheme: impl Into<String>, factory: F)
    where
        F: Fn(&ComponentRecord, &Registry) -> Result<Arc<dyn Component>, RegistryError>
            + Send
            + Sync
            + 'static,
    {
        self.schemes.insert(scheme.into(), Arc::new(factory));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, implementation_ref: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ComponentRecord, &Registry) -> Result<Arc<dyn Component>, RegistryError>
            + Send
            + Sync
            + 'static,
    {
        self.register(implementation_ref, factory);
        self
    }

    /// Merge another table into this one; entries in `other` win.
    pub fn extend(&mut self, other: FactoryTable) {
        self.exact.extend(other.exact);
        self.schemes.extend(other.schemes);
    }

    pub fn lookup(&self, implementation_ref: &str) -> Option<&ComponentFactory> {
        self.exact.get(implementation_ref).or_else(|| {
            let (scheme, _) = implementation_ref.split_once('.')?;
            self.schemes.get(scheme)
        })
    }

    pub fn contains(&self, implementation_ref: &str) -> bool {
        self.lookup(implementation_ref).is_some()
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut exact: Vec<_> = self.exact.keys().collect();
        exact.sort();
        let mut schemes: Vec<_> = self.schemes.keys().collect();
        schemes.sort();
        f.debug_struct("FactoryTable")
            .field("exact", &exact)
            .field("schemes", &schemes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgeflow_core::{ComponentError, ComponentKind};
    use serde_json::Value;

    struct Noop(String);

    impl Component for Noop {
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

    fn noop(record: &ComponentRecord, _: &Registry) -> Result<Arc<dyn Component>, RegistryError> {
        Ok(Arc::new(Noop(record.name.clone())))
    }

    #[test]
    fn test_exact_match_beats_scheme() {
        let mut table = FactoryTable::new();
        table.register_scheme("generated", |_: &ComponentRecord, _: &Registry| {
            Err(RegistryError::NotFound("scheme".into()))
        });
        table.register("generated.echo.Special", noop);

        let registry = Registry::in_memory();
        let record = ComponentRecord::new("Special", ComponentKind::Tool, "generated.echo.Special");
        let factory = table.lookup("generated.echo.Special").unwrap();
        assert!(factory(&record, &registry).is_ok());

        let other = table.lookup("generated.echo.Other").unwrap();
        assert!(other(&record, &registry).is_err());
    }

    #[test]
    fn test_unknown_reference() {
        let table = FactoryTable::new().with("builtin.echo.EchoTool", noop);
        assert!(table.contains("builtin.echo.EchoTool"));
        assert!(!table.contains("builtin.echo.Missing"));
        assert!(!table.contains("noscheme"));
        assert_eq!(table.len(), 1);
    }
}
