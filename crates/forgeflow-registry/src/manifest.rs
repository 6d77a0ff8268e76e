//! TOML manifests for seeding a registry.
//!
//! ```toml
//! [[component]]
//! name = "EchoTool"
//! kind = "tool"
//! implementation_ref = "builtin.echo.EchoTool"
//! description = "Returns its input unchanged"
//! tags = ["builtin"]
//!
//! [component.input_schema]
//! input = "any"
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use forgeflow_core::{ComponentKind, ComponentRecord, FieldSchema, RegistryError};

/// One component declaration in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub kind: ComponentKind,
    pub implementation_ref: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to the minimum for `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_point_count: Option<u32>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub input_schema: FieldSchema,
    #[serde(default)]
    pub output_schema: FieldSchema,
}

impl ManifestEntry {
    pub fn new(
        name: impl Into<String>,
        kind: ComponentKind,
        implementation_ref: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            implementation_ref: implementation_ref.into(),
            description: String::new(),
            decision_point_count: None,
            tags: BTreeSet::new(),
            input_schema: FieldSchema::new(),
            output_schema: FieldSchema::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_decision_points(mut self, count: u32) -> Self {
        self.decision_point_count = Some(count);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn to_record(&self) -> ComponentRecord {
        let mut record = ComponentRecord::new(&self.name, self.kind, &self.implementation_ref)
            .with_description(&self.description);
        if let Some(count) = self.decision_point_count {
            record = record.with_decision_points(count);
        }
        record.tags = self.tags.clone();
        record.input_schema = self.input_schema.clone();
        record.output_schema = self.output_schema.clone();
        record
    }
}

/// A list of component declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "component")]
    pub components: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: ManifestEntry) -> Self {
        self.components.push(entry);
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self, RegistryError> {
        toml::from_str(text).map_err(|e| RegistryError::Manifest(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| RegistryError::Manifest(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, RegistryError> {
        toml::to_string_pretty(self).map_err(|e| RegistryError::Manifest(e.to_string()))
    }

    /// Convert every entry into a validated record.
    ///
    /// # Errors
    ///
    /// Fails on the first entry whose record does not validate.
    pub fn to_records(&self) -> Result<Vec<ComponentRecord>, RegistryError> {
        self.components
            .iter()
            .map(|entry| {
                let record = entry.to_record();
                record.validate()?;
                Ok(record)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
