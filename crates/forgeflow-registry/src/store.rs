//! Durable backing stores for registry records.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use forgeflow_core::{ComponentRecord, RegistryError};

/// All records keyed by component name.
pub type RecordMap = BTreeMap<String, ComponentRecord>;

/// Whole-store persistence used by the registry.
///
/// `persist` must be all-or-nothing: after an error the previously
/// persisted state is still the one `load` returns.
pub trait RecordStore: Send + Sync {
    /// Load every persisted record. A missing store yields an empty map.
    fn load(&self) -> Result<RecordMap, RegistryError>;

    /// Replace the persisted store with `records`.
    fn persist(&self, records: &RecordMap) -> Result<(), RegistryError>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// Volatile store for tests and ephemeral registries.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<RecordMap>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryStore {
    fn load(&self) -> Result<RecordMap, RegistryError> {
        self.records
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| RegistryError::LockPoisoned)
    }

    fn persist(&self, records: &RecordMap) -> Result<(), RegistryError> {
        let mut guard = self.records.lock().map_err(|_| RegistryError::LockPoisoned)?;
        *guard = records.clone();
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Single JSON document keyed by component name.
///
/// Writes go to a sibling temp file which is flushed, synced and renamed
/// over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "registry.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persistence_error(&self, message: impl Into<String>) -> RegistryError {
        RegistryError::Persistence {
            path: self.path.clone(),
            message: message.into(),
        }
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> Result<RecordMap, RegistryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "Registry file not found, starting empty");
                return Ok(RecordMap::new());
            }
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "Failed to read registry file");
                return Err(self.persistence_error(e.to_string()));
            }
        };

        if contents.trim().is_empty() {
            return Ok(RecordMap::new());
        }

        let records: RecordMap = serde_json::from_str(&contents).map_err(|e| {
            tracing::error!(path = ?self.path, error = %e, "Failed to parse registry JSON");
            RegistryError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })?;

        tracing::debug!(path = ?self.path, entries = records.len(), "Loaded registry");
        Ok(records)
    }

    fn persist(&self, records: &RecordMap) -> Result<(), RegistryError> {
        let json = serde_json::to_string_pretty(records).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialize registry");
            self.persistence_error(format!("serialization failed: {e}"))
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.persistence_error(e.to_string()))?;
        }

        let tmp_path = self.tmp_path();
        let write_tmp = || -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.flush()?;
            file.sync_all()
        };
        if let Err(e) = write_tmp() {
            tracing::error!(path = ?tmp_path, error = %e, "Failed to write registry temp file");
            let _ = fs::remove_file(&tmp_path);
            return Err(self.persistence_error(format!(
                "failed to write {}: {e}",
                tmp_path.display()
            )));
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            tracing::error!(
                from = ?tmp_path,
                to = ?self.path,
                error = %e,
                "Failed to atomically rename registry file"
            );
            let _ = fs::remove_file(&tmp_path);
            self.persistence_error(format!("failed to rename {}: {e}", tmp_path.display()))
        })?;

        tracing::debug!(path = ?self.path, entries = records.len(), "Persisted registry");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgeflow_core::ComponentKind;
    use tempfile::TempDir;

    fn records() -> RecordMap {
        let mut map = RecordMap::new();
        let record = ComponentRecord::new("EchoTool", ComponentKind::Tool, "builtin.echo.EchoTool");
        map.insert(record.name.clone(), record);
        map
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("registry.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_persist_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/registry.json"));
        store.persist(&records()).unwrap();

        assert_eq!(store.load().unwrap(), records());
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(RegistryError::Corrupt { .. })));
    }

    #[test]
    fn test_persist_into_unwritable_location_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a dir").unwrap();
        let store = JsonFileStore::new(blocker.join("registry.json"));
        assert!(matches!(
            store.persist(&records()),
            Err(RegistryError::Persistence { .. })
        ));
    }
}
