//! # Forgeflow Registry
//!
//! The registry is the single source of truth for component metadata and
//! the only way to turn a component name into a runnable instance.
//!
//! ## Consistency model
//!
//! - Writes (`register`, `update`) are serialized by one registry-wide
//!   writer lock. Each write clones the current map, persists the clone,
//!   and only then swaps it in, so a failed write leaves readers untouched.
//! - Reads take a cheap snapshot under a shared lock and never block each
//!   other. No lock is ever held while a factory or component runs.
//!
//! ## Resolution
//!
//! Records carry an `implementation_ref` such as `builtin.echo.EchoTool`.
//! The [`FactoryTable`] maps exact references, or a scheme prefix such as
//! `generated`, to a constructor closure. There is no reflection and no
//! global registry: callers hold a cloned [`Registry`] handle.
//!
//! ```rust
//! use forgeflow_core::{ComponentKind, ComponentRecord};
//! use forgeflow_registry::Registry;
//!
//! let registry = Registry::in_memory();
//! registry
//!     .register(ComponentRecord::new("EchoTool", ComponentKind::Tool, "builtin.echo.EchoTool"))
//!     .unwrap();
//! assert!(registry.get_metadata("EchoTool").is_some());
//! // No factory is registered, so resolution degrades to `None`.
//! assert!(registry.resolve("EchoTool").is_none());
//! ```

pub mod deployment;
pub mod factory;
pub mod feedback;
pub mod manifest;
pub mod registry;
pub mod store;

pub use deployment::set_deployment;
pub use factory::{ComponentFactory, FactoryTable};
pub use feedback::{FeedbackSummary, record_feedback, summarize_feedback};
pub use manifest::{Manifest, ManifestEntry};
pub use registry::{Registry, RegistryBuilder};
pub use store::{InMemoryStore, JsonFileStore, RecordMap, RecordStore};
