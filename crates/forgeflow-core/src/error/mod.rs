//! Error Types
//!
//! Structured errors for every failure the pipeline can observe. Each
//! concern owns one enum; [`ForgeError`] wraps them for front-ends that
//! only need a single error type.
//!
//! - `component`: failures raised by a component's `run`
//! - `record`: record and identifier validation
//! - `registry`: lookup, instantiation and persistence
//! - `oracle`: generation oracle transport and parsing
//! - `orchestration`: terminal coordinator failures and step errors
//! - `workflow`: workflow file loading and saving
//! - `conversions`: the umbrella type and its `From` impls

mod component;
mod conversions;
mod oracle;
mod orchestration;
mod record;
mod registry;
mod workflow;

pub use component::ComponentError;
pub use conversions::{ForgeError, ForgeResult};
pub use oracle::OracleError;
pub use orchestration::OrchestrationError;
pub use record::RecordError;
pub use registry::{RegistryError, RegistryResult};
pub use workflow::WorkflowFileError;
