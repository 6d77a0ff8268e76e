//! # Forgeflow Testing
//!
//! Test doubles for the pieces the pipeline depends on:
//!
//! - [`MockComponent`] records every input it receives and returns a canned
//!   value (or echoes its input)
//! - [`FailingComponent`] always fails with a fixed message
//! - [`SlowComponent`] blocks its thread before echoing
//! - [`ScriptedOracle`], [`FailingOracle`] and [`SlowOracle`] stand in for a
//!   generation backend
//! - [`fixtures`] builds registries wired with factories for those doubles
//!
//! ```rust
//! use forgeflow_testing::{MockComponent, fixtures};
//! use serde_json::json;
//!
//! let echo = MockComponent::echo("EchoTool");
//! let registry = fixtures::registry_with(vec![echo.clone().into_registration()]);
//!
//! let component = registry.resolve("EchoTool").unwrap();
//! assert_eq!(component.run(json!("hi")).unwrap(), json!("hi"));
//! assert_eq!(echo.call_count(), 1);
//! ```

pub mod fixtures;
pub mod mock_components;
pub mod mock_oracles;

pub use fixtures::Registration;
pub use mock_components::{FailingComponent, MockComponent, SlowComponent};
pub use mock_oracles::{FailingOracle, ScriptedOracle, SlowOracle};
