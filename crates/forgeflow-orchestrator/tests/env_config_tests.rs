//! Integration tests for environment-based configuration

use forgeflow_orchestrator::{ConfigError, ForgeConfigBuilder, StepErrorPolicy};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const ALL_VARS: &[&str] = &[
    "FORGEFLOW_REGISTRY_PATH",
    "FORGEFLOW_ARTIFACTS_DIR",
    "FORGEFLOW_MAX_REPLAN_CYCLES",
    "FORGEFLOW_STEP_ERROR_POLICY",
    "FORGEFLOW_ORACLE_URL",
    "FORGEFLOW_ORACLE_MODEL",
    "FORGEFLOW_ORACLE_TIMEOUT_SECS",
    "FORGEFLOW_DEADLINE_SECS",
];

fn set_env(key: &str, value: &str) {
    unsafe {
        env::set_var(key, value);
    }
}

fn clear_all_forgeflow_env_vars() {
    for key in ALL_VARS {
        unsafe {
            env::remove_var(key);
        }
    }
}

#[test]
#[serial]
fn test_env_config_defaults_when_no_vars_set() {
    clear_all_forgeflow_env_vars();

    let config = ForgeConfigBuilder::from_env()
        .expect("should load defaults when no env vars set")
        .build()
        .expect("should build valid config");

    assert_eq!(config.registry_path, PathBuf::from("forgeflow_registry.json"));
    assert_eq!(config.artifacts_dir, PathBuf::from("generated"));
    assert_eq!(config.max_replan_cycles, 3);
    assert_eq!(config.step_error_policy, StepErrorPolicy::ContinueOnError);
    assert!(config.oracle_url.is_none());
    assert!(config.deadline().is_none());
}

#[test]
#[serial]
fn test_env_config_overrides() {
    clear_all_forgeflow_env_vars();
    set_env("FORGEFLOW_REGISTRY_PATH", "/tmp/forge/registry.json");
    set_env("FORGEFLOW_MAX_REPLAN_CYCLES", "5");
    set_env("FORGEFLOW_STEP_ERROR_POLICY", "abort");
    set_env("FORGEFLOW_ORACLE_URL", "http://localhost:9000/complete");
    set_env("FORGEFLOW_ORACLE_TIMEOUT_SECS", "12");
    set_env("FORGEFLOW_DEADLINE_SECS", "120");

    let config = ForgeConfigBuilder::from_env()
        .expect("should load config")
        .build()
        .expect("should build valid config");

    assert_eq!(config.registry_path, PathBuf::from("/tmp/forge/registry.json"));
    assert_eq!(config.max_replan_cycles, 5);
    assert_eq!(config.step_error_policy, StepErrorPolicy::AbortOnError);
    assert_eq!(
        config.oracle_url.as_deref(),
        Some("http://localhost:9000/complete")
    );
    assert_eq!(config.oracle_timeout(), Duration::from_secs(12));
    assert_eq!(config.deadline(), Some(Duration::from_secs(120)));

    clear_all_forgeflow_env_vars();
}

#[test]
#[serial]
fn test_env_config_blank_oracle_url_disables_oracle() {
    clear_all_forgeflow_env_vars();
    set_env("FORGEFLOW_ORACLE_URL", "  ");

    let config = ForgeConfigBuilder::from_env().unwrap().build().unwrap();
    assert!(config.oracle_url.is_none());

    clear_all_forgeflow_env_vars();
}

#[test]
#[serial]
fn test_env_config_invalid_number() {
    clear_all_forgeflow_env_vars();
    set_env("FORGEFLOW_MAX_REPLAN_CYCLES", "many");

    let result = ForgeConfigBuilder::from_env();
    match result {
        Err(ConfigError::InvalidEnvVar { key, .. }) => {
            assert_eq!(key, "FORGEFLOW_MAX_REPLAN_CYCLES");
        }
        other => panic!("expected InvalidEnvVar, got {other:?}"),
    }

    clear_all_forgeflow_env_vars();
}

#[test]
#[serial]
fn test_env_config_invalid_policy() {
    clear_all_forgeflow_env_vars();
    set_env("FORGEFLOW_STEP_ERROR_POLICY", "retry");

    assert!(matches!(
        ForgeConfigBuilder::from_env(),
        Err(ConfigError::InvalidEnvVar { .. })
    ));

    clear_all_forgeflow_env_vars();
}

#[test]
#[serial]
fn test_env_config_validation_runs_after_env() {
    clear_all_forgeflow_env_vars();
    set_env("FORGEFLOW_ORACLE_TIMEOUT_SECS", "0");

    let builder = ForgeConfigBuilder::from_env().expect("parses as a number");
    assert!(matches!(
        builder.build(),
        Err(ConfigError::ValidationError(_))
    ));

    clear_all_forgeflow_env_vars();
}
