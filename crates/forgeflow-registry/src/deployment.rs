//! Deployment descriptor updates.

use forgeflow_core::{DeploymentInfo, RegistryResult};

use crate::registry::Registry;

/// Store a deployment descriptor, leaving every other field untouched.
pub fn set_deployment(registry: &Registry, name: &str, info: DeploymentInfo) -> RegistryResult<()> {
    let endpoint = info.endpoint.clone();
    registry.update_with(name, move |record| record.deployment_info = Some(info))?;
    tracing::info!(component = %name, endpoint = %endpoint, "Deployment info updated");
    Ok(())
}
