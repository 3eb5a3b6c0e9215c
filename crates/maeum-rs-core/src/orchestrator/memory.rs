//! Memory variant selection from config.

use log::{info, warn};
use maeum_rs_config::MemoryConfig;
use maeum_rs_memory::{DisabledMemoryStore, MemoryStore, RemoteMemorySettings, RemoteMemoryStore};
use std::sync::Arc;
use std::time::Duration;

/// Pick the memory variant once at startup. Missing identifiers or a failed
/// client build select the disabled store for the rest of the process.
pub fn memory_store_from_config(config: &MemoryConfig) -> Arc<dyn MemoryStore> {
    let settings = match remote_settings_from_config(config) {
        Ok(settings) => settings,
        Err(reason) => return disabled(config, reason),
    };
    match RemoteMemoryStore::new(settings) {
        Ok(store) => {
            info!("remote memory enabled");
            Arc::new(store)
        }
        Err(err) => disabled(config, format!("remote memory initialization failed: {err}")),
    }
}

/// Translate memory config into remote settings, or the reason it cannot be.
fn remote_settings_from_config(config: &MemoryConfig) -> Result<RemoteMemorySettings, String> {
    if !config.enabled {
        return Err("memory.enabled is false".to_string());
    }
    let project_id = required(&config.project_id, "memory.project_id")?;
    let location = required(&config.location, "memory.location")?;
    let data_store_id = required(&config.data_store_id, "memory.data_store_id")?;
    Ok(RemoteMemorySettings {
        project_id,
        location,
        data_store_id,
        endpoint: config.endpoint.clone().filter(|value| !value.trim().is_empty()),
        access_token: config.access_token.clone(),
        timeout: Duration::from_secs(config.timeout_secs),
    })
}

fn required(value: &Option<String>, name: &str) -> Result<String, String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("{name} is not set"))
}

fn disabled(config: &MemoryConfig, reason: String) -> Arc<dyn MemoryStore> {
    if config.enabled {
        warn!("remote memory disabled for this process (reason={})", reason);
    } else {
        info!("remote memory disabled (reason={})", reason);
    }
    Arc::new(DisabledMemoryStore::new(
        reason,
        config.project_id.clone(),
        config.location.clone(),
        config.data_store_id.clone(),
    ))
}
