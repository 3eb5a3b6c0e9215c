//! Layered configuration loader.
//!
//! Discovers configuration layers (system/user/project/etc), validates schema,
//! merges them, applies environment overrides, and produces a final
//! `MaeumConfig`.

mod env;
mod layer_io;
mod merge;
mod schema;
mod utils;

#[cfg(test)]
mod tests;

use crate::{ConfigError, MaeumConfig};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "maeum.json5";
/// Default config directory under user or repo roots.
const DEFAULT_CONFIG_DIR: &str = ".maeum";
/// Marker files/dirs that identify a project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

#[cfg(unix)]
/// Default system config path on Unix.
const SYSTEM_CONFIG_PATH: &str = "/etc/maeum/maeum.json5";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: MaeumConfig,
    /// Metadata for each layer that contributed values.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// System-wide configuration.
    System,
    /// User-specific configuration.
    User,
    /// Project root configuration.
    Project,
    /// Current working directory configuration.
    Cwd,
    /// Repo-local configuration.
    Repo,
    /// Runtime override files.
    Runtime,
    /// Environment variables (highest precedence).
    Env,
}

/// Metadata about a config layer.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    /// Layer origin (system, user, runtime, etc).
    pub source: ConfigLayerSource,
    /// Location on disk if present.
    pub path: Option<PathBuf>,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to resolve local layers.
    pub cwd: PathBuf,
    /// Optional system config path (defaults to `/etc/maeum/maeum.json5` on Unix).
    pub system_config_path: Option<PathBuf>,
    /// Optional user config path (defaults to `~/.maeum/maeum.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied after file layers.
    pub runtime_paths: Vec<PathBuf>,
    /// Marker files/dirs used to detect the project root.
    pub project_root_markers: Vec<String>,
    /// Environment variables considered for overrides.
    pub env_vars: Vec<(String, String)>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd,
    /// capturing recognized environment overrides from the process.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        let cwd = cwd.as_ref().to_path_buf();
        Self {
            cwd,
            system_config_path: layer_io::default_system_config_path(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
            env_vars: env::capture_process_env(),
        }
    }

    /// Add a runtime override config path.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Replace the captured environment variables.
    pub fn with_env_vars(mut self, vars: Vec<(String, String)>) -> Self {
        self.env_vars = vars;
        self
    }
}

impl MaeumConfig {
    /// Load a single config from a path (no layering, no environment).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(value, "config")
    }

    /// Load a single config from JSON5 contents (no layering, no environment).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): system, user, project, cwd, repo,
    /// runtime overrides, environment.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = utils::normalize_path(&options.cwd)?;
        debug!("normalized cwd for config load: {}", cwd.display());
        let mut layers = Vec::new();
        let mut merge_layers = Vec::new();
        let mut seen_paths = HashSet::new();

        for (source, path) in [
            (
                ConfigLayerSource::System,
                options.system_config_path.as_deref(),
            ),
            (ConfigLayerSource::User, options.user_config_path.as_deref()),
        ] {
            if let Some(layer) = layer_io::load_optional_layer(source, path)? {
                debug!("loaded {:?} layer", source);
                layers.push(layer.meta.clone());
                merge_layers.push(layer);
            }
        }

        let project_root = utils::find_project_root(&cwd, &options.project_root_markers);
        let mut local_layers = Vec::new();
        match project_root.as_ref() {
            Some(root) => {
                debug!("resolved project root: {}", root.display());
                local_layers.push((ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)));
            }
            None => debug!("project root not found; skipping project/repo layers"),
        }
        local_layers.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));
        if let Some(root) = project_root.as_ref() {
            local_layers.push((
                ConfigLayerSource::Repo,
                root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
            ));
        }

        for (source, path) in local_layers {
            if !path.exists() {
                debug!(
                    "skipping missing layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            if !seen_paths.insert(utils::unique_path(&path)) {
                debug!(
                    "skipping duplicate layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            let loaded = layer_io::load_required_layer(source, &path)?;
            layers.push(loaded.meta.clone());
            merge_layers.push(loaded);
        }

        for runtime_path in &options.runtime_paths {
            let loaded = layer_io::load_required_layer(ConfigLayerSource::Runtime, runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            layers.push(loaded.meta.clone());
            merge_layers.push(loaded);
        }

        if let Some(value) = env::env_overlay(&options.env_vars)? {
            debug!("applying environment overrides (vars={})", options.env_vars.len());
            let loaded = LoadedLayer {
                meta: ConfigLayer {
                    source: ConfigLayerSource::Env,
                    path: None,
                },
                value,
            };
            layers.push(loaded.meta.clone());
            merge_layers.push(loaded);
        }

        let mut merged = Value::Object(serde_json::Map::new());
        for layer in merge_layers {
            merge::merge_json_values(&mut merged, &layer.value);
        }

        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let generation = &self.generation;
        if generation.temperature.is_nan() || generation.temperature <= 0.0 {
            return Err(invalid("generation.temperature", "must be greater than 0"));
        }
        if generation.top_p.is_nan() || generation.top_p <= 0.0 || generation.top_p > 1.0 {
            return Err(invalid("generation.top_p", "must be in (0, 1]"));
        }
        if self.memory.history_turns == 0 {
            return Err(invalid("memory.history_turns", "must be at least 1"));
        }
        if self.speech.tts_speed.is_nan() || self.speech.tts_speed <= 0.0 {
            return Err(invalid("speech.tts_speed", "must be greater than 0"));
        }
        if self.speech.emotion_top_k == 0 {
            return Err(invalid("speech.emotion_top_k", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: format!("effective:{path}"),
        message: message.to_string(),
    }
}

/// Internal representation of a loaded config layer.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

fn config_from_value(value: Value, label: &str) -> Result<MaeumConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: MaeumConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
