//! Environment variable overrides, applied as the highest-precedence layer.

use super::schema;
use crate::ConfigError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Text,
    Flag,
}

/// Recognized variables and the config key each one sets.
const ENV_OVERRIDES: &[(&str, &str, &str, EnvKind)] = &[
    ("GOOGLE_CLOUD_PROJECT", "memory", "project_id", EnvKind::Text),
    ("GOOGLE_CLOUD_LOCATION", "memory", "location", EnvKind::Text),
    ("VERTEX_AI_AGENT_ENGINE_ID", "memory", "data_store_id", EnvKind::Text),
    ("MEMORY_BANK_ENABLED", "memory", "enabled", EnvKind::Flag),
    ("GOOGLE_OAUTH_ACCESS_TOKEN", "memory", "access_token", EnvKind::Text),
    ("MAEUM_LLM_BASE_URL", "generation", "base_url", EnvKind::Text),
    ("MAEUM_LLM_API_KEY", "generation", "api_key", EnvKind::Text),
    ("MAEUM_SPEECH_ENDPOINT", "speech", "endpoint", EnvKind::Text),
];

/// Snapshot the recognized variables from the process environment.
pub(super) fn capture_process_env() -> Vec<(String, String)> {
    ENV_OVERRIDES
        .iter()
        .filter_map(|(name, ..)| {
            std::env::var(name)
                .ok()
                .map(|value| (name.to_string(), value))
        })
        .collect()
}

/// Build an overlay from environment variables; `None` when nothing applies.
///
/// Blank values are ignored. Flags are true only for `"true"`, compared
/// case-insensitively; anything else is false.
pub(super) fn env_overlay(vars: &[(String, String)]) -> Result<Option<Value>, ConfigError> {
    let mut root = Map::new();
    for (name, raw) in vars {
        let Some((_, section, key, kind)) = ENV_OVERRIDES
            .iter()
            .find(|(candidate, ..)| candidate == name)
        else {
            continue;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = match kind {
            EnvKind::Text => Value::String(trimmed.to_string()),
            EnvKind::Flag => Value::Bool(trimmed.eq_ignore_ascii_case("true")),
        };
        let section = root
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match section {
            Value::Object(map) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                return Err(ConfigError::InvalidEnv {
                    name: name.clone(),
                    message: "section is not an object".to_string(),
                });
            }
        }
    }
    if root.is_empty() {
        return Ok(None);
    }
    let overlay = Value::Object(root);
    schema::validate_layer_schema(&overlay, "env")?;
    Ok(Some(overlay))
}

#[cfg(test)]
mod tests {
    use super::env_overlay;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn maps_memory_variables() {
        let overlay = env_overlay(&vars(&[
            ("GOOGLE_CLOUD_PROJECT", "demo-project"),
            ("VERTEX_AI_AGENT_ENGINE_ID", "store-1"),
            ("MEMORY_BANK_ENABLED", "TRUE"),
        ]))
        .expect("overlay")
        .expect("some");
        assert_eq!(
            overlay,
            json!({
                "memory": {
                    "project_id": "demo-project",
                    "data_store_id": "store-1",
                    "enabled": true
                }
            })
        );
    }

    #[test]
    fn ignores_blank_and_unknown_variables() {
        let overlay = env_overlay(&vars(&[
            ("GOOGLE_CLOUD_LOCATION", "   "),
            ("UNRELATED", "value"),
        ]))
        .expect("overlay");
        assert_eq!(overlay, None);
    }

    #[test]
    fn non_true_flag_disables() {
        let overlay = env_overlay(&vars(&[("MEMORY_BANK_ENABLED", "yes")]))
            .expect("overlay")
            .expect("some");
        assert_eq!(overlay, json!({ "memory": { "enabled": false } }));
    }
}
