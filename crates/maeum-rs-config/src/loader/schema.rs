//! Schema validation helpers for Maeum JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(
    value: &Value,
    layer: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    let allowed = [
        "$schema",
        "server",
        "persona",
        "generation",
        "memory",
        "transcript",
        "speech",
    ];
    ensure_allowed_keys(map, &allowed, layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("server") {
        validate_server(value, layer, "server")?;
    }
    if let Some(value) = map.get("persona") {
        validate_persona(value, layer, "persona")?;
    }
    if let Some(value) = map.get("generation") {
        validate_generation(value, layer, "generation")?;
    }
    if let Some(value) = map.get("memory") {
        validate_memory(value, layer, "memory")?;
    }
    if let Some(value) = map.get("transcript") {
        validate_transcript(value, layer, "transcript")?;
    }
    if let Some(value) = map.get("speech") {
        validate_speech(value, layer, "speech")?;
    }
    Ok(())
}

/// Validate the "server" block.
fn validate_server(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["host", "port", "cors_origins", "max_audio_bytes"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("host") {
        expect_string(value, layer, &join_path(path, "host"))?;
    }
    if let Some(value) = map.get("port") {
        let port_path = join_path(path, "port");
        expect_u64(value, layer, &port_path)?;
        if value.as_u64().is_none_or(|port| port > u64::from(u16::MAX)) {
            return Err(invalid_field(layer, &port_path, "expected port number"));
        }
    }
    if let Some(value) = map.get("cors_origins") {
        validate_string_array(value, layer, &join_path(path, "cors_origins"))?;
    }
    if let Some(value) = map.get("max_audio_bytes") {
        expect_u64(value, layer, &join_path(path, "max_audio_bytes"))?;
    }
    Ok(())
}

/// Validate the "persona" block.
fn validate_persona(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["system_prompt", "append_system_prompt"], layer, path)?;

    for key in ["system_prompt", "append_system_prompt"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "generation" block.
fn validate_generation(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    let strings = ["base_url", "api_key", "model"];
    let integers = ["max_new_tokens", "top_k", "no_repeat_ngram_size", "timeout_secs"];
    let numbers = ["temperature", "top_p", "repetition_penalty"];
    let allowed: Vec<&str> = strings
        .iter()
        .chain(integers.iter())
        .chain(numbers.iter())
        .copied()
        .collect();
    ensure_allowed_keys(map, &allowed, layer, path)?;

    for key in strings {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    for key in integers {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    for key in numbers {
        if let Some(value) = map.get(key) {
            expect_f64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "memory" block.
fn validate_memory(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "enabled",
            "project_id",
            "location",
            "data_store_id",
            "endpoint",
            "access_token",
            "history_turns",
            "timeout_secs",
            "serialize_conversations",
        ],
        layer,
        path,
    )?;

    for key in ["enabled", "serialize_conversations"] {
        if let Some(value) = map.get(key) {
            expect_bool(value, layer, &join_path(path, key))?;
        }
    }
    for key in [
        "project_id",
        "location",
        "data_store_id",
        "endpoint",
        "access_token",
    ] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    for key in ["history_turns", "timeout_secs"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "transcript" block.
fn validate_transcript(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["path"], layer, path)?;

    if let Some(value) = map.get("path") {
        expect_string(value, layer, &join_path(path, "path"))?;
    }
    Ok(())
}

/// Validate the "speech" block.
fn validate_speech(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["endpoint", "emotion_top_k", "tts_speed", "timeout_secs"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("endpoint") {
        expect_string(value, layer, &join_path(path, "endpoint"))?;
    }
    for key in ["emotion_top_k", "timeout_secs"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("tts_speed") {
        expect_f64(value, layer, &join_path(path, "tts_speed"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Non-negative integers only.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected number"))
    }
}

/// Validate that a value is an array of strings.
fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Value::Array(arr) = value else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    for (idx, entry) in arr.iter().enumerate() {
        if !entry.is_string() {
            return Err(invalid_field(
                layer,
                &format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
