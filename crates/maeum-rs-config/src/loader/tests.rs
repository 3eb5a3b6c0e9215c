//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Options rooted in a temp project with no system/user layers or env.
fn isolated_options(root: &Path) -> (LayeredConfigOptions, PathBuf) {
    let project_root = root.join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    let mut options = LayeredConfigOptions::new(&cwd).with_env_vars(Vec::new());
    options.system_config_path = None;
    options.user_config_path = None;
    (options, project_root)
}

#[test]
fn parse_minimal_config() {
    let config = MaeumConfig::load_from_str("{}").expect("config");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.cors_origins.len(), 6);
    assert_eq!(config.memory.history_turns, 10);
    assert_eq!(config.memory.location.as_deref(), Some("us-central1"));
    assert!(!config.memory.enabled);
    assert!(config.memory.serialize_conversations);
    assert_eq!(config.generation.max_new_tokens, 1000);
    assert_eq!(config.generation.top_k, 50);
    assert_eq!(config.speech.emotion_top_k, 3);
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = MaeumConfig::load_from_str(r#"{ unexpected: true }"#).unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

#[test]
fn rejects_wrong_type_with_dotted_path() {
    let err = MaeumConfig::load_from_str(r#"{ memory: { history_turns: "ten" } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("memory.history_turns"), "{msg}");
}

#[test]
fn rejects_out_of_range_sampling() {
    let err = MaeumConfig::load_from_str(r#"{ generation: { top_p: 1.5 } }"#).unwrap_err();
    assert!(format!("{err}").contains("generation.top_p"));

    let err = MaeumConfig::load_from_str(r#"{ memory: { history_turns: 0 } }"#).unwrap_err();
    assert!(format!("{err}").contains("memory.history_turns"));
}

#[test]
fn rejects_port_outside_u16() {
    let err = MaeumConfig::load_from_str(r#"{ server: { port: 70000 } }"#).unwrap_err();
    assert!(format!("{err}").contains("server.port"));
}

#[test]
fn layered_config_prefers_repo_over_cwd() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (mut options, project_root) = isolated_options(root);

    let system_config = root.join("system.json5");
    write_json5(&system_config, "{ generation: { model: \"system\" } }");
    let user_config = root.join("user.json5");
    write_json5(&user_config, "{ generation: { model: \"user\" } }");
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ generation: { model: \"project\" } }",
    );
    write_json5(
        &options.cwd.join(DEFAULT_CONFIG_FILE),
        "{ generation: { model: \"cwd\" } }",
    );
    write_json5(
        &project_root
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE),
        "{ generation: { model: \"repo\" } }",
    );
    options.system_config_path = Some(system_config);
    options.user_config_path = Some(user_config);

    let layered = MaeumConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.generation.model, "repo");
    assert_eq!(layered.layers.len(), 5);
}

#[test]
fn runtime_layer_overrides_files_and_merges_siblings() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (options, project_root) = isolated_options(root);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ server: { port: 9000, host: \"127.0.0.1\" } }",
    );
    let runtime = root.join("runtime.json5");
    write_json5(&runtime, "{ server: { port: 9100 } }");

    let layered = MaeumConfig::load_layered_with_options(options.with_runtime_path(&runtime))
        .expect("layered");
    assert_eq!(layered.config.server.port, 9100);
    assert_eq!(layered.config.server.host, "127.0.0.1");
}

#[test]
fn environment_overrides_every_file_layer() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (options, project_root) = isolated_options(root);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ memory: { enabled: false, project_id: \"from-file\", data_store_id: \"store\" } }",
    );
    let options = options.with_env_vars(vec![
        ("GOOGLE_CLOUD_PROJECT".to_string(), "from-env".to_string()),
        ("MEMORY_BANK_ENABLED".to_string(), "true".to_string()),
    ]);

    let layered = MaeumConfig::load_layered_with_options(options).expect("layered");
    let memory = &layered.config.memory;
    assert!(memory.enabled);
    assert_eq!(memory.project_id.as_deref(), Some("from-env"));
    assert_eq!(memory.data_store_id.as_deref(), Some("store"));
    assert_eq!(
        layered.layers.last().map(|layer| layer.source),
        Some(ConfigLayerSource::Env)
    );
}

#[test]
fn invalid_layer_reports_its_origin() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (options, _) = isolated_options(root);
    write_json5(
        &options.cwd.join(DEFAULT_CONFIG_FILE),
        "{ speech: { tts_speed: \"fast\" } }",
    );

    let err = MaeumConfig::load_layered_with_options(options).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("), "{msg}");
    assert!(msg.contains("speech.tts_speed"), "{msg}");
}

#[test]
fn single_schema_applies_to_layers_and_final_config() {
    let err = MaeumConfig::load_from_str("{ memory: { bogus: 1 } }").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("config:memory.bogus"), "{msg}");

    let temp = TempDir::new().expect("tmp");
    let (options, _) = isolated_options(temp.path());
    write_json5(
        &options.cwd.join(DEFAULT_CONFIG_FILE),
        "{ memory: { bogus: 1 } }",
    );
    let err = MaeumConfig::load_layered_with_options(options).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("), "{msg}");
    assert!(msg.contains("memory.bogus"), "{msg}");
}
