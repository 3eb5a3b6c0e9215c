//! Configuration schema for Maeum.

use serde::{Deserialize, Serialize};

/// Root config for the Maeum backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MaeumConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub transcript: TranscriptConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl MaeumConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> MaeumConfigBuilder {
        MaeumConfigBuilder::new()
    }
}

/// Builder for assembling a `MaeumConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct MaeumConfigBuilder {
    config: MaeumConfig,
}

impl MaeumConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: MaeumConfig::default(),
        }
    }

    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    pub fn persona(mut self, persona: PersonaConfig) -> Self {
        self.config.persona = persona;
        self
    }

    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    pub fn transcript(mut self, transcript: TranscriptConfig) -> Self {
        self.config.transcript = transcript;
        self
    }

    pub fn speech(mut self, speech: SpeechConfig) -> Self {
        self.config.speech = speech;
        self
    }

    /// Finalize and return the built `MaeumConfig`.
    pub fn build(self) -> MaeumConfig {
        self.config
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Browser origins allowed by CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Largest decoded audio payload accepted by the voice route.
    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            max_audio_bytes: default_max_audio_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    ["localhost", "127.0.0.1"]
        .iter()
        .flat_map(|host| {
            [3000, 5173, 8081]
                .iter()
                .map(move |port| format!("http://{host}:{port}"))
        })
        .collect()
}

/// 25 MiB.
fn default_max_audio_bytes() -> usize {
    25 * 1024 * 1024
}

/// Persona instructions sent as the system turn.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PersonaConfig {
    /// Replaces the built-in persona when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Extra instructions appended after the persona.
    #[serde(default)]
    pub append_system_prompt: Option<String>,
}

/// Response generation settings for the OpenAI-compatible model server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    #[serde(default = "default_generation_api_key")]
    pub api_key: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    /// Enforced by the serving side; reported for observability.
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,
    /// Enforced by the serving side; reported for observability.
    #[serde(default = "default_no_repeat_ngram_size")]
    pub no_repeat_ngram_size: u32,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            api_key: default_generation_api_key(),
            model: default_generation_model(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            repetition_penalty: default_repetition_penalty(),
            no_repeat_ngram_size: default_no_repeat_ngram_size(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_generation_base_url() -> String {
    "http://127.0.0.1:8001/v1".to_string()
}

fn default_generation_api_key() -> String {
    "EMPTY".to_string()
}

fn default_generation_model() -> String {
    "finetuned-model".to_string()
}

fn default_max_new_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_top_k() -> u32 {
    50
}

fn default_repetition_penalty() -> f32 {
    1.2
}

fn default_no_repeat_ngram_size() -> u32 {
    3
}

fn default_generation_timeout_secs() -> u64 {
    120
}

/// Remote conversational memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_memory_location")]
    pub location: Option<String>,
    #[serde(default)]
    pub data_store_id: Option<String>,
    /// Overrides the REST base URL derived from `location`.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Most recent turns included in each prompt.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
    #[serde(default = "default_memory_timeout_secs")]
    pub timeout_secs: u64,
    /// Serialize whole turns that target the same conversation. When off,
    /// concurrent turns may read stale history and their commits may
    /// interleave; each remote append is still atomic within the process.
    #[serde(default = "default_serialize_conversations")]
    pub serialize_conversations: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_id: None,
            location: default_memory_location(),
            data_store_id: None,
            endpoint: None,
            access_token: None,
            history_turns: default_history_turns(),
            timeout_secs: default_memory_timeout_secs(),
            serialize_conversations: default_serialize_conversations(),
        }
    }
}

fn default_memory_location() -> Option<String> {
    Some("us-central1".to_string())
}

fn default_history_turns() -> usize {
    10
}

fn default_memory_timeout_secs() -> u64 {
    15
}

fn default_serialize_conversations() -> bool {
    true
}

/// Local transcript mirror settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TranscriptConfig {
    /// SQLite database file; defaults to `~/.maeum/conversations.db`.
    #[serde(default)]
    pub path: Option<String>,
}

/// Speech inference sidecar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Base URL of the sidecar; voice and TTS routes are off when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_emotion_top_k")]
    pub emotion_top_k: usize,
    #[serde(default = "default_tts_speed")]
    pub tts_speed: f32,
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            emotion_top_k: default_emotion_top_k(),
            tts_speed: default_tts_speed(),
            timeout_secs: default_speech_timeout_secs(),
        }
    }
}

fn default_emotion_top_k() -> usize {
    3
}

fn default_tts_speed() -> f32 {
    1.0
}

fn default_speech_timeout_secs() -> u64 {
    60
}
