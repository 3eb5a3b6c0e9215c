//! HTTP client for the speech inference sidecar.

use crate::error::MaeumCoreError;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::debug;
use maeum_rs_config::SpeechConfig;
use maeum_rs_protocol::{
    EmotionAnalysis, EmotionClassifier, EmotionPrediction, SpeechError, SpeechSynthesizer,
    SpeechToText,
};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct TranscribeRequest<'a> {
    audio: &'a str,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    text: String,
}

#[derive(Serialize)]
struct EmotionRequest<'a> {
    audio: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct EmotionResponse {
    top_emotion: String,
    top_probability: f32,
    #[serde(default)]
    top_predictions: Vec<EmotionPrediction>,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    speed: f32,
}

/// Speech-to-text, emotion classification and synthesis over one sidecar.
#[derive(Debug, Clone)]
pub struct SpeechClient {
    client: Client,
    endpoint: Url,
}

impl SpeechClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, MaeumCoreError> {
        let mut endpoint = Url::parse(endpoint)
            .map_err(|err| MaeumCoreError::Setup(format!("speech endpoint {endpoint}: {err}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(MaeumCoreError::Setup(format!(
                "speech endpoint cannot hold paths: {endpoint}"
            )));
        }
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| MaeumCoreError::Setup(format!("speech http client: {err}")))?;
        Ok(Self { client, endpoint })
    }

    /// `None` when no endpoint is configured.
    pub fn from_config(config: &SpeechConfig) -> Result<Option<Self>, MaeumCoreError> {
        match config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
        {
            Some(endpoint) => {
                Self::new(endpoint, Duration::from_secs(config.timeout_secs)).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        route: &str,
        body: &T,
    ) -> Result<Response, SpeechError> {
        let url = self
            .endpoint
            .join(route)
            .map_err(|err| SpeechError::Failed(format!("invalid route {route}: {err}")))?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| SpeechError::Unavailable(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SpeechError::Failed(format!("{route} returned {status}: {body}")))
    }
}

#[async_trait]
impl SpeechToText for SpeechClient {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SpeechError> {
        let encoded = BASE64.encode(audio);
        let response: TranscribeResponse = self
            .post("transcribe", &TranscribeRequest { audio: &encoded })
            .await?
            .json()
            .await
            .map_err(|err| SpeechError::InvalidResponse(err.to_string()))?;
        let text = response.text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyTranscript);
        }
        debug!(
            "audio transcribed (audio_bytes={}, chars={})",
            audio.len(),
            text.chars().count()
        );
        Ok(text.to_string())
    }
}

#[async_trait]
impl EmotionClassifier for SpeechClient {
    async fn predict(&self, audio: &[u8], top_k: usize) -> Result<EmotionAnalysis, SpeechError> {
        let encoded = BASE64.encode(audio);
        let response: EmotionResponse = self
            .post(
                "emotion",
                &EmotionRequest {
                    audio: &encoded,
                    top_k,
                },
            )
            .await?
            .json()
            .await
            .map_err(|err| SpeechError::InvalidResponse(err.to_string()))?;
        if response.top_emotion.trim().is_empty() {
            return Err(SpeechError::InvalidResponse(
                "emotion label is empty".to_string(),
            ));
        }
        let mut predictions = response.top_predictions;
        predictions.truncate(top_k);
        debug!(
            "emotion predicted (label={}, probability={:.3})",
            response.top_emotion, response.top_probability
        );
        Ok(EmotionAnalysis {
            top_label: response.top_emotion,
            top_probability: response.top_probability,
            top_k: predictions,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechClient {
    async fn synthesize(&self, text: &str, speed: f32) -> Result<Vec<u8>, SpeechError> {
        let bytes = self
            .post("synthesize", &SynthesizeRequest { text, speed })
            .await?
            .bytes()
            .await
            .map_err(|err| SpeechError::InvalidResponse(err.to_string()))?;
        if bytes.is_empty() {
            return Err(SpeechError::InvalidResponse(
                "synthesized audio is empty".to_string(),
            ));
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::SpeechClient;
    use maeum_rs_config::SpeechConfig;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn endpoint_gains_trailing_slash_so_routes_nest() {
        let client =
            SpeechClient::new("http://127.0.0.1:9000/speech", Duration::from_secs(1)).expect("client");
        assert_eq!(client.endpoint().as_str(), "http://127.0.0.1:9000/speech/");
        assert_eq!(
            client.endpoint().join("transcribe").expect("join").as_str(),
            "http://127.0.0.1:9000/speech/transcribe"
        );
    }

    #[test]
    fn missing_endpoint_yields_no_client() {
        assert!(SpeechClient::from_config(&SpeechConfig::default()).expect("config").is_none());
        let blank = SpeechConfig {
            endpoint: Some("  ".to_string()),
            ..SpeechConfig::default()
        };
        assert!(SpeechClient::from_config(&blank).expect("config").is_none());
    }

    #[test]
    fn invalid_endpoint_is_a_setup_error() {
        assert!(SpeechClient::new("not a url", Duration::from_secs(1)).is_err());
    }
}
