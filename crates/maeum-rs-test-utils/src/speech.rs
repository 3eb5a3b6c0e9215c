use async_trait::async_trait;
use maeum_rs_protocol::{
    EmotionAnalysis, EmotionClassifier, EmotionPrediction, SpeechError, SpeechSynthesizer,
    SpeechToText,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Canned speech collaborators. Records synthesis requests.
#[derive(Debug, Clone)]
pub struct StubSpeech {
    transcript: String,
    analysis: EmotionAnalysis,
    audio: Vec<u8>,
    fail_transcription: bool,
    pub synthesized: Arc<Mutex<Vec<(String, f32)>>>,
}

impl StubSpeech {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            analysis: EmotionAnalysis {
                top_label: "기쁨".to_string(),
                top_probability: 0.7,
                top_k: vec![
                    prediction("기쁨", 0.7),
                    prediction("당황", 0.2),
                    prediction("불안", 0.1),
                ],
            },
            audio: b"RIFF-stub-wav".to_vec(),
            fail_transcription: false,
            synthesized: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_emotion(mut self, label: &str, probability: f32) -> Self {
        self.analysis = EmotionAnalysis {
            top_label: label.to_string(),
            top_probability: probability,
            top_k: vec![prediction(label, probability)],
        };
        self
    }

    pub fn failing_transcription(mut self) -> Self {
        self.fail_transcription = true;
        self
    }
}

fn prediction(label: &str, probability: f32) -> EmotionPrediction {
    EmotionPrediction {
        label: label.to_string(),
        probability,
    }
}

#[async_trait]
impl SpeechToText for StubSpeech {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, SpeechError> {
        if self.fail_transcription {
            return Err(SpeechError::Unavailable("stub transcription down".to_string()));
        }
        if self.transcript.trim().is_empty() {
            return Err(SpeechError::EmptyTranscript);
        }
        Ok(self.transcript.clone())
    }
}

#[async_trait]
impl EmotionClassifier for StubSpeech {
    async fn predict(&self, _audio: &[u8], top_k: usize) -> Result<EmotionAnalysis, SpeechError> {
        let mut analysis = self.analysis.clone();
        analysis.top_k.truncate(top_k);
        Ok(analysis)
    }
}

#[async_trait]
impl SpeechSynthesizer for StubSpeech {
    async fn synthesize(&self, text: &str, speed: f32) -> Result<Vec<u8>, SpeechError> {
        self.synthesized.lock().push((text.to_string(), speed));
        Ok(self.audio.clone())
    }
}
