//! Chat service flows with the transcript mirror and speech stubs.

use maeum_rs_config::GenerationConfig;
use maeum_rs_core::{
    ChatService, GeneratorInfo, LlmResponseGenerator, MaeumCoreError, PromptBuilder,
    SamplingParams, SpeechServices, SqliteTranscriptStore, TranscriptStore, TurnOrchestrator,
};
use maeum_rs_protocol::{Role, SpeechError};
use maeum_rs_test_utils::{FailingLLM, RecordingChatLLM, StubMemory, StubSpeech};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Harness {
    chat: ChatService,
    memory: StubMemory,
    transcripts: Arc<SqliteTranscriptStore>,
    llm: RecordingChatLLM,
}

fn harness(speech: Option<StubSpeech>) -> Harness {
    let memory = StubMemory::new();
    let llm = RecordingChatLLM::new("정말 기쁘셨겠어요");
    let info = GeneratorInfo {
        model: "test-model".to_string(),
        sampling: SamplingParams::from(&GenerationConfig::default()),
    };
    let generator = LlmResponseGenerator::new(Arc::new(llm.clone()), info).expect("generator");
    let orchestrator = Arc::new(TurnOrchestrator::new(
        Arc::new(memory.clone()),
        Arc::new(generator),
        PromptBuilder::new("persona"),
    ));
    let transcripts = Arc::new(SqliteTranscriptStore::open_in_memory().expect("transcripts"));
    let chat = ChatService::new(
        orchestrator,
        transcripts.clone(),
        speech.map(|speech| SpeechServices::shared(Arc::new(speech))),
    )
    .with_tts_speed(1.25);
    Harness {
        chat,
        memory,
        transcripts,
        llm,
    }
}

#[tokio::test]
async fn text_chat_generates_id_and_mirrors_exchange() {
    let harness = harness(None);
    let reply = harness
        .chat
        .chat_text("오늘 좋은 일이 있었어요", None)
        .await
        .expect("reply");
    assert_eq!(reply.response, "정말 기쁘셨겠어요");
    assert!(!reply.conversation_id.is_empty());

    let detail = harness
        .transcripts
        .get_conversation(&reply.conversation_id)
        .expect("get")
        .expect("mirrored");
    assert_eq!(detail.title.as_deref(), Some("오늘 좋은 일이 있었어요"));
    let roles: Vec<Role> = detail.messages.iter().map(|message| message.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
}

#[tokio::test]
async fn text_chat_keeps_supplied_conversation_id() {
    let harness = harness(None);
    let reply = harness.chat.chat_text("안녕", Some("c1")).await.expect("reply");
    assert_eq!(reply.conversation_id, "c1");
    assert_eq!(harness.memory.stored("c1").len(), 2);
}

#[tokio::test]
async fn voice_chat_annotates_prompt_and_transcript_with_emotion() {
    let harness = harness(Some(
        StubSpeech::new("시험에 붙었어요").with_emotion("기쁨", 0.9),
    ));
    let reply = harness
        .chat
        .chat_voice(b"wav-bytes", Some("c1"))
        .await
        .expect("reply");
    assert_eq!(reply.transcribed_text, "시험에 붙었어요");
    assert_eq!(reply.detected_emotion, "기쁨");
    assert_eq!(reply.llm_response, "정말 기쁘셨겠어요");
    assert_eq!(reply.emotion_top_k.len(), 1);

    let prompt = harness.llm.last_messages.lock().clone();
    assert_eq!(prompt[1].content, "[감지된 감정: 기쁨] 시험에 붙었어요");

    let messages = harness.transcripts.list_messages("c1", 100, 0).expect("messages");
    assert_eq!(messages[0].content, "시험에 붙었어요");
    assert_eq!(messages[0].emotion.as_deref(), Some("기쁨"));
    assert_eq!(messages[0].emotion_probability, Some(0.9));
    assert_eq!(messages[1].emotion, None);
}

#[tokio::test]
async fn voice_chat_without_speech_is_unavailable() {
    let harness = harness(None);
    let err = harness
        .chat
        .chat_voice(b"wav-bytes", None)
        .await
        .expect_err("unavailable");
    assert!(matches!(err, MaeumCoreError::SpeechUnavailable));
}

#[tokio::test]
async fn transcription_failure_skips_generation() {
    let harness = harness(Some(StubSpeech::new("무시됨").failing_transcription()));
    let err = harness
        .chat
        .chat_voice(b"wav-bytes", Some("c1"))
        .await
        .expect_err("stt down");
    assert!(matches!(err, MaeumCoreError::Speech(SpeechError::Unavailable(_))));
    assert_eq!(harness.llm.call_count(), 0);
    assert!(harness.transcripts.get_conversation("c1").expect("get").is_none());
}

#[tokio::test]
async fn synthesis_uses_configured_speed_and_rejects_blank_text() {
    let speech = StubSpeech::new("unused");
    let synthesized = speech.synthesized.clone();
    let harness = harness(Some(speech));

    let wav = harness.chat.synthesize("안녕하세요").await.expect("wav");
    assert!(wav.starts_with(b"RIFF"));
    assert_eq!(synthesized.lock().clone(), vec![("안녕하세요".to_string(), 1.25)]);

    let err = harness.chat.synthesize(" ").await.expect_err("blank");
    assert!(matches!(err, MaeumCoreError::InvalidRequest(_)));
}

#[tokio::test]
async fn generation_failure_leaves_transcript_untouched() {
    let memory = StubMemory::new();
    let info = GeneratorInfo {
        model: "test-model".to_string(),
        sampling: SamplingParams::from(&GenerationConfig::default()),
    };
    let generator =
        LlmResponseGenerator::new(Arc::new(FailingLLM::new("offline")), info).expect("generator");
    let orchestrator = Arc::new(TurnOrchestrator::new(
        Arc::new(memory),
        Arc::new(generator),
        PromptBuilder::new("persona"),
    ));
    let transcripts = Arc::new(SqliteTranscriptStore::open_in_memory().expect("transcripts"));
    let chat = ChatService::new(orchestrator, transcripts.clone(), None);

    let err = chat.chat_text("안녕", Some("c1")).await.expect_err("fails");
    assert!(matches!(err, MaeumCoreError::Generation(_)));
    assert_eq!(transcripts.stats().expect("stats").messages, 0);
}

#[tokio::test]
async fn health_reflects_speech_configuration() {
    let without = harness(None).chat.health();
    assert_eq!(without.status, "unhealthy");
    assert!(!without.models_loaded.stt);
    assert!(without.memory_bank_status.enabled);

    let with = harness(Some(StubSpeech::new("안녕"))).chat.health();
    assert_eq!(with.status, "healthy");
    assert_eq!(with.message, "All services running");
    assert_eq!(with.generator.model, "test-model");
}

#[tokio::test]
async fn clear_leaves_transcript_in_place() {
    let harness = harness(None);
    harness.chat.chat_text("안녕", Some("c1")).await.expect("reply");
    assert!(harness.chat.clear("c1").await);
    assert!(harness.memory.stored("c1").is_empty());
    assert_eq!(harness.transcripts.list_messages("c1", 100, 0).expect("messages").len(), 2);
}
