//! Turn orchestration against stub memory and recording models.

use autoagents_llm::chat::{ChatMessage, ChatRole};
use maeum_rs_core::{
    GeneratorInfo, LlmResponseGenerator, MaeumCoreError, PromptBuilder, ResponseGenerator,
    SamplingParams, TurnOrchestrator,
};
use maeum_rs_config::GenerationConfig;
use maeum_rs_memory::DisabledMemoryStore;
use maeum_rs_protocol::{Role, Turn};
use maeum_rs_test_utils::{FailingLLM, RecordingChatLLM, StubMemory};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn generator(llm: impl autoagents_llm::LLMProvider + 'static) -> Arc<dyn ResponseGenerator> {
    let info = GeneratorInfo {
        model: "test-model".to_string(),
        sampling: SamplingParams::from(&GenerationConfig::default()),
    };
    Arc::new(LlmResponseGenerator::new(Arc::new(llm), info).expect("generator"))
}

fn orchestrator(memory: StubMemory, llm: RecordingChatLLM) -> TurnOrchestrator {
    TurnOrchestrator::new(
        Arc::new(memory),
        generator(llm),
        PromptBuilder::new("persona"),
    )
}

fn roles(messages: &[ChatMessage]) -> Vec<&'static str> {
    messages
        .iter()
        .map(|message| match &message.role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            _ => "other",
        })
        .collect()
}

fn contents(messages: &[ChatMessage]) -> Vec<String> {
    messages.iter().map(|message| message.content.clone()).collect()
}

#[tokio::test]
async fn second_turn_sees_first_turn_in_history() {
    let memory = StubMemory::new();
    let llm = RecordingChatLLM::new("unused").with_script(["정말 기쁘셨겠어요", "그랬군요 더 들려주세요"]);
    let orchestrator = orchestrator(memory.clone(), llm.clone());

    let first = orchestrator
        .respond("오늘 좋은 일이 있었어요", "c1", Some("기쁨"))
        .await
        .expect("first reply");
    assert_eq!(first, "정말 기쁘셨겠어요");

    orchestrator
        .respond("친구를 만났어요", "c1", None)
        .await
        .expect("second reply");

    let prompt = llm.last_messages.lock().clone();
    assert_eq!(roles(&prompt), vec!["system", "user", "assistant", "user"]);
    assert_eq!(
        contents(&prompt),
        vec![
            "persona".to_string(),
            "[감지된 감정: 기쁨] 오늘 좋은 일이 있었어요".to_string(),
            "정말 기쁘셨겠어요".to_string(),
            "친구를 만났어요".to_string(),
        ]
    );
    assert_eq!(memory.stored("c1").len(), 4);
}

#[tokio::test]
async fn history_is_bounded_by_configured_turns() {
    let history: Vec<Turn> = (0..20)
        .map(|idx| {
            if idx % 2 == 0 {
                Turn::user(format!("u{idx}"))
            } else {
                Turn::assistant(format!("a{idx}"))
            }
        })
        .collect();
    let memory = StubMemory::new().with_history("c1", history);
    let llm = RecordingChatLLM::new("네 그렇군요");
    let orchestrator = orchestrator(memory, llm.clone()).with_history_turns(4);

    orchestrator.respond("안녕", "c1", None).await.expect("reply");

    let prompt = llm.last_messages.lock().clone();
    assert_eq!(prompt.len(), 6);
    assert_eq!(prompt[1].content, "u16");
    assert_eq!(prompt[4].content, "a19");
}

#[tokio::test]
async fn failed_user_commit_still_commits_reply() {
    let memory = StubMemory::new();
    memory.fail_role(Role::User);
    let llm = RecordingChatLLM::new("많이 속상하셨겠어요");
    let orchestrator = orchestrator(memory.clone(), llm);

    let reply = orchestrator
        .respond("시험에 떨어졌어요", "c1", Some("슬픔"))
        .await
        .expect("reply");
    assert_eq!(reply, "많이 속상하셨겠어요");

    let added = memory.added();
    assert_eq!(added.len(), 2);
    assert_eq!((added[0].role, added[0].stored), (Role::User, false));
    assert_eq!(added[0].emotion.as_deref(), Some("슬픔"));
    assert_eq!((added[1].role, added[1].stored), (Role::Assistant, true));
    assert_eq!(added[1].content, "많이 속상하셨겠어요");
}

#[tokio::test]
async fn failed_reply_commit_keeps_reply() {
    let memory = StubMemory::new();
    memory.fail_role(Role::Assistant);
    let orchestrator = orchestrator(memory.clone(), RecordingChatLLM::new("그랬군요 힘드셨겠어요"));

    let reply = orchestrator.respond("피곤해요", "c1", None).await.expect("reply");
    assert_eq!(reply, "그랬군요 힘드셨겠어요");
    let stored = memory.stored("c1");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].role, Role::User);
}

#[tokio::test]
async fn generation_failure_is_fatal_and_commits_nothing() {
    let memory = StubMemory::new();
    let orchestrator = TurnOrchestrator::new(
        Arc::new(memory.clone()),
        generator(FailingLLM::new("model offline")),
        PromptBuilder::new("persona"),
    );

    let err = orchestrator
        .respond("안녕하세요", "c1", None)
        .await
        .expect_err("generation fails");
    assert!(matches!(err, MaeumCoreError::Generation(_)));
    assert_eq!(memory.fetch_count(), 1);
    assert!(memory.added().is_empty());
}

#[tokio::test]
async fn disabled_memory_is_never_consulted() {
    let memory = StubMemory::disabled();
    let llm = RecordingChatLLM::new("반가워요 오늘은 어떠셨어요");
    let orchestrator = orchestrator(memory.clone(), llm.clone());

    orchestrator.respond("안녕", "c1", None).await.expect("reply");
    orchestrator.respond("또 왔어요", "c1", None).await.expect("reply");

    assert_eq!(memory.fetch_count(), 0);
    assert!(memory.added().is_empty());
    assert_eq!(llm.last_messages.lock().len(), 2);
    assert!(orchestrator.history("c1").await.is_empty());
}

#[tokio::test]
async fn disabled_store_variant_degrades_to_single_turn_prompts() {
    let llm = RecordingChatLLM::new("괜찮아요 천천히 말해요");
    let orchestrator = TurnOrchestrator::new(
        Arc::new(DisabledMemoryStore::default()),
        generator(llm.clone()),
        PromptBuilder::new("persona"),
    );

    orchestrator.respond("안녕", "c1", None).await.expect("reply");
    assert_eq!(roles(&llm.last_messages.lock()), vec!["system", "user"]);
    assert!(!orchestrator.clear("c1").await);
    assert!(!orchestrator.memory_status().enabled);
}

#[tokio::test]
async fn blank_message_is_rejected_before_any_call() {
    let memory = StubMemory::new();
    let llm = RecordingChatLLM::new("unused");
    let orchestrator = orchestrator(memory.clone(), llm.clone());

    let err = orchestrator.respond("   ", "c1", None).await.expect_err("rejected");
    assert!(matches!(err, MaeumCoreError::InvalidRequest(_)));
    assert_eq!(memory.fetch_count(), 0);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn blank_emotion_is_treated_as_absent() {
    let memory = StubMemory::new();
    let llm = RecordingChatLLM::new("그렇군요 이야기해줘서 고마워요");
    let orchestrator = orchestrator(memory.clone(), llm.clone());

    orchestrator.respond("그냥 그래요", "c1", Some(" ")).await.expect("reply");
    assert_eq!(llm.last_messages.lock()[1].content, "그냥 그래요");
    assert_eq!(memory.added()[0].emotion, None);
}

#[tokio::test]
async fn clear_drops_history() {
    let memory = StubMemory::new();
    let orchestrator = orchestrator(memory.clone(), RecordingChatLLM::new("좋은 하루 보내세요"));
    orchestrator.respond("안녕", "c1", None).await.expect("reply");
    assert_eq!(orchestrator.history("c1").await.len(), 2);

    assert!(orchestrator.clear("c1").await);
    assert!(orchestrator.history("c1").await.is_empty());
}

#[tokio::test]
async fn serialized_conversations_observe_each_other() {
    let memory = StubMemory::new();
    let llm = RecordingChatLLM::new("천천히 이야기해 주세요").with_delay(Duration::from_millis(50));
    let orchestrator = Arc::new(orchestrator(memory.clone(), llm.clone()).with_conversation_locks());

    let first = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.respond("첫 번째", "c1", None).await })
    };
    let second = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.respond("두 번째", "c1", None).await })
    };
    first.await.expect("join").expect("first");
    second.await.expect("join").expect("second");

    let calls = llm.calls.lock().clone();
    let prompt_sizes: Vec<usize> = calls.iter().map(Vec::len).collect();
    assert_eq!(prompt_sizes, vec![2, 4]);
    let stored: Vec<Role> = memory.stored("c1").iter().map(|turn| turn.role).collect();
    assert_eq!(
        stored,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}
