//! Test helpers shared across Maeum crates.

pub mod llm;
pub mod memory;
pub mod speech;

pub use llm::{FailingLLM, FixedChatResponse, FixedLLM, RecordingChatLLM};
pub use memory::{AddedTurn, StubMemory};
pub use speech::StubSpeech;
