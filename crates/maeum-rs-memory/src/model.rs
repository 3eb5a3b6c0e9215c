//! Wire records for the remote conversation resource.
//!
//! A conversation holds an ordered list of messages. User turns carry
//! `userInput.input`, assistant turns carry `reply.summary.summaryText`.

use chrono::{DateTime, Utc};
use maeum_rs_protocol::{Role, Turn, parse_emotion_annotation};
use serde::{Deserialize, Serialize};

/// Remote conversation resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConversation {
    /// Full resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Pseudonymous end-user id, set to the conversation id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_pseudo_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<RemoteMessage>,
}

/// One stored turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_input: Option<TextInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<Reply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextInput {
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(default)]
    pub summary_text: String,
}

impl RemoteMessage {
    /// Build a message for a user or assistant turn. System turns are not
    /// stored remotely and yield `None`.
    pub fn from_content(role: Role, content: String, created_at: DateTime<Utc>) -> Option<Self> {
        let message = match role {
            Role::User => Self {
                user_input: Some(TextInput { input: content }),
                ..Self::default()
            },
            Role::Assistant => Self {
                reply: Some(Reply {
                    summary: Some(Summary {
                        summary_text: content,
                    }),
                }),
                ..Self::default()
            },
            Role::System => return None,
        };
        Some(Self {
            create_time: Some(created_at),
            ..message
        })
    }

    /// Convert to a turn. Content is kept verbatim, including any emotion
    /// annotation; the label is also lifted into `Turn::emotion`. A message
    /// without `createTime` is stamped with `fallback_time`. Messages without
    /// text yield `None`.
    pub fn to_turn(&self, fallback_time: DateTime<Utc>) -> Option<Turn> {
        let (role, content) = match (&self.user_input, &self.reply) {
            (Some(input), _) => (Role::User, input.input.as_str()),
            (None, Some(reply)) => (Role::Assistant, reply.summary.as_ref()?.summary_text.as_str()),
            (None, None) => return None,
        };
        if content.trim().is_empty() {
            return None;
        }
        let emotion = match role {
            Role::User => parse_emotion_annotation(content).map(str::to_string),
            _ => None,
        };
        let timestamp = self.create_time.unwrap_or(fallback_time);
        Some(
            Turn::new(role, content)
                .with_emotion(emotion)
                .at(timestamp),
        )
    }
}

impl RemoteConversation {
    /// Most recent `max_turns` turns, oldest first. Ordering is by
    /// `createTime` then stored position. A message without a time inherits
    /// the time of the message stored before it, so it stays in place.
    pub fn recent_turns(&self, max_turns: usize) -> Vec<Turn> {
        let mut previous = DateTime::<Utc>::MIN_UTC;
        let mut turns: Vec<(DateTime<Utc>, usize, Turn)> = Vec::new();
        for (idx, message) in self.messages.iter().enumerate() {
            let time = message.create_time.unwrap_or(previous);
            previous = time;
            if let Some(turn) = message.to_turn(time) {
                turns.push((time, idx, turn));
            }
        }
        turns.sort_by_key(|(time, idx, _)| (*time, *idx));
        let mut turns: Vec<Turn> = turns.into_iter().map(|(_, _, turn)| turn).collect();
        let skip = turns.len().saturating_sub(max_turns);
        turns.split_off(skip)
    }
}
