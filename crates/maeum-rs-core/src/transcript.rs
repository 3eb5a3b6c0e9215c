//! Local conversation transcript backed by SQLite.
//!
//! The transcript mirrors every exchange for listing and history display. It
//! is never read when building prompts; remote memory stays the source of
//! record for conversation context.

use chrono::{DateTime, Utc};
use directories::BaseDirs;
use log::{debug, info};
use maeum_rs_protocol::Role;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Title given to conversations before their first user message.
pub const DEFAULT_TITLE: &str = "새 대화";
const TITLE_PREVIEW_CHARS: usize = 50;
const LAST_MESSAGE_CHARS: usize = 100;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    user_id TEXT NULL,
    title TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_conversations_user_id ON conversations(user_id);
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    emotion TEXT NULL,
    emotion_probability REAL NULL,
    audio_path TEXT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_conversation_id ON messages(conversation_id);
";

/// Errors returned by the transcript store.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid transcript record: {0}")]
    InvalidRecord(String),
}

/// Stored message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub id: i64,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub emotion: Option<String>,
    pub emotion_probability: Option<f32>,
    pub created_at: DateTime<Utc>,
}

/// Message to append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub emotion: Option<String>,
    pub emotion_probability: Option<f32>,
    pub audio_path: Option<String>,
}

impl NewMessage {
    pub fn new(conversation_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            role,
            content: content.into(),
            emotion: None,
            emotion_probability: None,
            audio_path: None,
        }
    }

    pub fn with_emotion(mut self, emotion: Option<String>, probability: Option<f32>) -> Self {
        self.emotion = emotion;
        self.emotion_probability = probability;
        self
    }
}

/// Conversation row used for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u64,
    pub last_message: Option<String>,
}

/// Conversation with every message, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub id: String,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<TranscriptMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Exists,
}

impl CreateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreateOutcome::Created => "created",
            CreateOutcome::Exists => "exists",
        }
    }
}

/// Row counts reported by health checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptStats {
    pub location: String,
    pub conversations: u64,
    pub messages: u64,
}

/// Local transcript of conversations and messages.
pub trait TranscriptStore: Send + Sync {
    /// Append a user message and the assistant reply in one transaction,
    /// creating the conversation when absent.
    fn record_exchange(&self, user: &NewMessage, reply: &str) -> Result<(), TranscriptError>;
    /// Conversations by most recent activity.
    fn list_conversations(
        &self,
        user_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ConversationSummary>, TranscriptError>;
    fn get_conversation(&self, id: &str) -> Result<Option<ConversationDetail>, TranscriptError>;
    fn create_conversation(
        &self,
        id: &str,
        user_id: Option<&str>,
        title: Option<&str>,
    ) -> Result<CreateOutcome, TranscriptError>;
    /// Append one message and return its id.
    fn add_message(&self, message: &NewMessage) -> Result<i64, TranscriptError>;
    /// Delete a conversation and its messages. False when it did not exist.
    fn delete_conversation(&self, id: &str) -> Result<bool, TranscriptError>;
    fn list_messages(
        &self,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TranscriptMessage>, TranscriptError>;
    fn stats(&self) -> Result<TranscriptStats, TranscriptError>;
}

/// SQLite transcript store. One connection guarded by a mutex.
pub struct SqliteTranscriptStore {
    conn: Mutex<Connection>,
    location: String,
}

impl SqliteTranscriptStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TranscriptError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            location: path.display().to_string(),
        };
        store.migrate()?;
        info!("transcript store ready (path={})", path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, TranscriptError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            location: ":memory:".to_string(),
        };
        store.migrate()?;
        Ok(store)
    }

    /// `~/.maeum/conversations.db`, when a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.home_dir().join(".maeum").join("conversations.db"))
    }

    fn migrate(&self) -> Result<(), TranscriptError> {
        self.conn.lock().execute_batch(SCHEMA)?;
        Ok(())
    }
}

impl TranscriptStore for SqliteTranscriptStore {
    fn record_exchange(&self, user: &NewMessage, reply: &str) -> Result<(), TranscriptError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        append_message(&tx, user)?;
        append_message(
            &tx,
            &NewMessage::new(user.conversation_id.clone(), Role::Assistant, reply),
        )?;
        tx.commit()?;
        debug!(
            "exchange recorded (conversation_id={})",
            user.conversation_id
        );
        Ok(())
    }

    fn list_conversations(
        &self,
        user_id: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ConversationSummary>, TranscriptError> {
        let user_id = user_id.filter(|value| !value.is_empty());
        let conn = self.conn.lock();
        let mut statement = conn.prepare(
            "
            SELECT c.id, c.user_id, c.title, c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id),
                   (SELECT m.content FROM messages m WHERE m.conversation_id = c.id
                    ORDER BY m.created_at DESC, m.id DESC LIMIT 1)
            FROM conversations c
            WHERE ?1 IS NULL OR c.user_id = ?1
            ORDER BY c.updated_at DESC, c.rowid DESC
            LIMIT ?2 OFFSET ?3
            ",
        )?;
        let rows = statement.query_map(
            params![user_id, to_sql_count(limit), to_sql_count(offset)],
            |row| {
                let last_message: Option<String> = row.get(6)?;
                Ok(ConversationSummary {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                    message_count: row.get::<_, i64>(5)?.max(0) as u64,
                    last_message: last_message
                        .map(|content| content.chars().take(LAST_MESSAGE_CHARS).collect()),
                })
            },
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_conversation(&self, id: &str) -> Result<Option<ConversationDetail>, TranscriptError> {
        let header = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT id, user_id, title, created_at, updated_at FROM conversations WHERE id = ?1",
                [id],
                |row| {
                    Ok(ConversationDetail {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        title: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                        messages: Vec::new(),
                    })
                },
            )
            .optional()?
        };
        let Some(mut detail) = header else {
            return Ok(None);
        };
        detail.messages = self.list_messages(id, usize::MAX, 0)?;
        Ok(Some(detail))
    }

    fn create_conversation(
        &self,
        id: &str,
        user_id: Option<&str>,
        title: Option<&str>,
    ) -> Result<CreateOutcome, TranscriptError> {
        let title = title.filter(|value| !value.is_empty()).unwrap_or(DEFAULT_TITLE);
        let now = Utc::now();
        let inserted = self.conn.lock().execute(
            "INSERT OR IGNORE INTO conversations (id, user_id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![id, user_id, title, now],
        )?;
        Ok(if inserted > 0 {
            CreateOutcome::Created
        } else {
            CreateOutcome::Exists
        })
    }

    fn add_message(&self, message: &NewMessage) -> Result<i64, TranscriptError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let id = append_message(&tx, message)?;
        tx.commit()?;
        Ok(id)
    }

    fn delete_conversation(&self, id: &str) -> Result<bool, TranscriptError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let messages = tx.execute("DELETE FROM messages WHERE conversation_id = ?1", [id])?;
        let conversations = tx.execute("DELETE FROM conversations WHERE id = ?1", [id])?;
        tx.commit()?;
        if conversations > 0 {
            info!(
                "transcript conversation deleted (conversation_id={}, messages={})",
                id, messages
            );
        }
        Ok(conversations > 0)
    }

    fn list_messages(
        &self,
        id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TranscriptMessage>, TranscriptError> {
        let conn = self.conn.lock();
        let mut statement = conn.prepare(
            "
            SELECT id, conversation_id, role, content, emotion, emotion_probability, created_at
            FROM messages
            WHERE conversation_id = ?1
            ORDER BY created_at ASC, id ASC
            LIMIT ?2 OFFSET ?3
            ",
        )?;
        let rows = statement.query_map(
            params![id, to_sql_count(limit), to_sql_count(offset)],
            message_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn stats(&self) -> Result<TranscriptStats, TranscriptError> {
        let conn = self.conn.lock();
        let conversations: i64 =
            conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?;
        let messages: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(TranscriptStats {
            location: self.location.clone(),
            conversations: conversations.max(0) as u64,
            messages: messages.max(0) as u64,
        })
    }
}

fn append_message(tx: &Transaction<'_>, message: &NewMessage) -> Result<i64, TranscriptError> {
    if message.conversation_id.is_empty() {
        return Err(TranscriptError::InvalidRecord(
            "conversation_id must not be empty".to_string(),
        ));
    }
    let now = Utc::now();
    tx.execute(
        "INSERT OR IGNORE INTO conversations (id, user_id, title, created_at, updated_at)
         VALUES (?1, NULL, ?2, ?3, ?3)",
        params![message.conversation_id, DEFAULT_TITLE, now],
    )?;
    if message.role == Role::User {
        tx.execute(
            "UPDATE conversations SET title = ?2
             WHERE id = ?1 AND (title IS NULL OR title = '' OR title = ?3)",
            params![
                message.conversation_id,
                title_preview(&message.content),
                DEFAULT_TITLE
            ],
        )?;
    }
    tx.execute(
        "UPDATE conversations SET updated_at = ?2 WHERE id = ?1",
        params![message.conversation_id, now],
    )?;
    tx.execute(
        "INSERT INTO messages
            (conversation_id, role, content, emotion, emotion_probability, audio_path, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            message.conversation_id,
            message.role.as_str(),
            message.content,
            message.emotion,
            message.emotion_probability.map(f64::from),
            message.audio_path,
            now
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<TranscriptMessage> {
    let role: String = row.get(2)?;
    let role = Role::parse(&role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::new(TranscriptError::InvalidRecord(format!("unknown role {role}"))),
        )
    })?;
    let probability: Option<f64> = row.get(5)?;
    Ok(TranscriptMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        role,
        content: row.get(3)?,
        emotion: row.get(4)?,
        emotion_probability: probability.map(|value| value as f32),
        created_at: row.get(6)?,
    })
}

/// First 50 characters, with an ellipsis when the content was longer.
fn title_preview(content: &str) -> String {
    let mut title: String = content.chars().take(TITLE_PREVIEW_CHARS).collect();
    if content.chars().count() > TITLE_PREVIEW_CHARS {
        title.push_str("...");
    }
    title
}

fn to_sql_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
