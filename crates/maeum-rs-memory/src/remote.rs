//! Remote memory store backed by a conversational-search REST service.
//!
//! Conversations live at
//! `{base}/projects/{project}/locations/{location}/dataStores/{store}/conversations/{id}`.
//! Appends read the conversation, push one message, and write the full
//! message list back with `PATCH ?allowMissing=true`, which creates the
//! resource on first use. Appends to one conversation are serialized within
//! the process so concurrent commits do not overwrite each other.

use crate::locks::ConversationLocks;
use crate::model::{RemoteConversation, RemoteMessage};
use crate::store::MemoryStore;
use crate::{MemoryError, REMOTE_SERVICE_NAME};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use maeum_rs_protocol::{MemoryStatus, Role, Turn, annotate_emotion};
use reqwest::{StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;

/// Connection settings for [`RemoteMemoryStore`].
#[derive(Debug, Clone)]
pub struct RemoteMemorySettings {
    pub project_id: String,
    pub location: String,
    pub data_store_id: String,
    /// Overrides the base URL derived from `location`.
    pub endpoint: Option<String>,
    /// Bearer token attached to every request.
    pub access_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RemoteMemorySettings {
    /// REST base URL, e.g. `https://us-central1-discoveryengine.googleapis.com/v1`.
    pub fn base_url(&self) -> String {
        match self.endpoint.as_deref() {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None if self.location == "global" => {
                "https://discoveryengine.googleapis.com/v1".to_string()
            }
            None => format!("https://{}-discoveryengine.googleapis.com/v1", self.location),
        }
    }
}

/// Memory store persisting turns in a remote conversation resource.
#[derive(Debug, Clone)]
pub struct RemoteMemoryStore {
    client: reqwest::Client,
    base_url: Url,
    settings: RemoteMemorySettings,
    appends: Arc<ConversationLocks>,
}

impl RemoteMemoryStore {
    /// Build the store. Fails when a required identifier is blank, the base
    /// URL is unusable, or the HTTP client cannot be constructed.
    pub fn new(settings: RemoteMemorySettings) -> Result<Self, MemoryError> {
        for (name, value) in [
            ("project_id", &settings.project_id),
            ("location", &settings.location),
            ("data_store_id", &settings.data_store_id),
        ] {
            if value.trim().is_empty() {
                return Err(MemoryError::InvalidSettings(format!("{name} is empty")));
            }
        }
        let base_url = Url::parse(&settings.base_url())
            .map_err(|err| MemoryError::InvalidSettings(format!("base url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MemoryError::InvalidSettings(format!(
                "base url cannot hold paths: {base_url}"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        info!(
            "remote memory store ready (project_id={}, location={}, data_store_id={}, base_url={})",
            settings.project_id, settings.location, settings.data_store_id, base_url
        );
        Ok(Self {
            client,
            base_url,
            settings,
            appends: Arc::new(ConversationLocks::new()),
        })
    }

    /// Full resource name for a conversation.
    pub fn conversation_name(&self, conversation_id: &str) -> String {
        format!(
            "projects/{}/locations/{}/dataStores/{}/conversations/{}",
            self.settings.project_id,
            self.settings.location,
            self.settings.data_store_id,
            conversation_id
        )
    }

    /// Resource URL with each path segment percent-encoded.
    fn conversation_url(&self, conversation_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "projects",
                self.settings.project_id.as_str(),
                "locations",
                self.settings.location.as_str(),
                "dataStores",
                self.settings.data_store_id.as_str(),
                "conversations",
                conversation_id,
            ]);
        }
        url
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.settings.access_token.as_deref() {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }

    /// Fetch the conversation; `None` when it does not exist.
    pub async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<RemoteConversation>, MemoryError> {
        let url = self.conversation_url(conversation_id);
        let response = self.authorized(self.client.get(url)).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(remote_error(status, response).await);
        }
        let body = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }

    /// Replace the stored message list, creating the conversation if needed.
    async fn write_conversation(
        &self,
        conversation_id: &str,
        conversation: &RemoteConversation,
    ) -> Result<(), MemoryError> {
        let mut url = self.conversation_url(conversation_id);
        url.query_pairs_mut()
            .append_pair("updateMask", "messages")
            .append_pair("allowMissing", "true");
        let response = self
            .authorized(self.client.patch(url))
            .json(conversation)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MemoryError::NotFound(self.conversation_name(conversation_id)));
        }
        if !status.is_success() {
            return Err(remote_error(status, response).await);
        }
        Ok(())
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        message: &RemoteMessage,
    ) -> Result<(), MemoryError> {
        let mut conversation = self
            .get_conversation(conversation_id)
            .await?
            .unwrap_or_else(|| RemoteConversation {
                user_pseudo_id: Some(conversation_id.to_string()),
                ..RemoteConversation::default()
            });
        conversation.name = Some(self.conversation_name(conversation_id));
        conversation.messages.push(message.clone());
        self.write_conversation(conversation_id, &conversation).await
    }

    /// Delete the conversation; returns whether it existed.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<bool, MemoryError> {
        let url = self.conversation_url(conversation_id);
        let response = self.authorized(self.client.delete(url)).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(remote_error(status, response).await);
        }
        Ok(true)
    }
}

async fn remote_error(status: StatusCode, response: reqwest::Response) -> MemoryError {
    let body = response.text().await.unwrap_or_default();
    MemoryError::Remote {
        status: status.as_u16(),
        body: body.chars().take(512).collect(),
    }
}

#[async_trait]
impl MemoryStore for RemoteMemoryStore {
    async fn add_turn(
        &self,
        conversation_id: &str,
        text: &str,
        role: Role,
        emotion: Option<&str>,
    ) -> bool {
        let content = match role {
            Role::User => annotate_emotion(text, emotion),
            _ => text.to_string(),
        };
        let Some(message) = RemoteMessage::from_content(role, content, Utc::now()) else {
            warn!(
                "refusing to store non-conversational turn (conversation_id={}, role={})",
                conversation_id, role
            );
            return false;
        };

        let guard = self.appends.acquire(conversation_id).await;
        let mut result = self.append_message(conversation_id, &message).await;
        if let Err(MemoryError::NotFound(name)) = &result {
            debug!("conversation vanished during append; retrying (name={})", name);
            result = self.append_message(conversation_id, &message).await;
        }
        drop(guard);
        match result {
            Ok(()) => {
                debug!(
                    "turn stored (conversation_id={}, role={}, chars={})",
                    conversation_id,
                    role,
                    text.chars().count()
                );
                true
            }
            Err(err) => {
                warn!(
                    "failed to store turn (conversation_id={}, role={}, err={})",
                    conversation_id, role, err
                );
                false
            }
        }
    }

    async fn fetch_history(&self, conversation_id: &str, max_turns: usize) -> Vec<Turn> {
        match self.get_conversation(conversation_id).await {
            Ok(Some(conversation)) => {
                let turns = conversation.recent_turns(max_turns);
                debug!(
                    "history loaded (conversation_id={}, turns={})",
                    conversation_id,
                    turns.len()
                );
                turns
            }
            Ok(None) => {
                debug!("no remote conversation yet (conversation_id={})", conversation_id);
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "history fetch failed; continuing without history (conversation_id={}, err={})",
                    conversation_id, err
                );
                Vec::new()
            }
        }
    }

    async fn clear(&self, conversation_id: &str) -> bool {
        match self.delete_conversation(conversation_id).await {
            Ok(existed) => {
                info!(
                    "conversation cleared (conversation_id={}, existed={})",
                    conversation_id, existed
                );
                true
            }
            Err(err) => {
                warn!(
                    "failed to clear conversation (conversation_id={}, err={})",
                    conversation_id, err
                );
                false
            }
        }
    }

    fn status(&self) -> MemoryStatus {
        MemoryStatus {
            enabled: true,
            backend_available: true,
            service: REMOTE_SERVICE_NAME.to_string(),
            project_id: Some(self.settings.project_id.clone()),
            location: Some(self.settings.location.clone()),
            data_store_id: Some(self.settings.data_store_id.clone()),
            storage: "remote memory only (no local memory)".to_string(),
            disabled_reason: None,
        }
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(location: &str, endpoint: Option<&str>) -> RemoteMemorySettings {
        RemoteMemorySettings {
            project_id: "demo".to_string(),
            location: location.to_string(),
            data_store_id: "store".to_string(),
            endpoint: endpoint.map(str::to_string),
            access_token: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn base_url_follows_location() {
        assert_eq!(
            settings("us-central1", None).base_url(),
            "https://us-central1-discoveryengine.googleapis.com/v1"
        );
        assert_eq!(
            settings("global", None).base_url(),
            "https://discoveryengine.googleapis.com/v1"
        );
        assert_eq!(
            settings("global", Some("http://127.0.0.1:9000/v1/")).base_url(),
            "http://127.0.0.1:9000/v1"
        );
    }

    #[test]
    fn rejects_blank_identifiers() {
        let mut blank = settings("us-central1", None);
        blank.data_store_id = "  ".to_string();
        let err = RemoteMemoryStore::new(blank).unwrap_err();
        assert!(format!("{err}").contains("data_store_id"));
    }

    #[test]
    fn conversation_url_encodes_ids() {
        let store = RemoteMemoryStore::new(settings("global", Some("http://localhost:1/v1")))
            .expect("store");
        assert_eq!(
            store.conversation_url("a/b c").as_str(),
            "http://localhost:1/v1/projects/demo/locations/global/dataStores/store/conversations/a%2Fb%20c"
        );
        assert_eq!(
            store.conversation_name("c1"),
            "projects/demo/locations/global/dataStores/store/conversations/c1"
        );
    }
}
