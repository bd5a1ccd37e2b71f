//! Page inbox (`/api/Facebook/messaging`).

use std::sync::Arc;

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::segment;
use crate::error::PagedashError;
use crate::http::ApiRequest;
use crate::models::Envelope;
use crate::pipeline::ApiClient;

const MESSAGING_PATH: &str = "/api/Facebook/messaging";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: i64,
    pub facebook_page_id: String,
    pub conversation_id: String,
    pub participant_id: String,
    #[serde(default)]
    pub participant_name: Option<String>,
    #[serde(default)]
    pub participant_picture_url: Option<String>,
    #[serde(default, with = "super::timestamp::option")]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub last_message_preview: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
}

/// One page of conversations. Pass `next_cursor` back to continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    pub conversations: Vec<Conversation>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub message_id: String,
    pub from_id: String,
    pub to_id: String,
    pub message: String,
    #[serde(with = "super::timestamp")]
    pub created_time: DateTime<Utc>,
    pub is_from_page: bool,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub is_read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingSync {
    pub conversations_synced: u32,
    pub messages_synced: u32,
    pub new_conversations: u32,
    pub new_messages: u32,
    #[serde(default)]
    pub message: String,
    #[serde(with = "super::timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "super::timestamp")]
    pub ended_at: DateTime<Utc>,
}

/// Listing filters. Unset fields are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
pub struct ConversationQuery {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    /// `None` lists both archived and active conversations.
    pub archived: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Notice {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct MessagingService {
    client: Arc<ApiClient>,
}

impl MessagingService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn conversations(
        &self,
        page_id: &str,
        query: &ConversationQuery,
    ) -> Result<ConversationPage, PagedashError> {
        let request = ApiRequest::get(format!(
            "{MESSAGING_PATH}/pages/{}/conversations",
            segment(page_id)
        ))
        .with_optional_query("limit", query.limit)
        .with_optional_query("cursor", query.cursor.as_deref().filter(|c| !c.is_empty()))
        .with_optional_query("isArchived", query.archived);
        let envelope: Envelope<ConversationPage> = self.client.send_json(request).await?;
        Ok(envelope.data)
    }

    pub async fn messages(
        &self,
        page_id: &str,
        conversation_id: &str,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<Vec<Message>, PagedashError> {
        let request = ApiRequest::get(format!("{}/messages", conversation_path(page_id, conversation_id)))
            .with_optional_query("limit", limit)
            .with_optional_query("cursor", cursor.filter(|c| !c.is_empty()));
        let envelope: Envelope<Vec<Message>> = self.client.send_json(request).await?;
        Ok(envelope.data)
    }

    /// Reply as the page. Blank text is rejected without a request.
    pub async fn send(
        &self,
        page_id: &str,
        conversation_id: &str,
        text: &str,
    ) -> Result<Message, PagedashError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PagedashError::InvalidArgument("message is empty".to_string()));
        }
        let path = format!("{}/send", conversation_path(page_id, conversation_id));
        let envelope: Envelope<Message> = self.client.post_json(&path, &json!({ "message": text })).await?;
        Ok(envelope.data)
    }

    /// Returns the server's confirmation message.
    pub async fn mark_read(&self, page_id: &str, conversation_id: &str) -> Result<String, PagedashError> {
        let path = format!("{}/read", conversation_path(page_id, conversation_id));
        let notice: Notice = self.client.post_json(&path, &json!({})).await?;
        Ok(notice.message)
    }

    pub async fn set_archived(
        &self,
        page_id: &str,
        conversation_id: &str,
        archive: bool,
    ) -> Result<String, PagedashError> {
        let path = format!("{}/archive", conversation_path(page_id, conversation_id));
        let notice: Notice = self.client.post_json(&path, &json!({ "archive": archive })).await?;
        Ok(notice.message)
    }

    /// Pull new conversations and messages for one page.
    pub async fn sync(&self, page_id: &str) -> Result<MessagingSync, PagedashError> {
        let path = format!("{MESSAGING_PATH}/pages/{}/sync", segment(page_id));
        let envelope: Envelope<MessagingSync> = self.client.post_json(&path, &json!({})).await?;
        Ok(envelope.data)
    }
}

fn conversation_path(page_id: &str, conversation_id: &str) -> String {
    format!(
        "{MESSAGING_PATH}/pages/{}/conversations/{}",
        segment(page_id),
        segment(conversation_id)
    )
}
