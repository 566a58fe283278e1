use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message identity. An optimistic entry carries a client-generated id
/// until the authoritative row arrives over the push feed; reconciliation
/// matches on this tag instead of guessing at id formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageId {
    Pending(Uuid),
    Committed(String),
}

impl MessageId {
    pub fn is_pending(&self) -> bool {
        matches!(self, MessageId::Pending(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// A message row as the server serializes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    pub id: String,
    pub chat_id: String,
    pub role: Role,
    pub content: Option<String>,
    pub attachment_url: Option<String>,
    pub attachment_type: Option<String>,
    pub created_at: String,
}

/// One entry in the channel's in-memory list: either an optimistic local
/// message or a committed server row.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: Option<String>,
    pub attachment_url: Option<String>,
    pub attachment_type: Option<String>,
    pub created_at: String,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage {
            id: MessageId::Committed(row.id),
            role: row.role,
            content: row.content,
            attachment_url: row.attachment_url,
            attachment_type: row.attachment_type,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub webhook_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Server response to a send or upload. Reconciliation runs off the push
/// feed, not off this receipt; it exists for error reporting and tests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub user_message: MessageRow,
    pub bot_message: Option<MessageRow>,
}
