use serde::{Deserialize, Serialize};

use crate::models::Message;

// ── Client → Server Events ──

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Subscribe {
        #[serde(rename = "chatId")]
        chat_id: String,
    },
    Unsubscribe {
        #[serde(rename = "chatId")]
        chat_id: String,
    },
    Ping,
}

// ── Server → Client Events ──

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message row was inserted into a subscribed chat.
    Message {
        message: Message,
    },
    Subscribed {
        #[serde(rename = "chatId")]
        chat_id: String,
    },
    Pong,
    Error {
        message: String,
    },
}
