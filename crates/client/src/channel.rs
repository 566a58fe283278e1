//! In-memory state for one open chat: the ordered message list, the
//! optimistic entries awaiting confirmation, and the bot-typing indicator.
//!
//! The list is reconciled against the realtime push feed. Matching is by
//! exact content equality for optimistic user entries (the authoritative
//! row replaces the first pending entry with the same content, in place),
//! so two in-flight sends with identical text can swap confirmations; the
//! result is indistinguishable in the UI.

use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::ClientError;
use crate::model::{ChatMessage, MessageId, MessageRow, Role};

pub struct ChatChannel {
    chat_id: String,
    messages: Vec<ChatMessage>,
    is_loading: bool,
    is_bot_typing: bool,
    typing_since: Option<Instant>,
    /// When set, `expire_typing` clears a stale indicator after this long.
    /// Off by default: without it, a webhook that never writes a bot row
    /// leaves the indicator up forever.
    typing_timeout: Option<Duration>,
}

impl ChatChannel {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            messages: Vec::new(),
            is_loading: true,
            is_bot_typing: false,
            typing_since: None,
            typing_timeout: None,
        }
    }

    pub fn with_typing_timeout(mut self, timeout: Duration) -> Self {
        self.typing_timeout = Some(timeout);
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_bot_typing(&self) -> bool {
        self.is_bot_typing
    }

    /// Install the initial fetch result. A failed fetch yields an empty
    /// list rather than a stuck loading state.
    pub fn finish_load(&mut self, result: Result<Vec<MessageRow>, ClientError>) {
        self.messages = match result {
            Ok(rows) => rows.into_iter().map(ChatMessage::from).collect(),
            Err(e) => {
                tracing::warn!("failed to load messages for chat {}: {}", self.chat_id, e);
                Vec::new()
            }
        };
        self.is_loading = false;
    }

    /// Append an optimistic user message and start the typing indicator.
    /// Returns the client-generated id, or `None` for blank content.
    pub fn begin_send(&mut self, content: &str) -> Option<Uuid> {
        if content.trim().is_empty() {
            return None;
        }

        let client_id = Uuid::new_v4();
        self.messages.push(ChatMessage {
            id: MessageId::Pending(client_id),
            role: Role::User,
            content: Some(content.to_string()),
            attachment_url: None,
            attachment_type: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        });
        self.set_typing();

        Some(client_id)
    }

    /// An upload has started; the bot is expected to respond to the file.
    pub fn begin_upload(&mut self) {
        self.set_typing();
    }

    /// The relay call failed synchronously: drop the optimistic entry and
    /// stop the indicator. Reconciliation never sees this message.
    pub fn send_failed(&mut self, client_id: Uuid) {
        self.messages
            .retain(|m| m.id != MessageId::Pending(client_id));
        self.clear_typing();
    }

    /// Reconcile one pushed row into the list.
    pub fn apply_push(&mut self, row: MessageRow) {
        if row.role == Role::Bot {
            // A bot reply ends the typing indicator even if the row turns
            // out to be a duplicate.
            self.clear_typing();
        }

        if row.role == Role::User {
            // Confirmation of an optimistic entry: replace the first
            // pending user message with identical content, keeping its
            // position in the list.
            let slot = self.messages.iter().position(|m| {
                m.id.is_pending() && m.role == Role::User && m.content == row.content
            });
            if let Some(index) = slot {
                self.messages[index] = ChatMessage::from(row);
                return;
            }
        }

        // Otherwise append, unless the row is already present.
        if !self.contains_committed(&row.id) {
            self.messages.push(ChatMessage::from(row));
        }
    }

    /// Clear a stale typing indicator once the configured timeout has
    /// elapsed. Returns true if the indicator was cleared.
    pub fn expire_typing(&mut self, now: Instant) -> bool {
        let (timeout, since) = match (self.typing_timeout, self.typing_since) {
            (Some(t), Some(s)) => (t, s),
            _ => return false,
        };
        if now.duration_since(since) >= timeout {
            self.clear_typing();
            return true;
        }
        false
    }

    fn contains_committed(&self, id: &str) -> bool {
        self.messages
            .iter()
            .any(|m| matches!(&m.id, MessageId::Committed(existing) if existing == id))
    }

    fn set_typing(&mut self) {
        self.is_bot_typing = true;
        self.typing_since = Some(Instant::now());
    }

    fn clear_typing(&mut self) {
        self.is_bot_typing = false;
        self.typing_since = None;
    }
}
