use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use hookchat_shared::validation::validate_message_content;

use crate::error::ApiError;
use crate::models::{AuthUser, Chat, Message, SendMessageRequest, SendMessageResponse};
use crate::relay;
use crate::ws::events::ServerEvent;
use crate::AppState;

/// Fetch a chat scoped by ownership, or 404.
pub(crate) async fn owned_chat(
    state: &AppState,
    chat_id: &str,
    user_id: &str,
) -> Result<Chat, ApiError> {
    sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE id = ? AND user_id = ?")
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Chat not found"))
}

pub(crate) async fn insert_message(
    db: &sqlx::SqlitePool,
    chat_id: &str,
    role: &str,
    content: Option<&str>,
    attachment_url: Option<&str>,
    attachment_type: Option<&str>,
) -> Result<Message, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO messages (id, chat_id, role, content, attachment_url, attachment_type, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(chat_id)
    .bind(role)
    .bind(content)
    .bind(attachment_url)
    .bind(attachment_type)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(Message {
        id,
        chat_id: chat_id.to_string(),
        role: role.to_string(),
        content: content.map(|s| s.to_string()),
        attachment_url: attachment_url.map(|s| s.to_string()),
        attachment_type: attachment_type.map(|s| s.to_string()),
        created_at: now,
    })
}

/// Dispatch to the webhook, persist the bot reply, and push it to
/// subscribers. A failed bot write is logged and swallowed: the user's own
/// message already landed, so the only visible effect is a missing reply.
pub(crate) async fn relay_and_reply(
    state: &AppState,
    chat_id: &str,
    webhook_url: &str,
    envelope: &relay::Envelope<'_>,
) -> Option<Message> {
    let reply = relay::dispatch(&state.http, webhook_url, envelope).await;

    match insert_message(&state.db, chat_id, "bot", Some(&reply), None, None).await {
        Ok(bot) => {
            state
                .gateway
                .broadcast_chat(chat_id, &ServerEvent::Message { message: bot.clone() })
                .await;
            Some(bot)
        }
        Err(e) => {
            tracing::error!("failed to save bot reply for chat {}: {}", chat_id, e);
            None
        }
    }
}

/// GET /api/chats/:chatId/messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    owned_chat(&state, &chat_id, &user.id).await?;

    let items = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE chat_id = ? ORDER BY created_at ASC",
    )
    .bind(&chat_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(items))
}

/// POST /api/chats/:chatId/messages
///
/// The webhook relay: persist the user row, POST to the chat's webhook,
/// persist the resolved (or fallback) bot reply. No retries; a duplicate
/// client send produces a duplicate row pair.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = body.content.as_deref().unwrap_or("").trim().to_string();
    validate_message_content(&content).map_err(ApiError::Validation)?;

    let chat = owned_chat(&state, &chat_id, &user.id).await?;
    let webhook_url = chat
        .webhook_url
        .filter(|u| !u.is_empty())
        .ok_or(ApiError::Config("Chat has no webhook URL configured"))?;

    // The user row must land before the webhook is contacted; if this
    // write fails the whole send fails and no webhook call is made.
    let user_message =
        insert_message(&state.db, &chat_id, "user", Some(&content), None, None).await?;

    state
        .gateway
        .broadcast_chat(
            &chat_id,
            &ServerEvent::Message {
                message: user_message.clone(),
            },
        )
        .await;

    let envelope = relay::Envelope::Text {
        chat_id: &chat_id,
        user_id: &user.id,
        content: &content,
    };
    let bot_message = relay_and_reply(&state, &chat_id, &webhook_url, &envelope).await;

    Ok(Json(SendMessageResponse {
        user_message,
        bot_message,
    }))
}
