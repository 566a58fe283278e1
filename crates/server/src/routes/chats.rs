use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use hookchat_shared::validation::{validate_chat_title, validate_webhook_url};

use crate::error::ApiError;
use crate::models::{AuthUser, Chat, CreateChatRequest, UpdateChatRequest};
use crate::AppState;

/// GET /api/chats
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let chats = sqlx::query_as::<_, Chat>(
        "SELECT * FROM chats WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(chats))
}

/// POST /api/chats
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(body): Json<CreateChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let webhook_url = body.webhook_url.as_deref().unwrap_or("").trim().to_string();
    validate_webhook_url(&webhook_url).map_err(ApiError::Validation)?;
    url::Url::parse(&webhook_url)
        .map_err(|_| ApiError::Validation("Webhook URL is not a valid URL".into()))?;

    // A chat created without a title gets a date-stamped default.
    let title = match body.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => format!("Conversation {}", chrono::Utc::now().format("%-d/%-m/%Y")),
    };
    validate_chat_title(&title).map_err(ApiError::Validation)?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO chats (id, user_id, title, webhook_url, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&user.id)
    .bind(&title)
    .bind(&webhook_url)
    .bind(&now)
    .execute(&state.db)
    .await?;

    Ok(Json(Chat {
        id,
        user_id: user.id,
        title,
        webhook_url: Some(webhook_url),
        created_at: now,
    }))
}

/// GET /api/chats/:chatId
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let chat = sqlx::query_as::<_, Chat>("SELECT * FROM chats WHERE id = ? AND user_id = ?")
        .bind(&chat_id)
        .bind(&user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Chat not found"))?;

    Ok(Json(chat))
}

/// PATCH /api/chats/:chatId
pub async fn update_chat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
    Json(body): Json<UpdateChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = body.title.as_deref().unwrap_or("").trim().to_string();
    let webhook_url = body.webhook_url.as_deref().unwrap_or("").trim().to_string();

    validate_chat_title(&title).map_err(ApiError::Validation)?;
    validate_webhook_url(&webhook_url).map_err(ApiError::Validation)?;
    url::Url::parse(&webhook_url)
        .map_err(|_| ApiError::Validation("Webhook URL is not a valid URL".into()))?;

    // Ownership is enforced by the predicate. An update matching zero rows
    // (unknown id, or someone else's chat) is a silent no-op.
    sqlx::query("UPDATE chats SET title = ?, webhook_url = ? WHERE id = ? AND user_id = ?")
        .bind(&title)
        .bind(&webhook_url)
        .bind(&chat_id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({"ok": true})))
}

/// DELETE /api/chats/:chatId
pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Cascades to messages via the foreign key.
    sqlx::query("DELETE FROM chats WHERE id = ? AND user_id = ?")
        .bind(&chat_id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({"ok": true})))
}
