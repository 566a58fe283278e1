use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::error::ApiError;
use crate::models::{AuthUser, SendMessageResponse};
use crate::relay;
use crate::routes::messages::{insert_message, owned_chat, relay_and_reply};
use crate::ws::events::ServerEvent;
use crate::AppState;

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// POST /api/chats/:chatId/files
///
/// Stores the upload under a per-chat path keyed by upload time, resolves
/// its public URL, then runs the relay's file-message path. Collision
/// avoidance is timestamp-based only; two same-named uploads in the same
/// millisecond overwrite each other.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(chat_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let chat = owned_chat(&state, &chat_id, &user.id).await?;
    let webhook_url = chat
        .webhook_url
        .filter(|u| !u.is_empty())
        .ok_or(ApiError::Config("Chat has no webhook URL configured"))?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Upload(e.to_string()))?
        .ok_or_else(|| ApiError::Validation("No file provided".into()))?;

    let original_filename = sanitize_filename(field.file_name().unwrap_or("file"));
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::Upload(e.to_string()))?;

    if data.len() as u64 > state.config.max_upload_bytes {
        return Err(ApiError::Validation(format!(
            "File too large. Max size: {} MB",
            state.config.max_upload_bytes / 1_048_576
        )));
    }

    let stored_filename = format!(
        "{}_{}",
        chrono::Utc::now().timestamp_millis(),
        original_filename
    );
    let chat_dir = std::path::Path::new(&state.config.upload_dir).join(&chat_id);
    tokio::fs::create_dir_all(&chat_dir)
        .await
        .map_err(|e| ApiError::Upload(e.to_string()))?;
    let file_path = chat_dir.join(&stored_filename);

    tokio::fs::write(&file_path, &data)
        .await
        .map_err(|e| ApiError::Upload(e.to_string()))?;

    let public_url = format!(
        "{}/api/files/{}/{}",
        state.config.public_base_url, chat_id, stored_filename
    );

    let user_message = match insert_message(
        &state.db,
        &chat_id,
        "user",
        None,
        Some(&public_url),
        Some(&content_type),
    )
    .await
    {
        Ok(m) => m,
        Err(e) => {
            // Don't leave an orphaned file behind
            let _ = tokio::fs::remove_file(&file_path).await;
            return Err(e.into());
        }
    };

    state
        .gateway
        .broadcast_chat(
            &chat_id,
            &ServerEvent::Message {
                message: user_message.clone(),
            },
        )
        .await;

    let envelope = relay::Envelope::File {
        chat_id: &chat_id,
        user_id: &user.id,
        file_url: &public_url,
        file_type: &content_type,
    };
    let bot_message = relay_and_reply(&state, &chat_id, &webhook_url, &envelope).await;

    Ok(Json(SendMessageResponse {
        user_message,
        bot_message,
    }))
}

/// GET /api/files/:chatId/:filename
///
/// The public-URL target for stored attachments. Served without auth, like
/// an object store's public bucket.
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path((chat_id, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    // Reject anything that could escape the upload directory
    if filename.contains("..") || filename.contains('/') || chat_id.contains("..") {
        return Err(ApiError::NotFound("File not found"));
    }

    let file_path = std::path::Path::new(&state.config.upload_dir)
        .join(&chat_id)
        .join(&filename);

    let file = tokio::fs::File::open(&file_path)
        .await
        .map_err(|_| ApiError::NotFound("File not found"))?;

    // Recover the declared MIME type from the message row, if any
    let public_url = format!(
        "{}/api/files/{}/{}",
        state.config.public_base_url, chat_id, filename
    );
    let content_type = sqlx::query_scalar::<_, Option<String>>(
        "SELECT attachment_type FROM messages WHERE attachment_url = ? LIMIT 1",
    )
    .bind(&public_url)
    .fetch_optional(&state.db)
    .await?
    .flatten()
    .unwrap_or_else(|| "application/octet-stream".to_string());

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let disposition = if content_type.starts_with("image/")
        || content_type.starts_with("video/")
        || content_type.starts_with("audio/")
    {
        "inline".to_string()
    } else {
        format!("attachment; filename=\"{}\"", filename)
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        body,
    )
        .into_response())
}
