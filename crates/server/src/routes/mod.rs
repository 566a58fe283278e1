pub mod auth;
pub mod chats;
pub mod files;
pub mod messages;

use crate::ws;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Axum's default 2 MB body cap would reject large uploads inside the
    // multipart extractor, before the handler's own size check. Leave
    // headroom for the multipart framing so the handler check decides.
    let upload_body_limit = (state.config.max_upload_bytes as usize).saturating_add(1_048_576);

    let auth_routes = Router::new()
        .route("/sign-up/email", post(auth::sign_up))
        .route("/sign-in/email", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/get-session", get(auth::get_session));

    let api_routes = Router::new()
        // Chats
        .route("/chats", get(chats::list_chats))
        .route("/chats", post(chats::create_chat))
        .route("/chats/{chatId}", get(chats::get_chat))
        .route("/chats/{chatId}", patch(chats::update_chat))
        .route("/chats/{chatId}", delete(chats::delete_chat))
        // Messages
        .route("/chats/{chatId}/messages", get(messages::list_messages))
        .route("/chats/{chatId}/messages", post(messages::send_message))
        // Attachments
        .route(
            "/chats/{chatId}/files",
            post(files::upload).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/files/{chatId}/{filename}", get(files::serve_file));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .route("/gateway", get(ws::handler::ws_handler))
        .with_state(state)
}
