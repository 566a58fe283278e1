use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::middleware::auth::{extract_token, resolve_session};
use crate::models::AuthUser;
use crate::ws::events::{ClientEvent, ServerEvent};
use crate::ws::gateway::ClientId;
use crate::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    query: axum::extract::Query<std::collections::HashMap<String, String>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    // Session token from query param ?token=..., Authorization header, or cookie
    let token = query
        .get("token")
        .filter(|t| !t.is_empty())
        .cloned()
        .or_else(|| extract_token(&headers));

    let auth_user = match token {
        Some(t) => resolve_session(&state, &t).await.ok().flatten(),
        None => None,
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, auth_user))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, auth_user: Option<AuthUser>) {
    let user = match auth_user {
        Some(u) => u,
        None => {
            // Can't authenticate — close connection
            return;
        }
    };

    let client_id = state.gateway.next_client_id().await;
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Channel for pushing events to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    state.gateway.register(client_id, user.id.clone(), tx).await;

    // Task to forward messages from mpsc to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Receive loop
    let state_clone = state.clone();
    let user_clone = user.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Text(text) => {
                    let text_str: &str = &text;
                    if let Ok(event) = serde_json::from_str::<ClientEvent>(text_str) {
                        handle_client_event(&state_clone, client_id, &user_clone, event).await;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    // Clean up: drop the client and every chat subscription it held
    state.gateway.unregister(client_id).await;
}

async fn handle_client_event(
    state: &AppState,
    client_id: ClientId,
    user: &AuthUser,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Subscribe { chat_id } => {
            // Only the chat's owner may subscribe to its push feed
            let owned = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM chats WHERE id = ? AND user_id = ?",
            )
            .bind(&chat_id)
            .bind(&user.id)
            .fetch_one(&state.db)
            .await
            .unwrap_or(0);

            if owned == 0 {
                state
                    .gateway
                    .send_to(
                        client_id,
                        &ServerEvent::Error {
                            message: "Chat not found".into(),
                        },
                    )
                    .await;
                return;
            }

            state.gateway.subscribe_chat(client_id, &chat_id).await;
            state
                .gateway
                .send_to(client_id, &ServerEvent::Subscribed { chat_id })
                .await;
        }
        ClientEvent::Unsubscribe { chat_id } => {
            state.gateway.unsubscribe_chat(client_id, &chat_id).await;
        }
        ClientEvent::Ping => {
            state.gateway.send_to(client_id, &ServerEvent::Pong).await;
        }
    }
}
