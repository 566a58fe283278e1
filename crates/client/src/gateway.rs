//! Realtime push subscription for one chat.
//!
//! A [`Subscription`] owns the websocket connection and the background
//! read task; dropping it (or calling [`Subscription::close`]) tears both
//! down, so a subscription cannot outlive the view that opened it.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use hookchat_shared::constants::WS_HEARTBEAT_INTERVAL_MS;

use crate::error::{ClientError, Result};
use crate::model::MessageRow;

pub struct Subscription {
    chat_id: String,
    events: mpsc::UnboundedReceiver<MessageRow>,
    commands: mpsc::UnboundedSender<WsMessage>,
    task: tokio::task::JoinHandle<()>,
}

impl Subscription {
    /// Connect to the gateway, subscribe to `chat_id`, and wait for the
    /// server's acknowledgement before returning. An `error` event during
    /// the handshake (an unowned chat, for instance) fails the whole call.
    pub async fn open(base_url: &str, token: &str, chat_id: &str) -> Result<Self> {
        let ws_url = format!(
            "{}/gateway?token={}",
            base_url.replacen("http", "ws", 1),
            token
        );
        let (socket, _) = tokio_tungstenite::connect_async(&ws_url).await?;
        let (mut write, mut read) = socket.split();

        write
            .send(WsMessage::Text(
                json!({"type": "subscribe", "chatId": chat_id})
                    .to_string()
                    .into(),
            ))
            .await?;

        // Drain until the ack; pushes cannot arrive before it because the
        // server only registers the subscription when it acks.
        loop {
            let frame = match read.next().await {
                Some(frame) => frame?,
                None => return Err(ClientError::GatewayClosed),
            };
            let text = match frame {
                WsMessage::Text(text) => text,
                WsMessage::Close(_) => return Err(ClientError::GatewayClosed),
                _ => continue,
            };
            let event: serde_json::Value = match serde_json::from_str(&text) {
                Ok(event) => event,
                Err(_) => continue,
            };
            match event["type"].as_str() {
                Some("subscribed") if event["chatId"] == chat_id => break,
                Some("error") => {
                    return Err(ClientError::Api {
                        status: 0,
                        message: event["message"]
                            .as_str()
                            .unwrap_or("subscription rejected")
                            .to_string(),
                    });
                }
                _ => continue,
            }
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<WsMessage>();

        let task = tokio::spawn(async move {
            let mut heartbeat =
                tokio::time::interval(Duration::from_millis(WS_HEARTBEAT_INTERVAL_MS));
            heartbeat.tick().await; // first tick fires immediately
            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        let ping = json!({"type": "ping"}).to_string();
                        if write.send(WsMessage::Text(ping.into())).await.is_err() {
                            break;
                        }
                    }
                    frame = read.next() => {
                        let text = match frame {
                            Some(Ok(WsMessage::Text(text))) => text,
                            Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                            Some(Ok(_)) => continue,
                        };
                        let event: serde_json::Value = match serde_json::from_str(&text) {
                            Ok(event) => event,
                            Err(_) => continue,
                        };
                        if event["type"] == "message" {
                            let row: MessageRow =
                                match serde_json::from_value(event["message"].clone()) {
                                    Ok(row) => row,
                                    Err(e) => {
                                        tracing::warn!("malformed push event: {e}");
                                        continue;
                                    }
                                };
                            if event_tx.send(row).is_err() {
                                break;
                            }
                        }
                    }
                    command = command_rx.recv() => {
                        let Some(frame) = command else { break };
                        let closing = matches!(frame, WsMessage::Close(_));
                        if write.send(frame).await.is_err() || closing {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            chat_id: chat_id.to_string(),
            events: event_rx,
            commands: command_tx,
            task,
        })
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Next pushed message row, or `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<MessageRow> {
        self.events.recv().await
    }

    /// Unsubscribe and close the connection politely. Dropping without
    /// calling this still releases everything; the server cleans up on
    /// disconnect.
    pub async fn close(mut self) {
        let _ = self.commands.send(WsMessage::Text(
            json!({"type": "unsubscribe", "chatId": self.chat_id})
                .to_string()
                .into(),
        ));
        let _ = self.commands.send(WsMessage::Close(None));
        let _ = (&mut self.task).await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
