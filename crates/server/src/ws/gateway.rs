use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};

use crate::ws::events::ServerEvent;

pub type ClientId = u64;

pub struct ConnectedClient {
    pub user_id: String,
    pub tx: mpsc::UnboundedSender<String>,
    pub subscribed_chats: HashSet<String>,
}

/// Realtime push state: connected clients and per-chat subscriber sets.
/// A subscription lives for the client's view of one chat and is removed
/// on unsubscribe or disconnect; unregister cleans up every set so no
/// subscription outlives its connection.
pub struct GatewayState {
    next_id: RwLock<u64>,
    pub clients: RwLock<HashMap<ClientId, ConnectedClient>>,
    pub chat_subs: RwLock<HashMap<String, HashSet<ClientId>>>,
}

impl Default for GatewayState {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayState {
    pub fn new() -> Self {
        Self {
            next_id: RwLock::new(1),
            clients: RwLock::new(HashMap::new()),
            chat_subs: RwLock::new(HashMap::new()),
        }
    }

    pub async fn next_client_id(&self) -> ClientId {
        let mut id = self.next_id.write().await;
        let current = *id;
        *id += 1;
        current
    }

    pub async fn register(
        &self,
        client_id: ClientId,
        user_id: String,
        tx: mpsc::UnboundedSender<String>,
    ) {
        let client = ConnectedClient {
            user_id,
            tx,
            subscribed_chats: HashSet::new(),
        };
        self.clients.write().await.insert(client_id, client);
    }

    pub async fn unregister(&self, client_id: ClientId) -> Option<ConnectedClient> {
        let client = self.clients.write().await.remove(&client_id)?;

        let mut subs = self.chat_subs.write().await;
        for chat_id in &client.subscribed_chats {
            if let Some(set) = subs.get_mut(chat_id) {
                set.remove(&client_id);
                if set.is_empty() {
                    subs.remove(chat_id);
                }
            }
        }

        Some(client)
    }

    pub async fn subscribe_chat(&self, client_id: ClientId, chat_id: &str) {
        self.chat_subs
            .write()
            .await
            .entry(chat_id.to_string())
            .or_default()
            .insert(client_id);

        if let Some(client) = self.clients.write().await.get_mut(&client_id) {
            client.subscribed_chats.insert(chat_id.to_string());
        }
    }

    pub async fn unsubscribe_chat(&self, client_id: ClientId, chat_id: &str) {
        let mut subs = self.chat_subs.write().await;
        if let Some(set) = subs.get_mut(chat_id) {
            set.remove(&client_id);
            if set.is_empty() {
                subs.remove(chat_id);
            }
        }
        drop(subs);

        if let Some(client) = self.clients.write().await.get_mut(&client_id) {
            client.subscribed_chats.remove(chat_id);
        }
    }

    pub async fn broadcast_chat(&self, chat_id: &str, event: &ServerEvent) {
        let msg = match serde_json::to_string(event) {
            Ok(m) => m,
            Err(_) => return,
        };

        let subs = self.chat_subs.read().await;
        let clients = self.clients.read().await;

        if let Some(subscriber_ids) = subs.get(chat_id) {
            for &cid in subscriber_ids {
                if let Some(client) = clients.get(&cid) {
                    let _ = client.tx.send(msg.clone());
                }
            }
        }
    }

    pub async fn send_to(&self, client_id: ClientId, event: &ServerEvent) {
        let msg = match serde_json::to_string(event) {
            Ok(m) => m,
            Err(_) => return,
        };

        let clients = self.clients.read().await;
        if let Some(client) = clients.get(&client_id) {
            let _ = client.tx.send(msg);
        }
    }
}
