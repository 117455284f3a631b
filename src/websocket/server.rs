use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::chat::messages::DEFAULT_MAPS_BASE_URL;
use crate::chat::profanity::{self, ProfanityFilter};
use crate::chat::{ConnectionId, Session, UserRegistry};
use crate::config::Settings;
use crate::websocket::pool::{ConnectionPool, FrameSender};
use crate::websocket::ServerMessage;

/// Process-wide hub shared by every connection: the user registry, the
/// connection pool used for fan-out, and the message policy.
///
/// Lock order is registry first, then pool. Handlers that change membership
/// keep the registry write lock while they fan out, so roster updates for a
/// room go out in the same order as the changes they describe.
pub struct ChatServer {
    pool: Arc<ConnectionPool>,
    pub(crate) registry: RwLock<UserRegistry>,
    pub(crate) filter: Arc<dyn ProfanityFilter>,
    pub(crate) maps_base_url: String,
}

impl ChatServer {
    pub fn new(filter: Arc<dyn ProfanityFilter>) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            registry: RwLock::new(UserRegistry::new()),
            filter,
            maps_base_url: DEFAULT_MAPS_BASE_URL.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(profanity::from_config(&settings.profanity))
            .with_maps_base_url(settings.chat.maps_base_url.clone())
    }

    pub fn with_maps_base_url(mut self, maps_base_url: impl Into<String>) -> Self {
        self.maps_base_url = maps_base_url.into();
        self
    }

    /// Registers a new connection and returns the session that will handle
    /// its events. Frames for the connection are pushed into `sender`.
    pub async fn connect(self: &Arc<Self>, sender: FrameSender) -> Arc<Session> {
        let id = Uuid::new_v4();
        self.pool.add(id, sender).await;
        info!("Connection {} opened", id);

        Arc::new(Session::new(id, Arc::clone(self)))
    }

    pub fn pool(&self) -> Arc<ConnectionPool> {
        self.pool.clone()
    }

    pub async fn connection_count(&self) -> usize {
        self.pool.connection_count().await
    }

    pub(crate) async fn emit_to(&self, id: &ConnectionId, msg: &ServerMessage) {
        let Some(frame) = Self::encode(msg) else {
            return;
        };

        if let Err(e) = self.pool.send_to(id, &frame).await {
            warn!("Failed to send to connection {}: {}", id, e);
        }
    }

    /// Fans `msg` out to the members of `room_id`, optionally skipping one
    /// connection.
    pub(crate) async fn emit_to_room(
        &self,
        room_id: &str,
        msg: &ServerMessage,
        exclude: Option<ConnectionId>,
    ) {
        let Some(frame) = Self::encode(msg) else {
            return;
        };

        self.pool.send_to_group(room_id, &frame, exclude).await;
    }

    fn encode(msg: &ServerMessage) -> Option<String> {
        match msg.to_json() {
            Ok(frame) => Some(frame),
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::profanity::WordListFilter;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connect_registers_in_pool() {
        let server = Arc::new(ChatServer::new(Arc::new(WordListFilter::with_default_words())));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let session = server.connect(tx).await;
        assert_eq!(server.connection_count().await, 1);

        server
            .emit_to(&session.id(), &ServerMessage::Error { message: "hello".to_string() })
            .await;
        let frame: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(frame["type"], "error");
        assert_eq!(frame["payload"]["message"], "hello");

        session.disconnect().await;
        assert_eq!(server.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_from_settings() {
        let mut settings = Settings::new_for_test().unwrap();
        settings.chat.maps_base_url = "https://maps.example.com".to_string();
        settings.profanity.extra_words = vec!["spoiler".to_string()];

        let server = ChatServer::from_settings(&settings);
        assert_eq!(server.maps_base_url, "https://maps.example.com");
        assert!(server.filter.is_profane("no SPOILER please"));
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let server = Arc::new(ChatServer::new(Arc::new(WordListFilter::with_default_words())));
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        let first = server.connect(tx1).await;
        let second = server.connect(tx2).await;
        assert_ne!(first.id(), second.id());
        assert_eq!(server.connection_count().await, 2);
    }
}
