use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::chat::messages::{self, Coordinates};
use crate::chat::registry::{ConnectionId, User};
use crate::chat::router;
use crate::error::ChatError;
use crate::websocket::{Ack, ChatServer, ClientMessage, ServerMessage, LOCATION_SHARED};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, not in a room yet.
    Pending,
    /// Joined a room. Lasts until disconnect.
    Active,
    /// Terminal.
    Closed,
}

/// Protocol state of one connection.
///
/// Every request handler returns exactly one `Ack`; the transport decides
/// whether the client asked to see it.
pub struct Session {
    id: ConnectionId,
    server: Arc<ChatServer>,
    state: Mutex<SessionState>,
}

impl Session {
    pub(crate) fn new(id: ConnectionId, server: Arc<ChatServer>) -> Self {
        Self {
            id,
            server,
            state: Mutex::new(SessionState::Pending),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    pub async fn handle(&self, msg: ClientMessage) -> Ack {
        match msg {
            ClientMessage::Join { username, room } => self.join(&username, &room).await,
            ClientMessage::SendMessage(text) => self.send_message(&text).await,
            ClientMessage::SendLocation(coords) => self.send_location(coords).await,
        }
    }

    pub async fn join(&self, username: &str, room: &str) -> Ack {
        let mut state = self.state.lock().await;
        match *state {
            SessionState::Pending => {}
            SessionState::Active => return Ack::Rejected(ChatError::AlreadyJoined),
            SessionState::Closed => return Ack::Rejected(ChatError::Closed),
        }

        let mut registry = self.server.registry.write().await;
        let user = match registry.create(self.id, username, room) {
            Ok(user) => user,
            Err(e) => {
                warn!("Join rejected on connection {}: {}", self.id, e);
                return Ack::Rejected(e);
            }
        };

        if let Err(e) = self.server.pool().join_group(self.id, &user.room_id).await {
            warn!("Connection {} vanished while joining: {}", self.id, e);
            registry.remove(&self.id);
            return Ack::Rejected(ChatError::Closed);
        }
        *state = SessionState::Active;

        let welcome = messages::system(format!("Joined the room: {}", user.room));
        self.server.emit_to(&self.id, &ServerMessage::SystemMessage(welcome)).await;

        let joined = messages::system(format!("{} has joined!", user.username));
        self.server
            .emit_to_room(&user.room_id, &ServerMessage::SystemMessage(joined), Some(self.id))
            .await;

        let room_data = router::room_data(&registry, &user);
        self.server.emit_to_room(&user.room_id, &ServerMessage::RoomData(room_data), None).await;

        info!("{} joined room {} on connection {}", user.username, user.room, self.id);
        Ack::Ok
    }

    pub async fn send_message(&self, text: &str) -> Ack {
        if self.server.filter.is_profane(text) {
            warn!("Profane message rejected on connection {}", self.id);
            return Ack::Rejected(ChatError::Profanity);
        }

        let user = match self.current_user().await {
            Ok(user) => user,
            Err(e) => return Ack::Rejected(e),
        };

        let message = messages::text(&user, text);
        self.server.emit_to_room(&user.room_id, &ServerMessage::Message(message), None).await;
        Ack::Ok
    }

    pub async fn send_location(&self, coords: Coordinates) -> Ack {
        let user = match self.current_user().await {
            Ok(user) => user,
            Err(e) => return Ack::Rejected(e),
        };

        let message = messages::location(&user, coords, &self.server.maps_base_url);
        self.server
            .emit_to_room(&user.room_id, &ServerMessage::LocationMessage(message), None)
            .await;
        Ack::Confirmed(LOCATION_SHARED.to_string())
    }

    /// Tears the connection down. Safe to call more than once and before any
    /// join; only a connection that actually joined announces its departure.
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::Closed;

        let mut registry = self.server.registry.write().await;
        let removed = registry.remove(&self.id);
        self.server.pool().remove(&self.id).await;

        let Some(user) = removed else {
            return;
        };

        let left = messages::system(format!("{} has left!", user.username));
        self.server.emit_to_room(&user.room_id, &ServerMessage::SystemMessage(left), None).await;

        let room_data = router::room_data(&registry, &user);
        self.server.emit_to_room(&user.room_id, &ServerMessage::RoomData(room_data), None).await;

        info!("{} left room {} on connection {}", user.username, user.room, self.id);
    }

    async fn current_user(&self) -> Result<User, ChatError> {
        if *self.state.lock().await == SessionState::Closed {
            return Err(ChatError::Closed);
        }

        match self.server.registry.read().await.find(&self.id) {
            Some(user) => Ok(user.clone()),
            None => {
                warn!("Request before join on connection {}", self.id);
                Err(ChatError::NotJoined)
            }
        }
    }
}
