use std::collections::HashMap;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::chat::router::room_id;
use crate::error::ChatError;

/// Opaque identity the gateway assigns to every live connection.
pub type ConnectionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: ConnectionId,
    pub username: String,
    /// Display name of the room, in the casing of its first member.
    pub room: String,
    /// Canonical room key, `lowercase(trim(room))`.
    pub room_id: String,
}

/// In-memory map from connection to the user joined on it.
///
/// The registry itself is not synchronized; the owner keeps it behind a lock
/// so that each `create` and `remove` runs as one critical section.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: HashMap<ConnectionId, User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        id: ConnectionId,
        username: &str,
        room: &str,
    ) -> Result<User, ChatError> {
        let username = username.trim();
        let room = room.trim();

        if username.is_empty() || room.is_empty() {
            return Err(ChatError::Validation);
        }

        if self.users.contains_key(&id) {
            return Err(ChatError::AlreadyJoined);
        }

        let room_id = room_id(room);
        let mut members = self.users.values().filter(|user| user.room_id == room_id).peekable();

        // First member of the room fixes its display casing
        let room = match members.peek() {
            Some(existing) => existing.room.clone(),
            None => room.to_string(),
        };

        let lowered = username.to_lowercase();
        if members.any(|user| user.username.to_lowercase() == lowered) {
            return Err(ChatError::DuplicateUsername);
        }

        let user = User {
            id,
            username: username.to_string(),
            room,
            room_id,
        };
        self.users.insert(id, user.clone());
        info!("User {} registered in room {} on connection {}", user.username, user.room_id, id);

        Ok(user)
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<User> {
        let removed = self.users.remove(id);
        if let Some(user) = &removed {
            info!("User {} removed from room {} on connection {}", user.username, user.room_id, id);
        }
        removed
    }

    pub fn find(&self, id: &ConnectionId) -> Option<&User> {
        self.users.get(id)
    }

    /// Members of a room in no particular order. `room` may be a display name
    /// or a room id.
    pub fn list_by_room(&self, room: &str) -> Vec<&User> {
        let room_id = room_id(room);
        self.users.values().filter(|user| user.room_id == room_id).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usernames(registry: &UserRegistry, room: &str) -> Vec<String> {
        let mut names: Vec<String> = registry
            .list_by_room(room)
            .into_iter()
            .map(|user| user.username.clone())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_create_trims_and_normalizes() {
        let mut registry = UserRegistry::new();
        let id = Uuid::new_v4();

        let user = registry.create(id, "  Alice ", "  General  ").unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "Alice");
        assert_eq!(user.room, "General");
        assert_eq!(user.room_id, "general");
        assert_eq!(registry.find(&id), Some(&user));
    }

    #[test]
    fn test_create_rejects_blank_input() {
        let mut registry = UserRegistry::new();

        assert_eq!(registry.create(Uuid::new_v4(), "   ", "room"), Err(ChatError::Validation));
        assert_eq!(registry.create(Uuid::new_v4(), "bob", ""), Err(ChatError::Validation));
        assert_eq!(registry.create(Uuid::new_v4(), "", "\t"), Err(ChatError::Validation));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_username_unique_per_room_only() {
        let mut registry = UserRegistry::new();
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();

        registry.create(c1, "Bob", "R1").unwrap();
        assert_eq!(registry.create(c2, "bob", "r1"), Err(ChatError::DuplicateUsername));
        assert!(registry.find(&c2).is_none());

        let other = registry.create(c2, "bob", "R2").unwrap();
        assert_eq!(other.room_id, "r2");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_first_joiner_fixes_room_casing() {
        let mut registry = UserRegistry::new();

        let first = registry.create(Uuid::new_v4(), "ann", "LoBBy").unwrap();
        let second = registry.create(Uuid::new_v4(), "ben", "lobby").unwrap();
        let third = registry.create(Uuid::new_v4(), "cat", " LOBBY ").unwrap();

        assert_eq!(first.room, "LoBBy");
        assert_eq!(second.room, "LoBBy");
        assert_eq!(third.room, "LoBBy");
        assert!([&first, &second, &third].iter().all(|user| user.room_id == "lobby"));
    }

    #[test]
    fn test_casing_resets_once_room_empties() {
        let mut registry = UserRegistry::new();
        let id = Uuid::new_v4();

        registry.create(id, "ann", "Lobby").unwrap();
        registry.remove(&id);

        let user = registry.create(Uuid::new_v4(), "ben", "LOBBY").unwrap();
        assert_eq!(user.room, "LOBBY");
    }

    #[test]
    fn test_one_user_per_connection() {
        let mut registry = UserRegistry::new();
        let id = Uuid::new_v4();

        registry.create(id, "ann", "one").unwrap();
        assert_eq!(registry.create(id, "ann2", "two"), Err(ChatError::AlreadyJoined));
        assert_eq!(registry.find(&id).map(|user| user.room_id.as_str()), Some("one"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = UserRegistry::new();
        let id = Uuid::new_v4();
        registry.create(id, "ann", "room").unwrap();

        let removed = registry.remove(&id).expect("user should be removed");
        assert_eq!(removed.username, "ann");
        assert!(registry.remove(&id).is_none());
        assert!(registry.remove(&Uuid::new_v4()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_by_room() {
        let mut registry = UserRegistry::new();
        registry.create(Uuid::new_v4(), "ann", "General").unwrap();
        registry.create(Uuid::new_v4(), "ben", "general").unwrap();
        registry.create(Uuid::new_v4(), "cat", "random").unwrap();

        assert_eq!(usernames(&registry, "general"), vec!["ann", "ben"]);
        assert_eq!(usernames(&registry, " GENERAL "), vec!["ann", "ben"]);
        assert_eq!(usernames(&registry, "random"), vec!["cat"]);
        assert!(registry.list_by_room("empty").is_empty());
    }
}
