//! Read-only views of room membership.
//!
//! Rooms have no storage of their own: a room is whatever set of users in the
//! registry shares a room id, so every roster is computed fresh from the
//! registry at the moment it is sent.

use serde::{Deserialize, Serialize};

use crate::chat::registry::{User, UserRegistry};

/// Canonical key for a room name.
pub fn room_id(room: &str) -> String {
    room.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub username: String,
}

/// Payload of the `roomData` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomData {
    pub room: String,
    pub users: Vec<RosterEntry>,
}

pub fn roster(registry: &UserRegistry, room_id: &str) -> Vec<RosterEntry> {
    registry
        .list_by_room(room_id)
        .into_iter()
        .map(|user| RosterEntry { username: user.username.clone() })
        .collect()
}

/// Roster of the room `user` belongs to, labelled with its display name.
pub fn room_data(registry: &UserRegistry, user: &User) -> RoomData {
    RoomData {
        room: user.room.clone(),
        users: roster(registry, &user.room_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_room_id_normalization() {
        assert_eq!(room_id("General"), "general");
        assert_eq!(room_id("  Rust Nerds \n"), "rust nerds");
        assert_eq!(room_id("ÜBER"), "über");
    }

    #[test]
    fn test_roster_reflects_registry() {
        let mut registry = UserRegistry::new();
        let ann = registry.create(Uuid::new_v4(), "ann", "Kitchen").unwrap();
        let ben = Uuid::new_v4();
        registry.create(ben, "ben", "kitchen").unwrap();
        registry.create(Uuid::new_v4(), "cat", "garden").unwrap();

        let data = room_data(&registry, &ann);
        let mut names: Vec<_> = data.users.iter().map(|entry| entry.username.as_str()).collect();
        names.sort();
        assert_eq!(data.room, "Kitchen");
        assert_eq!(names, vec!["ann", "ben"]);

        registry.remove(&ben);
        assert_eq!(roster(&registry, "kitchen"), vec![RosterEntry { username: "ann".to_string() }]);
    }

    #[test]
    fn test_room_data_wire_format() {
        let data = RoomData {
            room: "Kitchen".to_string(),
            users: vec![RosterEntry { username: "ann".to_string() }],
        };

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "room": "Kitchen", "users": [{ "username": "ann" }] })
        );
    }
}
