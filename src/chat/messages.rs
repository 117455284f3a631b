use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::chat::registry::{ConnectionId, User};

pub const DEFAULT_MAPS_BASE_URL: &str = "https://google.com/maps";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessage {
    pub text: String,
    pub username: String,
    pub id: ConnectionId,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessage {
    pub text: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMessage {
    pub url: String,
    pub username: String,
    pub id: ConnectionId,
    pub created_at: i64,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn text(user: &User, body: &str) -> TextMessage {
    TextMessage {
        text: body.to_string(),
        username: user.username.clone(),
        id: user.id,
        created_at: now_millis(),
    }
}

pub fn system(body: impl Into<String>) -> SystemMessage {
    SystemMessage {
        text: body.into(),
        created_at: now_millis(),
    }
}

pub fn location(user: &User, coords: Coordinates, maps_base_url: &str) -> LocationMessage {
    LocationMessage {
        url: maps_url(maps_base_url, coords),
        username: user.username.clone(),
        id: user.id,
        created_at: now_millis(),
    }
}

pub fn maps_url(base: &str, Coordinates { lat, lng }: Coordinates) -> String {
    format!("{}?q={},{}", base, lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "ann".to_string(),
            room: "Kitchen".to_string(),
            room_id: "kitchen".to_string(),
        }
    }

    fn assert_recent(created_at: i64) {
        let delta = (Utc::now().timestamp_millis() - created_at).abs();
        assert!(delta < 1_000, "createdAt is {}ms away from now", delta);
    }

    #[test]
    fn test_text_message() {
        let user = user();
        let message = text(&user, "hello there");

        assert_eq!(message.text, "hello there");
        assert_eq!(message.username, "ann");
        assert_eq!(message.id, user.id);
        assert_recent(message.created_at);
    }

    #[test]
    fn test_system_message_has_no_author() {
        let message = system("ann has joined!");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["text"], "ann has joined!");
        assert!(json.get("username").is_none());
        assert!(json.get("id").is_none());
        assert_recent(json["createdAt"].as_i64().unwrap());
    }

    #[test]
    fn test_location_message() {
        let user = user();
        let message = location(&user, Coordinates { lat: 1.0, lng: 2.0 }, DEFAULT_MAPS_BASE_URL);

        assert!(message.url.contains("q=1,2"), "unexpected url {}", message.url);
        assert_eq!(message.url, "https://google.com/maps?q=1,2");
        assert_eq!(message.username, "ann");
        assert_eq!(message.id, user.id);
        assert_recent(message.created_at);
    }

    #[test]
    fn test_maps_url_keeps_precision() {
        let sydney = Coordinates { lat: -33.8688, lng: 151.2093 };
        let url = maps_url("https://maps.example.com", sydney);
        assert_eq!(url, "https://maps.example.com?q=-33.8688,151.2093");
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let user = user();
        let json = serde_json::to_value(text(&user, "hi")).unwrap();

        assert_eq!(json["id"], user.id.to_string());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
