pub mod chat;
pub mod config;
pub mod error;
pub mod websocket;

use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::{AppError, ChatError};
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use chat::{ProfanityFilter, Session, User, UserRegistry};
pub use websocket::{ChatServer, ConnectionPool};

/// Health check endpoint handler
/// Returns a JSON response with server status, timestamp and live connections
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "connections": state.chat.connection_count().await,
    }))
}

/// Routes served by the relay
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/ws", web::get().to(websocket::websocket_route));
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub chat: Arc<ChatServer>,
}

impl AppState {
    pub fn new(config: Settings) -> Self {
        let chat = ChatServer::from_settings(&config);

        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
        }
    }

    /// Same settings, caller-supplied chat server. Lets tests inject their
    /// own profanity policy.
    pub fn with_chat(config: Settings, chat: ChatServer) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(chat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::AllowAll;

    #[test]
    fn test_app_state_creation() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::new(config);

        assert_eq!(state.config.environment, "test");
        assert!(state.chat.filter.is_profane("damn"));
    }

    #[test]
    fn test_app_state_clone() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::with_chat(config, ChatServer::new(Arc::new(AllowAll)));

        let cloned = state.clone();

        // Verify Arc references are shared
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.chat, &cloned.chat));
    }
}
