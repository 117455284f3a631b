use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] WebSocketError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// Add conversion from std::io::Error
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

// Implement actix_web::ResponseError for AppError
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": message
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::WebSocketError(
                WebSocketError::InvalidFormat(_) | WebSocketError::HandshakeFailed(_),
            ) => StatusCode::BAD_REQUEST,
            AppError::WebSocketError(WebSocketError::ConnectionNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum WebSocketError {
    #[error("Connection {0} not found")]
    ConnectionNotFound(Uuid),

    #[error("Message sending failed: {0}")]
    SendError(String),

    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),
}

/// Errors a client can recover from. They never close the connection; they
/// are only reported back through the acknowledgement of the request that
/// caused them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Username and room are required!")]
    Validation,

    #[error("Username is in use!")]
    DuplicateUsername,

    #[error("Profanity is not allowed!")]
    Profanity,

    #[error("You must join a room first!")]
    NotJoined,

    #[error("You have already joined a room!")]
    AlreadyJoined,

    #[error("Connection is closed")]
    Closed,
}
