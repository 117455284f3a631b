//! WebSocket gateway for the chat relay
//!
//! This module accepts connections, decodes inbound frames, hands them to the
//! chat session and fans outbound frames out to rooms.

mod connection;
mod pool;
mod protocol;
mod server;

pub use connection::{websocket_route, WsConnection};
pub use pool::{ConnectionPool, FrameSender};
pub use protocol::{Ack, ClientFrame, ClientMessage, ServerMessage, LOCATION_SHARED};
pub use server::ChatServer;
