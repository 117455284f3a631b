use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::chat::Session;
use crate::config::ChatConfig;
use crate::error::WebSocketError;
use crate::websocket::{ClientFrame, ServerMessage};
use crate::AppState;

/// WebSocket connection handler
/// This upgrades the HTTP connection and binds it to a fresh chat session
pub async fn websocket_route(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> crate::Result<HttpResponse> {
    let peer_addr = req.peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    info!("New WebSocket connection request from: {}", peer_addr);

    let (tx, rx) = mpsc::unbounded_channel();
    let session = state.chat.connect(tx).await;
    let connection = WsConnection::new(session.clone(), rx, peer_addr.clone(), &state.config.chat);

    match ws::start(connection, &req, stream) {
        Ok(response) => Ok(response),
        Err(e) => {
            // The actor never started, so nothing else will clean up
            warn!("WebSocket handshake with {} failed: {}", peer_addr, e);
            session.disconnect().await;
            Err(WebSocketError::HandshakeFailed(e.to_string()).into())
        }
    }
}

/// Actor owning one client socket. Inbound frames go to the chat session;
/// frames the chat server queues for this connection are written back out.
pub struct WsConnection {
    session: Arc<Session>,
    outbound: Option<mpsc::UnboundedReceiver<String>>,
    peer_addr: String,
    last_heartbeat: Instant,
    heartbeat_interval: Duration,
    client_timeout: Duration,
}

impl WsConnection {
    pub fn new(
        session: Arc<Session>,
        outbound: mpsc::UnboundedReceiver<String>,
        peer_addr: String,
        config: &ChatConfig,
    ) -> Self {
        Self {
            session,
            outbound: Some(outbound),
            peer_addr,
            last_heartbeat: Instant::now(),
            heartbeat_interval: config.heartbeat_interval(),
            client_timeout: config.client_timeout(),
        }
    }

    /// Decode a text frame and run it through the session
    fn handle_websocket_message(&mut self, text: &str, ctx: &mut <Self as Actor>::Context) {
        let ClientFrame { ack, event } = match ClientFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to parse message from {}: {}", self.peer_addr, e);
                self.send_error(ctx, &e.to_string());
                return;
            }
        };

        let session = self.session.clone();

        // Stop reading the socket until this request is done so a client's
        // requests are applied in the order it sent them
        async move { session.handle(event).await }
            .into_actor(self)
            .map(move |result, act, ctx| {
                if let Some(id) = ack {
                    act.send_server_message(ctx, &result.into_message(id));
                }
            })
            .wait(ctx);
    }

    /// Send a server message to the client
    fn send_server_message(&self, ctx: &mut <Self as Actor>::Context, msg: &ServerMessage) {
        match msg.to_json() {
            Ok(json_str) => {
                ctx.text(json_str);
            }
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
            }
        }
    }

    /// Send an error message to the client
    fn send_error(&self, ctx: &mut <Self as Actor>::Context, message: &str) {
        self.send_server_message(ctx, &ServerMessage::Error {
            message: message.to_string()
        });
    }

    /// Ping the client periodically and drop it once it stops answering
    fn start_heartbeat(&self, ctx: &mut <Self as Actor>::Context) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > act.client_timeout {
                warn!("Heartbeat timeout for connection {} ({})", act.session.id(), act.peer_addr);
                ctx.stop();
                return;
            }

            ctx.ping(b"");
        });
    }
}

impl Actor for WsConnection {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            "WebSocket connection established with {} (id: {})",
            self.peer_addr,
            self.session.id()
        );

        self.start_heartbeat(ctx);

        if let Some(outbound) = self.outbound.take() {
            ctx.add_stream(futures::stream::unfold(outbound, |mut rx| async move {
                rx.recv().await.map(|frame| (frame, rx))
            }));
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!("WebSocket connection closed with {} (id: {})", self.peer_addr, self.session.id());

        let session = self.session.clone();
        actix_rt::spawn(async move {
            session.disconnect().await;
        });
    }
}

/// Frames queued for this connection by the chat server
impl StreamHandler<String> for WsConnection {
    fn handle(&mut self, frame: String, ctx: &mut Self::Context) {
        ctx.text(frame);
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        // The pool dropped our sender
        ctx.stop();
    }
}

/// Implement the StreamHandler trait to process WebSocket messages
impl StreamHandler<std::result::Result<ws::Message, ws::ProtocolError>> for WsConnection {
    fn handle(
        &mut self,
        msg: std::result::Result<ws::Message, ws::ProtocolError>,
        ctx: &mut Self::Context,
    ) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                self.handle_websocket_message(&text, ctx);
            }
            Ok(ws::Message::Binary(bin)) => {
                info!("Received binary message from {} of {} bytes", self.peer_addr, bin.len());
                self.send_error(ctx, "Binary messages are not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                info!("WebSocket closed from {}: {:?}", self.peer_addr, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {
                // Continuation and Nop frames carry nothing for us
            }
            Err(e) => {
                error!("Error handling WebSocket message from {}: {}", self.peer_addr, e);
                ctx.stop();
            }
        }
    }
}
