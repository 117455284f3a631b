use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};
use crate::chat::ConnectionId;
use crate::error::WebSocketError;
use tracing::{debug, error, info};

/// Outbound half of a connection. Frames are already serialized JSON.
pub type FrameSender = mpsc::UnboundedSender<String>;

#[derive(Debug, Default)]
struct PoolState {
    connections: HashMap<ConnectionId, FrameSender>,
    groups: HashMap<String, HashSet<ConnectionId>>,
}

/// Live connections and the fan-out groups they are subscribed to.
///
/// Sends never wait on the peer: each connection drains its own unbounded
/// queue, so a slow client cannot stall a broadcast.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    state: RwLock<PoolState>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, id: ConnectionId, sender: FrameSender) {
        self.state.write().await.connections.insert(id, sender);
        info!("Added connection {} to pool", id);
    }

    /// Drops the connection and all of its group subscriptions.
    pub async fn remove(&self, id: &ConnectionId) -> bool {
        let mut state = self.state.write().await;
        let removed = state.connections.remove(id).is_some();

        state.groups.retain(|_, members| {
            members.remove(id);
            !members.is_empty()
        });

        if removed {
            info!("Removed connection {} from pool", id);
        }
        removed
    }

    pub async fn join_group(&self, id: ConnectionId, group: &str) -> Result<(), WebSocketError> {
        let mut state = self.state.write().await;
        if !state.connections.contains_key(&id) {
            return Err(WebSocketError::ConnectionNotFound(id));
        }

        state.groups.entry(group.to_string()).or_default().insert(id);
        debug!("Connection {} joined group {}", id, group);
        Ok(())
    }

    pub async fn send_to(&self, id: &ConnectionId, msg: &str) -> Result<(), WebSocketError> {
        if let Some(sender) = self.state.read().await.connections.get(id) {
            sender
                .send(msg.to_string())
                .map_err(|e| WebSocketError::SendError(e.to_string()))?;
            Ok(())
        } else {
            Err(WebSocketError::ConnectionNotFound(*id))
        }
    }

    /// Sends to every member of `group` except `exclude_id`. Returns the
    /// number of connections the frame was queued for.
    pub async fn send_to_group(
        &self,
        group: &str,
        msg: &str,
        exclude_id: Option<ConnectionId>,
    ) -> usize {
        let state = self.state.read().await;
        let Some(members) = state.groups.get(group) else {
            return 0;
        };

        let mut delivered = 0;
        for id in members {
            if Some(*id) == exclude_id {
                continue;
            }

            match state.connections.get(id) {
                Some(sender) => {
                    if let Err(e) = sender.send(msg.to_string()) {
                        error!("Failed to send to connection {}: {}", id, e);
                    } else {
                        delivered += 1;
                    }
                }
                None => error!("Group {} references unknown connection {}", group, id),
            }
        }

        debug!("Fanned out frame to {} connection(s) in group {}", delivered, group);
        delivered
    }

    #[cfg(test)]
    pub async fn group_members(&self, group: &str) -> Vec<ConnectionId> {
        self.state
            .read()
            .await
            .groups
            .get(group)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }
}
