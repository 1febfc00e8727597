use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::session_controller::SessionController;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub controller: Arc<SessionController>,
    close_signal: Arc<Notify>,
}

impl Connection {
    pub fn new(id: ConnectionId, controller: Arc<SessionController>) -> Self {
        let now = Instant::now();
        Self {
            id,
            connected_at: now,
            last_activity: now,
            controller,
            close_signal: Arc::new(Notify::new()),
        }
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }

    /// Resolves once the server asks this connection to close.
    pub fn close_signal(&self) -> Arc<Notify> {
        self.close_signal.clone()
    }
}

/// Live connections and the sessions they own.
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, id: ConnectionId, controller: Arc<SessionController>) -> Connection {
        let connection = Connection::new(id, controller);
        let mut connections = self.connections.write().await;
        connections.insert(id, connection.clone());
        connection
    }

    /// Forget a connection and stop its session clock.
    pub async fn remove_connection(&self, id: ConnectionId) {
        let removed = {
            let mut connections = self.connections.write().await;
            connections.remove(&id)
        };

        if let Some(connection) = removed {
            connection.controller.shutdown().await;
        }
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections.get(&id).cloned()
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Close connections that have been silent for longer than `timeout`.
    pub async fn cleanup_inactive_connections(&self, timeout: Duration) -> Vec<ConnectionId> {
        let inactive: Vec<Connection> = {
            let mut connections = self.connections.write().await;
            let ids: Vec<ConnectionId> = connections
                .values()
                .filter(|conn| conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect();
            ids.iter().filter_map(|id| connections.remove(id)).collect()
        };

        for connection in &inactive {
            info!("Closing inactive connection {}", connection.id);
            connection.controller.shutdown().await;
            connection.close_signal.notify_one();
        }

        inactive.into_iter().map(|conn| conn.id).collect()
    }

    /// Stop every session clock and ask all connections to close.
    pub async fn shutdown_all(&self) {
        let connections: Vec<Connection> = {
            let mut connections = self.connections.write().await;
            connections.drain().map(|(_, conn)| conn).collect()
        };

        for connection in connections {
            connection.controller.shutdown().await;
            connection.close_signal.notify_one();
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
