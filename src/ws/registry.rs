//! Live connection registry with room membership and fan-out.
//!
//! Tracks every open WebSocket connection, groups them into rooms, and
//! delivers payloads either to one client or to a whole room. All
//! registry mutation happens under a single `RwLock` critical section;
//! a failed delivery transitions that one connection to closed and
//! deregisters it from the map and every room without aborting the
//! rest of the broadcast.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::domain::{ClientId, Room};

#[derive(Debug)]
struct ConnectionHandle {
    sender: UnboundedSender<serde_json::Value>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    connections: HashMap<ClientId, ConnectionHandle>,
    rooms: HashMap<Room, HashSet<ClientId>>,
}

impl RegistryInner {
    /// Removes a connection from the map and every room. Idempotent.
    fn purge(&mut self, client_id: ClientId) {
        self.connections.remove(&client_id);
        for members in self.rooms.values_mut() {
            members.remove(&client_id);
        }
    }
}

/// Process-wide registry of live connections and their rooms.
///
/// # Concurrency
///
/// Connect, disconnect, room changes, and broadcast all serialize on
/// the inner lock. Per-connection delivery order follows send call
/// order (each connection drains its own queue); no ordering is
/// guaranteed across distinct connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection: assigns a client id, joins the
    /// public room, and queues a `connection_established` ack as the
    /// first outbound message. Returns the receiving end the socket
    /// task drains.
    pub async fn register(&self) -> (ClientId, UnboundedReceiver<serde_json::Value>) {
        let client_id = ClientId::new();
        let (sender, receiver) = mpsc::unbounded_channel();

        let ack = serde_json::json!({
            "type": "connection_established",
            "client_id": client_id,
            "room": Room::Public,
            "timestamp": chrono::Utc::now(),
        });
        let _ = sender.send(ack);

        let mut inner = self.inner.write().await;
        inner.connections.insert(client_id, ConnectionHandle { sender });
        inner.rooms.entry(Room::Public).or_default().insert(client_id);
        tracing::debug!(%client_id, total = inner.connections.len(), "connection registered");

        (client_id, receiver)
    }

    /// Adds the client to a room. Unknown clients are a no-op.
    pub async fn join_room(&self, client_id: ClientId, room: Room) {
        let mut inner = self.inner.write().await;
        if inner.connections.contains_key(&client_id) {
            inner.rooms.entry(room).or_default().insert(client_id);
        }
    }

    /// Removes the client from a room. No-op if absent.
    pub async fn leave_room(&self, client_id: ClientId, room: Room) {
        let mut inner = self.inner.write().await;
        if let Some(members) = inner.rooms.get_mut(&room) {
            members.remove(&client_id);
        }
    }

    /// Sends a payload to one client. A failed send means the receiver
    /// is gone: the connection is deregistered and `false` is returned.
    pub async fn send_personal(&self, client_id: ClientId, payload: serde_json::Value) -> bool {
        let mut inner = self.inner.write().await;
        let Some(handle) = inner.connections.get(&client_id) else {
            return false;
        };
        if handle.sender.send(payload).is_err() {
            inner.purge(client_id);
            tracing::debug!(%client_id, "dead connection removed on personal send");
            return false;
        }
        true
    }

    /// Delivers a payload to every member of `room`, or to every
    /// connection when `room` is `None`.
    ///
    /// Partial failure is tolerated: each dead connection is removed
    /// from the map and all rooms, and the remaining targets still
    /// receive the payload. Returns the number of successful
    /// deliveries.
    pub async fn broadcast(&self, room: Option<Room>, payload: &serde_json::Value) -> usize {
        let mut inner = self.inner.write().await;

        let targets: Vec<ClientId> = match room {
            Some(room) => inner
                .rooms
                .get(&room)
                .map(|members| members.iter().copied().collect())
                .unwrap_or_default(),
            None => inner.connections.keys().copied().collect(),
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for client_id in targets {
            match inner.connections.get(&client_id) {
                Some(handle) if handle.sender.send(payload.clone()).is_ok() => delivered += 1,
                Some(_) => dead.push(client_id),
                None => {}
            }
        }
        for client_id in dead {
            inner.purge(client_id);
            tracing::debug!(%client_id, "dead connection removed during broadcast");
        }

        delivered
    }

    /// Deregisters a connection from the map and every room.
    /// Idempotent.
    pub async fn disconnect(&self, client_id: ClientId) {
        let mut inner = self.inner.write().await;
        inner.purge(client_id);
        tracing::debug!(%client_id, total = inner.connections.len(), "connection closed");
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Number of members in a room.
    pub async fn room_size(&self, room: Room) -> usize {
        self.inner
            .read()
            .await
            .rooms
            .get(&room)
            .map_or(0, HashSet::len)
    }
}
