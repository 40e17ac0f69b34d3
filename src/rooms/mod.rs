//! In-memory room table for `WebSocket` signaling relay.
//!
//! Tracks active connections per room, supporting the host (one per room) and
//! viewers (many per room). Rooms are created lazily on first join and removed
//! when their last member leaves, so a room exists in the table if and only if
//! it has at least one member.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound channel feeding a connection's `WebSocket` send task.
pub type WsTx = mpsc::UnboundedSender<String>;

/// Role a connection holds within its room, fixed at join time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Viewer,
}

impl Role {
    /// Parse the `role` query parameter. Anything other than `host`
    /// (case-insensitive) is treated as a viewer.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("host") => Self::Host,
            _ => Self::Viewer,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Viewer => "viewer",
        }
    }
}

/// One live transport endpoint. Owned exclusively by the session index; the
/// room map references connections by id only.
#[derive(Debug)]
struct Connection {
    id: String,
    room_id: String,
    display_name: String,
    role: Role,
    connected_at: DateTime<Utc>,
    last_seen: Instant,
    tx: WsTx,
}

/// Identity assigned to a connection at join time.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: String,
    pub room_id: String,
    pub display_name: String,
    pub role: Role,
}

/// Membership of a single room: at most one host plus a set of viewers.
#[derive(Debug, Default)]
struct Room {
    host: Option<String>,
    viewers: HashSet<String>,
}

impl Room {
    fn is_empty(&self) -> bool {
        self.host.is_none() && self.viewers.is_empty()
    }

    fn remove(&mut self, connection_id: &str) {
        if self.host.as_deref() == Some(connection_id) {
            self.host = None;
        } else {
            self.viewers.remove(connection_id);
        }
    }

    fn member_ids(&self) -> impl Iterator<Item = &String> {
        self.host.iter().chain(self.viewers.iter())
    }
}

/// Why a join attempt was refused. No state is mutated on rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    /// The room already has a live host.
    HostExists,
}

/// What `leave` observed, so the caller can notify remaining peers.
#[derive(Debug, Clone)]
pub struct Departure {
    pub connection_id: String,
    pub room_id: String,
    pub display_name: String,
    pub role: Role,
    /// True when this departure emptied the room and it was deleted.
    pub room_deleted: bool,
}

/// Read-only view of one member, for presence queries and the HTTP surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSnapshot {
    pub id: String,
    pub username: String,
    pub connected_at: DateTime<Utc>,
}

/// Read-only view of a room. Owned data only — never live references into
/// the table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: String,
    pub host: Option<MemberSnapshot>,
    pub viewers: Vec<MemberSnapshot>,
    pub viewer_count: usize,
}

/// One row of the room listing endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListing {
    pub id: String,
    pub viewer_count: usize,
    pub has_host: bool,
}

/// Tracks all rooms and their connections. All mutation funnels through this
/// service; per-room serialization comes from the `DashMap` entry locks.
#[derive(Debug, Clone, Default)]
pub struct RoomTable {
    /// `room_id` → membership (connection ids only)
    rooms: Arc<DashMap<String, Room>>,
    /// `connection_id` → connection record (session index)
    conns: Arc<DashMap<String, Connection>>,
}

impl RoomTable {
    /// Create a new empty room table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            conns: Arc::new(DashMap::new()),
        }
    }

    /// Register a connection in a room, creating the room if absent.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::HostExists`] when `role` is host and the room
    /// already has one. Two concurrent host joins on the same room are
    /// serialized by the room's entry lock, so exactly one succeeds.
    pub fn join(
        &self,
        room_id: &str,
        role: Role,
        display_name: &str,
        tx: WsTx,
    ) -> Result<ConnectionInfo, JoinError> {
        let id = Uuid::new_v4().to_string();
        let conn = Connection {
            id: id.clone(),
            room_id: room_id.to_string(),
            display_name: display_name.to_string(),
            role,
            connected_at: Utc::now(),
            last_seen: Instant::now(),
            tx,
        };

        // Index the connection before touching the room so a member id found
        // in a room always resolves; rolled back below if the join is refused.
        self.conns.insert(id.clone(), conn);

        match self.rooms.entry(room_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if role == Role::Host && occupied.get().host.is_some() {
                    drop(occupied);
                    self.conns.remove(&id);
                    return Err(JoinError::HostExists);
                }
                let room = occupied.get_mut();
                match role {
                    Role::Host => room.host = Some(id.clone()),
                    Role::Viewer => {
                        room.viewers.insert(id.clone());
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let mut room = Room::default();
                match role {
                    Role::Host => room.host = Some(id.clone()),
                    Role::Viewer => {
                        room.viewers.insert(id.clone());
                    }
                }
                vacant.insert(room);
            }
        }

        Ok(ConnectionInfo {
            id,
            room_id: room_id.to_string(),
            display_name: display_name.to_string(),
            role,
        })
    }

    /// Remove a connection from its room, deleting the room if it is now
    /// empty. Idempotent: a second call for the same id returns `None`.
    pub fn leave(&self, connection_id: &str) -> Option<Departure> {
        let (_, conn) = self.conns.remove(connection_id)?;

        let mut room_deleted = false;
        if let Entry::Occupied(mut occupied) = self.rooms.entry(conn.room_id.clone()) {
            occupied.get_mut().remove(connection_id);
            if occupied.get().is_empty() {
                occupied.remove();
                room_deleted = true;
            }
        }

        Some(Departure {
            connection_id: conn.id,
            room_id: conn.room_id,
            display_name: conn.display_name,
            role: conn.role,
            room_deleted,
        })
    }

    /// Resolve a connection id to its room and role across the whole table.
    #[must_use]
    pub fn find_connection(&self, connection_id: &str) -> Option<(String, Role)> {
        self.conns
            .get(connection_id)
            .map(|c| (c.room_id.clone(), c.role))
    }

    /// Identity of a connection, if still live.
    #[must_use]
    pub fn peer_info(&self, connection_id: &str) -> Option<ConnectionInfo> {
        self.conns.get(connection_id).map(|c| ConnectionInfo {
            id: c.id.clone(),
            room_id: c.room_id.clone(),
            display_name: c.display_name.clone(),
            role: c.role,
        })
    }

    /// Identity of a room's current host, if any.
    #[must_use]
    pub fn host_info(&self, room_id: &str) -> Option<ConnectionInfo> {
        let host_id = self.rooms.get(room_id)?.host.clone()?;
        self.peer_info(&host_id)
    }

    /// Identities of a room's current viewers.
    #[must_use]
    pub fn viewer_infos(&self, room_id: &str) -> Vec<ConnectionInfo> {
        let Some(room) = self.rooms.get(room_id) else {
            return Vec::new();
        };
        room.viewers
            .iter()
            .filter_map(|id| self.peer_info(id))
            .collect()
    }

    /// Read-only snapshot of a room. `None` means the room has no members.
    #[must_use]
    pub fn lookup(&self, room_id: &str) -> Option<RoomSnapshot> {
        let room = self.rooms.get(room_id)?;
        let host = room.host.as_ref().and_then(|id| self.member_snapshot(id));
        let viewers: Vec<MemberSnapshot> = room
            .viewers
            .iter()
            .filter_map(|id| self.member_snapshot(id))
            .collect();
        let viewer_count = viewers.len();
        Some(RoomSnapshot {
            id: room_id.to_string(),
            host,
            viewers,
            viewer_count,
        })
    }

    fn member_snapshot(&self, connection_id: &str) -> Option<MemberSnapshot> {
        self.conns.get(connection_id).map(|c| MemberSnapshot {
            id: c.id.clone(),
            username: c.display_name.clone(),
            connected_at: c.connected_at,
        })
    }

    /// Refresh a connection's activity timestamp on inbound traffic.
    pub fn touch(&self, connection_id: &str) {
        if let Some(mut conn) = self.conns.get_mut(connection_id) {
            conn.last_seen = Instant::now();
        }
    }

    /// Send a message to a specific connection. A vanished target is a
    /// silent no-op.
    pub fn send_to(&self, connection_id: &str, message: &str) {
        if let Some(conn) = self.conns.get(connection_id) {
            let _ = conn.tx.send(message.to_string());
        }
    }

    /// Send a message to the host of a room, if one is connected.
    pub fn send_to_host(&self, room_id: &str, message: &str) {
        if let Some(room) = self.rooms.get(room_id)
            && let Some(host_id) = room.host.clone()
        {
            drop(room);
            self.send_to(&host_id, message);
        }
    }

    /// Send a message to every viewer in a room (not the host).
    pub fn broadcast_to_viewers(&self, room_id: &str, message: &str) {
        for id in self.viewer_ids(room_id) {
            self.send_to(&id, message);
        }
    }

    /// Send a message to every member of a room, optionally excluding one
    /// connection (typically the sender).
    pub fn broadcast_to_room(&self, room_id: &str, exclude: Option<&str>, message: &str) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        let ids: Vec<String> = room
            .member_ids()
            .filter(|id| Some(id.as_str()) != exclude)
            .cloned()
            .collect();
        drop(room);
        for id in ids {
            self.send_to(&id, message);
        }
    }

    fn viewer_ids(&self, room_id: &str) -> Vec<String> {
        self.rooms
            .get(room_id)
            .map(|room| room.viewers.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove rooms with no member active within `stale_after`, dropping
    /// their connections so any lingering transport tasks unwind. Returns
    /// the ids of the rooms removed.
    ///
    /// A candidate that disappears (or livens up) between the scan and the
    /// removal decision is skipped — the ordinary `leave` path got there
    /// first, which is success, not a fault.
    pub fn reap_idle(&self, stale_after: Duration) -> Vec<String> {
        let now = Instant::now();
        let candidates: Vec<String> = self
            .rooms
            .iter()
            .filter(|entry| !self.has_live_member(entry.value(), now, stale_after))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = Vec::new();
        for room_id in candidates {
            if let Entry::Occupied(occupied) = self.rooms.entry(room_id.clone()) {
                // Re-check under the entry lock: a member may have become
                // active (or joined) since the scan.
                if self.has_live_member(occupied.get(), Instant::now(), stale_after) {
                    continue;
                }
                let (_, room) = occupied.remove_entry();
                for id in room.host.into_iter().chain(room.viewers) {
                    self.conns.remove(&id);
                }
                removed.push(room_id);
            }
        }
        removed
    }

    fn has_live_member(&self, room: &Room, now: Instant, stale_after: Duration) -> bool {
        room.member_ids().any(|id| {
            self.conns
                .get(id)
                .is_some_and(|c| now.duration_since(c.last_seen) < stale_after)
        })
    }

    /// Number of rooms currently in the table.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of live connections across all rooms.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.conns.len()
    }

    /// Listing rows for every current room.
    #[must_use]
    pub fn list_rooms(&self) -> Vec<RoomListing> {
        self.rooms
            .iter()
            .map(|entry| RoomListing {
                id: entry.key().clone(),
                viewer_count: entry.value().viewers.len(),
                has_host: entry.value().host.is_some(),
            })
            .collect()
    }
}
