//! Routes decoded inbound envelopes to relay, presence, and query handling.
//!
//! Failure policy follows the connection contract: malformed messages are
//! dropped, routing misses (target already gone) are dropped, and an
//! unrecognized `type` gets an explicit `error` reply. Nothing here closes
//! the connection.

use serde_json::Value;

use crate::rooms::{ConnectionInfo, Role, RoomTable};

use super::envelope::{ClientEnvelope, DecodeError, ServerEnvelope};

/// The three WebRTC handshake payloads share one relay rule.
enum RelayPayload {
    Offer(String),
    Answer(String),
    IceCandidate(Value),
}

/// Handle one inbound text frame from a registered connection.
pub fn handle_message(rooms: &RoomTable, sender: &ConnectionInfo, text: &str) {
    // A reaped connection can still have frames in flight; it no longer
    // speaks for its room, which may since have new members.
    if rooms.find_connection(&sender.id).is_none() {
        tracing::debug!(connection_id = %sender.id, "dropping message from unregistered connection");
        return;
    }
    rooms.touch(&sender.id);

    let envelope = match ClientEnvelope::decode(text) {
        Ok(envelope) => envelope,
        Err(DecodeError::Malformed) => {
            tracing::debug!(connection_id = %sender.id, "dropping malformed message");
            return;
        }
        Err(DecodeError::UnknownType(kind)) => {
            tracing::debug!(connection_id = %sender.id, %kind, "unknown message type");
            let reply = ServerEnvelope::Error {
                message: format!("unknown message type: {kind}"),
            };
            rooms.send_to(&sender.id, &reply.to_json());
            return;
        }
    };

    match envelope {
        ClientEnvelope::Offer { target, sdp } => {
            relay(rooms, sender, target.as_deref(), RelayPayload::Offer(sdp));
        }
        ClientEnvelope::Answer { target, sdp } => {
            relay(rooms, sender, target.as_deref(), RelayPayload::Answer(sdp));
        }
        ClientEnvelope::IceCandidate { target, candidate } => {
            relay(
                rooms,
                sender,
                target.as_deref(),
                RelayPayload::IceCandidate(candidate),
            );
        }
        ClientEnvelope::ScreenRequest => {
            // Viewers ask the host to start sharing; a host sending this is
            // dropped.
            if sender.role == Role::Viewer {
                let request = ServerEnvelope::ScreenRequest {
                    viewer_id: sender.id.clone(),
                    viewer_name: sender.display_name.clone(),
                };
                rooms.send_to_host(&sender.room_id, &request.to_json());
            }
        }
        ClientEnvelope::ScreenSharingStarted => {
            notify_sharing(rooms, sender, true);
        }
        ClientEnvelope::ScreenSharingStopped => {
            notify_sharing(rooms, sender, false);
        }
        ClientEnvelope::Chat { message } => {
            broadcast_to_others(
                rooms,
                sender,
                &ServerEnvelope::Chat {
                    sender: sender.id.clone(),
                    sender_name: sender.display_name.clone(),
                    message,
                },
            );
        }
        ClientEnvelope::Play => {
            broadcast_to_others(
                rooms,
                sender,
                &ServerEnvelope::Play {
                    sender: sender.id.clone(),
                },
            );
        }
        ClientEnvelope::Pause => {
            broadcast_to_others(
                rooms,
                sender,
                &ServerEnvelope::Pause {
                    sender: sender.id.clone(),
                },
            );
        }
        ClientEnvelope::Seek { time } => {
            broadcast_to_others(
                rooms,
                sender,
                &ServerEnvelope::Seek {
                    sender: sender.id.clone(),
                    time,
                },
            );
        }
        ClientEnvelope::VideoChange { url } => {
            broadcast_to_others(
                rooms,
                sender,
                &ServerEnvelope::VideoChange {
                    sender: sender.id.clone(),
                    url,
                },
            );
        }
        ClientEnvelope::Ping => {
            rooms.send_to(&sender.id, &ServerEnvelope::Pong.to_json());
        }
        ClientEnvelope::GetRoomInfo => {
            let (host, viewers) = rooms
                .lookup(&sender.room_id)
                .map_or((None, Vec::new()), |snapshot| {
                    (snapshot.host, snapshot.viewers)
                });
            let viewer_count = viewers.len();
            let info = ServerEnvelope::RoomInfo {
                host,
                viewers,
                viewer_count,
            };
            rooms.send_to(&sender.id, &info.to_json());
        }
    }
}

/// Relay a handshake payload to its peer.
///
/// When the sender is the host, `target` names a viewer and is required;
/// when the sender is a viewer, the target is implicitly the room's host and
/// any explicit `target` is ignored. A target that is missing, no longer
/// live, or outside the sender's room is dropped silently — a peer may
/// legitimately have left.
fn relay(rooms: &RoomTable, sender: &ConnectionInfo, target: Option<&str>, payload: RelayPayload) {
    let target_id = match sender.role {
        Role::Host => {
            let Some(target) = target else {
                tracing::debug!(connection_id = %sender.id, "host relay without target");
                return;
            };
            match rooms.find_connection(target) {
                Some((room_id, _)) if room_id == sender.room_id => target.to_string(),
                _ => return,
            }
        }
        Role::Viewer => match rooms.host_info(&sender.room_id) {
            Some(host) => host.id,
            None => return,
        },
    };

    let outbound = match payload {
        RelayPayload::Offer(sdp) => ServerEnvelope::Offer {
            sender: sender.id.clone(),
            sender_name: sender.display_name.clone(),
            sdp,
        },
        RelayPayload::Answer(sdp) => ServerEnvelope::Answer {
            sender: sender.id.clone(),
            sender_name: sender.display_name.clone(),
            sdp,
        },
        RelayPayload::IceCandidate(candidate) => ServerEnvelope::IceCandidate {
            sender: sender.id.clone(),
            sender_name: sender.display_name.clone(),
            candidate,
        },
    };
    rooms.send_to(&target_id, &outbound.to_json());
}

/// Sharing start/stop announcements go from the host to every viewer.
fn notify_sharing(rooms: &RoomTable, sender: &ConnectionInfo, started: bool) {
    if sender.role != Role::Host {
        return;
    }
    let notice = if started {
        ServerEnvelope::ScreenSharingStarted {
            host_id: sender.id.clone(),
            host_name: sender.display_name.clone(),
        }
    } else {
        ServerEnvelope::ScreenSharingStopped {
            host_id: sender.id.clone(),
            host_name: sender.display_name.clone(),
        }
    };
    rooms.broadcast_to_viewers(&sender.room_id, &notice.to_json());
}

fn broadcast_to_others(rooms: &RoomTable, sender: &ConnectionInfo, envelope: &ServerEnvelope) {
    rooms.broadcast_to_room(&sender.room_id, Some(&sender.id), &envelope.to_json());
}
