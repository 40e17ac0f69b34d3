//! `WebSocket` endpoint: admission, presence lifecycle, and per-connection
//! message loop.

use axum::Router;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::rooms::{ConnectionInfo, JoinError, Role, RoomTable};
use crate::state::AppState;

use super::envelope::{ServerEnvelope, ViewerIdentity};
use super::router::handle_message;

/// Application close codes (4000-range) for rejected admissions and
/// server-initiated eviction.
const CLOSE_ROOM_REQUIRED: u16 = 4001;
const CLOSE_HOST_EXISTS: u16 = 4002;
const CLOSE_ROOM_IDLE: u16 = 4003;

#[derive(Deserialize)]
struct WsQueryParams {
    room: Option<String>,
    username: Option<String>,
    role: Option<String>,
}

/// Build the signaling route group: `GET /ws`.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsQueryParams>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(state, params, socket))
}

/// Admit the connection into its room, run its message loop, and clean up.
async fn handle_connection(state: AppState, params: WsQueryParams, mut socket: WebSocket) {
    let room_id = match params.room.as_deref().map(str::trim) {
        Some(room) if !room.is_empty() => room.to_string(),
        _ => {
            close_with(&mut socket, CLOSE_ROOM_REQUIRED, "room id required").await;
            return;
        }
    };
    let username = params
        .username
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "Anonymous".to_string());
    let role = Role::from_query(params.role.as_deref());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let conn = match state.rooms.join(&room_id, role, &username, tx) {
        Ok(conn) => conn,
        Err(JoinError::HostExists) => {
            tracing::debug!(%room_id, "rejecting second host");
            close_with(
                &mut socket,
                CLOSE_HOST_EXISTS,
                "host already exists for requested room",
            )
            .await;
            return;
        }
    };

    tracing::info!(
        connection_id = %conn.id,
        room_id = %conn.room_id,
        role = conn.role.as_str(),
        username = %conn.display_name,
        "connection joined"
    );

    let (mut ws_sink, mut ws_stream) = socket.split();

    announce_join(&state.rooms, &conn);

    // Drive inbound frames and the outbound queue together. The queue closing
    // means the registry dropped this connection's sender (idle reap), so the
    // socket is closed with a reason instead of lingering half-open.
    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(msg) => {
                    if ws_sink.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                None => {
                    let frame = Message::Close(Some(CloseFrame {
                        code: CLOSE_ROOM_IDLE,
                        reason: "room closed for inactivity".to_string().into(),
                    }));
                    let _ = ws_sink.send(frame).await;
                    break;
                }
            },
            inbound = ws_stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    handle_message(&state.rooms, &conn, &text);
                }
                // Protocol keepalives count as activity even when the
                // signaling plane is quiet.
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    state.rooms.touch(&conn.id);
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    announce_leave(&state.rooms, &conn);
}

/// Post-join presence notifications: `welcome` to the joiner, then
/// `host-info`/`viewer-joined` or `viewers-list`/`host-joined` depending on
/// who was already in the room.
pub fn announce_join(rooms: &RoomTable, conn: &ConnectionInfo) {
    let welcome = ServerEnvelope::Welcome {
        user_id: conn.id.clone(),
        username: conn.display_name.clone(),
        room: conn.room_id.clone(),
        role: conn.role,
    };
    rooms.send_to(&conn.id, &welcome.to_json());

    match conn.role {
        Role::Viewer => {
            if let Some(host) = rooms.host_info(&conn.room_id) {
                let host_info = ServerEnvelope::HostInfo {
                    host_id: host.id.clone(),
                    host_name: host.display_name,
                };
                rooms.send_to(&conn.id, &host_info.to_json());

                let joined = ServerEnvelope::ViewerJoined {
                    viewer_id: conn.id.clone(),
                    viewer_name: conn.display_name.clone(),
                };
                rooms.send_to(&host.id, &joined.to_json());
            }
        }
        Role::Host => {
            let viewers = rooms.viewer_infos(&conn.room_id);
            if viewers.is_empty() {
                return;
            }
            let list = ServerEnvelope::ViewersList {
                viewers: viewers
                    .iter()
                    .map(|v| ViewerIdentity {
                        viewer_id: v.id.clone(),
                        viewer_name: v.display_name.clone(),
                    })
                    .collect(),
            };
            rooms.send_to(&conn.id, &list.to_json());

            let host_joined = ServerEnvelope::HostJoined {
                host_id: conn.id.clone(),
                host_name: conn.display_name.clone(),
            };
            let host_joined_json = host_joined.to_json();
            for viewer in viewers {
                rooms.send_to(&viewer.id, &host_joined_json);
            }
        }
    }
}

/// Unregister and notify remaining peers. `leave` is idempotent, so a close
/// racing an error (or the reaper) is safe.
pub fn announce_leave(rooms: &RoomTable, conn: &ConnectionInfo) {
    let Some(departure) = rooms.leave(&conn.id) else {
        return;
    };

    tracing::info!(
        connection_id = %departure.connection_id,
        room_id = %departure.room_id,
        role = departure.role.as_str(),
        room_deleted = departure.room_deleted,
        "connection left"
    );

    if departure.room_deleted {
        // Empty-room deletion is silent.
        return;
    }

    match departure.role {
        Role::Host => {
            rooms.broadcast_to_viewers(&departure.room_id, &ServerEnvelope::HostLeft.to_json());
        }
        Role::Viewer => {
            let left = ServerEnvelope::ViewerLeft {
                viewer_id: departure.connection_id,
            };
            rooms.send_to_host(&departure.room_id, &left.to_json());
        }
    }
}

async fn close_with(socket: &mut WebSocket, code: u16, reason: &str) {
    let frame = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    let _ = socket.send(frame).await;
}
