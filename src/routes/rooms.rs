use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::AppError;
use crate::rooms::{RoomListing, RoomSnapshot};
use crate::state::AppState;
use crate::utils::generate_room_code;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the read-only room route group: `/rooms/...` and `/status`.
///
/// These are thin views over the room table's `lookup`; rooms themselves are
/// created on first `WebSocket` join, never over HTTP.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room_code))
        .route("/rooms/{room_id}", get(get_room))
        .route("/status", get(server_status))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomResponse {
    room_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    active_rooms: usize,
    active_connections: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/rooms` — List all current rooms.
async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomListing>> {
    Json(state.rooms.list_rooms())
}

/// `GET /api/v1/rooms/{roomId}` — Snapshot of one room.
///
/// 404 means the room has no members — rooms exist only while occupied.
async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    state
        .rooms
        .lookup(&room_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Room not found.".to_string()))
}

/// `POST /api/v1/rooms` — Hand out a fresh unused room code.
///
/// Creates no server state; the room is born when its first member connects.
async fn create_room_code(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), AppError> {
    for _ in 0..20 {
        let code = generate_room_code();
        if state.rooms.lookup(&code).is_none() {
            return Ok((StatusCode::CREATED, Json(CreateRoomResponse { room_id: code })));
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "Failed to generate unused room code after 20 attempts"
    )))
}

/// `GET /api/v1/status` — Coordinator-wide counters.
async fn server_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        active_rooms: state.rooms.room_count(),
        active_connections: state.rooms.connection_count(),
    })
}
