mod health;
mod rooms;

use axum::Router;

use crate::signaling::socket;
use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /health` — lightweight health check (used by Railway)
/// - `GET /ws` — the signaling `WebSocket` endpoint
/// - `/api/v1/rooms`, `/api/v1/status` — read-only views over the room table
pub fn router() -> Router<AppState> {
    let api_v1 = Router::new().merge(rooms::router());

    Router::new()
        .merge(health::router())
        .merge(socket::router())
        .nest("/api/v1", api_v1)
}
