#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use paircast_api::rooms::Role;
use tokio::sync::mpsc;

// ──────────────────────────────────────────────────────────────────────────────
// GET /api/v1/rooms — Listing
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_rooms_empty() {
    let (app, _state) = common::test_app();
    let (status, body) = common::get(&app, "/api/v1/rooms").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn list_rooms_reflects_membership() {
    let (app, state) = common::test_app();
    let (tx_a, _rx_a) = mpsc::unbounded_channel();
    let (tx_b, _rx_b) = mpsc::unbounded_channel();
    state.rooms.join("movie1", Role::Host, "Alice", tx_a).unwrap();
    state.rooms.join("movie1", Role::Viewer, "Bob", tx_b).unwrap();

    let (status, body) = common::get(&app, "/api/v1/rooms").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let rooms = json.as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["id"], "movie1");
    assert_eq!(rooms[0]["viewerCount"], 1);
    assert_eq!(rooms[0]["hasHost"], true);
}

// ──────────────────────────────────────────────────────────────────────────────
// GET /api/v1/rooms/{roomId} — Snapshot
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_room_snapshot() {
    let (app, state) = common::test_app();
    let (tx, _rx) = mpsc::unbounded_channel();
    state.rooms.join("movie1", Role::Host, "Alice", tx).unwrap();

    let (status, body) = common::get(&app, "/api/v1/rooms/movie1").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["id"], "movie1");
    assert_eq!(json["host"]["username"], "Alice");
    assert_eq!(json["viewerCount"], 0);
}

#[tokio::test]
async fn get_room_not_found() {
    let (app, _state) = common::test_app();
    let (status, body) = common::get(&app, "/api/v1/rooms/ghost").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn emptied_room_disappears_from_the_surface() {
    let (app, state) = common::test_app();
    let (tx, _rx) = mpsc::unbounded_channel();
    let conn = state.rooms.join("movie1", Role::Host, "Alice", tx).unwrap();

    let (status, _body) = common::get(&app, "/api/v1/rooms/movie1").await;
    assert_eq!(status, StatusCode::OK);

    state.rooms.leave(&conn.id);

    let (status, _body) = common::get(&app, "/api/v1/rooms/movie1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ──────────────────────────────────────────────────────────────────────────────
// POST /api/v1/rooms — Room-code metadata
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_room_code_returns_unused_code() {
    let (app, state) = common::test_app();
    let (status, body) = common::post(&app, "/api/v1/rooms").await;

    assert_eq!(status, StatusCode::CREATED);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let code = json["roomId"].as_str().unwrap();
    assert!(paircast_api::utils::is_valid_room_code(code));

    // Metadata only: no room was created.
    assert_eq!(state.rooms.room_count(), 0);
}

// ──────────────────────────────────────────────────────────────────────────────
// GET /api/v1/status — Counters
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn status_reports_counts() {
    let (app, state) = common::test_app();
    let (tx_a, _rx_a) = mpsc::unbounded_channel();
    let (tx_b, _rx_b) = mpsc::unbounded_channel();
    state.rooms.join("movie1", Role::Host, "Alice", tx_a).unwrap();
    state.rooms.join("movie2", Role::Viewer, "Bob", tx_b).unwrap();

    let (status, body) = common::get(&app, "/api/v1/status").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["activeRooms"], 2);
    assert_eq!(json["activeConnections"], 2);
}
