mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn health_returns_200() {
    let (app, _state) = common::test_app();
    let (status, body) = common::get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["uptime_secs"].is_number());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (app, _state) = common::test_app();
    let (status, _body) = common::get(&app, "/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
