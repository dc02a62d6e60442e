//! In-process tests for the HTTP request surface.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use parlor::{ServerConfig, SessionStore, router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    router(SessionStore::new(ServerConfig::default()))
}

async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    dispatch(app, request).await
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    dispatch(app, request).await
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Creates a game and joins Alice and Bob.
async fn started_game(app: &Router) -> String {
    let (status, body) = post(app, "/create_game", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let code = body["code"].as_str().unwrap().to_string();

    let (status, body) = post(app, "/join_game", json!({"code": &code, "player": "Alice"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player_index"], 0);

    let (status, body) = post(app, "/join_game", json!({"code": &code, "player": "Bob"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["player_index"], 1);

    code
}

#[tokio::test]
async fn test_healthz() {
    let app = app();
    let (status, body) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_without_body_defaults_to_tictactoe() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/create_game")
        .body(Body::empty())
        .unwrap();
    let (status, body) = dispatch(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"].as_str().unwrap().len(), 6);
}

#[tokio::test]
async fn test_full_game_flow_to_win() {
    let app = app();
    let code = started_game(&app).await;

    for (player, index) in [("Alice", 0), ("Bob", 3), ("Alice", 1), ("Bob", 4)] {
        let (status, _) = post(
            &app,
            "/make_move",
            json!({"code": &code, "player": player, "index": index}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // Alice completes the top row.
    let (status, body) = post(
        &app,
        "/make_move",
        json!({"code": &code, "player": "Alice", "index": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, state) = get(&app, &format!("/game_state/{}", code)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["game_over"], true);
    assert_eq!(state["winner"], "X");
    assert_eq!(state["winning_line"], json!([0, 1, 2]));
    assert_eq!(state["board"][0], "X");
    assert_eq!(state["board"][1], "X");
    assert_eq!(state["board"][2], "X");
    assert_eq!(state["board"][3], "O");
    assert_eq!(state["players"], json!(["Alice", "Bob"]));

    // Terminal state is final: further moves are rejected.
    let (status, body) = post(
        &app,
        "/make_move",
        json!({"code": &code, "player": "Bob", "index": 8}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("over"));
}

#[tokio::test]
async fn test_state_reflects_turn_flips() {
    let app = app();
    let code = started_game(&app).await;

    let (_, state) = get(&app, &format!("/game_state/{}", code)).await;
    assert_eq!(state["turn"], 0);

    post(
        &app,
        "/make_move",
        json!({"code": &code, "player": "Alice", "index": 0}),
    )
    .await;

    let (_, state) = get(&app, &format!("/game_state/{}", code)).await;
    assert_eq!(state["turn"], 1);
    assert_eq!(state["board"][0], "X");
}

#[tokio::test]
async fn test_join_unknown_code_is_404() {
    let app = app();
    let (status, body) = post(
        &app,
        "/join_game",
        json!({"code": "ZZZZZZ", "player": "Alice"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "game not found");
}

#[tokio::test]
async fn test_state_unknown_code_is_404() {
    let app = app();
    let (status, _) = get(&app, "/game_state/ZZZZZZ").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_third_join_is_conflict() {
    let app = app();
    let code = started_game(&app).await;
    let (status, body) = post(
        &app,
        "/join_game",
        json!({"code": &code, "player": "Carol"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("two players"));
}

#[tokio::test]
async fn test_duplicate_name_is_conflict() {
    let app = app();
    let (_, body) = post(&app, "/create_game", json!({})).await;
    let code = body["code"].as_str().unwrap();

    post(&app, "/join_game", json!({"code": &code, "player": "Alice"})).await;
    let (status, _) = post(&app, "/join_game", json!({"code": &code, "player": "Alice"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_move_out_of_turn_is_unprocessable() {
    let app = app();
    let code = started_game(&app).await;
    let (status, body) = post(
        &app,
        "/make_move",
        json!({"code": &code, "player": "Bob", "index": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("turn"));
}

#[tokio::test]
async fn test_move_by_stranger_is_unprocessable() {
    let app = app();
    let code = started_game(&app).await;
    let (status, _) = post(
        &app,
        "/make_move",
        json!({"code": &code, "player": "Mallory", "index": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_chat_roundtrip_preserves_order() {
    let app = app();
    let code = started_game(&app).await;

    for (player, message) in [("Alice", "good luck"), ("Bob", "you too")] {
        let (status, body) = post(
            &app,
            "/send_message",
            json!({"code": &code, "player": player, "message": message}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    let (status, body) = get(&app, &format!("/get_messages/{}", code)).await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["player"], "Alice");
    assert_eq!(messages[0]["message"], "good luck");
    assert_eq!(messages[0]["seq"], 0);
    assert_eq!(messages[1]["player"], "Bob");
    assert_eq!(messages[1]["seq"], 1);
}

#[tokio::test]
async fn test_over_length_message_is_unprocessable() {
    let app = app();
    let code = started_game(&app).await;

    let long = "x".repeat(51);
    let (status, body) = post(
        &app,
        "/send_message",
        json!({"code": &code, "player": "Alice", "message": long}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("50"));

    // Nothing was silently truncated-and-accepted.
    let (_, body) = get(&app, &format!("/get_messages/{}", code)).await;
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_message_unknown_code_is_404() {
    let app = app();
    let (status, _) = post(
        &app,
        "/send_message",
        json!({"code": "ZZZZZZ", "player": "Alice", "message": "hi"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
