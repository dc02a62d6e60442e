//! HTTP request surface.
//!
//! A thin axum layer over the session store. Mutation endpoints return
//! bare acknowledgements; clients observe the resulting state through
//! the polling endpoints, which stay the single source of truth.

use crate::chat::ChatMessage;
use crate::error::SessionError;
use crate::games::GameKind;
use crate::session::{SessionStore, StateSnapshot};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Body for `POST /create_game`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateGameRequest {
    /// Game variant to play; defaults to tic-tac-toe.
    #[serde(default)]
    pub game: GameKind,
}

/// Response for `POST /create_game`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameResponse {
    /// Shareable session code.
    pub code: String,
}

/// Body for `POST /join_game`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGameRequest {
    /// Session code.
    pub code: String,
    /// Joining player's name.
    pub player: String,
}

/// Response for `POST /join_game`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGameResponse {
    /// The joiner's 0-based turn index.
    pub player_index: usize,
    /// All joined players in turn order.
    pub players: Vec<String>,
}

/// Body for `POST /make_move`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeMoveRequest {
    /// Session code.
    pub code: String,
    /// Acting player's name.
    pub player: String,
    /// Targeted cell index.
    pub index: usize,
}

/// Body for `POST /send_message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Session code.
    pub code: String,
    /// Sender's name.
    pub player: String,
    /// Message text.
    pub message: String,
}

/// Response for `GET /get_messages/{code}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// All messages in arrival order.
    pub messages: Vec<ChatMessage>,
}

/// Plain acknowledgement for mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    /// Always true on success.
    pub ok: bool,
}

/// Error body returned alongside a non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable rejection reason.
    pub error: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::NotFound => StatusCode::NOT_FOUND,
            SessionError::Full | SessionError::DuplicateName => StatusCode::CONFLICT,
            SessionError::NotAJoinedPlayer
            | SessionError::InvalidMove(_)
            | SessionError::MessageTooLong { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::CodeSpaceExhausted => StatusCode::SERVICE_UNAVAILABLE,
        };
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Builds the application router over a session store.
pub fn router(store: SessionStore) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/create_game", post(create_game))
        .route("/join_game", post(join_game))
        .route("/make_move", post(make_move))
        .route("/game_state/{code}", get(game_state))
        .route("/send_message", post(send_message))
        .route("/get_messages/{code}", get(get_messages))
        .with_state(store)
}

/// Binds a listener and serves the router until shutdown.
pub async fn serve(host: &str, port: u16, store: SessionStore) -> anyhow::Result<()> {
    let app = router(store);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(host, port, "Server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Liveness probe.
async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[instrument(skip(store, body))]
async fn create_game(
    State(store): State<SessionStore>,
    body: Option<Json<CreateGameRequest>>,
) -> Result<Json<CreateGameResponse>, SessionError> {
    let kind = body.map(|Json(req)| req.game).unwrap_or_default();
    let code = store.create(kind)?;
    info!(code = %code, kind = %kind, "Created game");
    Ok(Json(CreateGameResponse { code }))
}

#[instrument(skip(store, req), fields(code = %req.code, player = %req.player))]
async fn join_game(
    State(store): State<SessionStore>,
    Json(req): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, SessionError> {
    let player_index = store.join(&req.code, &req.player)?;
    let players = store.snapshot(&req.code)?.players;
    info!(player_index, "Player joined game");
    Ok(Json(JoinGameResponse {
        player_index,
        players,
    }))
}

#[instrument(skip(store, req), fields(code = %req.code, player = %req.player, index = req.index))]
async fn make_move(
    State(store): State<SessionStore>,
    Json(req): Json<MakeMoveRequest>,
) -> Result<Json<Ack>, SessionError> {
    store.apply_move(&req.code, &req.player, req.index)?;
    info!("Move accepted");
    Ok(Json(Ack { ok: true }))
}

#[instrument(skip(store), fields(code = %code))]
async fn game_state(
    State(store): State<SessionStore>,
    Path(code): Path<String>,
) -> Result<Json<StateSnapshot>, SessionError> {
    let snapshot = store.snapshot(&code)?;
    Ok(Json(snapshot))
}

#[instrument(skip(store, req), fields(code = %req.code, player = %req.player))]
async fn send_message(
    State(store): State<SessionStore>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Ack>, SessionError> {
    let seq = store.append_message(&req.code, &req.player, &req.message)?;
    info!(seq, "Message appended");
    Ok(Json(Ack { ok: true }))
}

#[instrument(skip(store), fields(code = %code))]
async fn get_messages(
    State(store): State<SessionStore>,
    Path(code): Path<String>,
) -> Result<Json<MessagesResponse>, SessionError> {
    let messages = store.messages(&code)?;
    Ok(Json(MessagesResponse { messages }))
}
