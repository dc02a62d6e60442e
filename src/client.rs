//! Polling client and the adaptive backoff policy.
//!
//! The client never holds authoritative state. It polls the snapshot
//! endpoint, compares each snapshot structurally against the last one
//! it saw, and widens its polling interval geometrically while nothing
//! changes. Any observed change, and any mutation of its own, snaps the
//! interval back to the floor.

use crate::chat::ChatMessage;
use crate::games::GameKind;
use crate::session::StateSnapshot;
use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Geometric backoff between a floor and a ceiling.
///
/// The server must stay correct under arbitrarily-spaced polls; this
/// policy only bounds the load an idle client generates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Backoff {
    /// Creates a policy starting at `floor`, never exceeding `ceiling`.
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(floor);
        Self {
            floor,
            ceiling,
            current: floor,
        }
    }

    /// The interval to wait before the next poll.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Doubles the interval, clamped at the ceiling.
    pub fn advance(&mut self) -> Duration {
        self.current = (self.current * 2).min(self.ceiling);
        self.current
    }

    /// Snaps the interval back to the floor.
    pub fn reset(&mut self) -> Duration {
        self.current = self.floor;
        self.current
    }

    /// Feeds one poll observation into the policy and returns the next
    /// interval: reset on change, advance otherwise.
    pub fn observe(&mut self, changed: bool) -> Duration {
        if changed { self.reset() } else { self.advance() }
    }
}

/// HTTP client for the session server.
#[derive(Debug, Clone)]
pub struct GameClient {
    base_url: String,
    client: reqwest::Client,
}

impl GameClient {
    /// Creates a client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Creates a new session and returns its code.
    #[instrument(skip(self))]
    pub async fn create_game(&self, kind: GameKind) -> Result<String> {
        let body = serde_json::json!({ "game": kind });
        let response: serde_json::Value = self.post_json("/create_game", body).await?;
        response
            .get("code")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("create_game response missing code"))
    }

    /// Joins a session, returning the assigned turn index.
    #[instrument(skip(self))]
    pub async fn join_game(&self, code: &str, player: &str) -> Result<usize> {
        let body = serde_json::json!({ "code": code, "player": player });
        let response: serde_json::Value = self.post_json("/join_game", body).await?;
        response
            .get("player_index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .ok_or_else(|| anyhow!("join_game response missing player_index"))
    }

    /// Submits a move. State is observed via [`Self::game_state`], not
    /// returned here.
    #[instrument(skip(self))]
    pub async fn make_move(&self, code: &str, player: &str, index: usize) -> Result<()> {
        let body = serde_json::json!({ "code": code, "player": player, "index": index });
        let _: serde_json::Value = self.post_json("/make_move", body).await?;
        Ok(())
    }

    /// Fetches the current session snapshot.
    #[instrument(skip(self), level = "debug")]
    pub async fn game_state(&self, code: &str) -> Result<StateSnapshot> {
        self.get_json(&format!("/game_state/{}", code)).await
    }

    /// Sends a chat message.
    #[instrument(skip(self, message))]
    pub async fn send_message(&self, code: &str, player: &str, message: &str) -> Result<()> {
        let body = serde_json::json!({ "code": code, "player": player, "message": message });
        let _: serde_json::Value = self.post_json("/send_message", body).await?;
        Ok(())
    }

    /// Fetches all chat messages in arrival order.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_messages(&self, code: &str) -> Result<Vec<ChatMessage>> {
        let response: serde_json::Value =
            self.get_json(&format!("/get_messages/{}", code)).await?;
        let messages = response
            .get("messages")
            .cloned()
            .ok_or_else(|| anyhow!("get_messages response missing messages"))?;
        Ok(serde_json::from_value(messages)?)
    }

    /// Submits a move, then forces an immediate out-of-band poll.
    ///
    /// The actor who just acted should not wait for the next scheduled
    /// tick to see their own effect, so the backoff resets and the
    /// fresh snapshot is fetched right away.
    #[instrument(skip(self, backoff))]
    pub async fn move_and_refresh(
        &self,
        code: &str,
        player: &str,
        index: usize,
        backoff: &mut Backoff,
    ) -> Result<StateSnapshot> {
        self.make_move(code, player, index).await?;
        backoff.reset();
        self.game_state(code).await
    }

    /// Sends a chat message, then forces an immediate message fetch.
    #[instrument(skip(self, message, backoff))]
    pub async fn say_and_refresh(
        &self,
        code: &str,
        player: &str,
        message: &str,
        backoff: &mut Backoff,
    ) -> Result<Vec<ChatMessage>> {
        self.send_message(code, player, message).await?;
        backoff.reset();
        self.get_messages(code).await
    }

    /// Polls the session until it reaches a terminal state, invoking
    /// `on_change` for every snapshot that differs from the last.
    #[instrument(skip(self, backoff, on_change))]
    pub async fn watch(
        &self,
        code: &str,
        mut backoff: Backoff,
        mut on_change: impl FnMut(&StateSnapshot),
    ) -> Result<StateSnapshot> {
        let mut last: Option<StateSnapshot> = None;
        loop {
            let snapshot = self.game_state(code).await?;
            let changed = last.as_ref() != Some(&snapshot);
            if changed {
                debug!(code, "Snapshot changed");
                on_change(&snapshot);
            }
            if snapshot.game_over {
                return Ok(snapshot);
            }
            let wait = backoff.observe(changed);
            last = Some(snapshot);
            tokio::time::sleep(wait).await;
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(&body).send().await?;
        Self::decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let reason = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
            .to_string();
        warn!(%status, reason, "Server rejected request");
        Err(anyhow!("server rejected request ({}): {}", status, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff() -> Backoff {
        Backoff::new(Duration::from_millis(1000), Duration::from_millis(3000))
    }

    #[test]
    fn starts_at_floor() {
        assert_eq!(backoff().current(), Duration::from_millis(1000));
    }

    #[test]
    fn doubles_then_clamps_at_ceiling() {
        let mut policy = backoff();
        assert_eq!(policy.advance(), Duration::from_millis(2000));
        assert_eq!(policy.advance(), Duration::from_millis(3000));
        assert_eq!(policy.advance(), Duration::from_millis(3000));
    }

    #[test]
    fn any_change_resets_to_floor() {
        let mut policy = backoff();
        policy.advance();
        policy.advance();
        assert_eq!(policy.observe(true), Duration::from_millis(1000));
        assert_eq!(policy.observe(false), Duration::from_millis(2000));
    }

    #[test]
    fn ceiling_never_drops_below_floor() {
        let policy = Backoff::new(Duration::from_millis(500), Duration::from_millis(100));
        assert_eq!(policy.current(), Duration::from_millis(500));
    }
}
