//! Per-session chat log.
//!
//! Append-only, ordered by arrival. Length limits are enforced by the
//! session store so this type stays a plain buffer.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// One chat entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender's player name.
    pub player: String,
    /// Message text.
    pub message: String,
    /// Monotonically increasing position within the session.
    pub seq: u64,
    /// Wall-clock arrival stamp (`HH:MM`).
    pub timestamp: String,
}

/// Append-only ordered message buffer.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    entries: Vec<ChatMessage>,
    next_seq: u64,
}

impl ChatLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, returning its sequence number.
    pub fn append(&mut self, player: &str, message: &str) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(ChatMessage {
            player: player.to_string(),
            message: message.to_string(),
            seq,
            timestamp: Local::now().format("%H:%M").to_string(),
        });
        seq
    }

    /// All messages in arrival order.
    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    /// Number of messages in the log.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
