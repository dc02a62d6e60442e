//! Parlor - session engine for two-player turn-based grid games.
//!
//! The server owns the only authoritative copy of each match. Clients
//! hold no state of their own: they create a session, share its short
//! code, join, and then converge on the server's state by polling with
//! adaptive backoff.
//!
//! # Architecture
//!
//! - **Games**: pure rule sets behind the [`RuleSet`] capability
//!   (currently tic-tac-toe)
//! - **Session**: arena-style store keyed by code, one lock per session
//! - **Server**: thin axum request surface over the store
//! - **Client**: reqwest polling observer with geometric backoff
//!
//! # Example
//!
//! ```no_run
//! use parlor::{GameKind, ServerConfig, SessionStore};
//!
//! # fn example() -> Result<(), parlor::SessionError> {
//! let store = SessionStore::new(ServerConfig::default());
//!
//! let code = store.create(GameKind::TicTacToe)?;
//! store.join(&code, "Alice")?;
//! store.join(&code, "Bob")?;
//! store.apply_move(&code, "Alice", 4)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod chat;
mod client;
mod code;
mod config;
mod error;
mod games;
mod server;
mod session;

/// Command-line interface definitions.
pub mod cli;

// Crate-level exports - chat log
pub use chat::{ChatLog, ChatMessage};

// Crate-level exports - polling client
pub use client::{Backoff, GameClient};

// Crate-level exports - code generation
pub use code::{CodeGenerator, DEFAULT_CODE_ALPHABET};

// Crate-level exports - configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - error taxonomy
pub use error::SessionError;

// Crate-level exports - game rules
pub use games::{GameKind, GameState, Mark, MoveRejection, RuleSet, Winner};

// Crate-level exports - request surface
pub use server::{
    Ack, CreateGameRequest, CreateGameResponse, ErrorBody, JoinGameRequest, JoinGameResponse,
    MakeMoveRequest, MessagesResponse, SendMessageRequest, router, serve,
};

// Crate-level exports - session management
pub use session::{MAX_PLAYERS, Session, SessionStore, StateSnapshot};
