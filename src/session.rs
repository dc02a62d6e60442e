//! Authoritative session state and the arena store.
//!
//! One [`Session`] per match, keyed by its short code. The store keeps
//! an outer map lock only long enough to resolve, insert, or remove
//! entries; every session carries its own mutex, so operations on
//! unrelated matches never contend and mutations on the same match are
//! serialized (the second of two near-simultaneous moves observes the
//! first's effect and is rejected, never interleaved).

use crate::chat::{ChatLog, ChatMessage};
use crate::code::CodeGenerator;
use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::games::{GameKind, GameState, Mark};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// A session holds at most this many players.
pub const MAX_PLAYERS: usize = 2;

/// One in-progress or finished match between two players.
#[derive(Debug)]
pub struct Session {
    code: String,
    kind: GameKind,
    players: Vec<String>,
    state: GameState,
    chat: ChatLog,
    last_activity: Instant,
    finished_at: Option<Instant>,
}

impl Session {
    /// Creates an empty session under the given code.
    #[instrument(skip(code), fields(code = %code.as_ref()))]
    pub fn new(code: impl AsRef<str>, kind: GameKind) -> Self {
        info!(kind = %kind, "Creating session");
        Self {
            code: code.as_ref().to_string(),
            kind,
            players: Vec::new(),
            state: kind.rules().initial_state(),
            chat: ChatLog::new(),
            last_activity: Instant::now(),
            finished_at: None,
        }
    }

    /// The session's code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The game variant this session plays.
    pub fn kind(&self) -> GameKind {
        self.kind
    }

    /// Joined player names in turn order.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    /// Resolves a player name to their turn index.
    pub fn player_index(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p == name)
    }

    /// Marks the session as touched now.
    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Adds a player, returning their 0-based turn index.
    ///
    /// The second join implicitly starts the match: the board resets
    /// and the turn is fixed at player 0.
    fn join(&mut self, name: &str) -> Result<usize, SessionError> {
        if self.player_index(name).is_some() {
            warn!(code = %self.code, player = name, "Duplicate player name rejected");
            return Err(SessionError::DuplicateName);
        }
        if self.players.len() >= MAX_PLAYERS {
            warn!(code = %self.code, player = name, "Session already full");
            return Err(SessionError::Full);
        }

        self.players.push(name.to_string());
        let index = self.players.len() - 1;

        if self.players.len() == MAX_PLAYERS {
            self.state = self.kind.rules().initial_state();
            info!(code = %self.code, "Second player joined, match started");
        }

        info!(code = %self.code, player = name, index, "Player joined");
        Ok(index)
    }

    /// Applies a move on behalf of a named player.
    fn apply_move(&mut self, player: &str, cell: usize) -> Result<(), SessionError> {
        let mover = self
            .player_index(player)
            .ok_or(SessionError::NotAJoinedPlayer)?;

        let next = self.kind.rules().apply_move(&self.state, mover, cell)?;
        self.state = next;

        if self.state.game_over && self.finished_at.is_none() {
            self.finished_at = Some(Instant::now());
            info!(
                code = %self.code,
                winner = ?self.state.winner,
                "Game reached terminal state"
            );
        }

        debug!(code = %self.code, player, cell, "Move applied");
        Ok(())
    }

    /// Appends a chat message from a joined player.
    fn append_message(&mut self, player: &str, text: &str, limit: usize) -> Result<u64, SessionError> {
        if self.player_index(player).is_none() {
            warn!(code = %self.code, player, "Chat from unjoined player rejected");
            return Err(SessionError::NotAJoinedPlayer);
        }
        if text.chars().count() > limit {
            warn!(code = %self.code, player, limit, "Over-length chat message rejected");
            return Err(SessionError::MessageTooLong { limit });
        }
        Ok(self.chat.append(player, text))
    }

    /// Point-in-time copy of everything a polling client needs.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            players: self.players.clone(),
            board: self.state.board.clone(),
            turn: self.state.turn,
            game_over: self.state.game_over,
            winner: self.state.winner,
            winning_line: self.state.winning_line.clone(),
        }
    }
}

/// Consistent point-in-time copy of a session's observable state.
///
/// This is the shape polled by clients; equality comparison against the
/// previously seen snapshot is how a client detects change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Player names in turn order (index 0 moves first).
    pub players: Vec<String>,
    /// Cells in row-major order; `None` is empty.
    pub board: Vec<Option<Mark>>,
    /// Index of the player to move.
    pub turn: usize,
    /// Whether the match reached a terminal state.
    pub game_over: bool,
    /// Terminal outcome, if any.
    pub winner: Option<crate::games::Winner>,
    /// Indices of the winning triple, empty for ties.
    pub winning_line: Vec<usize>,
}

impl StateSnapshot {
    /// Formats the board as a human-readable grid.
    pub fn display_board(&self) -> String {
        let mut out = String::new();
        let rows: Vec<&[Option<Mark>]> = self.board.chunks(3).collect();
        for (i, row) in rows.iter().enumerate() {
            let cells: Vec<&str> = row
                .iter()
                .map(|cell| match cell {
                    Some(Mark::X) => "X",
                    Some(Mark::O) => "O",
                    None => ".",
                })
                .collect();
            out.push_str(&cells.join("|"));
            if i + 1 < rows.len() {
                out.push_str("\n-+-+-\n");
            }
        }
        out
    }
}

/// Arena-style store: one entry per live session, one lock per entry.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
    codes: CodeGenerator,
    config: Arc<ServerConfig>,
}

impl SessionStore {
    /// Creates an empty store with the given configuration.
    #[instrument(skip(config))]
    pub fn new(config: ServerConfig) -> Self {
        info!("Creating session store");
        let codes = CodeGenerator::new(
            config.code_alphabet(),
            *config.code_length(),
            *config.code_max_attempts(),
        );
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            codes,
            config: Arc::new(config),
        }
    }

    /// The configuration this store runs with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Allocates a new empty session and returns its code.
    ///
    /// The collision check and the insertion happen under the same map
    /// write lock, so concurrent creates can never share a code.
    #[instrument(skip(self))]
    pub fn create(&self, kind: GameKind) -> Result<String, SessionError> {
        let mut map = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let code = self.codes.generate(|candidate| map.contains_key(candidate))?;
        let session = Session::new(&code, kind);
        map.insert(code.clone(), Arc::new(Mutex::new(session)));

        info!(code = %code, kind = %kind, live = map.len(), "Session created");
        Ok(code)
    }

    /// Adds a player to a session, returning their turn index.
    #[instrument(skip(self))]
    pub fn join(&self, code: &str, name: &str) -> Result<usize, SessionError> {
        self.with_session(code, |session| session.join(name))
    }

    /// Applies a move and returns the resulting snapshot.
    ///
    /// Runs inside the session's critical section: two near-simultaneous
    /// moves are serialized, and the loser sees a plain rejection.
    #[instrument(skip(self))]
    pub fn apply_move(
        &self,
        code: &str,
        player: &str,
        cell: usize,
    ) -> Result<StateSnapshot, SessionError> {
        self.with_session(code, |session| {
            session.apply_move(player, cell)?;
            Ok(session.snapshot())
        })
    }

    /// Returns a consistent snapshot of the session's state.
    #[instrument(skip(self), level = "debug")]
    pub fn snapshot(&self, code: &str) -> Result<StateSnapshot, SessionError> {
        self.with_session(code, |session| Ok(session.snapshot()))
    }

    /// Appends a chat message, returning its sequence number.
    #[instrument(skip(self, text))]
    pub fn append_message(
        &self,
        code: &str,
        player: &str,
        text: &str,
    ) -> Result<u64, SessionError> {
        let limit = *self.config.max_message_len();
        self.with_session(code, |session| session.append_message(player, text, limit))
    }

    /// Returns all chat messages in arrival order.
    #[instrument(skip(self), level = "debug")]
    pub fn messages(&self, code: &str) -> Result<Vec<ChatMessage>, SessionError> {
        self.with_session(code, |session| Ok(session.chat.entries().to_vec()))
    }

    /// Codes of all live sessions.
    pub fn live_codes(&self) -> Vec<String> {
        let map = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        map.keys().cloned().collect()
    }

    /// Removes sessions that finished longer ago than the grace window
    /// or sat untouched past the idle window. Returns the number
    /// removed.
    ///
    /// Holds the map write lock and each entry's own lock while
    /// deciding, so pruning never races an in-flight operation.
    #[instrument(skip(self))]
    pub fn prune(&self) -> usize {
        let grace = self.config.finished_grace();
        let idle = self.config.idle_timeout();

        let mut map = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = map.len();

        map.retain(|code, entry| {
            let session = match entry.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    error!(code = %code, "Session lock poisoned, discarding session");
                    return false;
                }
            };
            let finished_out = session
                .finished_at
                .map(|at| at.elapsed() >= grace)
                .unwrap_or(false);
            let abandoned = session.last_activity.elapsed() >= idle;
            if finished_out || abandoned {
                info!(
                    code = %code,
                    finished = finished_out,
                    abandoned,
                    "Pruning session"
                );
                false
            } else {
                true
            }
        });

        let removed = before - map.len();
        if removed > 0 {
            debug!(removed, live = map.len(), "Prune pass complete");
        }
        removed
    }

    /// Spawns the background sweeper that prunes expired sessions.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        let period = self.config.sweep_interval();
        info!(period_secs = period.as_secs(), "Starting session sweeper");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.prune();
            }
        })
    }

    /// Resolves a session entry from the map.
    fn entry(&self, code: &str) -> Result<Arc<Mutex<Session>>, SessionError> {
        let map = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        map.get(code).cloned().ok_or(SessionError::NotFound)
    }

    /// Runs an operation inside the session's critical section.
    ///
    /// Every access, reads included, refreshes the session's activity
    /// stamp. A poisoned session lock discards that session only; the
    /// rest of the store is unaffected.
    fn with_session<R>(
        &self,
        code: &str,
        op: impl FnOnce(&mut Session) -> Result<R, SessionError>,
    ) -> Result<R, SessionError> {
        let entry = self.entry(code)?;
        let mut session = match entry.lock() {
            Ok(guard) => guard,
            Err(_) => {
                error!(code = %code, "Session lock poisoned, discarding session");
                self.discard(code);
                return Err(SessionError::NotFound);
            }
        };
        session.touch();
        op(&mut session)
    }

    /// Drops a session outright, bypassing expiry windows.
    fn discard(&self, code: &str) {
        let mut map = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        map.remove(code);
    }
}
