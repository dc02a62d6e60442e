//! Request-boundary error taxonomy.
//!
//! Every operation on the session store resolves to either success or
//! one of these rejections. All of them are recoverable: the server
//! reports them to the caller and carries on.

use crate::games::MoveRejection;
use derive_more::{Display, Error, From};

/// Rejection reasons surfaced to callers of the session store.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum SessionError {
    /// No live session exists under the given code.
    #[display("game not found")]
    NotFound,

    /// The session already has two players.
    #[display("game already has two players")]
    Full,

    /// A player with the same name already joined this session.
    #[display("a player with that name already joined")]
    DuplicateName,

    /// The named player never joined this session.
    #[display("player has not joined this game")]
    NotAJoinedPlayer,

    /// The rule engine rejected the move.
    #[display("invalid move: {_0}")]
    #[from]
    InvalidMove(MoveRejection),

    /// Chat text exceeds the configured length limit.
    #[display("message exceeds {limit} characters")]
    MessageTooLong {
        /// The configured limit the message exceeded.
        #[error(not(source))]
        limit: usize,
    },

    /// Code generation gave up after the configured number of redraws.
    #[display("session code space exhausted")]
    CodeSpaceExhausted,
}
