use thiserror::Error;

/// A player (or engine-proposed) move the rules oracle refused to apply.
///
/// Recoverable: the board and all session state are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal move: {uci}")]
pub struct IllegalMoveError {
    pub uci: String,
}

/// Failures of the search worker boundary. All of these are fatal to the
/// current turn; play cannot continue until the caller restarts the worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine worker is not available")]
    Unavailable,
    #[error("engine calculation timed out")]
    Timeout,
    #[error("a calculation is already in flight")]
    Busy,
    #[error("engine rejected the request: {0}")]
    Rejected(String),
    #[error("engine returned an unusable reply: {0}")]
    InvalidReply(String),
}

/// Advisory failures are absorbed by the orchestrator: the turn still
/// completes, with a canned fallback analysis in place of the real one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisoryError {
    #[error("advisory service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed advisory payload: {0}")]
    Malformed(String),
}

/// Persistence failures are logged and never surfaced to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("no such game: {0}")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Corrupt or unreadable saved state. The caller decides whether to retry
/// or start a fresh game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("saved position is unreadable: {0}")]
    BadPosition(String),
    #[error("saved history is unreadable: {0}")]
    BadHistory(String),
    #[error("saved game has neither a position nor a history")]
    Empty,
    #[error("saved game could not be fetched: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("no legal moves in this position")]
    NoLegalMoves,
}

/// Umbrella error returned by `GameSession` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error(transparent)]
    Illegal(#[from] IllegalMoveError),
    #[error("engine stage failed: {0}")]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Load(#[from] LoadError),
}
