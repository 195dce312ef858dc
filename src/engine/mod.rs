use crate::error::EngineError;
use async_trait::async_trait;
use shakmaty::{Role, Square};
use std::fmt;
use std::str::FromStr;

pub mod eval;
pub mod eval_constants;
pub mod search;
pub mod worker;

/// Fixed search depth the orchestrator requests for opponent replies.
pub const SEARCH_DEPTH: u8 = 3;

/// Checkmate score, far beyond any material and positional sum.
pub const MATE_SCORE: i32 = 1_000_000;

pub(crate) const INFINITY: i32 = i32::MAX;

/// A wire-level move: origin, destination and an optional promotion piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl EngineMove {
    pub fn new(from: Square, to: Square, promotion: Option<Role>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }

    /// Parses UCI coordinate notation (`e2e4`, `e7e8q`).
    pub fn from_uci(s: &str) -> Option<Self> {
        if s.len() < 4 || s.len() > 5 {
            return None;
        }
        let from = Square::from_str(s.get(0..2)?).ok()?;
        let to = Square::from_str(s.get(2..4)?).ok()?;
        let promotion = match s.get(4..5) {
            Some(p) => Some(Role::from_char(p.chars().next()?)?),
            None => None,
        };
        Some(Self {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for EngineMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

/// Result of a completed root search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub mv: shakmaty::Move,
    pub score: i32,
    pub depth: u8,
}

pub trait Evaluator {
    fn evaluate(&self, pos: &shakmaty::Chess) -> i32;
}

/// The orchestrator's view of the search worker: one asynchronous
/// request per opponent reply. Implemented by [`worker::EngineHandle`]
/// and by test doubles.
#[async_trait]
pub trait MoveEngine: Send + Sync {
    async fn calculate(&self, fen: &str, depth: u8) -> Result<EngineMove, EngineError>;
}
