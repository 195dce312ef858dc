//! Chess mentor core library.
//!
//! A human plays White against a fixed-depth alpha-beta engine that runs
//! on its own worker thread, while an advisory service produces coaching
//! analysis that is folded into a bounded coaching memory and persisted
//! in the background.

pub mod advice;
pub mod engine;
pub mod error;
pub mod game;
pub mod oracle;
pub mod storage;

pub use advice::{Advisor, CoachingAnalysis, OfflineAdvisor};
pub use engine::worker::EngineHandle;
pub use engine::{EngineMove, MoveEngine, SEARCH_DEPTH};
pub use error::{EngineError, IllegalMoveError, LoadError, TurnError};
pub use game::{CoachingMemory, GameSession, TurnOutcome, UiState};
pub use oracle::{PlayedMove, RulesOracle, StandardOracle};
pub use storage::{GameStore, MemoryStore, SavedGame};
