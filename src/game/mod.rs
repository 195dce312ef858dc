//! Turn orchestration.
//!
//! [`GameSession`] owns the board, the coaching memory and the UI flags,
//! and drives each turn through the engine, advisory and persistence
//! collaborators. It is single-writer: every mutation goes through
//! `&mut self`, so no turn interleaves with another.

use crate::advice::{Advisor, CoachingAnalysis};
use crate::engine::MoveEngine;
use crate::oracle::{PlayedMove, RulesOracle};
use crate::storage::GameStore;
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod lifecycle;
pub mod memory;
pub mod turn;


pub use memory::CoachingMemory;

/// Flags the front end renders. The orchestrator keeps these coherent:
/// at most one phase flag is set at a time, and both are cleared before
/// any turn returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub engine_thinking: bool,
    pub analyzing: bool,
    pub error: Option<String>,
    pub notification: Option<String>,
}

impl UiState {
    fn begin_engine_phase(&mut self) {
        self.engine_thinking = true;
        self.analyzing = false;
        self.error = None;
    }

    fn begin_analysis_phase(&mut self) {
        self.engine_thinking = false;
        self.analyzing = true;
    }

    fn settle(&mut self) {
        self.engine_thinking = false;
        self.analyzing = false;
    }

    fn fail(&mut self, message: String) {
        self.settle();
        self.error = Some(message);
    }

    fn finish(&mut self, message: String) {
        self.settle();
        self.notification = Some(message);
    }
}

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The game reached a terminal position. `reply` is the engine's move
    /// if the engine delivered the final blow, `None` if the player did.
    Finished { reply: Option<PlayedMove> },
    /// Play continues; the engine replied with this move.
    Playing { reply: PlayedMove },
}

pub struct GameSession {
    oracle: Box<dyn RulesOracle>,
    engine: Arc<dyn MoveEngine>,
    advisor: Arc<dyn Advisor>,
    store: Arc<dyn GameStore>,
    memory: CoachingMemory,
    analysis: Arc<Mutex<Option<CoachingAnalysis>>>,
    ui: UiState,
    game_id: Option<String>,
    owner: String,
    search_depth: u8,
}

impl GameSession {
    pub fn new(
        oracle: Box<dyn RulesOracle>,
        engine: Arc<dyn MoveEngine>,
        advisor: Arc<dyn Advisor>,
        store: Arc<dyn GameStore>,
        owner: impl Into<String>,
        search_depth: u8,
    ) -> Self {
        Self {
            oracle,
            engine,
            advisor,
            store,
            memory: CoachingMemory::empty(),
            analysis: Arc::new(Mutex::new(None)),
            ui: UiState::default(),
            game_id: None,
            owner: owner.into(),
            search_depth,
        }
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn memory(&self) -> &CoachingMemory {
        &self.memory
    }

    pub fn fen(&self) -> String {
        self.oracle.fen()
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    pub fn history_uci(&self) -> Vec<String> {
        self.oracle.history().iter().map(|m| m.uci()).collect()
    }

    pub fn history_san(&self) -> Vec<String> {
        self.oracle
            .history()
            .iter()
            .map(|m| m.san.clone())
            .collect()
    }

    /// Shared slot where analysis lands; background advisory tasks write
    /// here so a reset or load can still receive a late opening analysis.
    pub fn analysis_slot(&self) -> Arc<Mutex<Option<CoachingAnalysis>>> {
        Arc::clone(&self.analysis)
    }

    pub async fn latest_analysis(&self) -> Option<CoachingAnalysis> {
        self.analysis.lock().await.clone()
    }
}
