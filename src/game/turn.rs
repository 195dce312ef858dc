//! The player-move turn: apply, reply, analyze, persist.

use crate::advice::{fallback_analysis, AnalysisRequest, CoachingAnalysis};
use crate::engine::EngineMove;
use crate::error::{EngineError, TurnError};
use crate::game::memory::PositionSnapshot;
use crate::game::{GameSession, TurnOutcome};
use crate::oracle::PlayedMove;
use crate::storage::GameUpdate;
use shakmaty::Color;

impl GameSession {
    /// Plays one full turn: the player's move, the engine's reply, and the
    /// coaching analysis of the resulting position.
    ///
    /// An illegal move returns early with nothing changed. An engine
    /// failure leaves the player's move on the board and sets the UI
    /// error. Advisory failures never fail the turn; a canned fallback
    /// analysis is substituted and the memory is left untouched.
    pub async fn submit_move(&mut self, mv: EngineMove) -> Result<TurnOutcome, TurnError> {
        let played = self.oracle.apply(mv)?;
        tracing::info!(uci = %played.uci(), san = %played.san, "player move applied");

        *self.analysis.lock().await = None;
        self.ui.begin_engine_phase();

        if self.oracle.is_game_over() {
            return Ok(self.finish_terminal(None));
        }

        let fen = self.oracle.fen();
        let reply = match self.engine.calculate(&fen, self.search_depth).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(error = %err, "engine failed to reply");
                self.ui.fail(format!("Engine error: {err}"));
                return Err(TurnError::Engine(err));
            }
        };

        let reply = match self.oracle.apply(reply) {
            Ok(reply) => reply,
            Err(illegal) => {
                let err = EngineError::InvalidReply(illegal.uci.clone());
                tracing::error!(uci = %illegal.uci, "engine proposed an illegal move");
                self.ui.fail(format!("Engine error: {err}"));
                return Err(TurnError::Engine(err));
            }
        };
        tracing::info!(uci = %reply.uci(), san = %reply.san, "engine reply applied");

        if self.oracle.is_game_over() {
            return Ok(self.finish_terminal(Some(reply)));
        }

        self.ui.begin_analysis_phase();
        let request = AnalysisRequest {
            fen: self.oracle.fen(),
            move_history: self.history_san(),
            memory: self.memory.clone(),
            last_move: Some(reply.clone()),
        };

        match self.advisor.analyze(request).await {
            Ok(analysis) if analysis.is_usable() => {
                self.absorb_analysis(analysis).await;
                self.persist_snapshot();
            }
            Ok(_) => {
                tracing::warn!("advisory payload unusable, using fallback");
                self.fallback_into_slot().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "advisory call failed, using fallback");
                self.fallback_into_slot().await;
            }
        }

        self.ui.settle();
        Ok(TurnOutcome::Playing { reply })
    }

    /// Folds a usable analysis into the coaching memory and publishes it.
    async fn absorb_analysis(&mut self, analysis: CoachingAnalysis) {
        let ply = self.oracle.history().len() as u32;
        let evaluation = analysis
            .memory_update
            .position_evolution
            .first()
            .map(|note| note.evaluation.clone())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| analysis.position_evaluation.clone());
        let snapshot = PositionSnapshot {
            ply,
            fen: self.oracle.fen(),
            evaluation,
        };
        self.memory.merge(&analysis.memory_update, snapshot);
        *self.analysis.lock().await = Some(analysis);
    }

    async fn fallback_into_slot(&mut self) {
        let fallback = fallback_analysis(self.oracle.history().len());
        *self.analysis.lock().await = Some(fallback);
    }

    /// Writes the current game state in the background. Failures are
    /// logged; play never waits on the store.
    fn persist_snapshot(&self) {
        let Some(game_id) = self.game_id.clone() else {
            return;
        };
        let store = std::sync::Arc::clone(&self.store);
        let update = GameUpdate {
            fen: self.oracle.fen(),
            history: self.history_uci(),
            memory: self.memory.clone(),
            active: None,
        };
        tokio::spawn(async move {
            if let Err(err) = store.update_game(&game_id, update).await {
                tracing::warn!(game_id = %game_id, error = %err, "failed to persist game");
            }
        });
    }

    fn finish_terminal(&mut self, reply: Option<PlayedMove>) -> TurnOutcome {
        let message = if self.oracle.is_checkmate() {
            // The side to move is the one who got mated.
            let winner = match self.oracle.turn() {
                Color::White => "Black",
                Color::Black => "White",
            };
            format!("Checkmate! {winner} wins!")
        } else {
            "Game over - Draw".to_string()
        };
        tracing::info!(message = %message, "game finished");
        self.ui.finish(message);
        TurnOutcome::Finished { reply }
    }
}
