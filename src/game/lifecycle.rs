//! Session lifecycle: fresh games, loading saved state, resuming.

use crate::advice::AnalysisRequest;
use crate::engine::EngineMove;
use crate::error::LoadError;
use crate::game::memory::CoachingMemory;
use crate::game::GameSession;
use crate::storage::GameUpdate;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color, Position};

impl GameSession {
    /// Starts a fresh game. The previous game's record is archived in
    /// the background and the session detaches from it; the next
    /// [`GameSession::ensure_saved`] mints a new one. The opening advice
    /// is requested in the background; it lands in the analysis slot
    /// whenever it arrives.
    pub async fn reset_game(&mut self) {
        if let Some(game_id) = self.game_id.take() {
            let store = std::sync::Arc::clone(&self.store);
            let update = GameUpdate {
                fen: self.oracle.fen(),
                history: self.history_uci(),
                memory: self.memory.clone(),
                active: Some(false),
            };
            tokio::spawn(async move {
                if let Err(err) = store.update_game(&game_id, update).await {
                    tracing::warn!(game_id = %game_id, error = %err, "failed to archive game");
                }
            });
        }

        self.oracle.reset();
        self.memory = CoachingMemory::empty();
        *self.analysis.lock().await = None;
        self.ui.finish("New game started".to_string());
        tracing::info!("game reset");
        self.request_opening_advice();
    }

    /// Restores a game from a saved position or a saved move history.
    ///
    /// A position takes precedence over a history when both are present.
    /// The history is replayed on a scratch board first, so a corrupt
    /// save fails without disturbing the game in progress.
    pub async fn load_game(
        &mut self,
        fen: Option<&str>,
        history: &[String],
        memory: CoachingMemory,
    ) -> Result<(), LoadError> {
        if let Some(fen) = fen {
            self.oracle.load_fen(fen)?;
        } else if !history.is_empty() {
            let moves = Self::replay_history(history)?;
            self.oracle.reset();
            for mv in moves {
                self.oracle
                    .apply(mv)
                    .map_err(|e| LoadError::BadHistory(e.uci))?;
            }
        } else {
            return Err(LoadError::Empty);
        }

        self.memory = memory;
        *self.analysis.lock().await = None;
        self.ui.finish("Game loaded".to_string());
        tracing::info!(moves = history.len(), "game loaded");

        if self.oracle.turn() == Color::White {
            self.request_opening_advice();
        }
        Ok(())
    }

    /// Picks up the owner's active saved game, if one exists.
    pub async fn resume(&mut self) -> Result<bool, LoadError> {
        let saved = self
            .store
            .get_active_game(&self.owner)
            .await
            .map_err(|e| LoadError::Unavailable(e.to_string()))?;
        let Some(saved) = saved else {
            return Ok(false);
        };

        let fen = Some(saved.fen.as_str()).filter(|f| !f.is_empty());
        self.load_game(fen, &saved.history, saved.memory).await?;
        self.game_id = Some(saved.game_id);
        tracing::info!(game_id = ?self.game_id, "game resumed");
        Ok(true)
    }

    /// Makes sure the session has a persistent game record to write
    /// snapshots into. A store failure is logged and the session plays on
    /// unsaved.
    pub async fn ensure_saved(&mut self) {
        if self.game_id.is_some() {
            return;
        }
        match self.store.create_game(&self.owner).await {
            Ok(game_id) => {
                tracing::info!(game_id = %game_id, "game record created");
                self.game_id = Some(game_id);
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not create game record, playing unsaved");
            }
        }
    }

    /// Validates an entire saved UCI history against a scratch board
    /// before anything touches the live oracle.
    fn replay_history(history: &[String]) -> Result<Vec<EngineMove>, LoadError> {
        let mut scratch = Chess::default();
        let mut moves = Vec::with_capacity(history.len());
        for uci in history {
            let mv = EngineMove::from_uci(uci)
                .ok_or_else(|| LoadError::BadHistory(uci.clone()))?;
            let legal = UciMove::Normal {
                from: mv.from,
                to: mv.to,
                promotion: mv.promotion,
            }
            .to_move(&scratch)
            .map_err(|_| LoadError::BadHistory(uci.clone()))?;
            scratch.play_unchecked(&legal);
            moves.push(mv);
        }
        Ok(moves)
    }

    /// Asks the advisor what to play from the current position, off the
    /// turn path. Only a usable analysis is published.
    fn request_opening_advice(&self) {
        let advisor = std::sync::Arc::clone(&self.advisor);
        let slot = self.analysis_slot();
        let request = AnalysisRequest {
            fen: self.oracle.fen(),
            move_history: self.history_san(),
            memory: self.memory.clone(),
            last_move: None,
        };
        tokio::spawn(async move {
            match advisor.analyze(request).await {
                Ok(analysis) if analysis.is_usable() => {
                    *slot.lock().await = Some(analysis);
                }
                Ok(_) => tracing::debug!("opening advice unusable, dropped"),
                Err(err) => tracing::debug!(error = %err, "opening advice unavailable"),
            }
        });
    }
}
