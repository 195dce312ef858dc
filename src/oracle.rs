use crate::engine::EngineMove;
use crate::error::{IllegalMoveError, LoadError};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};

/// A move the oracle has applied, with its algebraic label for display
/// and history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub from: shakmaty::Square,
    pub to: shakmaty::Square,
    pub promotion: Option<shakmaty::Role>,
    pub san: String,
}

impl PlayedMove {
    pub fn uci(&self) -> String {
        EngineMove::new(self.from, self.to, self.promotion).to_string()
    }
}

/// Full chess-rules enforcement, consumed by the orchestrator. The
/// orchestrator never constructs a position directly; it only mutates
/// through this interface.
pub trait RulesOracle: Send {
    /// Legal moves in a stable, deterministic order.
    fn legal_moves(&self) -> Vec<EngineMove>;
    /// Applies a move, returning its SAN-labelled record, or rejects it
    /// leaving the position untouched.
    fn apply(&mut self, mv: EngineMove) -> Result<PlayedMove, IllegalMoveError>;
    /// Reverts the last applied move. Returns false at the root.
    fn undo(&mut self) -> bool;
    fn is_check(&self) -> bool;
    fn is_checkmate(&self) -> bool;
    fn is_stalemate(&self) -> bool;
    fn is_draw(&self) -> bool;
    fn is_game_over(&self) -> bool;
    fn turn(&self) -> Color;
    fn fen(&self) -> String;
    fn history(&self) -> &[PlayedMove];
    /// Back to the standard starting position, history cleared.
    fn reset(&mut self);
    fn load_fen(&mut self, fen: &str) -> Result<(), LoadError>;
}

/// Standard-chess oracle over `shakmaty`, with an undo stack and a
/// zobrist trail for threefold-repetition detection.
pub struct StandardOracle {
    pos: Chess,
    undo_stack: Vec<Chess>,
    moves: Vec<PlayedMove>,
    seen: Vec<Zobrist64>,
}

impl StandardOracle {
    pub fn new() -> Self {
        let pos = Chess::default();
        let seen = vec![pos.zobrist_hash(EnPassantMode::Legal)];
        Self {
            pos,
            undo_stack: Vec::new(),
            moves: Vec::new(),
            seen,
        }
    }

    fn threefold(&self) -> bool {
        let current = match self.seen.last() {
            Some(hash) => *hash,
            None => return false,
        };
        self.seen.iter().filter(|hash| **hash == current).count() >= 3
    }
}

impl Default for StandardOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesOracle for StandardOracle {
    fn legal_moves(&self) -> Vec<EngineMove> {
        self.pos
            .legal_moves()
            .iter()
            .filter_map(|m| match m.to_uci(CastlingMode::Standard) {
                UciMove::Normal {
                    from,
                    to,
                    promotion,
                } => Some(EngineMove::new(from, to, promotion)),
                _ => None,
            })
            .collect()
    }

    fn apply(&mut self, mv: EngineMove) -> Result<PlayedMove, IllegalMoveError> {
        let uci = UciMove::Normal {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
        };
        let legal = uci.to_move(&self.pos).map_err(|_| IllegalMoveError {
            uci: mv.to_string(),
        })?;

        let san = San::from_move(&self.pos, &legal).to_string();
        self.undo_stack.push(self.pos.clone());
        self.pos.play_unchecked(&legal);
        self.seen.push(self.pos.zobrist_hash(EnPassantMode::Legal));

        let played = PlayedMove {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
            san,
        };
        self.moves.push(played.clone());
        Ok(played)
    }

    fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                self.pos = previous;
                self.moves.pop();
                self.seen.pop();
                true
            }
            None => false,
        }
    }

    fn is_check(&self) -> bool {
        self.pos.is_check()
    }

    fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    fn is_stalemate(&self) -> bool {
        self.pos.is_stalemate()
    }

    fn is_draw(&self) -> bool {
        self.pos.is_stalemate()
            || self.pos.is_insufficient_material()
            || self.pos.halfmoves() >= 100
            || self.threefold()
    }

    fn is_game_over(&self) -> bool {
        self.pos.is_checkmate() || self.is_draw()
    }

    fn turn(&self) -> Color {
        self.pos.turn()
    }

    fn fen(&self) -> String {
        Fen::from_position(self.pos.clone(), EnPassantMode::Legal).to_string()
    }

    fn history(&self) -> &[PlayedMove] {
        &self.moves
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn load_fen(&mut self, fen: &str) -> Result<(), LoadError> {
        let pos: Chess = fen
            .parse::<Fen>()
            .map_err(|e| LoadError::BadPosition(e.to_string()))?
            .into_position(CastlingMode::Standard)
            .map_err(|e| LoadError::BadPosition(e.to_string()))?;
        let seen = vec![pos.zobrist_hash(EnPassantMode::Legal)];
        self.pos = pos;
        self.undo_stack.clear();
        self.moves.clear();
        self.seen = seen;
        Ok(())
    }
}
