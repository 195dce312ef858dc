use crate::engine::eval_constants::*;
use crate::engine::{Evaluator, MATE_SCORE};
use shakmaty::{Chess, Position, Role};

/// Static material + piece-square evaluator. Positive scores favor White.
pub struct MaterialEvaluator;

fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => VAL_PAWN,
        Role::Knight => VAL_KNIGHT,
        Role::Bishop => VAL_BISHOP,
        Role::Rook => VAL_ROOK,
        Role::Queen => VAL_QUEEN,
        Role::King => VAL_KING,
    }
}

fn square_bonus(role: Role, table_index: usize) -> i32 {
    let table = match role {
        Role::Pawn => &PST_PAWN,
        Role::Knight => &PST_KNIGHT,
        Role::Bishop => &PST_BISHOP,
        Role::Rook => &PST_ROOK,
        Role::Queen => &PST_QUEEN,
        Role::King => &PST_KING,
    };
    table[table_index]
}

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, pos: &Chess) -> i32 {
        // Terminal overrides come first; material never decides a mate.
        if pos.is_checkmate() {
            return if pos.turn().is_white() {
                -MATE_SCORE
            } else {
                MATE_SCORE
            };
        }
        if pos.is_stalemate() || pos.is_insufficient_material() || pos.halfmoves() >= 100 {
            return 0;
        }

        let board = pos.board();
        let mut score = 0;
        for sq in board.occupied() {
            if let Some(piece) = board.piece_at(sq) {
                let index = usize::from(sq);
                let (rank, file) = (index / 8, index % 8);
                // The tables are written from White's perspective with
                // rank 8 first; Black gets the row-flipped index.
                let table_index = if piece.color.is_white() {
                    (7 - rank) * 8 + file
                } else {
                    rank * 8 + file
                };
                let value = piece_value(piece.role) + square_bonus(piece.role, table_index);
                score += if piece.color.is_white() { value } else { -value };
            }
        }
        score
    }
}
