use crate::engine::eval::MaterialEvaluator;
use crate::engine::{Evaluator, SearchOutcome, INFINITY};
use crate::error::SearchError;
use shakmaty::{Chess, Position};

/// Depth-limited minimax with alpha-beta pruning.
///
/// Deliberately bounded: no quiescence search, no iterative deepening, no
/// transposition table. The engine plays at a fixed small depth and the
/// horizon effect is an accepted part of its strength.
pub struct AlphaBetaEngine {
    evaluator: MaterialEvaluator,
    nodes_searched: u64,
}

impl AlphaBetaEngine {
    pub fn new() -> Self {
        Self {
            evaluator: MaterialEvaluator,
            nodes_searched: 0,
        }
    }

    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    fn search(&mut self, pos: &Chess, depth: u8, mut alpha: i32, mut beta: i32, maximizing: bool) -> i32 {
        self.nodes_searched += 1;

        // Terminal test must agree with the evaluator: `is_game_over`
        // does not cover the 50-move rule.
        if depth == 0 || pos.is_game_over() || pos.halfmoves() >= 100 {
            return self.evaluator.evaluate(pos);
        }

        // Moves come back in the generator's stable order; no reordering.
        let moves = pos.legal_moves();
        if maximizing {
            let mut best = -INFINITY;
            for m in &moves {
                let mut child = pos.clone();
                child.play_unchecked(m);
                let score = self.search(&child, depth - 1, alpha, beta, false);
                best = best.max(score);
                alpha = alpha.max(score);
                if beta <= alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = INFINITY;
            for m in &moves {
                let mut child = pos.clone();
                child.play_unchecked(m);
                let score = self.search(&child, depth - 1, alpha, beta, true);
                best = best.min(score);
                beta = beta.min(score);
                if beta <= alpha {
                    break;
                }
            }
            best
        }
    }

    /// Picks the reply for the side to move. Ties keep the move the
    /// generator produced first, so the choice is deterministic.
    ///
    /// Callers must not ask for a move in a terminal position; a root
    /// with no legal moves is reported as [`SearchError::NoLegalMoves`].
    pub fn choose_move(&mut self, pos: &Chess, depth: u8) -> Result<SearchOutcome, SearchError> {
        let moves = pos.legal_moves();
        if moves.is_empty() {
            return Err(SearchError::NoLegalMoves);
        }

        let maximizing = pos.turn().is_white();
        let mut best_move = moves[0].clone();
        let mut best_score = if maximizing { -INFINITY } else { INFINITY };

        for m in &moves {
            let mut child = pos.clone();
            child.play_unchecked(m);
            // Each root child is searched with a fresh full window, so the
            // returned score is the exact minimax value.
            let score = self.search(
                &child,
                depth.saturating_sub(1),
                -INFINITY,
                INFINITY,
                !maximizing,
            );
            let better = if maximizing {
                score > best_score
            } else {
                score < best_score
            };
            if better {
                best_score = score;
                best_move = m.clone();
            }
        }

        Ok(SearchOutcome {
            mv: best_move,
            score: best_score,
            depth,
        })
    }
}

impl Default for AlphaBetaEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MATE_SCORE;
    use shakmaty::fen::Fen;
    use shakmaty::{CastlingMode, Move, Square};

    fn position(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .expect("valid FEN")
            .into_position(CastlingMode::Standard)
            .expect("legal position")
    }

    /// Reference minimax without pruning. Alpha-beta must agree with this
    /// on both the chosen move and the score.
    fn plain_minimax(evaluator: &MaterialEvaluator, pos: &Chess, depth: u8, maximizing: bool) -> i32 {
        if depth == 0 || pos.is_game_over() || pos.halfmoves() >= 100 {
            return evaluator.evaluate(pos);
        }
        let mut best = if maximizing { -INFINITY } else { INFINITY };
        for m in &pos.legal_moves() {
            let mut child = pos.clone();
            child.play_unchecked(m);
            let score = plain_minimax(evaluator, &child, depth - 1, !maximizing);
            best = if maximizing {
                best.max(score)
            } else {
                best.min(score)
            };
        }
        best
    }

    fn plain_choose(pos: &Chess, depth: u8) -> (Move, i32) {
        let evaluator = MaterialEvaluator;
        let maximizing = pos.turn().is_white();
        let moves = pos.legal_moves();
        let mut best_move = moves[0].clone();
        let mut best_score = if maximizing { -INFINITY } else { INFINITY };
        for m in &moves {
            let mut child = pos.clone();
            child.play_unchecked(m);
            let score = plain_minimax(&evaluator, &child, depth.saturating_sub(1), !maximizing);
            let better = if maximizing {
                score > best_score
            } else {
                score < best_score
            };
            if better {
                best_score = score;
                best_move = m.clone();
            }
        }
        (best_move, best_score)
    }

    #[test]
    fn finds_back_rank_mate_in_one() {
        let pos = position("6k1/5ppp/8/8/8/8/8/4R2K w - - 0 1");
        let outcome = AlphaBetaEngine::new()
            .choose_move(&pos, 3)
            .expect("moves exist");
        assert_eq!(outcome.mv.to(), Square::E8);
        assert_eq!(outcome.score, MATE_SCORE);
    }

    #[test]
    fn single_legal_move_is_returned() {
        // White king on h1 is in check from the queen on h3; Kg1 is the
        // only move.
        let pos = position("k7/8/8/8/8/7q/8/7K w - - 0 1");
        assert_eq!(pos.legal_moves().len(), 1);
        let outcome = AlphaBetaEngine::new()
            .choose_move(&pos, 2)
            .expect("moves exist");
        assert_eq!(outcome.mv.to(), Square::G1);
    }

    #[test]
    fn terminal_root_reports_no_legal_moves() {
        let mated = position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let err = AlphaBetaEngine::new().choose_move(&mated, 3).unwrap_err();
        assert_eq!(err, SearchError::NoLegalMoves);
    }

    #[test]
    fn depth_zero_matches_one_ply_greedy_choice() {
        let pos = Chess::default();
        let outcome = AlphaBetaEngine::new()
            .choose_move(&pos, 0)
            .expect("moves exist");

        // Exhaustive one-ply comparison with the bare evaluator.
        let evaluator = MaterialEvaluator;
        let mut best = -INFINITY;
        for m in &pos.legal_moves() {
            let mut child = pos.clone();
            child.play_unchecked(m);
            best = best.max(evaluator.evaluate(&child));
        }
        assert_eq!(outcome.score, best);
    }

    #[test]
    fn alpha_beta_matches_plain_minimax_on_corpus() {
        let corpus = [
            // Starting position.
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            // Italian-game middlegame, Black to move.
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
            // Open position with hanging material.
            "r1bqkb1r/ppp2ppp/2np1n2/4p3/2B1P3/2N2N2/PPPP1PPP/R1BQK2R w KQkq - 0 5",
        ];
        for fen in corpus {
            let pos = position(fen);
            for depth in 1..=3u8 {
                let outcome = AlphaBetaEngine::new()
                    .choose_move(&pos, depth)
                    .expect("moves exist");
                let (reference_move, reference_score) = plain_choose(&pos, depth);
                assert_eq!(outcome.mv, reference_move, "move at depth {depth} for {fen}");
                assert_eq!(
                    outcome.score, reference_score,
                    "score at depth {depth} for {fen}"
                );
            }
        }
    }

    #[test]
    fn alpha_beta_matches_plain_minimax_at_depth_four_in_endgame() {
        let pos = position("8/8/4k3/8/8/4K3/4R3/8 w - - 0 1");
        let outcome = AlphaBetaEngine::new()
            .choose_move(&pos, 4)
            .expect("moves exist");
        let (reference_move, reference_score) = plain_choose(&pos, 4);
        assert_eq!(outcome.mv, reference_move);
        assert_eq!(outcome.score, reference_score);
    }

    #[test]
    fn fifty_move_rule_stops_the_search() {
        // Halfmove clock already at 100: the position is drawn, even
        // though White could win the rook. The search must score it 0
        // instead of expanding through the draw.
        let pos = position("7k/8/8/8/8/8/1r5K/Q7 w - - 100 1");
        let mut engine = AlphaBetaEngine::new();
        let score = engine.search(&pos, 1, -INFINITY, INFINITY, true);
        assert_eq!(score, 0);
    }

    #[test]
    fn pruning_actually_prunes() {
        let pos = Chess::default();
        let mut pruned = AlphaBetaEngine::new();
        pruned.choose_move(&pos, 3).expect("moves exist");

        let evaluator = MaterialEvaluator;
        let mut full_nodes = 0u64;
        fn count(evaluator: &MaterialEvaluator, pos: &Chess, depth: u8, nodes: &mut u64) {
            *nodes += 1;
            if depth == 0 || pos.is_game_over() || pos.halfmoves() >= 100 {
                return;
            }
            for m in &pos.legal_moves() {
                let mut child = pos.clone();
                child.play_unchecked(m);
                count(evaluator, &child, depth - 1, nodes);
            }
        }
        for m in &pos.legal_moves() {
            let mut child = pos.clone();
            child.play_unchecked(m);
            count(&evaluator, &child, 2, &mut full_nodes);
        }
        assert!(pruned.nodes_searched() < full_nodes);
    }
}
