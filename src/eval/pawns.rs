/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{movegen, tables, Bitboard, Board, Color, Params, PhaseScore, PieceKind, Score};

/// Pawn-structure evaluation: passed, doubled, and tripled pawns plus pawn
/// chains.
///
/// The passed-pawn bitboards are computed up front (via
/// [`PawnEvaluator::compute_passed_pawns`]) so the main evaluator can award
/// its rook/queen-behind-passer terms from the same data this evaluator
/// scores.
pub struct PawnEvaluator {
    passed: [Bitboard; Color::COUNT],
}

impl PawnEvaluator {
    pub fn new() -> Self {
        Self {
            passed: [Bitboard::EMPTY; Color::COUNT],
        }
    }

    /// Recomputes the passed-pawn bitboards for both sides.
    pub fn compute_passed_pawns(&mut self, board: &Board) {
        for color in Color::all() {
            let our_pawns = board.pieces_of(color, PieceKind::Pawn);
            let their_pawns = board.pieces_of(color.opponent(), PieceKind::Pawn);

            // The masks are White-relative; Black's pawns are viewed through
            // a vertical flip of both the square and the enemy pawns.
            let viewed_theirs = if color.is_white() {
                their_pawns
            } else {
                their_pawns.flip_y()
            };

            let mut passed = Bitboard::EMPTY;
            for src in our_pawns {
                let viewed = if color.is_white() { src } else { src.flip_y() };
                if (tables::passed_pawn_mask(viewed) & viewed_theirs).is_empty() {
                    passed |= src.bitboard();
                }
            }

            self.passed[color.index()] = passed;
        }
    }

    /// The passed pawns of `color`, in board coordinates.
    #[inline(always)]
    pub fn passed_pawns(&self, color: Color) -> Bitboard {
        self.passed[color.index()]
    }

    /// Evaluates pawn structure, blended by phase and signed for the side to
    /// move. Expects [`PawnEvaluator::compute_passed_pawns`] to have run on
    /// the same position.
    pub fn evaluate(&self, board: &Board, params: &Params) -> Score {
        let mut eval = PhaseScore::ZERO;

        self.evaluate_pawn_chains(&mut eval, board, params);

        for color in Color::all() {
            let sign = color.sign();
            let our_pawns = board.pieces_of(color, PieceKind::Pawn);

            let viewed_ours = if color.is_white() {
                our_pawns
            } else {
                our_pawns.flip_y()
            };

            for src in our_pawns {
                let viewed = if color.is_white() { src } else { src.flip_y() };

                if self.passed[color.index()].contains(src) {
                    eval += params.pawn_passed_pst[viewed.index()] * sign;
                }

                // Friendly pawns ahead on the same file are doubled, or
                // tripled when there is more than one.
                let ahead = tables::squares_in_front(viewed) & viewed_ours;
                if ahead.is_nonempty() {
                    if ahead.is_single() {
                        eval += params.pawn_doubled_pst[viewed.index()] * sign;
                    } else {
                        eval += params.pawn_tripled_pst[viewed.index()] * sign;
                    }
                }
            }
        }

        let score = eval.blend(board.piece_count());
        if board.side_to_move().is_white() {
            score
        } else {
            -score
        }
    }

    /// Awards chain bonuses: every defended pawn earns the front bonus, and
    /// each of its defenders the back bonus. Found with one bulk
    /// shift-and-mask per side.
    fn evaluate_pawn_chains(&self, eval: &mut PhaseScore, board: &Board, params: &Params) {
        for color in Color::all() {
            let sign = color.sign();
            let our_pawns = board.pieces_of(color, PieceKind::Pawn);
            let defended = movegen::pawn_attack_squares(our_pawns, color) & our_pawns;

            for front in defended {
                let viewed_front = if color.is_white() { front } else { front.flip_y() };
                *eval += params.pawn_chain_front_pst[viewed_front.index()] * sign;

                // The defenders sit on the squares that capture onto `front`.
                let backers = tables::pawn_captures(color.opponent(), front) & our_pawns;
                for back in backers {
                    let viewed_back = if color.is_white() { back } else { back.flip_y() };
                    *eval += params.pawn_chain_back_pst[viewed_back.index()] * sign;
                }
            }
        }
    }
}

impl Default for PawnEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Square;

    #[test]
    fn passed_pawns_are_detected_for_both_sides() {
        let params = Params::new();
        // White's e5 pawn is passed; White's a2 pawn is not (black a7).
        // Black's h4 pawn is passed.
        let board =
            Board::from_fen("7k/p7/8/4P3/7p/8/P7/7K w - - 0 1", &params).unwrap();

        let mut pawns = PawnEvaluator::new();
        pawns.compute_passed_pawns(&board);

        assert_eq!(pawns.passed_pawns(Color::White), Square::E5.bitboard());
        assert_eq!(pawns.passed_pawns(Color::Black), Square::H4.bitboard());
    }

    #[test]
    fn passed_bonus_is_symmetric() {
        let mut params = Params::new();
        params.set("pawn-passed-default-mg", 40);
        params.set("pawn-passed-default-eg", 60);
        params.rebuild();

        // Mirrored positions must evaluate to the same side-to-move score.
        let white_view =
            Board::from_fen("7k/8/8/4P3/8/8/8/7K w - - 0 1", &params).unwrap();
        let black_view =
            Board::from_fen("7K/8/8/8/4p3/8/8/7k b - - 0 1", &params).unwrap();

        let mut pawns = PawnEvaluator::new();
        pawns.compute_passed_pawns(&white_view);
        let white_score = pawns.evaluate(&white_view, &params);

        pawns.compute_passed_pawns(&black_view);
        let black_score = pawns.evaluate(&black_view, &params);

        assert_eq!(white_score, black_score);
        assert!(white_score > Score::DRAW);
    }

    #[test]
    fn doubled_and_tripled_pawns_are_penalised_once_each() {
        let mut params = Params::new();
        params.set("pawn-doubled-default-mg", -20);
        params.set("pawn-doubled-default-eg", -20);
        params.rebuild();

        let single = Board::from_fen("7k/8/8/8/8/8/4P3/7K w - - 0 1", &params).unwrap();
        let doubled = Board::from_fen("7k/8/8/8/4P3/4P3/8/7K w - - 0 1", &params).unwrap();

        let mut pawns = PawnEvaluator::new();
        pawns.compute_passed_pawns(&single);
        let single_score = pawns.evaluate(&single, &params);

        pawns.compute_passed_pawns(&doubled);
        let doubled_score = pawns.evaluate(&doubled, &params);

        assert!(doubled_score < single_score);
    }

    #[test]
    fn chains_reward_front_and_back() {
        let mut params = Params::new();
        params.set("pawn-chain-front-default-mg", 10);
        params.set("pawn-chain-front-default-eg", 10);
        params.set("pawn-chain-back-default-mg", 5);
        params.set("pawn-chain-back-default-eg", 5);
        params.rebuild();

        // d4 defends e5: e5 gets the front bonus, d4 the back bonus.
        let board = Board::from_fen("7k/8/8/4P3/3P4/8/8/7K w - - 0 1", &params).unwrap();
        let loose = Board::from_fen("7k/8/8/4P3/8/3P4/8/7K w - - 0 1", &params).unwrap();

        let mut pawns = PawnEvaluator::new();
        pawns.compute_passed_pawns(&board);
        let chained = pawns.evaluate(&board, &params);

        pawns.compute_passed_pawns(&loose);
        let unchained = pawns.evaluate(&loose, &params);

        assert!(chained > unchained);
    }
}
