/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The tapered evaluator.
//!
//! Scores flow White-relative through the accumulation and are signed for
//! the side to move only at the end. The order of operations matters: tiny
//! endings go to the recognisers, hopeless imbalances short-circuit through
//! the lazy path, and only then is the full positional sum computed.

/// Recognisers for small-material endings.
mod endgame;

/// Tunable parameters and their derived tables.
mod params;

/// Pawn-structure evaluation.
mod pawns;

pub use endgame::EndgameTable;
pub use params::*;
pub use pawns::PawnEvaluator;

use crate::score::PAWN_SCORE;
use crate::{movegen, tables, Bitboard, Board, Color, PhaseScore, PieceKind, Score, Square};

/// Margin outside `[alpha, beta]` beyond which the lazy evaluation is
/// trusted without finishing the positional terms.
const LAZY_THRESHOLD: i32 = 4 * PAWN_SCORE;

/// Per-evaluation scratch: attack sets and mobility sums per side and kind.
#[derive(Default)]
struct EvalTable {
    /// Squares attacked by each side's pieces of each kind.
    attacks: [[Bitboard; PieceKind::COUNT]; Color::COUNT],
    /// Summed mobility per side and kind.
    mobility: [[i32; PieceKind::COUNT]; Color::COUNT],
}

/// The positional evaluator. Owns the endgame table and the pawn evaluator.
pub struct Evaluator {
    endgame: EndgameTable,
    pawns: PawnEvaluator,
}

impl Evaluator {
    pub fn new(params: &Params) -> Self {
        Self {
            endgame: EndgameTable::new(params),
            pawns: PawnEvaluator::new(),
        }
    }

    /// Returns `true` for material combinations that cannot deliver mate:
    /// bare kings, a lone minor, two knights, or same-complex lone bishops.
    pub fn insufficient_material(board: &Board) -> bool {
        let white_knights = board.pieces_of(Color::White, PieceKind::Knight);
        let black_knights = board.pieces_of(Color::Black, PieceKind::Knight);
        let white_bishops = board.pieces_of(Color::White, PieceKind::Bishop);
        let black_bishops = board.pieces_of(Color::Black, PieceKind::Bishop);

        match board.piece_count() {
            2 => true,
            3 => (white_knights | black_knights | white_bishops | black_bishops).is_nonempty(),
            4 => {
                if white_knights.population() == 2 || black_knights.population() == 2 {
                    return true;
                }

                // Lone bishops on the same colour complex cannot interact.
                white_bishops.is_single()
                    && black_bishops.is_single()
                    && white_bishops
                        .same_color_as(black_bishops.first().unwrap())
                        .is_nonempty()
            }
            _ => false,
        }
    }

    /// Evaluates the position in centipawn-like units from the side to
    /// move's perspective. `alpha`/`beta` enable the lazy short-circuit.
    pub fn evaluate(&mut self, board: &Board, alpha: Score, beta: Score, params: &Params) -> Score {
        let piece_count = board.piece_count();

        // 1) Tiny endings go to the recognisers.
        if piece_count <= 5 {
            if let Some(score) = self.endgame.probe(board) {
                return score;
            }
        } else if board.pieces_of(Color::White, PieceKind::All).is_single()
            || board.pieces_of(Color::Black, PieceKind::All).is_single()
        {
            // 2) One side has a bare king but too many pieces remain for the
            //    table: the generic weak-king drive applies directly.
            return endgame::weak_king_endgame(board, Score::BASICALLY_WINNING);
        }

        // 3) Hopeless imbalances skip the positional terms entirely.
        let lazy = Self::lazy_evaluate(board);
        if lazy + LAZY_THRESHOLD < alpha || lazy - LAZY_THRESHOLD >= beta {
            return lazy;
        }

        // 4) The full positional sum.
        let mut table = EvalTable::default();
        let mut eval = board.material_eval + board.pst_eval;

        self.pawns.compute_passed_pawns(board);

        for color in Color::all() {
            let sign = color.sign();
            let them = color.opponent();
            let their_all = board.pieces_of(them, PieceKind::All);
            let their_king = board.king_square(them);

            // Squares the enemy pawns attack are unsafe for our pieces.
            let unsafe_squares = movegen::pawn_attack_squares(
                board.pieces_of(them, PieceKind::Pawn),
                them,
            );
            table.attacks[them.index()][PieceKind::Pawn.index()] = unsafe_squares;

            for kind in [
                PieceKind::Pawn,
                PieceKind::Knight,
                PieceKind::Bishop,
                PieceKind::Rook,
                PieceKind::Queen,
            ] {
                let pieces = board.pieces_of(color, kind);

                let has_pair = kind != PieceKind::Pawn && pieces.population() > 1;
                if has_pair {
                    eval += params.piece_pairs[kind.index()] * sign;
                }

                for src in pieces {
                    let attack_set = if kind == PieceKind::Pawn {
                        tables::pawn_captures(color, src)
                    } else {
                        let reachable = self.mobility_squares(board, kind, src);
                        eval += self.mobility_terms(
                            &mut table,
                            reachable,
                            unsafe_squares,
                            color,
                            kind,
                            params,
                        ) * sign;
                        tables::piece_moves(kind, src)
                    };

                    // Attack pairs: each enemy piece reachable on a clear ray.
                    for dst in attack_set & their_all {
                        if (tables::in_between(src, dst) & board.occupied()).is_empty() {
                            let attacked = board.piece_at(dst);
                            eval += params.attack[kind.index()][attacked.index()] * sign;
                        }
                    }

                    if kind == PieceKind::Pawn {
                        continue;
                    }

                    // King tropism.
                    let tropism_distance = tables::distance(
                        their_king.file_distance(src),
                        their_king.rank_distance(src),
                    );
                    eval += params.tropism[kind.index()][tropism_distance as usize] * sign;

                    let passed = self.pawns.passed_pawns(color);
                    match kind {
                        PieceKind::Bishop => {
                            eval += Self::bishop_terms(board, src, has_pair, them, params) * sign;
                        }
                        PieceKind::Rook => {
                            eval +=
                                Self::rook_terms(board, src, has_pair, color, passed, params)
                                    * sign;
                        }
                        PieceKind::Queen => {
                            eval += Self::queen_terms(board, src, color, passed, params) * sign;
                        }
                        _ => {}
                    }
                }
            }
        }

        // 5) Board and king-zone control.
        eval += Self::board_control(board, &mut table, params);

        // 6) Mobility difference per piece kind.
        for kind in [
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
        ] {
            let diff = table.mobility[Color::White.index()][kind.index()]
                - table.mobility[Color::Black.index()][kind.index()];
            let sign = if diff < 0 { -1 } else { 1 };
            let magnitude = (diff.abs() as usize).min(31);

            eval += params.better_mobility[kind.index()][magnitude] * sign;
        }

        // 7) Blend by phase, sign for the side to move, then add the pawn
        //    evaluator's already-signed return.
        let mut score = eval.blend(piece_count);
        if !board.side_to_move().is_white() {
            score = -score;
        }

        score + self.pawns.evaluate(board, params)
    }

    /// Material plus piece-square blend, signed for the side to move.
    pub fn lazy_evaluate(board: &Board) -> Score {
        let eval = board.material_eval + board.pst_eval;
        let score = eval.blend(board.piece_count());

        if board.side_to_move().is_white() {
            score
        } else {
            -score
        }
    }

    /// The squares a non-pawn piece can actually reach: its pseudo-attacks,
    /// minus slider destinations whose ray is obstructed.
    fn mobility_squares(&self, board: &Board, kind: PieceKind, src: Square) -> Bitboard {
        let pseudo = tables::piece_moves(kind, src);

        match kind {
            PieceKind::Knight => pseudo,
            _ => {
                let mut reachable = pseudo;
                for dst in pseudo {
                    if (tables::in_between(src, dst) & board.occupied()).is_nonempty() {
                        reachable ^= dst.bitboard();
                    }
                }
                reachable
            }
        }
    }

    /// Records one piece's attack set and returns its mobility terms.
    fn mobility_terms(
        &self,
        table: &mut EvalTable,
        reachable: Bitboard,
        unsafe_squares: Bitboard,
        color: Color,
        kind: PieceKind,
        params: &Params,
    ) -> PhaseScore {
        table.attacks[color.index()][kind.index()] |= reachable;

        let mobility = reachable.population() as usize;
        let safe_mobility = (reachable & !unsafe_squares).population() as usize;
        table.mobility[color.index()][kind.index()] += mobility as i32;

        params.mobility[kind.index()][mobility] + params.safe_mobility[kind.index()][safe_mobility]
    }

    /// Bishop pawn-colour complex: with a single bishop, enemy pawns fixed
    /// on its colour are targets.
    fn bishop_terms(
        board: &Board,
        src: Square,
        has_pair: bool,
        them: Color,
        params: &Params,
    ) -> PhaseScore {
        if has_pair {
            return PhaseScore::ZERO;
        }

        let enemy_pawns = board.pieces_of(them, PieceKind::Pawn);
        let good = enemy_pawns.same_color_as(src).population() as i32;
        let bad = enemy_pawns.opposite_color_as(src).population() as i32;

        match good - bad {
            d if d > 0 => params.good_bishop_pawns[(d as usize).min(7)],
            d if d < 0 => -params.good_bishop_pawns[((-d) as usize).min(7)],
            _ => PhaseScore::ZERO,
        }
    }

    /// Rook bonuses: doubled rooks on a clear shared file, an empty file,
    /// or standing on a passed pawn's file.
    fn rook_terms(
        board: &Board,
        src: Square,
        has_pair: bool,
        color: Color,
        passed: Bitboard,
        params: &Params,
    ) -> PhaseScore {
        let mut eval = PhaseScore::ZERO;

        if has_pair {
            let file_mask = Bitboard::from_file(src.file());
            let partners =
                board.pieces_of(color, PieceKind::Rook) & file_mask & !src.bitboard();

            for partner in partners {
                if (tables::in_between(src, partner) & board.occupied()).is_empty() {
                    eval += params.doubled_rooks;
                }
            }
        }

        let on_file = board.occupied() & Bitboard::from_file(src.file());
        if on_file == src.bitboard() {
            eval += params.empty_file_rook;
        } else {
            for pawn in on_file & passed {
                let viewed = if color.is_white() { pawn } else { pawn.flip_y() };
                eval += params.rook_behind_passer_pst[viewed.index()];
            }
        }

        eval
    }

    /// Queen bonuses, the same file terms as the rook's.
    fn queen_terms(
        board: &Board,
        src: Square,
        color: Color,
        passed: Bitboard,
        params: &Params,
    ) -> PhaseScore {
        let mut eval = PhaseScore::ZERO;

        let on_file = board.occupied() & Bitboard::from_file(src.file());
        if on_file == src.bitboard() {
            eval += params.empty_file_queen;
        } else {
            for pawn in on_file & passed {
                let viewed = if color.is_white() { pawn } else { pawn.flip_y() };
                eval += params.queen_behind_passer_pst[viewed.index()];
            }
        }

        eval
    }

    /// Partitions the board into exclusively-controlled squares, lowest
    /// piece kind first, and awards the control PSTs. Squares next to the
    /// enemy king count again on the king-control table.
    fn board_control(board: &Board, table: &mut EvalTable, params: &Params) -> PhaseScore {
        let mut white_control = Bitboard::EMPTY;
        let mut black_control = Bitboard::EMPTY;

        for kind in [
            PieceKind::Pawn,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
        ] {
            let claimed = white_control | black_control;

            let mut white = !claimed & table.attacks[Color::White.index()][kind.index()];
            let mut black = !claimed & table.attacks[Color::Black.index()][kind.index()];

            // Squares both sides attack with the same kind are contested.
            let contested = white & black;
            white &= !contested;
            black &= !contested;

            white_control |= white;
            black_control |= black;
        }

        let mut eval = PhaseScore::ZERO;

        let white_king_zone =
            white_control & tables::piece_moves(PieceKind::King, board.king_square(Color::Black));
        let black_king_zone =
            black_control & tables::piece_moves(PieceKind::King, board.king_square(Color::White));

        for square in white_control {
            eval += params.board_control_pst[square.index()];
        }
        for square in black_control {
            eval -= params.board_control_pst[square.flip_y().index()];
        }
        for square in white_king_zone {
            eval += params.king_control_pst[square.index()];
        }
        for square in black_king_zone {
            eval -= params.king_control_pst[square.flip_y().index()];
        }

        eval
    }
}
