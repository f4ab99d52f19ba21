/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Pseudo-legal move generation with pin awareness.
//!
//! The generators lean on the board's attack cache: pinned pieces are
//! restricted to their pin ray up front, and king moves are vetted against
//! [`attacks::is_square_attacked`]. Two rare cases survive that filtering
//! (ring moves of diagonally pinned pieces, and en-passant captures that
//! uncover a rook on the fifth rank), so whenever pins or an en-passant
//! square exist, the affected moves are re-checked by actually applying them.

use crate::{
    attacks, ordinal, sort_moves, tables, Bitboard, Board, ButterflyTable, Color, Move, MoveList,
    Params, PieceKind, Square,
};

/// Squares attacked by the given pawns.
#[inline(always)]
pub fn pawn_attack_squares(pawns: Bitboard, color: Color) -> Bitboard {
    match color {
        Color::White => ((pawns & Bitboard::NOT_FILE_A) >> 9) | ((pawns & Bitboard::NOT_FILE_H) >> 7),
        Color::Black => ((pawns & Bitboard::NOT_FILE_A) << 7) | ((pawns & Bitboard::NOT_FILE_H) << 9),
    }
}

/// The promotion rank of `color`, as a destination mask.
#[inline(always)]
fn promotion_rank(color: Color) -> Bitboard {
    match color {
        Color::White => Bitboard::RANK_8,
        Color::Black => Bitboard::RANK_1,
    }
}

#[inline(always)]
fn push_move(moves: &mut MoveList, src: Square, dst: Square, promotes: bool) {
    if promotes {
        moves.push(Move::new(src, dst, PieceKind::Queen));
        moves.push(Move::new(src, dst, PieceKind::Rook));
        moves.push(Move::new(src, dst, PieceKind::Bishop));
        moves.push(Move::new(src, dst, PieceKind::Knight));
    } else {
        moves.push(Move::new(src, dst, PieceKind::None));
    }
}

/// Generates every legal move in the position.
pub fn generate_all_moves(board: &Board, moves: &mut MoveList) {
    // In check, a specialised generator enumerates only the evasions.
    if board.checkers().is_nonempty() {
        generate_check_evasions(board, moves);
        return;
    }

    moves.clear();

    let us = board.side_to_move();
    let them = us.opponent();
    let our_all = board.pieces_of(us, PieceKind::All);
    let their_all = board.pieces_of(them, PieceKind::All);
    let promo_rank = promotion_rank(us);

    for src in our_all {
        let moving = board.piece_at(src);

        let mut dsts = match moving {
            PieceKind::Pawn => {
                let mut dsts = tables::pawn_moves(us, src) & !board.occupied();

                // A blocked single push blocks the double push too: project
                // the blockers on the intermediate rank onto the double-push
                // destinations and mask them off.
                if us.is_white() {
                    if src.rank() == crate::Rank::TWO {
                        dsts &= !((board.occupied() & Bitboard::RANK_3) >> 8);
                    }
                } else if src.rank() == crate::Rank::SEVEN {
                    dsts &= !((board.occupied() & Bitboard::RANK_6) << 8);
                }

                dsts |= tables::pawn_captures(us, src) & their_all;

                if let Some(ep) = board.en_passant() {
                    if tables::pawn_captures(us, src).contains(ep) {
                        dsts |= ep.bitboard();
                    }
                }

                dsts
            }
            PieceKind::King => {
                let mut dsts = tables::piece_moves(PieceKind::King, src);

                // Castling: rights intact, path empty, transit square safe.
                // The origin square needs no check because a checked king is
                // handled by the evasion generator.
                if src == Square::E1 && us.is_white() {
                    if board.castle_rights.has(crate::CastleRights::WHITE_QUEENSIDE)
                        && (board.occupied()
                            & (Square::B1.bitboard() | Square::C1 | Square::D1))
                            .is_empty()
                        && !attacks::is_square_attacked(board, Square::D1)
                    {
                        dsts |= Square::C1.bitboard();
                    }
                    if board.castle_rights.has(crate::CastleRights::WHITE_KINGSIDE)
                        && (board.occupied() & (Square::F1.bitboard() | Square::G1)).is_empty()
                        && !attacks::is_square_attacked(board, Square::F1)
                    {
                        dsts |= Square::G1.bitboard();
                    }
                } else if src == Square::E8 && !us.is_white() {
                    if board.castle_rights.has(crate::CastleRights::BLACK_QUEENSIDE)
                        && (board.occupied()
                            & (Square::B8.bitboard() | Square::C8 | Square::D8))
                            .is_empty()
                        && !attacks::is_square_attacked(board, Square::D8)
                    {
                        dsts |= Square::C8.bitboard();
                    }
                    if board.castle_rights.has(crate::CastleRights::BLACK_KINGSIDE)
                        && (board.occupied() & (Square::F8.bitboard() | Square::G8)).is_empty()
                        && !attacks::is_square_attacked(board, Square::F8)
                    {
                        dsts |= Square::G8.bitboard();
                    }
                }

                dsts
            }
            kind => tables::piece_moves(kind, src),
        };

        dsts &= !our_all;

        // A pinned piece may only move along its pin ray.
        if board.pinned_pieces.contains(src) {
            dsts &= board.in_between_squares | board.blocked_pieces;
        }

        for dst in dsts {
            match moving {
                PieceKind::Pawn => push_move(moves, src, dst, promo_rank.contains(dst)),
                PieceKind::Knight => push_move(moves, src, dst, false),
                PieceKind::King => {
                    if !attacks::is_square_attacked(board, dst) {
                        push_move(moves, src, dst, false);
                    }
                }
                _ => {
                    // Sliders: accept only destinations with a clear ray.
                    if (tables::in_between(src, dst) & board.occupied()).is_empty() {
                        push_move(moves, src, dst, false);
                    }
                }
            }
        }
    }

    if should_validate(board) {
        validate_special_moves(board, moves);
    }
}

/// The number of legal moves in the position.
///
/// The contract is exactly `generate_all_moves(board).len()`; the list is
/// materialised and counted, since the pin and en-passant validation pass
/// needs real moves anyway whenever it applies.
pub fn count_legal_moves(board: &Board) -> usize {
    let mut moves = MoveList::new();
    generate_all_moves(board, &mut moves);
    moves.len()
}

/// Generates captures (including en passant and capturing promotions) only.
/// When the side to move is in check, all evasions are generated instead.
pub fn generate_captures(board: &Board, moves: &mut MoveList) {
    if board.checkers().is_nonempty() {
        generate_check_evasions(board, moves);
        return;
    }

    moves.clear();

    let us = board.side_to_move();
    let them = us.opponent();
    let our_all = board.pieces_of(us, PieceKind::All);
    let their_all = board.pieces_of(them, PieceKind::All);
    let promo_rank = promotion_rank(us);

    for src in our_all {
        let moving = board.piece_at(src);

        let mut dsts = if moving == PieceKind::Pawn {
            let mut dsts = tables::pawn_captures(us, src) & their_all;

            if let Some(ep) = board.en_passant() {
                if tables::pawn_captures(us, src).contains(ep) {
                    dsts |= ep.bitboard();
                }
            }

            dsts
        } else {
            tables::piece_moves(moving, src) & their_all
        };

        // A pinned piece can only capture along its ray, i.e. the blocked
        // attacker itself.
        if board.pinned_pieces.contains(src) {
            dsts &= board.blocked_pieces;
        }

        for dst in dsts {
            match moving {
                PieceKind::Pawn => push_move(moves, src, dst, promo_rank.contains(dst)),
                PieceKind::Knight => push_move(moves, src, dst, false),
                PieceKind::King => {
                    if !attacks::is_square_attacked(board, dst) {
                        push_move(moves, src, dst, false);
                    }
                }
                _ => {
                    if (tables::in_between(src, dst) & board.occupied()).is_empty() {
                        push_move(moves, src, dst, false);
                    }
                }
            }
        }
    }

    if should_validate(board) {
        validate_special_moves(board, moves);
    }
}

/// Generates all moves that evade the current check.
fn generate_check_evasions(board: &Board, moves: &mut MoveList) {
    moves.clear();

    let us = board.side_to_move();
    let them = us.opponent();
    let king = board.king_square(us);
    let our_all = board.pieces_of(us, PieceKind::All);
    let our_king = board.pieces_of(us, PieceKind::King);

    // 1) King steps, never onto an attacked square. The x-ray through the
    //    king inside `is_square_attacked` keeps it off its own check ray.
    let king_steps = tables::piece_moves(PieceKind::King, king) & !our_all;
    for dst in king_steps {
        if !attacks::is_square_attacked(board, dst) {
            moves.push(Move::new(king, dst, PieceKind::None));
        }
    }

    // 2) Against a double check only king moves help.
    let checkers = board.checkers();
    if checkers.population() == 2 {
        return;
    }

    // The single checker.
    let checker = checkers.first().expect("evasions need a checker");

    // 3) If the checker is a pawn that just double-pushed, capturing it en
    //    passant also lifts the check.
    if let Some(ep) = board.en_passant() {
        let behind = Square::from_index(
            (ep.index() as i32 + if us.is_white() { 8 } else { -8 }) as usize,
        );

        if checkers.contains(behind) {
            let takers = tables::pawn_captures(them, ep)
                & board.pieces_of(us, PieceKind::Pawn)
                & !board.pinned_pieces;
            for src in takers {
                moves.push(Move::new(src, ep, PieceKind::None));
            }
        }
    }

    // 4) Capture the checker. Pinned pieces cannot help, and the king's own
    //    captures were generated above.
    let excluded = our_king | board.pinned_pieces;
    generate_attacks_on_squares(board, moves, checkers, excluded);

    // A contact check or a pawn/knight check cannot be blocked.
    let checker_kind = board.piece_at(checker);
    let contact = (tables::piece_moves(PieceKind::King, king) & checkers).is_nonempty();
    if checker_kind <= PieceKind::Knight || contact {
        return;
    }

    if board.in_between_squares.is_empty() {
        return;
    }

    // 5) Block the checking ray.
    generate_moves_to_squares(board, moves, tables::in_between(king, checker), excluded);
}

/// Appends all non-excluded moves that capture onto the squares of
/// `dst_squares`, scanning backwards from each destination.
fn generate_attacks_on_squares(
    board: &Board,
    moves: &mut MoveList,
    dst_squares: Bitboard,
    exclude_src: Bitboard,
) {
    let us = board.side_to_move();
    let them = us.opponent();
    let include = !exclude_src;
    let promo_rank = promotion_rank(us);

    for dst in dst_squares {
        for kind in PieceKind::PIECES {
            let srcs = match kind {
                // The enemy capture pattern from `dst` reaches exactly the
                // squares our pawns capture it from.
                PieceKind::Pawn => {
                    tables::pawn_captures(them, dst) & board.pieces_of(us, PieceKind::Pawn)
                }
                _ => tables::piece_moves(kind, dst) & board.pieces_of(us, kind),
            } & include;

            for src in srcs {
                if kind == PieceKind::Pawn && promo_rank.contains(dst) {
                    push_move(moves, src, dst, true);
                } else if (tables::in_between(src, dst) & board.occupied()).is_empty() {
                    push_move(moves, src, dst, false);
                }
            }
        }
    }
}

/// Appends all non-excluded quiet moves onto the (empty) squares of
/// `dst_squares`. Used to generate blocks of a checking ray.
fn generate_moves_to_squares(
    board: &Board,
    moves: &mut MoveList,
    dst_squares: Bitboard,
    exclude_src: Bitboard,
) {
    let us = board.side_to_move();
    let include = !exclude_src;
    let promo_rank = promotion_rank(us);

    for dst in dst_squares {
        for kind in PieceKind::PIECES {
            let srcs = match kind {
                PieceKind::Pawn => {
                    // Pushes are found by walking backwards from the target:
                    // one square behind, or two when the target is on the
                    // double-push rank. The occupancy test below rejects a
                    // blocked intermediate square.
                    let back = if us.is_white() { 8i32 } else { -8i32 };
                    let double_rank = if us.is_white() {
                        crate::Rank::FOUR
                    } else {
                        crate::Rank::FIVE
                    };
                    // No pawn can push onto its own back ranks.
                    let impossible = if us.is_white() {
                        dst.rank() == crate::Rank::ONE
                    } else {
                        dst.rank() == crate::Rank::EIGHT
                    };

                    let mut srcs = Bitboard::EMPTY;
                    if !impossible {
                        let one = dst.index() as i32 + back;
                        if (0..64).contains(&one) {
                            srcs |= Square::from_index(one as usize).bitboard();
                        }
                        if dst.rank() == double_rank {
                            let two = dst.index() as i32 + 2 * back;
                            if (0..64).contains(&two) {
                                srcs |= Square::from_index(two as usize).bitboard();
                            }
                        }
                    }

                    srcs & board.pieces_of(us, PieceKind::Pawn)
                }
                _ => tables::piece_moves(kind, dst) & board.pieces_of(us, kind),
            } & include;

            for src in srcs {
                if (tables::in_between(src, dst) & board.occupied()).is_empty() {
                    if kind == PieceKind::Pawn && promo_rank.contains(dst) {
                        push_move(moves, src, dst, true);
                    } else {
                        push_move(moves, src, dst, false);
                    }
                }
            }
        }
    }
}

/// Pins and en-passant squares mark the rare positions where pseudo-legal
/// generation can emit an illegal move.
#[inline(always)]
fn should_validate(board: &Board) -> bool {
    board.pinned_pieces.is_nonempty() || board.en_passant().is_some()
}

/// Re-checks every pinned-piece move and en-passant capture by applying it
/// and verifying the mover's king is not left attacked.
fn validate_special_moves(board: &Board, moves: &mut MoveList) {
    moves.retain(|mv| {
        let pinned = board.pinned_pieces.contains(mv.src);
        let en_passant =
            board.piece_at(mv.src) == PieceKind::Pawn && board.en_passant() == Some(mv.dst);

        if !pinned && !en_passant {
            return true;
        }

        let mut next = *board;
        let mut applied = *mv;
        next.do_move_no_precalc(&mut applied);
        !attacks::is_in_check(&next, true)
    });
}

/// Assigns ordering ordinals for the main search and stably sorts the list,
/// best first.
///
/// Bands, from best to worst: the PV move, winning captures, equal captures,
/// the two killers, butterfly-boosted quiets, losing captures, and finally
/// non-pawn moves standing on a pawn-attacked square.
pub fn order_moves(
    board: &Board,
    moves: &mut MoveList,
    pv_move: Option<Move>,
    killers: [Option<Move>; 2],
    butterfly: &ButterflyTable,
    params: &Params,
    pv_node: bool,
) {
    let us = board.side_to_move();
    let them = us.opponent();
    let unsafe_squares =
        pawn_attack_squares(board.pieces_of(them, PieceKind::Pawn), them);

    for mv in moves.iter_mut() {
        let moving = board.piece_at(mv.src);
        let captured = board.piece_at(mv.dst);

        mv.ordinal = if pv_node && pv_move == Some(*mv) {
            ordinal::PV_MOVE
        } else if !captured.is_none() {
            let gain = params.material[captured.index()].mg;
            let risk = params.material[moving.index()].mg;

            if gain > risk {
                ordinal::GOOD_CAPTURE
            } else if gain == risk {
                ordinal::EQUAL_CAPTURE
            } else {
                ordinal::BAD_CAPTURE
            }
        } else if killers[0] == Some(*mv) {
            ordinal::KILLER_1
        } else if killers[1] == Some(*mv) {
            ordinal::KILLER_2
        } else if moving != PieceKind::Pawn && unsafe_squares.contains(mv.src) {
            ordinal::UNSAFE
        } else {
            ordinal::BUTTERFLY + butterfly.get(moving, mv.dst) as i32
        };
    }

    sort_moves(moves);
}

/// Assigns quiescence ordering ordinals and stably sorts the list: winning
/// victims first, unsafe movers last.
pub fn order_quiescence_moves(board: &Board, moves: &mut MoveList, params: &Params) {
    let us = board.side_to_move();
    let them = us.opponent();
    let unsafe_squares =
        pawn_attack_squares(board.pieces_of(them, PieceKind::Pawn), them);

    for mv in moves.iter_mut() {
        let moving = board.piece_at(mv.src);
        let captured = board.piece_at(mv.dst);

        mv.ordinal = if moving != PieceKind::Pawn && unsafe_squares.contains(mv.src) {
            ordinal::UNSAFE
        } else {
            ordinal::QUIESCENCE_MOVE + 1024 * params.material[captured.index()].mg
                - params.material[moving.index()].mg
        };
    }

    sort_moves(moves);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Params;

    fn legal_moves(fen: &str) -> MoveList {
        let params = Params::new();
        let board = Board::from_fen(fen, &params).unwrap();
        let mut moves = MoveList::new();
        generate_all_moves(&board, &mut moves);
        moves
    }

    fn contains(moves: &MoveList, coordinate: &str) -> bool {
        let mv: Move = coordinate.parse().unwrap();
        moves.iter().any(|m| *m == mv)
    }

    #[test]
    fn starting_position_has_twenty_moves() {
        let moves = legal_moves("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn kiwipete_has_forty_eight_moves() {
        let moves = legal_moves(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        );
        assert_eq!(moves.len(), 48);
        assert!(contains(&moves, "e1g1"));
        assert!(contains(&moves, "e1c1"));
    }

    #[test]
    fn position_three_has_fourteen_moves() {
        let moves = legal_moves("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
        assert_eq!(moves.len(), 14);
        assert!(contains(&moves, "e2e4"));
    }

    #[test]
    fn en_passant_reply_is_generated() {
        let params = Params::new();
        let mut board =
            Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", &params).unwrap();
        let mut mv: Move = "e2e4".parse().unwrap();
        board.do_move(&mut mv, &params);

        let mut moves = MoveList::new();
        generate_all_moves(&board, &mut moves);
        assert!(contains(&moves, "f4e3"));
    }

    #[test]
    fn en_passant_through_pin_is_rejected() {
        // Capturing e.p. removes both fifth-rank pawns and exposes the king
        // to the h5 rook: bxc6 must not be generated.
        let moves = legal_moves("7k/8/8/KPp4r/8/8/8/8 w - c6 0 1");
        assert!(!contains(&moves, "b5c6"));
        // The plain push is still fine.
        assert!(contains(&moves, "b5b6"));
    }

    #[test]
    fn pinned_pieces_stay_on_the_ray() {
        // The e4 knight is pinned by the e8 rook and may not move at all.
        let moves = legal_moves("4r2k/8/8/8/4N3/8/8/4K3 w - - 0 1");
        assert!(moves.iter().all(|m| m.src != Square::E4));

        // A pinned rook may slide along the pin ray.
        let moves = legal_moves("4r2k/8/8/8/4R3/8/8/4K3 w - - 0 1");
        assert!(contains(&moves, "e4e5"));
        assert!(contains(&moves, "e4e8"));
        assert!(!contains(&moves, "e4d4"));
    }

    #[test]
    fn promotions_expand_to_four_moves() {
        let moves = legal_moves("8/P6k/8/8/8/8/8/K7 w - - 0 1");
        let promotions: Vec<_> = moves.iter().filter(|m| m.src == Square::A7).collect();
        assert_eq!(promotions.len(), 4);
    }

    #[test]
    fn double_push_blocked_by_intermediate_piece() {
        let moves = legal_moves("rnbqkbnr/pppppppp/8/8/8/4n3/PPPPPPPP/RNBQKB1R w KQkq - 0 1");
        assert!(!contains(&moves, "e2e3"));
        assert!(!contains(&moves, "e2e4"));
        assert!(contains(&moves, "d2d4"));
    }

    #[test]
    fn castling_through_check_is_rejected() {
        // Black rook on f8 guards f1: no kingside castling through it.
        let moves = legal_moves("5r1k/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!contains(&moves, "e1g1"));
        assert!(contains(&moves, "e1c1"));
    }

    #[test]
    fn evasions_cover_blocks_and_king_moves() {
        // Rook checks along the e-file; the bishop and queen can block, and
        // the king can step off the file but not stay on it.
        let moves = legal_moves("4r2k/8/8/8/8/8/2B5/4K2Q w - - 0 1");

        assert!(contains(&moves, "c2e4")); // bishop block
        assert!(contains(&moves, "h1e4")); // queen block
        assert!(contains(&moves, "e1d2")); // king steps off the file
        assert!(!contains(&moves, "e1e2")); // still on the check ray
    }

    #[test]
    fn evasions_cover_captures_of_the_checker() {
        // The rook delivering check can be taken by the queen along rank 8.
        let moves = legal_moves("4r2Q/8/8/8/8/8/8/4K2k w - - 0 1");
        assert!(contains(&moves, "h8e8"));
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        // Rook on e8 and knight on f3 both check e1.
        let moves = legal_moves("4r3/8/8/8/8/5n2/8/4K2k w - - 0 1");
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.src == Square::E1));
    }

    #[test]
    fn count_matches_generation() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "7k/8/8/KPpP3r/8/8/8/8 w - c6 0 1",
        ];
        let params = Params::new();

        for fen in fens {
            let board = Board::from_fen(fen, &params).unwrap();
            let mut moves = MoveList::new();
            generate_all_moves(&board, &mut moves);
            assert_eq!(count_legal_moves(&board), moves.len(), "count mismatch for {fen}");
        }
    }
}
