/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Attack queries against a [`Board`].
//!
//! These answer "who attacks this square" for the side not on move, which is
//! what both check detection and king-move legality need. Sliding attacks are
//! resolved by intersecting pseudo-attack masks with an in-between occupancy
//! test rather than magic lookups.

use crate::{tables, Bitboard, Board, PieceKind, Square};

/// Returns a bitboard of enemy pieces attacking `dst`.
///
/// `stop_early` lets callers bail after the first attacker is found, when
/// only attacked-or-not matters. Squares in `attack_through` are treated as
/// transparent, which lets king-safety queries x-ray through the king itself.
pub fn attackers_of(board: &Board, dst: Square, stop_early: bool, attack_through: Bitboard) -> Bitboard {
    let us = board.side_to_move();
    let them = us.opponent();
    let mut attackers = Bitboard::EMPTY;

    // Pawn, knight, and king attacks are direct mask intersections. Note the
    // pawn mask is *our* capture pattern: the squares we could capture from
    // are exactly the squares an enemy pawn attacks us from.
    attackers |= tables::pawn_captures(us, dst) & board.pieces_of(them, PieceKind::Pawn);
    attackers |=
        tables::piece_moves(PieceKind::Knight, dst) & board.pieces_of(them, PieceKind::Knight);
    attackers |= tables::piece_moves(PieceKind::King, dst) & board.pieces_of(them, PieceKind::King);

    if stop_early && attackers.is_nonempty() {
        return attackers;
    }

    let occupancy = board.occupied() & !attack_through;

    let diagonal = tables::piece_moves(PieceKind::Bishop, dst)
        & (board.pieces_of(them, PieceKind::Bishop) | board.pieces_of(them, PieceKind::Queen));
    for src in diagonal {
        if (tables::in_between(dst, src) & occupancy).is_empty() {
            attackers |= src.bitboard();
        }
    }

    if stop_early && attackers.is_nonempty() {
        return attackers;
    }

    let straight = tables::piece_moves(PieceKind::Rook, dst)
        & (board.pieces_of(them, PieceKind::Rook) | board.pieces_of(them, PieceKind::Queen));
    for src in straight {
        if (tables::in_between(dst, src) & occupancy).is_empty() {
            attackers |= src.bitboard();
        }
    }

    attackers
}

/// Returns `true` if the given side's king is attacked.
///
/// For the side to move this is an O(1) read of the attack cache. For the
/// other side (used to vet pinned-piece and en-passant moves after they have
/// been applied) the answer is recomputed from scratch.
pub fn is_in_check(board: &Board, other_side: bool) -> bool {
    if !other_side {
        return board.checkers().is_nonempty();
    }

    let us = board.side_to_move().opponent();
    let them = board.side_to_move();
    let king = board.king_square(us);

    if (tables::piece_moves(PieceKind::Knight, king) & board.pieces_of(them, PieceKind::Knight))
        .is_nonempty()
    {
        return true;
    }

    if (tables::pawn_captures(us, king) & board.pieces_of(them, PieceKind::Pawn)).is_nonempty() {
        return true;
    }

    if (tables::piece_moves(PieceKind::King, king) & board.pieces_of(them, PieceKind::King))
        .is_nonempty()
    {
        return true;
    }

    let diagonal = tables::piece_moves(PieceKind::Bishop, king)
        & (board.pieces_of(them, PieceKind::Bishop) | board.pieces_of(them, PieceKind::Queen));
    for src in diagonal {
        if (tables::in_between(king, src) & board.occupied()).is_empty() {
            return true;
        }
    }

    let straight = tables::piece_moves(PieceKind::Rook, king)
        & (board.pieces_of(them, PieceKind::Rook) | board.pieces_of(them, PieceKind::Queen));
    for src in straight {
        if (tables::in_between(king, src) & board.occupied()).is_empty() {
            return true;
        }
    }

    false
}

/// Returns `true` if `dst` is attacked by the side not on move.
///
/// The side-to-move king is transparent to sliders here, so squares "behind"
/// a checked king along the checking ray are still reported as attacked and
/// the king cannot legally retreat onto them.
#[inline(always)]
pub fn is_square_attacked(board: &Board, dst: Square) -> bool {
    let king = board.pieces_of(board.side_to_move(), PieceKind::King);
    attackers_of(board, dst, true, king).is_nonempty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Params;

    #[test]
    fn attackers_resolve_blockers() {
        let params = Params::new();
        // Black to move, so the attackers reported are White's.
        let board = Board::from_fen("4r2k/8/8/8/8/4N3/8/4RK2 b - - 0 1", &params).unwrap();

        // The knight blocks the rook's ray to e5; only the knight reaches it.
        assert_eq!(
            attackers_of(&board, Square::E5, false, Bitboard::EMPTY),
            Square::E3.bitboard()
        );

        // With the knight transparent, the rook ray opens up.
        assert_eq!(
            attackers_of(&board, Square::E5, false, Square::E3.bitboard()),
            Square::E1.bitboard()
        );

        // e2 is attacked by both the rook and the knight (and the king).
        let attackers = attackers_of(&board, Square::E2, false, Bitboard::EMPTY);
        assert!(attackers.contains(Square::E1));
        assert!(attackers.contains(Square::F1));
    }

    #[test]
    fn check_detection_matches_cache() {
        let params = Params::new();

        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
            "4r2k/8/8/8/8/8/8/4K3 w - - 0 1",
            "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1",
        ];

        for fen in fens {
            let board = Board::from_fen(fen, &params).unwrap();
            let king = board.king_square(board.side_to_move());
            let from_scratch =
                attackers_of(&board, king, false, Bitboard::EMPTY).is_nonempty();
            assert_eq!(
                is_in_check(&board, false),
                from_scratch,
                "check mismatch for {fen}"
            );
        }
    }

    #[test]
    fn king_cannot_hide_behind_itself() {
        let params = Params::new();
        // Rook checks the king along the e-file; e1 is "behind" the king but
        // still attacked because the king is transparent to the ray.
        let board = Board::from_fen("4r3/8/8/8/4K3/8/8/7k w - - 0 1", &params).unwrap();
        assert!(is_square_attacked(&board, Square::E3));
        assert!(is_square_attacked(&board, Square::E2));
        assert!(!is_square_attacked(&board, Square::D3));
    }
}
