/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Recognisers for small-material endings.
//!
//! The table maps a *material hash* (a Zobrist signature of piece counts
//! only) to a handler. It is populated from minimal FENs of the canonical
//! endings, each in both colour variants, so probing is one hash lookup on
//! positions with five or fewer pieces.

use std::collections::HashMap;

use crate::{tables, Board, Color, Params, Score, Square};

/// How a recognised ending is scored.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum EndgameKind {
    /// Dead draw regardless of placement (e.g. KR vs KN).
    Draw,
    /// The strong side wins by driving the weak king to the edge.
    WeakKing,
    /// Fortress-like: play it out, but from a drawn baseline (e.g. KRP vs KR).
    WeakKingDrawish,
    /// The nominally strong side cannot win (KN vs KP, KB vs KP).
    CannotWin,
}

use EndgameKind::*;

/// Canonical endings and their handlers. Placement within the FEN is
/// irrelevant; only the material signature is keyed.
const ENDINGS: &[(&str, EndgameKind)] = &[
    ("K7/8/8/8/8/8/8/7k w - - 0 1", Draw),
    ("k7/8/8/8/8/8/8/7K w - - 0 1", Draw),
    // Lone minor pieces cannot mate.
    ("KN6/8/8/8/8/8/8/7k w - - 0 1", Draw),
    ("kn6/8/8/8/8/8/8/7K w - - 0 1", Draw),
    ("KB6/8/8/8/8/8/8/7k w - - 0 1", Draw),
    ("kb6/8/8/8/8/8/8/7K w - - 0 1", Draw),
    ("KR6/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("kr6/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    ("KQ6/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("kq6/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    // A minor piece cannot beat a pawn, and must even avoid losing to it.
    ("KN6/8/8/8/8/8/8/6pk w - - 0 1", CannotWin),
    ("kn6/8/8/8/8/8/8/6PK w - - 0 1", CannotWin),
    ("KB6/8/8/8/8/8/8/6pk w - - 0 1", CannotWin),
    ("kb6/8/8/8/8/8/8/6PK w - - 0 1", CannotWin),
    ("KN6/8/8/8/8/8/8/6nk w - - 0 1", Draw),
    ("KB6/8/8/8/8/8/8/6nk w - - 0 1", Draw),
    ("kb6/8/8/8/8/8/8/6NK w - - 0 1", Draw),
    ("KB6/8/8/8/8/8/8/6bk w - - 0 1", Draw),
    ("KR6/8/8/8/8/8/8/6pk w - - 0 1", WeakKing),
    ("kr6/8/8/8/8/8/8/6PK w - - 0 1", WeakKing),
    ("KR6/8/8/8/8/8/8/6nk w - - 0 1", Draw),
    ("kr6/8/8/8/8/8/8/6NK w - - 0 1", Draw),
    ("KR6/8/8/8/8/8/8/6bk w - - 0 1", Draw),
    ("kr6/8/8/8/8/8/8/6BK w - - 0 1", Draw),
    ("KR6/8/8/8/8/8/8/6rk w - - 0 1", Draw),
    ("KRP5/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("krp5/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    ("KRN5/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("krn5/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    ("KRB5/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("krb5/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    ("KRR5/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("krr5/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    ("KQ6/8/8/8/8/8/8/6pk w - - 0 1", WeakKing),
    ("kq6/8/8/8/8/8/8/6PK w - - 0 1", WeakKing),
    ("KQ6/8/8/8/8/8/8/6nk w - - 0 1", WeakKing),
    ("kq6/8/8/8/8/8/8/6NK w - - 0 1", WeakKing),
    ("KQ6/8/8/8/8/8/8/6bk w - - 0 1", WeakKing),
    ("kq6/8/8/8/8/8/8/6BK w - - 0 1", WeakKing),
    ("KQ6/8/8/8/8/8/8/6rk w - - 0 1", Draw),
    ("kq6/8/8/8/8/8/8/6RK w - - 0 1", Draw),
    ("KQ6/8/8/8/8/8/8/6qk w - - 0 1", Draw),
    ("KQP5/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("kqp5/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    ("KQN5/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("kqn5/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    ("KQB5/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("kqb5/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    ("KQR5/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("kqr5/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    ("KQQ5/8/8/8/8/8/8/7k w - - 0 1", WeakKing),
    ("kqq5/8/8/8/8/8/8/7K w - - 0 1", WeakKing),
    ("KRP5/8/8/8/8/8/8/6rk w - - 0 1", WeakKingDrawish),
    ("krp5/8/8/8/8/8/8/6RK w - - 0 1", WeakKingDrawish),
    ("KRN5/8/8/8/8/8/8/6rk w - - 0 1", WeakKing),
    ("krn5/8/8/8/8/8/8/6RK w - - 0 1", WeakKing),
    ("KRB5/8/8/8/8/8/8/6nk w - - 0 1", WeakKing),
    ("krb5/8/8/8/8/8/8/6NK w - - 0 1", WeakKing),
    ("KRB5/8/8/8/8/8/8/6bk w - - 0 1", WeakKing),
    ("krb5/8/8/8/8/8/8/6BK w - - 0 1", WeakKing),
    ("KRB5/8/8/8/8/8/8/6rk w - - 0 1", WeakKing),
    ("krb5/8/8/8/8/8/8/6RK w - - 0 1", WeakKing),
    ("KQP5/8/8/8/8/8/8/6qk w - - 0 1", WeakKing),
    ("kqp5/8/8/8/8/8/8/6QK w - - 0 1", WeakKing),
    ("KQN5/8/8/8/8/8/8/6qk w - - 0 1", WeakKing),
    ("kqn5/8/8/8/8/8/8/6QK w - - 0 1", WeakKing),
];

/// Drives the weak king towards edges and corners; indexed by its square.
#[rustfmt::skip]
const GENERAL_MATE: [i32; Square::COUNT] = [
    5000, 4500, 4000, 3500, 3500, 4000, 4500, 5000,
    4500, 4000, 3500, 3000, 3000, 3500, 4000, 4500,
    4000, 3500, 3000, 2500, 2500, 3000, 3500, 4000,
    3500, 3000, 2500, 2000, 2000, 2500, 3000, 3500,
    3500, 3000, 2500, 2000, 2000, 2500, 3000, 3500,
    4000, 3500, 3000, 2500, 2500, 3000, 3500, 4000,
    4500, 4000, 3500, 3000, 3000, 3500, 4000, 4500,
    5000, 4500, 4000, 3500, 3500, 4000, 4500, 5000,
];

/// Rewards a strong king close to the weak one; indexed by king distance.
const PROXIMITY: [i32; 11] = [0, 0, 90, 80, 70, 60, 50, 40, 30, 20, 10];

/// Material-hash-keyed dispatch to the ending handlers above.
pub struct EndgameTable {
    entries: HashMap<u64, EndgameKind>,
}

impl EndgameTable {
    /// Builds the table by instantiating each canonical ending and keying on
    /// its material hash.
    pub fn new(params: &Params) -> Self {
        let mut entries = HashMap::new();

        for (fen, kind) in ENDINGS {
            // The canonical FENs are static and always parse.
            let board = Board::from_fen(fen, params).unwrap();
            entries.insert(board.material_hash(), *kind);
        }

        Self { entries }
    }

    /// Scores the position if its material signature is recognised.
    pub fn probe(&self, board: &Board) -> Option<Score> {
        let kind = self.entries.get(&board.material_hash())?;

        let score = match kind {
            Draw => Score::DRAW,
            WeakKing => weak_king_endgame(board, Score::BASICALLY_WINNING),
            WeakKingDrawish => weak_king_endgame(board, Score::DRAW),
            CannotWin => cannot_win_endgame(board),
        };

        Some(score)
    }
}

/// The side ahead in endgame material; ties go to the side to move.
fn find_strong_side(board: &Board) -> Color {
    // Phase blending is irrelevant for a sign test.
    match board.material_endgame_sign() {
        0 => board.side_to_move(),
        s if s > 0 => Color::White,
        _ => Color::Black,
    }
}

/// Scores a won (or, with a `DRAW` base, drawish) ending for the strong
/// side: drive the weak king to the edge, bring the strong king close, and
/// keep the remaining pieces on their best squares.
pub(crate) fn weak_king_endgame(board: &Board, base: Score) -> Score {
    let strong = find_strong_side(board);
    let weak_king = board.king_square(strong.opponent());

    let white_king = board.king_square(Color::White);
    let black_king = board.king_square(Color::Black);
    let king_distance = tables::distance(
        white_king.file_distance(black_king),
        white_king.rank_distance(black_king),
    );

    // The PST sum is White-relative; view it from the strong side.
    let mut pst = board.pst_endgame();
    if strong == Color::Black {
        pst = -pst;
    }

    let edge_drive = if base == Score::DRAW {
        0
    } else {
        GENERAL_MATE[weak_king.index()]
    };

    let score = base + edge_drive + PROXIMITY[king_distance as usize] + pst;

    if board.side_to_move() == strong {
        score
    } else {
        -score
    }
}

/// The strong side holds the material edge but cannot convert it; its score
/// is clamped below the draw line so it never presses.
fn cannot_win_endgame(board: &Board) -> Score {
    let strong = find_strong_side(board);

    let mut pst = board.pst_endgame();
    if strong == Color::Black {
        pst = -pst;
    }

    let mut score = Score::new(pst);
    if score > Score::DRAW {
        score = Score::DRAW - 1;
    }

    if board.side_to_move() == strong {
        score
    } else {
        -score
    }
}

impl Board {
    /// Sign of the endgame material balance, for strong-side detection.
    #[inline(always)]
    pub(crate) fn material_endgame_sign(&self) -> i32 {
        self.material_eval.eg.signum()
    }

    /// The endgame component of the incremental PST sum.
    #[inline(always)]
    pub(crate) fn pst_endgame(&self) -> i32 {
        self.pst_eval.eg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(fen: &str) -> Option<Score> {
        let params = Params::new();
        let table = EndgameTable::new(&params);
        let board = Board::from_fen(fen, &params).unwrap();
        table.probe(&board)
    }

    #[test]
    fn drawn_endings_score_zero() {
        assert_eq!(probe("8/8/4k3/8/8/3K1N2/8/8 w - - 0 1"), Some(Score::DRAW));
        assert_eq!(probe("8/8/4k3/7r/8/3K1R2/8/8 w - - 0 1"), Some(Score::DRAW));
        assert_eq!(probe("8/8/4k3/7r/8/3K1Q2/8/8 w - - 0 1"), Some(Score::DRAW));
    }

    #[test]
    fn queen_endings_favor_the_strong_side() {
        // White queen vs lone black king, White to move: decisively winning.
        let score = probe("8/8/4k3/8/8/3K1Q2/8/8 w - - 0 1").unwrap();
        assert!(score >= Score::BASICALLY_WINNING);
        assert!(!score.is_mate());

        // Same material, weak side to move: decisively losing.
        let score = probe("8/8/4k3/8/8/3K1Q2/8/8 b - - 0 1").unwrap();
        assert!(score <= -Score::BASICALLY_WINNING);
    }

    #[test]
    fn cornered_kings_are_worse_off() {
        let centered = probe("8/8/4k3/8/8/4K3/Q7/8 b - - 0 1").unwrap();
        let cornered = probe("7k/8/8/8/8/4K3/Q7/8 b - - 0 1").unwrap();
        // Both losing for Black, but the cornered king is deeper in trouble.
        assert!(cornered < centered);
    }

    #[test]
    fn minor_versus_pawn_never_presses() {
        let score = probe("KN6/8/8/8/8/8/8/6pk w - - 0 1").unwrap();
        assert!(score <= Score::DRAW);
    }

    #[test]
    fn unknown_material_is_not_recognised() {
        assert_eq!(probe("8/8/4k3/8/8/3K1N2/4R3/8 w - - 0 1"), None);
    }
}
