/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Result};
use arrayvec::ArrayVec;

use crate::{PieceKind, Square};

/// Upper bound on the number of pseudo-legal moves in any position.
pub const MAX_NUM_MOVES: usize = 256;

/// A list of moves, stored inline to avoid per-node allocation.
pub type MoveList = ArrayVec<Move, MAX_NUM_MOVES>;

/// Ordering bands assigned to a move's ordinal. Sorting is stable and
/// greater-is-better, so the most negative band is examined last.
pub mod ordinal {
    /// Move found on the principal variation (hash move).
    pub const PV_MOVE: i32 = -1_000_000;
    /// Base band for quiescence ordering, refined by victim/attacker values.
    pub const QUIESCENCE_MOVE: i32 = -1_000_000;
    /// Capture of a more valuable piece.
    pub const GOOD_CAPTURE: i32 = -2_000_000;
    /// Capture of an equally valuable piece.
    pub const EQUAL_CAPTURE: i32 = -3_000_000;
    /// First killer at this ply.
    pub const KILLER_1: i32 = -4_000_000;
    /// Second killer at this ply.
    pub const KILLER_2: i32 = -5_000_000;
    /// Quiet move; refined upwards by its butterfly counter.
    pub const BUTTERFLY: i32 = -6_000_000;
    /// Capture of a less valuable piece.
    pub const BAD_CAPTURE: i32 = -7_000_000;
    /// Non-pawn move whose source square is attacked by an enemy pawn.
    pub const UNSAFE: i32 = -8_000_000;
    /// Not yet classified.
    pub const NONE: i32 = 0;
}

/// A chess move from `src` to `dst`, with an optional promotion kind.
///
/// The `ordinal` carries the move-ordering band (or, at the root and during
/// internal iterative deepening, the score the move last returned). The
/// `moved`/`captured` fields are caches filled in by
/// [`Board::do_move`](crate::Board::do_move) for the benefit of undo-free
/// history bookkeeping. None of the three participate in equality.
#[derive(Clone, Copy, Debug)]
pub struct Move {
    pub src: Square,
    pub dst: Square,
    pub promotion: PieceKind,
    pub ordinal: i32,
    pub moved: PieceKind,
    pub captured: PieceKind,
}

impl Move {
    /// Creates a new [`Move`] with an unclassified ordinal.
    #[inline(always)]
    pub const fn new(src: Square, dst: Square, promotion: PieceKind) -> Self {
        Self {
            src,
            dst,
            promotion,
            ordinal: ordinal::NONE,
            moved: PieceKind::None,
            captured: PieceKind::None,
        }
    }
}

impl PartialEq for Move {
    /// Equality ignores the ordinal and the moved/captured caches.
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src && self.dst == other.dst && self.promotion == other.promotion
    }
}

impl Eq for Move {}

impl FromStr for Move {
    type Err = anyhow::Error;

    /// Parses pure coordinate notation like `e2e4` or `a7a8q`.
    ///
    /// An optional `x` between source and destination is tolerated on input;
    /// it is never produced on output.
    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() < 4 {
            bail!("Move string too short: {s:?}");
        }

        let src: Square = s.get(0..2).context("Malformed move string")?.parse()?;

        let offset = if chars[2] == 'x' { 3 } else { 2 };
        let dst: Square = s
            .get(offset..offset + 2)
            .context("Malformed move string")?
            .parse()?;

        let promotion = match chars.get(offset + 2) {
            Some(&c) => PieceKind::from_promotion_char(c)?,
            None => PieceKind::None,
        };

        Ok(Self::new(src, dst, promotion))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.src, self.dst)?;
        if self.promotion.is_piece() {
            write!(f, "{}", self.promotion)?;
        }
        Ok(())
    }
}

/// Stably sorts a move list so greater ordinals come first.
#[inline(always)]
pub fn sort_moves(moves: &mut MoveList) {
    moves.sort_by(|a, b| b.ordinal.cmp(&a.ordinal));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_round_trip() {
        let mv: Move = "e2e4".parse().unwrap();
        assert_eq!(mv.src, Square::E2);
        assert_eq!(mv.dst, Square::E4);
        assert_eq!(mv.promotion, PieceKind::None);
        assert_eq!(mv.to_string(), "e2e4");
    }

    #[test]
    fn capture_marker_tolerated() {
        let plain: Move = "e4d5".parse().unwrap();
        let marked: Move = "e4xd5".parse().unwrap();
        assert_eq!(plain, marked);
        // The `x` never appears on output.
        assert_eq!(marked.to_string(), "e4d5");
    }

    #[test]
    fn promotions() {
        let mv: Move = "a7a8q".parse().unwrap();
        assert_eq!(mv.promotion, PieceKind::Queen);
        assert_eq!(mv.to_string(), "a7a8q");

        let mv: Move = "a7xb8N".parse().unwrap();
        assert_eq!(mv.promotion, PieceKind::Knight);
        assert_eq!(mv.to_string(), "a7b8n");

        assert!("a7a8z".parse::<Move>().is_err());
    }

    #[test]
    fn ordering_is_stable_and_descending() {
        let mut moves = MoveList::new();
        let mut a = Move::new(Square::A2, Square::A3, PieceKind::None);
        a.ordinal = ordinal::BUTTERFLY;
        let mut b = Move::new(Square::B2, Square::B3, PieceKind::None);
        b.ordinal = ordinal::PV_MOVE;
        let mut c = Move::new(Square::C2, Square::C3, PieceKind::None);
        c.ordinal = ordinal::BUTTERFLY;

        moves.extend([a, b, c]);
        sort_moves(&mut moves);

        assert_eq!(moves[0], b);
        // Equal ordinals keep their relative order.
        assert_eq!(moves[1], a);
        assert_eq!(moves[2], c);
    }
}
