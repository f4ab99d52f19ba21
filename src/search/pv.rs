/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use arrayvec::ArrayVec;

use crate::{Move, MAX_PLY};

/// The best line found from some node: a fixed-capacity sequence of moves,
/// rebuilt backwards as the search unwinds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrincipalVariation(ArrayVec<Move, MAX_PLY>);

impl PrincipalVariation {
    /// An empty line.
    pub const fn new() -> Self {
        Self(ArrayVec::new_const())
    }

    /// Empties the line.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Replaces this line with `mv` followed by `child`.
    ///
    /// Called when a move improves alpha: the child's line is already final,
    /// so the parent's line is the move plus everything below it. Truncates
    /// silently at capacity, which only drops moves beyond the maximum ply.
    #[inline(always)]
    pub fn copy_backward(&mut self, child: &Self, mv: Move) {
        self.0.clear();
        self.0.push(mv);
        for &m in child.0.iter().take(self.0.capacity() - 1) {
            self.0.push(m);
        }
    }

    /// The first move of the line, if any.
    #[inline(always)]
    pub fn first(&self) -> Option<Move> {
        self.0.first().copied()
    }

    /// Number of moves in the line.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the line is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the moves of the line in order.
    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.0.iter()
    }
}

impl fmt::Display for PrincipalVariation {
    /// Renders the line as space-separated coordinate moves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for mv in self.0.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{mv}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PieceKind, Square};

    #[test]
    fn copy_backward_prepends() {
        let e2e4 = Move::new(Square::E2, Square::E4, PieceKind::None);
        let e7e5 = Move::new(Square::E7, Square::E5, PieceKind::None);
        let g1f3 = Move::new(Square::G1, Square::F3, PieceKind::None);

        let mut child = PrincipalVariation::new();
        child.copy_backward(&PrincipalVariation::new(), e7e5);

        let mut parent = PrincipalVariation::new();
        parent.copy_backward(&child, e2e4);

        assert_eq!(parent.len(), 2);
        assert_eq!(parent.first(), Some(e2e4));
        assert_eq!(parent.to_string(), "e2e4 e7e5");

        // Replacing the line discards the old contents.
        parent.copy_backward(&PrincipalVariation::new(), g1f3);
        assert_eq!(parent.to_string(), "g1f3");
    }

    #[test]
    fn clear_empties() {
        let mut pv = PrincipalVariation::new();
        pv.copy_backward(
            &PrincipalVariation::new(),
            Move::new(Square::E2, Square::E4, PieceKind::None),
        );
        assert!(!pv.is_empty());

        pv.clear();
        assert!(pv.is_empty());
        assert_eq!(pv.first(), None);
    }
}
