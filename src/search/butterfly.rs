/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{PieceKind, Square};

/// History counters indexed by `(moving piece kind, destination square)`.
///
/// Quiet moves that cause a beta cutoff bump their counter; move ordering
/// uses the counter as a tie-breaker among otherwise unclassified moves.
/// Reset before every root search.
#[derive(Clone)]
pub struct ButterflyTable {
    counters: [[u32; Square::COUNT]; PieceKind::COUNT],
}

impl ButterflyTable {
    pub fn new() -> Self {
        Self {
            counters: [[0; Square::COUNT]; PieceKind::COUNT],
        }
    }

    /// Clears every counter.
    #[inline(always)]
    pub fn reset(&mut self) {
        self.counters = [[0; Square::COUNT]; PieceKind::COUNT];
    }

    /// The counter for moving `kind` to `dst`.
    #[inline(always)]
    pub fn get(&self, kind: PieceKind, dst: Square) -> u32 {
        self.counters[kind.index()][dst.index()]
    }

    /// Bumps the counter for moving `kind` to `dst`.
    #[inline(always)]
    pub fn add(&mut self, kind: PieceKind, dst: Square, amount: u32) {
        self.counters[kind.index()][dst.index()] += amount;
    }
}

impl Default for ButterflyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_reset() {
        let mut table = ButterflyTable::new();
        assert_eq!(table.get(PieceKind::Knight, Square::F3), 0);

        table.add(PieceKind::Knight, Square::F3, 1);
        table.add(PieceKind::Knight, Square::F3, 1);
        assert_eq!(table.get(PieceKind::Knight, Square::F3), 2);
        assert_eq!(table.get(PieceKind::Knight, Square::F6), 0);

        table.reset();
        assert_eq!(table.get(PieceKind::Knight, Square::F3), 0);
    }
}
