/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Score, MAX_PLY};

/// What a stored score means relative to the search window that produced it.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum EntryKind {
    /// Empty slot.
    #[default]
    None,
    /// The score is exact.
    Exact,
    /// The search failed high; the score is a lower bound.
    Lower,
    /// The search failed low; the score is an upper bound.
    Upper,
}

/// One transposition-table slot.
#[derive(Clone, Copy, Default, Debug)]
struct Entry {
    hash: u64,
    score: Score,
    depth_left: u8,
    age: u8,
    kind: EntryKind,
}

/// A fixed-size transposition table.
///
/// The slot count is a power of two; a position indexes by the low bits of
/// its hash and verifies the full hash on probe. Replacement favours deeper
/// entries within the current age and anything over a stale age. The age is
/// bumped once per root search.
pub struct TranspositionTable {
    entries: Vec<Entry>,
    mask: usize,
    age: u8,
}

impl TranspositionTable {
    /// Default slot count.
    pub const DEFAULT_SIZE: usize = 1 << 16;

    /// Creates a table with at least `size` slots, rounded up to a power of
    /// two.
    pub fn new(size: usize) -> Self {
        let size = size.max(2).next_power_of_two();

        Self {
            entries: vec![Entry::default(); size],
            mask: size - 1,
            age: 0,
        }
    }

    /// Drops every stored entry.
    pub fn reset(&mut self) {
        self.entries.fill(Entry::default());
        self.age = 0;
    }

    /// Starts a new search generation; older entries become replaceable.
    #[inline(always)]
    pub fn increment_age(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    /// Looks up `hash`, returning the entry kind, score, and remaining depth
    /// on a verified hit.
    ///
    /// Mate scores are stored relative to the node that produced them and
    /// re-based onto `current_depth` here, so "mate in n" stays truthful
    /// wherever the transposition is reached from.
    pub fn probe(&self, hash: u64, current_depth: i32) -> Option<(EntryKind, Score, u8)> {
        let entry = &self.entries[hash as usize & self.mask];

        if entry.kind == EntryKind::None || entry.hash != hash {
            return None;
        }

        let mut score = entry.score;
        if score.is_mate() {
            if score > Score::DRAW {
                score = score - current_depth;
            } else {
                score = score + current_depth;
            }
        }

        Some((entry.kind, score, entry.depth_left))
    }

    /// Stores a result. The slot is overwritten when empty, when its age is
    /// stale, or when the new entry searched at least as deep.
    pub fn insert(
        &mut self,
        hash: u64,
        score: Score,
        current_depth: i32,
        depth_left: i32,
        kind: EntryKind,
    ) {
        let slot = &mut self.entries[hash as usize & self.mask];

        let replace = slot.kind == EntryKind::None
            || slot.age != self.age
            || depth_left as u8 >= slot.depth_left;
        if !replace {
            return;
        }

        // Normalise mate scores to be relative to this node.
        let mut stored = score;
        if stored.is_mate() {
            if stored > Score::DRAW {
                stored = stored + current_depth;
            } else {
                stored = stored - current_depth;
            }
        }

        *slot = Entry {
            hash,
            score: stored,
            depth_left: depth_left.clamp(0, MAX_PLY as i32) as u8,
            age: self.age,
            kind,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_verifies_the_full_hash() {
        let mut table = TranspositionTable::new(16);
        let hash = 0x1234_5678_9abc_def0;

        table.insert(hash, Score::new(42), 0, 5, EntryKind::Exact);
        assert_eq!(table.probe(hash, 0), Some((EntryKind::Exact, Score::new(42), 5)));

        // A different hash mapping to the same slot must miss.
        let collision = hash ^ 0x0101_0000_0000_0000;
        assert_eq!(table.probe(collision, 0), None);
    }

    #[test]
    fn deeper_entries_replace_shallower_ones() {
        let mut table = TranspositionTable::new(16);
        let hash = 99;

        table.insert(hash, Score::new(10), 0, 6, EntryKind::Exact);
        // Shallower result does not displace it...
        table.insert(hash, Score::new(20), 0, 2, EntryKind::Exact);
        assert_eq!(table.probe(hash, 0).unwrap().1, Score::new(10));

        // ...but an equal-or-deeper one does.
        table.insert(hash, Score::new(30), 0, 6, EntryKind::Lower);
        assert_eq!(table.probe(hash, 0).unwrap().0, EntryKind::Lower);
    }

    #[test]
    fn stale_ages_are_replaceable() {
        let mut table = TranspositionTable::new(16);
        let hash = 7;

        table.insert(hash, Score::new(10), 0, 12, EntryKind::Exact);
        table.increment_age();

        // Shallower, but the stored entry is from an older search.
        table.insert(hash, Score::new(20), 0, 1, EntryKind::Exact);
        assert_eq!(table.probe(hash, 0).unwrap().1, Score::new(20));
    }

    #[test]
    fn mate_scores_rebase_by_ply() {
        let mut table = TranspositionTable::new(16);
        let hash = 1;

        // Mate found 4 plies into the search, stored from depth 4.
        let mate = Score::WIN - 4;
        table.insert(hash, mate, 4, 3, EntryKind::Exact);

        // Probed from depth 2, the same mate is 2 plies closer to the root.
        let (_, score, _) = table.probe(hash, 2).unwrap();
        assert_eq!(score, Score::WIN - 2);
    }
}
