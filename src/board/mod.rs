/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Attack queries: who attacks a square, check detection.
pub mod attacks;

/// The `Bitboard` type and its operations.
mod bitboard;

/// Move generation, legality filtering, and move ordering.
pub mod movegen;

/// The `Move` type, move lists, and ordering bands.
mod moves;

/// Leaf-node counting for move generator validation.
mod perft;

/// Piece kinds, colors, and castle rights.
mod piece;

/// Board state, FEN parsing, and move application.
mod position;

/// Squares, files, and ranks.
mod square;

/// Pre-computed attack and geometry tables.
pub mod tables;

/// Fixed-seed Zobrist keys.
pub mod zobrist;

pub use bitboard::*;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use square::*;
