/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops};

use anyhow::{bail, Result};

/// The color of a player or piece. White moves first, so [`Color`] defaults
/// to [`Color::White`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// Both colors, White first.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Returns `true` if this [`Color`] is White.
    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        matches!(self, Self::White)
    }

    /// Returns this [`Color`]'s opponent.
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Returns this [`Color`] as a `usize`, for indexing into lists.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// `1` for White, `-1` for Black; used to sign White-relative scores.
    #[inline(always)]
    pub const fn sign(&self) -> i32 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }
}

impl ops::Not for Color {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self::Output {
        self.opponent()
    }
}

impl fmt::Display for Color {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.is_white() { 'w' } else { 'b' })
    }
}

/// The kind of a piece occupying a square.
///
/// Two pseudo-kinds pad out the range so the same index space serves the
/// mailbox, the per-kind bitboard arrays, and the parameter tables:
/// [`PieceKind::None`] marks an empty mailbox square, and [`PieceKind::All`]
/// is the aggregate bitboard slot holding the union of one side's pieces.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum PieceKind {
    #[default]
    None,
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
    All,
}

impl PieceKind {
    /// Number of slots in a per-kind table, including the two pseudo-kinds.
    pub const COUNT: usize = 8;

    /// The six real piece kinds, in ascending value order.
    pub const PIECES: [Self; 6] = [
        Self::Pawn,
        Self::Knight,
        Self::Bishop,
        Self::Rook,
        Self::Queen,
        Self::King,
    ];

    /// Returns this [`PieceKind`] as a `usize`, for indexing into tables.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Creates a [`PieceKind`] from a table index.
    #[inline(always)]
    pub const fn from_index(index: usize) -> Self {
        debug_assert!(index < Self::COUNT);
        // Safety: `PieceKind` is `repr(u8)` with 8 variants.
        unsafe { std::mem::transmute(index as u8) }
    }

    /// Returns `true` for an empty mailbox slot.
    #[inline(always)]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns `true` for one of the six real piece kinds.
    #[inline(always)]
    pub const fn is_piece(&self) -> bool {
        !matches!(self, Self::None | Self::All)
    }

    /// Creates a [`PieceKind`] from a FEN piece character, together with the
    /// color implied by its case.
    pub fn from_fen_char(c: char) -> Result<(Color, Self)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };

        let kind = match c.to_ascii_lowercase() {
            'p' => Self::Pawn,
            'n' => Self::Knight,
            'b' => Self::Bishop,
            'r' => Self::Rook,
            'q' => Self::Queen,
            'k' => Self::King,
            _ => bail!("Invalid piece character: {c:?}"),
        };

        Ok((color, kind))
    }

    /// Creates a promotion [`PieceKind`] from its lowercase letter.
    pub fn from_promotion_char(c: char) -> Result<Self> {
        match c.to_ascii_lowercase() {
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            _ => bail!("Invalid promotion character: {c:?}"),
        }
    }

    /// The lowercase letter for this kind, as used in move and FEN output.
    #[inline(always)]
    pub const fn as_char(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
            Self::None | Self::All => '.',
        }
    }

    /// The FEN character for a piece of this kind and `color`.
    #[inline(always)]
    pub fn as_fen_char(&self, color: Color) -> char {
        if color.is_white() {
            self.as_char().to_ascii_uppercase()
        } else {
            self.as_char()
        }
    }
}

impl fmt::Display for PieceKind {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Castle rights for both sides, packed into four bits.
///
/// The packed value indexes the Zobrist castle-rights key table, so every
/// combination of rights hashes distinctly.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct CastleRights(pub(crate) u8);

impl CastleRights {
    pub const NONE: Self = Self(0);
    pub const WHITE_KINGSIDE: Self = Self(0b0001);
    pub const WHITE_QUEENSIDE: Self = Self(0b0010);
    pub const BLACK_KINGSIDE: Self = Self(0b0100);
    pub const BLACK_QUEENSIDE: Self = Self(0b1000);
    pub const WHITE_ALL: Self = Self(0b0011);
    pub const BLACK_ALL: Self = Self(0b1100);
    pub const ALL: Self = Self(0b1111);

    /// Number of distinct rights combinations.
    pub const COUNT: usize = 16;

    /// Returns the packed rights as a `usize`, for indexing the hash table.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if any of the rights in `rights` are held.
    #[inline(always)]
    pub const fn has(&self, rights: Self) -> bool {
        self.0 & rights.0 != 0
    }

    /// Removes the rights in `rights`.
    #[inline(always)]
    pub fn remove(&mut self, rights: Self) {
        self.0 &= !rights.0;
    }

    /// Removes every right not in `rights`.
    #[inline(always)]
    pub fn retain(&mut self, rights: Self) {
        self.0 &= rights.0;
    }

    /// Adds the rights in `rights`.
    #[inline(always)]
    pub fn add(&mut self, rights: Self) {
        self.0 |= rights.0;
    }
}

impl fmt::Display for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }

        if self.has(Self::WHITE_KINGSIDE) {
            write!(f, "K")?;
        }
        if self.has(Self::WHITE_QUEENSIDE) {
            write!(f, "Q")?;
        }
        if self.has(Self::BLACK_KINGSIDE) {
            write!(f, "k")?;
        }
        if self.has(Self::BLACK_QUEENSIDE) {
            write!(f, "q")?;
        }
        Ok(())
    }
}
