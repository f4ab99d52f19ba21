/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Context, Result};

use crate::{
    tables, zobrist, Bitboard, CastleRights, Color, File, Move, Params, PhaseScore, PieceKind,
    Rank, Square,
};

/// FEN for the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The complete state of a chess position.
///
/// The board keeps a mailbox and per-kind bitboards in lockstep, plus a set
/// of incrementally-maintained values: the position, material, and pawn
/// Zobrist hashes, the material and piece-square evaluation sums, and an
/// attack cache describing checks and pins against the side-to-move king.
///
/// Boards are a few hundred bytes and `Copy`; the search clones one per ply
/// and mutates the clone, so there is no undo.
#[derive(Clone, Copy)]
pub struct Board {
    /// Piece kind on each square; [`PieceKind::None`] when empty.
    pub(crate) pieces: [PieceKind; Square::COUNT],

    /// Bitboards per color and kind; the [`PieceKind::All`] slot holds the
    /// union of that color's pieces.
    pub(crate) by_color: [[Bitboard; PieceKind::COUNT]; Color::COUNT],

    /// Union of both colors' pieces.
    pub(crate) all_pieces: Bitboard,

    pub(crate) side_to_move: Color,
    pub(crate) castle_rights: CastleRights,

    /// Set only when the en-passant capture is actually available to the side
    /// to move. This is tighter than FEN's rule and prunes search branches.
    pub(crate) en_passant: Option<Square>,

    pub(crate) fifty_move_count: u32,
    pub(crate) full_move_count: u32,

    pub(crate) king_square: [Square; Color::COUNT],

    // Attack cache, relative to the side-to-move king.
    pub(crate) checking_pieces: Bitboard,
    pub(crate) blocked_pieces: Bitboard,
    pub(crate) pinned_pieces: Bitboard,
    pub(crate) in_between_squares: Bitboard,

    // Incrementally-maintained hashes and evaluation sums.
    pub(crate) hash: u64,
    pub(crate) material_hash: u64,
    pub(crate) pawn_hash: u64,
    pub(crate) material_eval: PhaseScore,
    pub(crate) pst_eval: PhaseScore,

    /// True iff the previous ply was a null move.
    pub(crate) null_move: bool,
}

impl Board {
    /// A board with no pieces. Only useful as the error state after a failed
    /// FEN parse; it satisfies no invariants and must not be searched.
    pub fn cleared() -> Self {
        Self {
            pieces: [PieceKind::None; Square::COUNT],
            by_color: [[Bitboard::EMPTY; PieceKind::COUNT]; Color::COUNT],
            all_pieces: Bitboard::EMPTY,
            side_to_move: Color::White,
            castle_rights: CastleRights::ALL,
            en_passant: None,
            fifty_move_count: 0,
            full_move_count: 1,
            king_square: [Square::A8; Color::COUNT],
            checking_pieces: Bitboard::EMPTY,
            blocked_pieces: Bitboard::EMPTY,
            pinned_pieces: Bitboard::EMPTY,
            in_between_squares: Bitboard::EMPTY,
            hash: 0,
            material_hash: 0,
            pawn_hash: 0,
            material_eval: PhaseScore::ZERO,
            pst_eval: PhaseScore::ZERO,
            null_move: false,
        }
    }

    /// The standard starting position.
    pub fn start_position(params: &Params) -> Self {
        // The starting FEN always parses.
        Self::from_fen(START_FEN, params).unwrap()
    }

    /// Parses a FEN string into a [`Board`], deriving the attack cache and
    /// every incremental value.
    ///
    /// The en-passant field is stored only when the capture is actually
    /// available to the side to move.
    pub fn from_fen(fen: &str, params: &Params) -> Result<Self> {
        let mut board = Self::cleared();
        let mut tokens = fen.split_whitespace();

        // 1) Piece placement, ranks from the top down.
        let placement = tokens.next().context("FEN is empty")?;
        let mut index = 0usize;

        for c in placement.chars() {
            match c {
                '/' => {
                    if index % 8 != 0 {
                        bail!("Malformed FEN rank near {c:?} in {placement:?}");
                    }
                }
                '1'..='8' => index += c as usize - '0' as usize,
                _ => {
                    let (color, kind) = PieceKind::from_fen_char(c)
                        .with_context(|| format!("Bad placement field {placement:?}"))?;
                    if index >= Square::COUNT {
                        bail!("FEN placement overflows the board: {placement:?}");
                    }

                    let square = Square::from_index(index);
                    board.pieces[index] = kind;
                    board.by_color[color.index()][kind.index()] |= square.bitboard();
                    board.by_color[color.index()][PieceKind::All.index()] |= square.bitboard();

                    if kind == PieceKind::King {
                        board.king_square[color.index()] = square;
                    }

                    index += 1;
                }
            }
        }

        if index != Square::COUNT {
            bail!("FEN placement covers {index} squares, expected 64");
        }

        for color in Color::all() {
            if board.by_color[color.index()][PieceKind::King.index()].population() != 1 {
                bail!("FEN must contain exactly one king per side");
            }
        }

        // 2) Side to move.
        match tokens.next().context("FEN missing side-to-move field")? {
            "w" => board.side_to_move = Color::White,
            "b" => board.side_to_move = Color::Black,
            other => bail!("Invalid side-to-move field: {other:?}"),
        }

        // 3) Castle rights.
        board.castle_rights = CastleRights::NONE;
        let castling = tokens.next().context("FEN missing castling field")?;
        if castling != "-" {
            for c in castling.chars() {
                match c {
                    'K' => board.castle_rights.add(CastleRights::WHITE_KINGSIDE),
                    'Q' => board.castle_rights.add(CastleRights::WHITE_QUEENSIDE),
                    'k' => board.castle_rights.add(CastleRights::BLACK_KINGSIDE),
                    'q' => board.castle_rights.add(CastleRights::BLACK_QUEENSIDE),
                    _ => bail!("Invalid castling field: {castling:?}"),
                }
            }
        }

        // 4) En passant, kept only when a side-to-move pawn can take.
        let ep = tokens.next().unwrap_or("-");
        if ep != "-" {
            let square: Square = ep.parse().context("Invalid en-passant field")?;
            let takers = tables::pawn_captures(!board.side_to_move, square)
                & board.pieces_of(board.side_to_move, PieceKind::Pawn);
            board.en_passant = takers.is_nonempty().then_some(square);
        }

        // 5) Move counters; tolerated missing, as in abbreviated test FENs.
        board.fifty_move_count = match tokens.next() {
            Some(t) => t.parse().context("Invalid halfmove clock")?,
            None => 0,
        };
        board.full_move_count = match tokens.next() {
            Some(t) => t.parse().context("Invalid fullmove number")?,
            None => 1,
        };

        board.all_pieces = board.by_color[Color::White.index()][PieceKind::All.index()]
            | board.by_color[Color::Black.index()][PieceKind::All.index()];

        board.build_attack_boards();

        board.material_eval = board.calculate_material_eval(params);
        board.pst_eval = board.calculate_pst_eval(params);
        board.hash = board.calculate_hash();
        board.material_hash = board.calculate_material_hash();
        board.pawn_hash = board.calculate_pawn_hash();

        Ok(board)
    }

    /// The side to move.
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// The position hash.
    #[inline(always)]
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    /// The material-signature hash, keyed on piece counts only.
    #[inline(always)]
    pub const fn material_hash(&self) -> u64 {
        self.material_hash
    }

    /// The kind of piece on `square`, or [`PieceKind::None`].
    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> PieceKind {
        self.pieces[square.index()]
    }

    /// All occupied squares.
    #[inline(always)]
    pub const fn occupied(&self) -> Bitboard {
        self.all_pieces
    }

    /// Bitboard of `color`'s pieces of `kind`.
    #[inline(always)]
    pub const fn pieces_of(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.by_color[color.index()][kind.index()]
    }

    /// The square of `color`'s king.
    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Square {
        self.king_square[color.index()]
    }

    /// Pieces currently giving check to the side-to-move king.
    #[inline(always)]
    pub const fn checkers(&self) -> Bitboard {
        self.checking_pieces
    }

    /// The stored en-passant square, if the capture is available.
    #[inline(always)]
    pub const fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// The halfmove clock for the fifty-move rule, in plies.
    #[inline(always)]
    pub const fn fifty_move_count(&self) -> u32 {
        self.fifty_move_count
    }

    /// The fullmove number from the FEN this position descends from.
    #[inline(always)]
    pub const fn full_move_count(&self) -> u32 {
        self.full_move_count
    }

    /// True iff the previous ply was a null move.
    #[inline(always)]
    pub const fn has_made_null_move(&self) -> bool {
        self.null_move
    }

    /// Total number of pieces on the board; doubles as the phase measure.
    #[inline(always)]
    pub const fn piece_count(&self) -> u32 {
        self.all_pieces.population()
    }

    /// Rebuilds the attack cache for the side-to-move king: checkers,
    /// blocked sliders, pinned pieces, and the union of slider rays into the
    /// king (the legal block-target set during check evasion).
    pub(crate) fn build_attack_boards(&mut self) {
        let us = self.side_to_move;
        let king = self.king_square[us.index()];
        let them = &self.by_color[us.opponent().index()];

        let mut checking = Bitboard::EMPTY;
        let mut blocked = Bitboard::EMPTY;
        let mut pinned = Bitboard::EMPTY;
        let mut rays = Bitboard::EMPTY;

        // Pawn and knight checks are a direct mask intersection.
        checking |= tables::pawn_captures(us, king) & them[PieceKind::Pawn.index()];
        checking |= tables::piece_moves(PieceKind::Knight, king) & them[PieceKind::Knight.index()];

        // Sliders: an unobstructed ray is a check; a ray with exactly one
        // piece on it pins that piece.
        let diagonal = tables::piece_moves(PieceKind::Bishop, king)
            & (them[PieceKind::Bishop.index()] | them[PieceKind::Queen.index()]);
        let straight = tables::piece_moves(PieceKind::Rook, king)
            & (them[PieceKind::Rook.index()] | them[PieceKind::Queen.index()]);

        for attacker in diagonal | straight {
            let between = tables::in_between(king, attacker);
            let occupied = between & self.all_pieces;
            rays |= between;

            if occupied.is_empty() {
                checking |= attacker.bitboard();
            } else {
                blocked |= attacker.bitboard();
                if occupied.is_single() {
                    pinned |= occupied;
                }
            }
        }

        self.checking_pieces = checking;
        self.blocked_pieces = blocked;
        self.pinned_pieces = pinned;
        self.in_between_squares = rays;
    }

    /// Recomputes the position hash from scratch.
    pub fn calculate_hash(&self) -> u64 {
        let mut hash = 0u64;

        for color in Color::all() {
            for kind in PieceKind::PIECES {
                for square in self.pieces_of(color, kind) {
                    hash ^= zobrist::piece_key(color, kind, square);
                }
            }
        }

        hash ^= zobrist::castle_rights_key(self.castle_rights);

        if self.side_to_move.is_white() {
            hash ^= zobrist::white_to_move_key();
        }

        if let Some(square) = self.en_passant {
            hash ^= zobrist::en_passant_key(square);
        }

        hash
    }

    /// Recomputes the material hash (piece counts only) from scratch.
    pub fn calculate_material_hash(&self) -> u64 {
        let mut hash = 0u64;

        for color in Color::all() {
            for kind in PieceKind::PIECES {
                let count = self.pieces_of(color, kind).population();
                hash ^= zobrist::material_key(color, kind, count);
            }
        }

        hash
    }

    /// Recomputes the pawn hash from scratch.
    pub fn calculate_pawn_hash(&self) -> u64 {
        let mut hash = 0u64;

        for color in Color::all() {
            for square in self.pieces_of(color, PieceKind::Pawn) {
                hash ^= zobrist::piece_key(color, PieceKind::Pawn, square);
            }
        }

        hash
    }

    /// Recomputes the White-relative material evaluation from scratch.
    pub fn calculate_material_eval(&self, params: &Params) -> PhaseScore {
        let mut eval = PhaseScore::ZERO;

        // Kings never come off the board, so they carry no material term.
        for kind in PieceKind::PIECES {
            if kind == PieceKind::King {
                continue;
            }
            let white = self.pieces_of(Color::White, kind).population() as i32;
            let black = self.pieces_of(Color::Black, kind).population() as i32;
            eval += params.material[kind.index()] * (white - black);
        }

        eval
    }

    /// Recomputes the White-relative piece-square evaluation from scratch.
    pub fn calculate_pst_eval(&self, params: &Params) -> PhaseScore {
        let mut eval = PhaseScore::ZERO;

        for color in Color::all() {
            for kind in PieceKind::PIECES {
                for square in self.pieces_of(color, kind) {
                    eval += Self::pst_entry(params, kind, color, square);
                }
            }
        }

        eval
    }

    /// The signed, color-relative PST contribution of one piece.
    #[inline(always)]
    fn pst_entry(params: &Params, kind: PieceKind, color: Color, square: Square) -> PhaseScore {
        let viewed = if color.is_white() {
            square
        } else {
            square.flip_y()
        };
        params.pst[kind.index()][viewed.index()] * color.sign()
    }

    /// Applies `mv` with full incremental updates, recording the moved and
    /// captured kinds into the move.
    #[inline(always)]
    pub fn do_move(&mut self, mv: &mut Move, params: &Params) {
        self.do_move_inner(mv, Some(params));
    }

    /// Applies `mv` without hash or evaluation updates; the attack cache is
    /// still rebuilt. Used by perft and the pinned/en-passant legality check.
    #[inline(always)]
    pub fn do_move_no_precalc(&mut self, mv: &mut Move) {
        self.do_move_inner(mv, None);
    }

    fn do_move_inner(&mut self, mv: &mut Move, precalc: Option<&Params>) {
        let us = self.side_to_move;
        let them = us.opponent();
        let white_to_move = us.is_white();
        let src = mv.src;
        let dst = mv.dst;

        let old_en_passant = self.en_passant;
        let old_castle_rights = self.castle_rights;

        let moving = self.pieces[src.index()];
        mv.moved = moving;

        // 1) En passant: shuffle the captured pawn onto the destination
        //    square so the uniform capture handling below removes it.
        if moving == PieceKind::Pawn && Some(dst) == old_en_passant {
            let behind =
                Square::from_index((dst.index() as i32 + if white_to_move { 8 } else { -8 }) as usize);

            let their = &mut self.by_color[them.index()];
            their[PieceKind::Pawn.index()].toggle(behind);
            their[PieceKind::Pawn.index()].toggle(dst);
            their[PieceKind::All.index()].toggle(behind);
            their[PieceKind::All.index()].toggle(dst);

            self.pieces[dst.index()] = PieceKind::Pawn;
            self.pieces[behind.index()] = PieceKind::None;

            if let Some(params) = precalc {
                self.hash ^= zobrist::piece_key(them, PieceKind::Pawn, dst);
                self.hash ^= zobrist::piece_key(them, PieceKind::Pawn, behind);
                self.pawn_hash ^= zobrist::piece_key(them, PieceKind::Pawn, dst);
                self.pawn_hash ^= zobrist::piece_key(them, PieceKind::Pawn, behind);

                self.pst_eval += Self::pst_entry(params, PieceKind::Pawn, them, dst);
                self.pst_eval -= Self::pst_entry(params, PieceKind::Pawn, them, behind);
            }
        }

        // 2) Cache the captured piece (possibly the shuffled e.p. pawn).
        let captured = self.pieces[dst.index()];
        mv.captured = captured;

        // 3) Move the piece in the mailbox and bitboards.
        self.pieces[dst.index()] = moving;
        self.pieces[src.index()] = PieceKind::None;

        let ours = &mut self.by_color[us.index()];
        ours[moving.index()].toggle(src);
        ours[moving.index()].toggle(dst);
        ours[PieceKind::All.index()].toggle(src);
        ours[PieceKind::All.index()].toggle(dst);

        if let Some(params) = precalc {
            self.hash ^= zobrist::piece_key(us, moving, src);
            self.hash ^= zobrist::piece_key(us, moving, dst);
            self.pst_eval += Self::pst_entry(params, moving, us, dst);
            self.pst_eval -= Self::pst_entry(params, moving, us, src);
        }

        // 4) Clear en passant; a double push may set it again below.
        self.en_passant = None;

        // 5) Special-move side effects.
        match moving {
            PieceKind::Pawn => {
                let double_push = src.index().abs_diff(dst.index()) == 16;
                let beside = tables::adjacent_files(dst)
                    & self.by_color[them.index()][PieceKind::Pawn.index()];

                if double_push && beside.is_nonempty() {
                    let passed_through = Square::from_index(
                        (src.index() as i32 + if white_to_move { -8 } else { 8 }) as usize,
                    );
                    self.en_passant = Some(passed_through);
                }

                if precalc.is_some() {
                    self.pawn_hash ^= zobrist::piece_key(us, PieceKind::Pawn, src);
                    self.pawn_hash ^= zobrist::piece_key(us, PieceKind::Pawn, dst);
                }
            }
            PieceKind::Rook => {
                // A rook leaving its corner forfeits that castle right.
                match src {
                    Square::A1 => self.castle_rights.remove(CastleRights::WHITE_QUEENSIDE),
                    Square::H1 => self.castle_rights.remove(CastleRights::WHITE_KINGSIDE),
                    Square::A8 => self.castle_rights.remove(CastleRights::BLACK_QUEENSIDE),
                    Square::H8 => self.castle_rights.remove(CastleRights::BLACK_KINGSIDE),
                    _ => {}
                }
            }
            PieceKind::King => {
                self.king_square[us.index()] = dst;
                self.castle_rights.retain(if white_to_move {
                    CastleRights::BLACK_ALL
                } else {
                    CastleRights::WHITE_ALL
                });

                // Castling: shift the rook from its corner to the square the
                // king passed through.
                let castle = match (src, dst) {
                    (Square::E1, Square::G1) => Some((Square::H1, Square::F1)),
                    (Square::E1, Square::C1) => Some((Square::A1, Square::D1)),
                    (Square::E8, Square::G8) => Some((Square::H8, Square::F8)),
                    (Square::E8, Square::C8) => Some((Square::A8, Square::D8)),
                    _ => None,
                };

                if let Some((rook_src, rook_dst)) = castle {
                    self.pieces[rook_dst.index()] = PieceKind::Rook;
                    self.pieces[rook_src.index()] = PieceKind::None;

                    let ours = &mut self.by_color[us.index()];
                    ours[PieceKind::Rook.index()].toggle(rook_src);
                    ours[PieceKind::Rook.index()].toggle(rook_dst);
                    ours[PieceKind::All.index()].toggle(rook_src);
                    ours[PieceKind::All.index()].toggle(rook_dst);

                    if let Some(params) = precalc {
                        self.hash ^= zobrist::piece_key(us, PieceKind::Rook, rook_src);
                        self.hash ^= zobrist::piece_key(us, PieceKind::Rook, rook_dst);
                        self.pst_eval += Self::pst_entry(params, PieceKind::Rook, us, rook_dst);
                        self.pst_eval -= Self::pst_entry(params, PieceKind::Rook, us, rook_src);
                    }
                }
            }
            _ => {}
        }

        // 6) Remove the captured piece.
        if !captured.is_none() {
            if let Some(params) = precalc {
                self.material_eval -= params.material[captured.index()] * them.sign();

                let count = self.by_color[them.index()][captured.index()].population();
                self.material_hash ^= zobrist::material_key(them, captured, count)
                    ^ zobrist::material_key(them, captured, count - 1);

                self.pst_eval -= Self::pst_entry(params, captured, them, dst);
                self.hash ^= zobrist::piece_key(them, captured, dst);

                if captured == PieceKind::Pawn {
                    self.pawn_hash ^= zobrist::piece_key(them, PieceKind::Pawn, dst);
                }
            }

            let their = &mut self.by_color[them.index()];
            their[captured.index()].toggle(dst);
            their[PieceKind::All.index()].toggle(dst);

            // Capturing a rook on its home corner strips that right too.
            if captured == PieceKind::Rook {
                match dst {
                    Square::A1 => self.castle_rights.remove(CastleRights::WHITE_QUEENSIDE),
                    Square::H1 => self.castle_rights.remove(CastleRights::WHITE_KINGSIDE),
                    Square::A8 => self.castle_rights.remove(CastleRights::BLACK_QUEENSIDE),
                    Square::H8 => self.castle_rights.remove(CastleRights::BLACK_KINGSIDE),
                    _ => {}
                }
            }
        }

        // 7) Promotion.
        let promotion = mv.promotion;
        if moving == PieceKind::Pawn && promotion.is_piece() {
            self.pieces[dst.index()] = promotion;

            if let Some(params) = precalc {
                self.material_eval += params.material[promotion.index()] * us.sign();
                self.material_eval -= params.material[PieceKind::Pawn.index()] * us.sign();

                let promo_count = self.by_color[us.index()][promotion.index()].population();
                self.material_hash ^= zobrist::material_key(us, promotion, promo_count)
                    ^ zobrist::material_key(us, promotion, promo_count + 1);

                let pawn_count = self.by_color[us.index()][PieceKind::Pawn.index()].population();
                self.material_hash ^= zobrist::material_key(us, PieceKind::Pawn, pawn_count)
                    ^ zobrist::material_key(us, PieceKind::Pawn, pawn_count - 1);

                self.pst_eval += Self::pst_entry(params, promotion, us, dst);
                self.pst_eval -= Self::pst_entry(params, PieceKind::Pawn, us, dst);

                self.hash ^= zobrist::piece_key(us, PieceKind::Pawn, dst);
                self.hash ^= zobrist::piece_key(us, promotion, dst);
                self.pawn_hash ^= zobrist::piece_key(us, PieceKind::Pawn, dst);
            }

            let ours = &mut self.by_color[us.index()];
            ours[promotion.index()] |= dst.bitboard();
            ours[PieceKind::Pawn.index()].toggle(dst);
        }

        // 8) Flip the side to move.
        self.side_to_move = them;
        self.null_move = false;

        if precalc.is_some() {
            self.hash ^= zobrist::white_to_move_key();

            // 9) Fold en-passant and castle-rights changes into the hash.
            if let Some(square) = old_en_passant {
                self.hash ^= zobrist::en_passant_key(square);
            }
            if let Some(square) = self.en_passant {
                self.hash ^= zobrist::en_passant_key(square);
            }
            if self.castle_rights != old_castle_rights {
                self.hash ^= zobrist::castle_rights_key(old_castle_rights);
                self.hash ^= zobrist::castle_rights_key(self.castle_rights);
            }
        }

        // 10) Fifty-move clock: quiet non-pawn moves tick it, everything
        //     else resets it.
        if captured.is_none() && moving != PieceKind::Pawn {
            self.fifty_move_count += 1;
        } else {
            self.fifty_move_count = 0;
        }

        // 11) Re-derive the occupancy union and the attack cache.
        self.all_pieces = self.by_color[Color::White.index()][PieceKind::All.index()]
            | self.by_color[Color::Black.index()][PieceKind::All.index()];

        self.build_attack_boards();
    }

    /// Passes the turn without moving: flips the side, clears en passant,
    /// and rebuilds the attack cache. Material, PST, and counters are
    /// untouched. Marks the board so consecutive null moves are rejected.
    pub fn do_null_move(&mut self) {
        self.null_move = true;

        self.hash ^= zobrist::white_to_move_key();
        self.side_to_move = self.side_to_move.opponent();

        if let Some(square) = self.en_passant.take() {
            self.hash ^= zobrist::en_passant_key(square);
        }

        self.build_attack_boards();
    }
}

impl fmt::Display for Board {
    /// Renders the position as an ASCII diagram, rank 8 at the top.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in 0..8u8 {
            write!(f, "{} |", Rank::new(rank))?;
            for file in 0..8u8 {
                let square = Square::new(File::new(file), Rank::new(rank));
                let kind = self.piece_at(square);
                let c = if self.pieces_of(Color::White, PieceKind::All).contains(square) {
                    kind.as_fen_char(Color::White)
                } else if kind.is_piece() {
                    kind.as_fen_char(Color::Black)
                } else {
                    '.'
                };
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  +----------------")?;
        writeln!(f, "    a b c d e f g h")?;
        write!(f, "{} to move", self.side_to_move)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Params {
        Params::new()
    }

    fn apply(board: &mut Board, coordinate: &str, params: &Params) {
        let mut mv: Move = coordinate.parse().unwrap();
        board.do_move(&mut mv, params);
    }

    #[test]
    fn start_position_invariants() {
        let params = params();
        let board = Board::start_position(&params);

        assert_eq!(board.piece_count(), 32);
        assert_eq!(board.side_to_move(), Color::White);
        assert_eq!(board.castle_rights, CastleRights::ALL);
        assert_eq!(board.en_passant(), None);
        assert_eq!(board.king_square(Color::White), Square::E1);
        assert_eq!(board.king_square(Color::Black), Square::E8);
        assert_eq!(board.checkers(), Bitboard::EMPTY);

        // Disjoint color sets whose union is the occupancy.
        let white = board.pieces_of(Color::White, PieceKind::All);
        let black = board.pieces_of(Color::Black, PieceKind::All);
        assert_eq!(white & black, Bitboard::EMPTY);
        assert_eq!(white | black, board.occupied());

        // Material is balanced, so the White-relative sums are zero.
        assert_eq!(board.material_eval, PhaseScore::ZERO);
        assert_eq!(board.pst_eval, PhaseScore::ZERO);
    }

    #[test]
    fn incremental_values_match_recomputation() {
        let params = params();
        let mut board = Board::start_position(&params);

        for coordinate in ["e2e4", "c7c5", "g1f3", "d7d6", "f1b5", "c8d7", "b5d7", "d8d7", "e1g1"] {
            apply(&mut board, coordinate, &params);

            assert_eq!(board.hash, board.calculate_hash(), "hash after {coordinate}");
            assert_eq!(
                board.material_hash,
                board.calculate_material_hash(),
                "material hash after {coordinate}"
            );
            assert_eq!(
                board.pawn_hash,
                board.calculate_pawn_hash(),
                "pawn hash after {coordinate}"
            );
            assert_eq!(
                board.material_eval,
                board.calculate_material_eval(&params),
                "material eval after {coordinate}"
            );
            assert_eq!(
                board.pst_eval,
                board.calculate_pst_eval(&params),
                "pst eval after {coordinate}"
            );
        }
    }

    #[test]
    fn en_passant_only_stored_when_capturable() {
        let params = params();

        // No black pawn beside e4, so no en-passant square is recorded.
        let mut board = Board::start_position(&params);
        apply(&mut board, "e2e4", &params);
        assert_eq!(board.en_passant(), None);

        // With a black pawn on d4, the double push is capturable.
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/8/3p4/8/PPPPPPPP/RNBQKBNR w KQkq - 0 3", &params)
                .unwrap();
        apply(&mut board, "e2e4", &params);
        assert_eq!(board.en_passant(), Some(Square::E3));

        // The same rule filters the FEN field itself.
        let board = Board::from_fen(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            &params,
        )
        .unwrap();
        assert_eq!(board.en_passant(), None);
    }

    #[test]
    fn en_passant_capture_removes_the_pawn() {
        let params = params();
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/8/3p4/8/PPPPPPPP/RNBQKBNR w KQkq - 0 3", &params)
                .unwrap();
        apply(&mut board, "e2e4", &params);
        apply(&mut board, "d4e3", &params);

        assert_eq!(board.piece_at(Square::E4), PieceKind::None);
        assert_eq!(board.piece_at(Square::E3), PieceKind::Pawn);
        assert!(board.pieces_of(Color::Black, PieceKind::Pawn).contains(Square::E3));
        assert_eq!(board.hash, board.calculate_hash());
        assert_eq!(board.pawn_hash, board.calculate_pawn_hash());
    }

    #[test]
    fn castling_moves_the_rook() {
        let params = params();
        let mut board = Board::from_fen(
            "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1",
            &params,
        )
        .unwrap();

        apply(&mut board, "e1g1", &params);
        assert_eq!(board.piece_at(Square::G1), PieceKind::King);
        assert_eq!(board.piece_at(Square::F1), PieceKind::Rook);
        assert_eq!(board.piece_at(Square::H1), PieceKind::None);
        assert!(!board.castle_rights.has(CastleRights::WHITE_ALL));
        assert!(board.castle_rights.has(CastleRights::BLACK_ALL));

        apply(&mut board, "e8c8", &params);
        assert_eq!(board.piece_at(Square::C8), PieceKind::King);
        assert_eq!(board.piece_at(Square::D8), PieceKind::Rook);
        assert_eq!(board.piece_at(Square::A8), PieceKind::None);
        assert!(!board.castle_rights.has(CastleRights::BLACK_ALL));

        assert_eq!(board.hash, board.calculate_hash());
    }

    #[test]
    fn promotion_updates_material() {
        let params = params();
        let mut board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1", &params).unwrap();
        apply(&mut board, "a7a8q", &params);

        assert_eq!(board.piece_at(Square::A8), PieceKind::Queen);
        assert!(board.pieces_of(Color::White, PieceKind::Pawn).is_empty());
        assert_eq!(board.material_eval, board.calculate_material_eval(&params));
        assert_eq!(board.material_hash, board.calculate_material_hash());
        assert_eq!(board.pawn_hash, board.calculate_pawn_hash());
    }

    #[test]
    fn null_move_flips_side_and_hash() {
        let params = params();
        let mut board = Board::start_position(&params);
        let hash = board.hash();

        board.do_null_move();
        assert_eq!(board.side_to_move(), Color::Black);
        assert!(board.has_made_null_move());
        assert_ne!(board.hash(), hash);
        assert_eq!(board.hash, board.calculate_hash());

        board.do_null_move();
        assert_eq!(board.hash(), hash);
    }

    #[test]
    fn attack_cache_detects_pins_and_checks() {
        let params = params();

        // Black rook pins the white knight on e4 against the king on e1.
        let board = Board::from_fen("4r2k/8/8/8/4N3/8/8/4K3 w - - 0 1", &params).unwrap();
        assert!(board.pinned_pieces.contains(Square::E4));
        assert_eq!(board.checkers(), Bitboard::EMPTY);
        assert!(board.blocked_pieces.contains(Square::E8));

        // Remove the knight and the rook gives check instead.
        let board = Board::from_fen("4r2k/8/8/8/8/8/8/4K3 w - - 0 1", &params).unwrap();
        assert_eq!(board.checkers(), Square::E8.bitboard());
    }

    #[test]
    fn malformed_fens_are_rejected() {
        let params = params();
        assert!(Board::from_fen("", &params).is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8 w - - 0 1", &params).is_err());
        assert!(Board::from_fen("9/8/8/8/8/8/8/8 w - - 0 1", &params).is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 1", &params).is_err());
        assert!(Board::from_fen(START_FEN.replace('w', "x").as_str(), &params).is_err());
    }
}
