/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The engine's tunable parameters.
//!
//! Every knob is a named signed integer reachable through [`Params::set`],
//! which is what the `setvalue` command and personality files drive. Most
//! tables are not stored directly: they are *constructed* from a handful of
//! shape parameters (a rank slope and centralisation terms for PST-shaped
//! tables, a quadratic for curve-shaped ones), so a personality tunes shapes
//! rather than 64 squares at a time. [`Params::rebuild`] re-derives every
//! table and must be called after a batch of writes; no search may be in
//! progress while parameters change.

use crate::{PhaseScore, PieceKind, Score, Square};
use crate::score::{BISHOP_SCORE, KNIGHT_SCORE, PAWN_SCORE, QUEEN_SCORE, ROOK_SCORE};

/// Shape parameters for one phase of a PST-shaped table.
#[derive(Clone, Copy, Default, Debug)]
pub struct PstShape {
    /// Bonus per rank of advancement towards the promotion side.
    pub rank: i32,
    /// Bonus for file centralisation.
    pub file_center: i32,
    /// Bonus for rank centralisation.
    pub rank_center: i32,
    /// Bonus for overall centralisation.
    pub center: i32,
}

/// Shape parameters for both phases of a PST-shaped table.
#[derive(Clone, Copy, Default, Debug)]
pub struct PstConstruct {
    pub mg: PstShape,
    pub eg: PstShape,
}

impl PstConstruct {
    /// Evaluates the shape at `square`, seen from White's side.
    fn at(&self, square: Square) -> PhaseScore {
        let advance = 7 - square.rank().index() as i32;
        let file_centrality = 3 - square.file().center_distance() as i32;
        let rank_centrality = 3 - square.rank().center_distance() as i32;
        let centrality = file_centrality + rank_centrality;

        let shape = |s: &PstShape| {
            s.rank * advance
                + s.file_center * file_centrality
                + s.rank_center * rank_centrality
                + s.center * centrality
        };

        PhaseScore::new(shape(&self.mg), shape(&self.eg))
    }
}

/// One phase of a curve-shaped table: `q*x^2 + s*x + y`.
#[derive(Clone, Copy, Default, Debug)]
pub struct Curve {
    pub quadratic: i32,
    pub slope: i32,
    pub y_intercept: i32,
}

impl Curve {
    fn at(&self, x: i32) -> i32 {
        self.quadratic * x * x + self.slope * x + self.y_intercept
    }
}

/// Shape parameters for both phases of a curve-shaped table.
#[derive(Clone, Copy, Default, Debug)]
pub struct QuadraticConstruct {
    pub mg: Curve,
    pub eg: Curve,
}

impl QuadraticConstruct {
    fn at(&self, x: i32) -> PhaseScore {
        PhaseScore::new(self.mg.at(x), self.eg.at(x))
    }
}

const KINDS: usize = PieceKind::COUNT;
const SQUARES: usize = Square::COUNT;

/// The complete parameter bag: raw shape parameters plus the derived tables
/// the evaluator and searcher read.
///
/// Owned by the engine; the driver is the single writer, and writes only
/// happen between searches.
#[derive(Clone)]
pub struct Params {
    // Directly-stored parameters.
    pub material: [PhaseScore; KINDS],
    pub piece_pairs: [PhaseScore; KINDS],
    pub attack: [[PhaseScore; KINDS]; KINDS],
    pub doubled_rooks: PhaseScore,
    pub empty_file_rook: PhaseScore,
    pub empty_file_queen: PhaseScore,

    /// Late-move-reduction coefficients, in percent: current-depth,
    /// depth-left, searched-moves, and the overall multiplier.
    pub lmr: [i32; 4],

    // Shape parameters.
    pst_shape: [PstConstruct; KINDS],
    board_control_shape: PstConstruct,
    king_control_shape: PstConstruct,
    mobility_shape: [QuadraticConstruct; KINDS],
    safe_mobility_shape: [QuadraticConstruct; KINDS],
    better_mobility_shape: [QuadraticConstruct; KINDS],
    tropism_shape: [QuadraticConstruct; KINDS],
    good_bishop_shape: QuadraticConstruct,
    mobility_zero: [PhaseScore; KINDS],

    pawn_chain_back_default: PhaseScore,
    pawn_chain_front_default: PhaseScore,
    pawn_doubled_default: PhaseScore,
    pawn_passed_default: PhaseScore,
    pawn_tripled_default: PhaseScore,
    pawn_chain_back_shape: PstConstruct,
    pawn_chain_front_shape: PstConstruct,
    pawn_doubled_shape: PstConstruct,
    pawn_passed_shape: PstConstruct,
    pawn_tripled_shape: PstConstruct,

    rook_behind_passer_default: PhaseScore,
    queen_behind_passer_default: PhaseScore,
    rook_behind_passer_shape: PstConstruct,
    queen_behind_passer_shape: PstConstruct,

    // Derived tables, rebuilt by `rebuild`.
    pub pst: [[PhaseScore; SQUARES]; KINDS],
    pub board_control_pst: [PhaseScore; SQUARES],
    pub king_control_pst: [PhaseScore; SQUARES],
    pub mobility: [[PhaseScore; 32]; KINDS],
    pub safe_mobility: [[PhaseScore; 32]; KINDS],
    pub better_mobility: [[PhaseScore; 32]; KINDS],
    pub tropism: [[PhaseScore; 16]; KINDS],
    pub good_bishop_pawns: [PhaseScore; 8],
    pub pawn_chain_back_pst: [PhaseScore; SQUARES],
    pub pawn_chain_front_pst: [PhaseScore; SQUARES],
    pub pawn_doubled_pst: [PhaseScore; SQUARES],
    pub pawn_passed_pst: [PhaseScore; SQUARES],
    pub pawn_tripled_pst: [PhaseScore; SQUARES],
    pub rook_behind_passer_pst: [PhaseScore; SQUARES],
    pub queen_behind_passer_pst: [PhaseScore; SQUARES],
}

impl Params {
    /// Creates the default parameter set and builds its derived tables.
    ///
    /// Only material carries nonzero defaults; everything else is flat until
    /// a personality file or `setvalue` commands shape it, mirroring an
    /// engine that ships its tuning in personalities.
    pub fn new() -> Self {
        let mut material = [PhaseScore::ZERO; KINDS];
        material[PieceKind::Pawn.index()] = PhaseScore::splat(PAWN_SCORE);
        material[PieceKind::Knight.index()] = PhaseScore::splat(KNIGHT_SCORE);
        material[PieceKind::Bishop.index()] = PhaseScore::splat(BISHOP_SCORE);
        material[PieceKind::Rook.index()] = PhaseScore::splat(ROOK_SCORE);
        material[PieceKind::Queen.index()] = PhaseScore::splat(QUEEN_SCORE);
        // Losing the king loses the game; static exchange evaluation leans
        // on this value to never trade into a king capture.
        material[PieceKind::King.index()] = PhaseScore::splat(Score::WIN.inner());

        let mut params = Self {
            material,
            piece_pairs: [PhaseScore::ZERO; KINDS],
            attack: [[PhaseScore::ZERO; KINDS]; KINDS],
            doubled_rooks: PhaseScore::ZERO,
            empty_file_rook: PhaseScore::ZERO,
            empty_file_queen: PhaseScore::ZERO,
            lmr: [0; 4],
            pst_shape: [PstConstruct::default(); KINDS],
            board_control_shape: PstConstruct::default(),
            king_control_shape: PstConstruct::default(),
            mobility_shape: [QuadraticConstruct::default(); KINDS],
            safe_mobility_shape: [QuadraticConstruct::default(); KINDS],
            better_mobility_shape: [QuadraticConstruct::default(); KINDS],
            tropism_shape: [QuadraticConstruct::default(); KINDS],
            good_bishop_shape: QuadraticConstruct::default(),
            mobility_zero: [PhaseScore::ZERO; KINDS],
            pawn_chain_back_default: PhaseScore::ZERO,
            pawn_chain_front_default: PhaseScore::ZERO,
            pawn_doubled_default: PhaseScore::ZERO,
            pawn_passed_default: PhaseScore::ZERO,
            pawn_tripled_default: PhaseScore::ZERO,
            pawn_chain_back_shape: PstConstruct::default(),
            pawn_chain_front_shape: PstConstruct::default(),
            pawn_doubled_shape: PstConstruct::default(),
            pawn_passed_shape: PstConstruct::default(),
            pawn_tripled_shape: PstConstruct::default(),
            rook_behind_passer_default: PhaseScore::ZERO,
            queen_behind_passer_default: PhaseScore::ZERO,
            rook_behind_passer_shape: PstConstruct::default(),
            queen_behind_passer_shape: PstConstruct::default(),
            pst: [[PhaseScore::ZERO; SQUARES]; KINDS],
            board_control_pst: [PhaseScore::ZERO; SQUARES],
            king_control_pst: [PhaseScore::ZERO; SQUARES],
            mobility: [[PhaseScore::ZERO; 32]; KINDS],
            safe_mobility: [[PhaseScore::ZERO; 32]; KINDS],
            better_mobility: [[PhaseScore::ZERO; 32]; KINDS],
            tropism: [[PhaseScore::ZERO; 16]; KINDS],
            good_bishop_pawns: [PhaseScore::ZERO; 8],
            pawn_chain_back_pst: [PhaseScore::ZERO; SQUARES],
            pawn_chain_front_pst: [PhaseScore::ZERO; SQUARES],
            pawn_doubled_pst: [PhaseScore::ZERO; SQUARES],
            pawn_passed_pst: [PhaseScore::ZERO; SQUARES],
            pawn_tripled_pst: [PhaseScore::ZERO; SQUARES],
            rook_behind_passer_pst: [PhaseScore::ZERO; SQUARES],
            queen_behind_passer_pst: [PhaseScore::ZERO; SQUARES],
        };

        params.rebuild();
        params
    }

    /// Re-derives every constructed table from the shape parameters.
    pub fn rebuild(&mut self) {
        for kind in 0..KINDS {
            for square in Square::iter() {
                self.pst[kind][square.index()] = self.pst_shape[kind].at(square);
            }

            for x in 0..32 {
                self.mobility[kind][x as usize] = self.mobility_shape[kind].at(x);
                self.safe_mobility[kind][x as usize] = self.safe_mobility_shape[kind].at(x);
                self.better_mobility[kind][x as usize] = self.better_mobility_shape[kind].at(x);
            }
            self.mobility[kind][0] += self.mobility_zero[kind];

            for x in 0..16 {
                self.tropism[kind][x as usize] = self.tropism_shape[kind].at(x);
            }
        }

        for square in Square::iter() {
            let i = square.index();
            self.board_control_pst[i] = self.board_control_shape.at(square);
            self.king_control_pst[i] = self.king_control_shape.at(square);

            self.pawn_chain_back_pst[i] =
                self.pawn_chain_back_default + self.pawn_chain_back_shape.at(square);
            self.pawn_chain_front_pst[i] =
                self.pawn_chain_front_default + self.pawn_chain_front_shape.at(square);
            self.pawn_doubled_pst[i] =
                self.pawn_doubled_default + self.pawn_doubled_shape.at(square);
            self.pawn_passed_pst[i] = self.pawn_passed_default + self.pawn_passed_shape.at(square);
            self.pawn_tripled_pst[i] =
                self.pawn_tripled_default + self.pawn_tripled_shape.at(square);

            self.rook_behind_passer_pst[i] =
                self.rook_behind_passer_default + self.rook_behind_passer_shape.at(square);
            self.queen_behind_passer_pst[i] =
                self.queen_behind_passer_default + self.queen_behind_passer_shape.at(square);
        }

        for x in 0..8 {
            self.good_bishop_pawns[x as usize] = self.good_bishop_shape.at(x);
        }
    }

    /// Sets the named parameter, returning `false` for unknown names.
    ///
    /// Callers batch their writes and then call [`Params::rebuild`].
    pub fn set(&mut self, name: &str, value: i32) -> bool {
        // The trailing segment selects the phase; reductions are mg-only.
        let (base, phase_is_mg) = match name.rsplit_once('-') {
            Some((base, "mg")) => (base, true),
            Some((base, "eg")) => (base, false),
            _ => return false,
        };

        let write = |target: &mut PhaseScore| {
            if phase_is_mg {
                target.mg = value;
            } else {
                target.eg = value;
            }
        };

        if let Some(rest) = base.strip_prefix("material-") {
            if let Some(piece) = rest.strip_suffix("-pair") {
                let Some(kind) = piece_by_name(piece) else {
                    return false;
                };
                write(&mut self.piece_pairs[kind.index()]);
                return true;
            }
            let Some(kind) = piece_by_name(rest) else {
                return false;
            };
            if kind == PieceKind::King {
                // The king's exchange value is not tunable.
                return false;
            }
            write(&mut self.material[kind.index()]);
            return true;
        }

        if let Some(rest) = base.strip_prefix("attack-") {
            let Some((attacker, attacked)) = rest.split_once('-') else {
                return false;
            };
            let (Some(attacker), Some(attacked)) =
                (piece_by_name(attacker), piece_by_name(attacked))
            else {
                return false;
            };
            write(&mut self.attack[attacker.index()][attacked.index()]);
            return true;
        }

        if let Some(rest) = base.strip_prefix("pst-control-") {
            return set_pst_shape(&mut self.board_control_shape, rest, phase_is_mg, value);
        }
        if let Some(rest) = base.strip_prefix("pst-king-control-") {
            return set_pst_shape(&mut self.king_control_shape, rest, phase_is_mg, value);
        }
        if let Some(rest) = base.strip_prefix("pst-") {
            let Some((piece, component)) = rest.split_once('-') else {
                return false;
            };
            let Some(kind) = piece_by_name(piece) else {
                return false;
            };
            return set_pst_shape(
                &mut self.pst_shape[kind.index()],
                component,
                phase_is_mg,
                value,
            );
        }

        if let Some(rest) = base.strip_prefix("pawn-") {
            let targets: [(&str, &mut PhaseScore, &mut PstConstruct); 5] = [
                (
                    "chain-back",
                    &mut self.pawn_chain_back_default,
                    &mut self.pawn_chain_back_shape,
                ),
                (
                    "chain-front",
                    &mut self.pawn_chain_front_default,
                    &mut self.pawn_chain_front_shape,
                ),
                (
                    "doubled",
                    &mut self.pawn_doubled_default,
                    &mut self.pawn_doubled_shape,
                ),
                (
                    "passed",
                    &mut self.pawn_passed_default,
                    &mut self.pawn_passed_shape,
                ),
                (
                    "tripled",
                    &mut self.pawn_tripled_default,
                    &mut self.pawn_tripled_shape,
                ),
            ];

            for (prefix, default, shape) in targets {
                let Some(component) = rest
                    .strip_prefix(prefix)
                    .and_then(|r| r.strip_prefix('-'))
                else {
                    continue;
                };
                if component == "default" {
                    write(default);
                    return true;
                }
                return set_pst_shape(shape, component, phase_is_mg, value);
            }
            return false;
        }

        if let Some(rest) = base.strip_prefix("mobility-") {
            let (plain, shapes, rest) = if let Some(rest) = rest.strip_prefix("better-") {
                (false, &mut self.better_mobility_shape, rest)
            } else if let Some(rest) = rest.strip_prefix("safe-") {
                (false, &mut self.safe_mobility_shape, rest)
            } else {
                (true, &mut self.mobility_shape, rest)
            };

            let Some((piece, component)) = rest.split_once('-') else {
                return false;
            };
            let Some(kind) = piece_by_name(piece) else {
                return false;
            };

            // `mobility-<piece>-0` pins the value at zero mobility, on top
            // of whatever the curve yields there.
            if component == "0" && plain {
                write(&mut self.mobility_zero[kind.index()]);
                return true;
            }

            return set_curve(&mut shapes[kind.index()], component, phase_is_mg, value);
        }

        if let Some(rest) = base.strip_prefix("tropism-") {
            let Some((piece, component)) = rest.split_once('-') else {
                return false;
            };
            let Some(kind) = piece_by_name(piece) else {
                return false;
            };
            return set_curve(
                &mut self.tropism_shape[kind.index()],
                component,
                phase_is_mg,
                value,
            );
        }

        if let Some(rest) = base.strip_prefix("good-bishop-pawns-") {
            return set_curve(&mut self.good_bishop_shape, rest, phase_is_mg, value);
        }

        if let Some(rest) = base.strip_prefix("search-reductions-") {
            if !phase_is_mg {
                return false;
            }
            let index = match rest {
                "current-depth" => 0,
                "depth-left" => 1,
                "searched-moves" => 2,
                "all" => 3,
                _ => return false,
            };
            self.lmr[index] = value;
            return true;
        }

        for (prefix, default, shape) in [
            (
                "rook-behind-passed-pawn",
                &mut self.rook_behind_passer_default,
                &mut self.rook_behind_passer_shape,
            ),
            (
                "queen-behind-passed-pawn",
                &mut self.queen_behind_passer_default,
                &mut self.queen_behind_passer_shape,
            ),
        ] {
            let Some(rest) = base.strip_prefix(prefix) else {
                continue;
            };
            let Some(component) = rest.strip_prefix('-') else {
                return false;
            };
            if component == "default" {
                write(default);
                return true;
            }
            return set_pst_shape(shape, component, phase_is_mg, value);
        }

        match base {
            "doubled-rooks" => write(&mut self.doubled_rooks),
            "empty-file-rook" => write(&mut self.empty_file_rook),
            "empty-file-queen" => write(&mut self.empty_file_queen),
            _ => return false,
        }
        true
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

fn piece_by_name(name: &str) -> Option<PieceKind> {
    match name {
        "pawn" => Some(PieceKind::Pawn),
        "knight" => Some(PieceKind::Knight),
        "bishop" => Some(PieceKind::Bishop),
        "rook" => Some(PieceKind::Rook),
        "queen" => Some(PieceKind::Queen),
        "king" => Some(PieceKind::King),
        _ => None,
    }
}

fn set_pst_shape(construct: &mut PstConstruct, component: &str, mg: bool, value: i32) -> bool {
    let shape = if mg { &mut construct.mg } else { &mut construct.eg };

    match component {
        "rank" => shape.rank = value,
        "file-center" => shape.file_center = value,
        "rank-center" => shape.rank_center = value,
        "center" => shape.center = value,
        _ => return false,
    }
    true
}

fn set_curve(construct: &mut QuadraticConstruct, component: &str, mg: bool, value: i32) -> bool {
    let curve = if mg { &mut construct.mg } else { &mut construct.eg };

    match component {
        "quadratic" => curve.quadratic = value,
        "slope" => curve.slope = value,
        "yintercept" => curve.y_intercept = value,
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_defaults() {
        let params = Params::new();
        assert_eq!(params.material[PieceKind::Pawn.index()].mg, PAWN_SCORE);
        assert_eq!(params.material[PieceKind::Queen.index()].eg, QUEEN_SCORE);
        assert_eq!(
            params.material[PieceKind::King.index()].mg,
            Score::WIN.inner()
        );
    }

    #[test]
    fn set_and_rebuild_material() {
        let mut params = Params::new();
        assert!(params.set("material-pawn-mg", 200));
        assert_eq!(params.material[PieceKind::Pawn.index()].mg, 200);
        assert_eq!(params.material[PieceKind::Pawn.index()].eg, PAWN_SCORE);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut params = Params::new();
        assert!(!params.set("material-king-mg", 1));
        assert!(!params.set("material-dragon-mg", 1));
        assert!(!params.set("mobility-pawn", 1));
        assert!(!params.set("nonsense", 1));
        assert!(!params.set("", 1));
    }

    #[test]
    fn pst_shapes_construct_tables() {
        let mut params = Params::new();
        assert!(params.set("pst-pawn-rank-mg", 4));
        params.rebuild();

        // Each rank of advancement adds the slope once.
        assert_eq!(params.pst[PieceKind::Pawn.index()][Square::E2.index()].mg, 4);
        assert_eq!(params.pst[PieceKind::Pawn.index()][Square::E4.index()].mg, 12);
        assert_eq!(params.pst[PieceKind::Pawn.index()][Square::E7.index()].mg, 24);
        // The endgame phase was untouched.
        assert_eq!(params.pst[PieceKind::Pawn.index()][Square::E4.index()].eg, 0);
    }

    #[test]
    fn curves_construct_tables() {
        let mut params = Params::new();
        assert!(params.set("mobility-knight-slope-mg", 3));
        assert!(params.set("mobility-knight-yintercept-mg", -5));
        assert!(params.set("mobility-knight-0-mg", 7));
        params.rebuild();

        let knight = &params.mobility[PieceKind::Knight.index()];
        assert_eq!(knight[0].mg, -5 + 7);
        assert_eq!(knight[1].mg, -2);
        assert_eq!(knight[8].mg, 19);
    }

    #[test]
    fn attack_pairs_are_addressable() {
        let mut params = Params::new();
        assert!(params.set("attack-knight-queen-mg", 25));
        assert_eq!(
            params.attack[PieceKind::Knight.index()][PieceKind::Queen.index()].mg,
            25
        );
    }

    #[test]
    fn lmr_coefficients_are_addressable() {
        let mut params = Params::new();
        assert!(params.set("search-reductions-all-mg", 50));
        assert_eq!(params.lmr[3], 50);
        assert!(!params.set("search-reductions-all-eg", 50));
    }
}
