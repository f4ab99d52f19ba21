/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The principal-variation searcher.
//!
//! A negamax over value-copied boards: every recursion clones its parent,
//! applies one move, and discards the clone on return. Nodes are typed
//! PV/CUT/ALL at compile time, which decides window shapes, re-search rules,
//! and which pruning applies. Cancellation is cooperative: the clock oracle
//! is polled at every node, and once `aborted` is set the tree unwinds with
//! a sentinel score and the previous iteration's result stands.

/// History counters for quiet fail-high moves.
mod butterfly;

/// Played-position history for repetition detection.
mod history;

/// The principal-variation buffer.
mod pv;

/// The transposition table.
mod ttable;

pub use butterfly::ButterflyTable;
pub use history::MoveHistory;
pub use pv::PrincipalVariation;
pub use ttable::{EntryKind, TranspositionTable};

use crate::score::PAWN_SCORE;
use crate::{
    movegen, tables, Board, Clock, Color, Evaluator, Move, MoveList, Params, PieceKind, Score,
    Square, MAX_PLY,
};

/// Result of checking a position against the game-ending rules, from the
/// side to move's point of view.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameResult {
    /// Play continues.
    Ongoing,
    /// Drawn: stalemate, fifty-move rule, repetition, or dead material.
    Draw,
    /// The side to move is checkmated.
    Loss,
}

/// Marker for the node types of the alpha-beta tree.
///
/// `Zw` names the node type a zero-window child is searched as: expected
/// cut-nodes have all-node children and vice versa, while PV nodes spawn
/// cut-node children for their zero-window probes.
trait NodeKind {
    const PV: bool;
    type Zw: NodeKind;
}

/// A node on the principal variation, searched with a full window.
struct PvNode;

/// A node expected to fail high.
struct CutNode;

/// A node expected to fail low.
struct AllNode;

impl NodeKind for PvNode {
    const PV: bool = true;
    type Zw = CutNode;
}

impl NodeKind for CutNode {
    const PV: bool = false;
    type Zw = AllNode;
}

impl NodeKind for AllNode {
    const PV: bool = false;
    type Zw = CutNode;
}

/// Null-move depth reduction.
const NULL_MOVE_REDUCTION: i32 = 3;

/// Internal-iterative-deepening depth reduction.
const IID_REDUCTION: i32 = 3;

/// Futility pruning margin per ply of remaining depth.
const FUTILITY_MARGIN: i32 = PAWN_SCORE;

/// Quiescence delta-pruning cushion.
const DELTA_MARGIN: i32 = 2 * PAWN_SCORE;

/// Quiescence and reduction threshold for static exchange evaluation.
const SEE_THRESHOLD: i32 = PAWN_SCORE;

/// Per-ply search state.
#[derive(Clone, Default)]
struct StackEntry {
    pv: PrincipalVariation,
    killer1: Option<Move>,
    killer2: Option<Move>,
    static_eval: Score,
    best_move: Option<Move>,
    pv_move: Option<Move>,
}

/// The outcome of one `go`: everything the driver needs to play a move and
/// report on the search.
#[derive(Clone, Debug)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: Score,
    pub depth: i32,
    pub nodes: u64,
    pub pv: PrincipalVariation,
}

/// The searcher. Owns the transposition table, the ordering heuristics, the
/// evaluator, and the move history; all of it is reused across searches.
pub struct Searcher {
    ttable: TranspositionTable,
    butterfly: ButterflyTable,
    evaluator: Evaluator,
    pub history: MoveHistory,
    root_moves: MoveList,
    stack: Vec<StackEntry>,
    clock: Clock,
    aborted: bool,
    node_count: u64,
}

impl Searcher {
    pub fn new(params: &Params, tt_size: usize) -> Self {
        Self {
            ttable: TranspositionTable::new(tt_size),
            butterfly: ButterflyTable::new(),
            evaluator: Evaluator::new(params),
            history: MoveHistory::new(),
            root_moves: MoveList::new(),
            stack: vec![StackEntry::default(); MAX_PLY + 2],
            clock: Clock::new(),
            aborted: false,
            node_count: 0,
        }
    }

    /// Forgets everything learned so far: hash table, history counters, and
    /// the played-move history. Used by `new`.
    pub fn reset(&mut self) {
        self.ttable.reset();
        self.butterfly.reset();
        self.history.clear();
    }

    /// Total nodes searched in the last `run`.
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Checks the game-ending rules for `board`.
    ///
    /// `check_move_count` additionally detects mate and stalemate, which
    /// costs a move generation; the in-search draw check skips it because
    /// the search observes empty move lists itself.
    pub fn check_board_game_result(&self, board: &Board, check_move_count: bool) -> GameResult {
        if check_move_count && movegen::count_legal_moves(board) == 0 {
            return if board.checkers().is_nonempty() {
                GameResult::Loss
            } else {
                GameResult::Draw
            };
        }

        if board.fifty_move_count() >= 100 {
            return GameResult::Draw;
        }

        if self.history.repetitions(board.hash()) > 1 {
            return GameResult::Draw;
        }

        if Evaluator::insufficient_material(board) {
            return GameResult::Draw;
        }

        GameResult::Ongoing
    }

    /// Runs iterative deepening on `board` under `clock`, emitting a
    /// thinking line per completed iteration, and returns the best result
    /// from the last completed iteration.
    pub fn run(&mut self, board: &Board, params: &Params, clock: Clock) -> SearchReport {
        self.clock = clock;
        self.aborted = false;
        self.node_count = 0;
        self.butterfly.reset();
        self.ttable.increment_age();
        for entry in self.stack.iter_mut() {
            *entry = StackEntry::default();
        }

        movegen::generate_all_moves(board, &mut self.root_moves);

        let mut report = SearchReport {
            best_move: None,
            score: Score::DRAW,
            depth: 0,
            nodes: 0,
            pv: PrincipalVariation::new(),
        };

        // No legal moves: the game is already over.
        if self.root_moves.is_empty() {
            report.score = if board.checkers().is_nonempty() {
                -Score::WIN
            } else {
                Score::DRAW
            };
            return report;
        }

        // Fall back to the first legal move if even depth one is cut short.
        report.best_move = Some(self.root_moves[0]);

        let mut pv = PrincipalVariation::new();
        let mut depth = 1;

        while depth < MAX_PLY as i32 && self.clock.should_continue_search(depth, self.node_count) {
            let score = self.root_search(board, &mut pv, depth, params);

            if self.aborted {
                break;
            }

            report.best_move = pv.first();
            report.score = score;
            report.depth = depth;
            report.pv = pv.clone();

            // A forced mate found: deeper iterations cannot improve on it.
            if score.is_mate() {
                break;
            }

            depth += 1;
        }

        report.nodes = self.node_count;
        report
    }

    /// Searches every root move, keeping the root list sorted best-first for
    /// the next iteration by recording each move's returned score.
    fn root_search(
        &mut self,
        board: &Board,
        pv: &mut PrincipalVariation,
        max_depth: i32,
        params: &Params,
    ) -> Score {
        let mut alpha = -Score::WIN;
        let beta = Score::WIN;
        let mut best = -Score::WIN;
        let mut searched = 0u64;

        for index in 0..self.root_moves.len() {
            let mut mv = self.root_moves[index];

            let mut next = *board;
            next.do_move(&mut mv, params);
            self.history.push(&next, &mv);

            let score = if searched == 0 {
                -self.search::<PvNode>(&next, -beta, -alpha, max_depth, 1, params)
            } else {
                let probe =
                    -self.search::<CutNode>(&next, -(alpha + 1), -alpha, max_depth, 1, params);
                if probe > alpha && !self.aborted {
                    -self.search::<PvNode>(&next, -beta, -alpha, max_depth, 1, params)
                } else {
                    probe
                }
            };

            self.history.pop();

            if self.aborted {
                break;
            }

            self.root_moves[index].ordinal = score.inner();

            if score > best {
                best = score;
                if best >= beta {
                    break;
                }
            }

            if score > alpha || searched == 0 {
                alpha = score;
                pv.copy_backward(&self.stack[1].pv, mv);
                self.emit_thinking(max_depth, score, pv);
            }

            searched += 1;
        }

        if !self.aborted {
            crate::sort_moves(&mut self.root_moves);
            self.emit_thinking(max_depth, best, pv);
        }

        best
    }

    /// The main alpha-beta node.
    fn search<N: NodeKind>(
        &mut self,
        board: &Board,
        mut alpha: Score,
        mut beta: Score,
        max_depth: i32,
        current_depth: i32,
        params: &Params,
    ) -> Score {
        // 1) Hard aborts: out of plies, or out of time.
        if current_depth >= MAX_PLY as i32 - 1 {
            self.aborted = true;
            return Score::NO_SCORE;
        }

        if !self.clock.should_continue_search(0, self.node_count) {
            self.aborted = true;
            return Score::NO_SCORE;
        }

        // 2) Draws by rule.
        if self.check_board_game_result(board, false) == GameResult::Draw {
            self.stack[current_depth as usize].pv.clear();
            return Score::DRAW;
        }

        // 3) Mate-distance pruning: even a mate here cannot beat a shorter
        //    mate already found above us.
        alpha = alpha.max(-Score::WIN + current_depth);
        beta = beta.min(Score::WIN - (current_depth + 1));
        if alpha >= beta {
            self.stack[current_depth as usize].pv.clear();
            return alpha;
        }

        // 4) At the horizon, drop into quiescence (never while in check:
        //    evasions must be searched at full width).
        let in_check = board.checkers().is_nonempty();
        if !in_check && current_depth >= max_depth {
            self.stack[current_depth as usize].pv.clear();
            return self.quiescence::<N>(board, alpha, beta, current_depth, max_depth, params);
        }

        // 5) This is a real node.
        self.node_count += 1;

        // 6) Transposition probe; only non-PV nodes may cut off on it.
        let depth_left = max_depth - current_depth;
        let mut tt_hit = false;

        if !N::PV {
            if let Some((kind, score, stored_depth)) =
                self.ttable.probe(board.hash(), current_depth)
            {
                if stored_depth as i32 >= depth_left {
                    tt_hit = true;

                    let cutoff = match kind {
                        EntryKind::Exact => true,
                        EntryKind::Lower => score >= alpha,
                        EntryKind::Upper => score <= alpha,
                        EntryKind::None => false,
                    };

                    if cutoff {
                        self.stack[current_depth as usize].pv.clear();
                        return score;
                    }
                }
            }
        }

        let is_mate_search = alpha.is_mate();
        let mut mate_threat = false;

        // 7) Verified null-move pruning: hand the opponent a free move; if
        //    the reduced search still clears beta, confirm with a reduced
        //    zero-window search from this side before trusting the cut.
        if !is_mate_search
            && !tt_hit
            && !board.has_made_null_move()
            && !N::PV
            && !in_check
            && depth_left > 2
        {
            let mut next = *board;
            next.do_null_move();

            let null_score = -self.search::<AllNode>(
                &next,
                -beta,
                -beta + 1,
                max_depth - NULL_MOVE_REDUCTION,
                current_depth + 1,
                params,
            );

            mate_threat = null_score.is_mate();
            if !mate_threat && null_score >= beta {
                let verified = self.search::<N>(
                    board,
                    beta - 1,
                    beta,
                    max_depth - NULL_MOVE_REDUCTION,
                    current_depth,
                    params,
                );

                mate_threat = verified.is_mate();
                if !mate_threat && verified >= beta {
                    self.stack[current_depth as usize].pv.clear();
                    return beta;
                }
            }

            if self.aborted {
                return Score::NO_SCORE;
            }
        }

        // 8) Static evaluation for this ply.
        let static_eval = if in_check {
            -Score::WIN + current_depth
        } else {
            self.evaluator.evaluate(board, alpha, beta, params)
        };
        self.stack[current_depth as usize].static_eval = static_eval;

        // 9) Futility: close to the horizon, a position already clearing
        //    beta by a growing margin is trusted to hold.
        if !mate_threat
            && !is_mate_search
            && !tt_hit
            && !N::PV
            && !in_check
            && depth_left < 4
            && static_eval - FUTILITY_MARGIN * depth_left >= beta
        {
            self.stack[current_depth as usize].pv.clear();
            return static_eval;
        }

        // 10) Generate; an empty list is mate or stalemate.
        let mut moves = MoveList::new();
        movegen::generate_all_moves(board, &mut moves);

        if moves.is_empty() {
            self.stack[current_depth as usize].pv.clear();
            return if in_check {
                -Score::WIN + current_depth
            } else {
                Score::DRAW
            };
        }

        // 11) The move loop.
        let result =
            self.search_loop::<N>(board, &mut moves, alpha, beta, max_depth, current_depth, params);

        // 12) Remember the bucket.
        if !self.aborted {
            let kind = if result >= beta {
                EntryKind::Lower
            } else if result < alpha {
                EntryKind::Upper
            } else {
                EntryKind::Exact
            };
            self.ttable
                .insert(board.hash(), result, current_depth, depth_left, kind);
        }

        result
    }

    /// Iterates the move list of one node: ordering, extensions, reductions,
    /// recursion, and the alpha/beta bookkeeping.
    #[allow(clippy::too_many_arguments)]
    fn search_loop<N: NodeKind>(
        &mut self,
        board: &Board,
        moves: &mut MoveList,
        mut alpha: Score,
        beta: Score,
        max_depth: i32,
        current_depth: i32,
        params: &Params,
    ) -> Score {
        let ply = current_depth as usize;
        let depth_left = max_depth - current_depth;

        // Internal iterative deepening: a reduced pass through this same
        // loop leaves a score on every move's ordinal; sorting by those
        // beats any static ordering. Close to the horizon, the static
        // ordering is used directly.
        if depth_left > IID_REDUCTION {
            self.search_loop::<N>(
                board,
                moves,
                alpha,
                beta,
                max_depth - IID_REDUCTION,
                current_depth,
                params,
            );
            if self.aborted {
                return alpha;
            }
            crate::sort_moves(moves);
        } else {
            let (pv_move, killers) = {
                let entry = &self.stack[ply];
                (entry.pv.first(), [entry.killer1, entry.killer2])
            };
            movegen::order_moves(board, moves, pv_move, killers, &self.butterfly, params, N::PV);
        }

        // Positions in check get one extra ply, past the first two plies.
        let in_check = board.checkers().is_nonempty();
        let position_extension = if current_depth >= 2 && in_check { 1 } else { 0 };

        let mut best = -Score::WIN;
        let mut searched: u64 = 0;

        for index in 0..moves.len() {
            let mv = moves[index];
            let moving = board.piece_at(mv.src);
            let captured = board.piece_at(mv.dst);
            let quiet = captured.is_none() && !mv.promotion.is_piece();

            // Late-move reductions: unextended later moves at non-PV nodes
            // are searched shallower, more so the later and deeper they are,
            // plus an extra ply if the move loses material on the spot.
            let mut extension = position_extension;
            if !N::PV && extension == 0 && searched > 0 {
                let l1 = (1.0 + params.lmr[0] as f32 / 100.0)
                    * ((current_depth + 1) as f32).ln();
                let l2 =
                    (1.0 + params.lmr[1] as f32 / 100.0) * ((depth_left + 1) as f32).ln();
                let l3 = (1.0 + params.lmr[2] as f32 / 100.0) * ((searched + 1) as f32).ln();
                let reduction = (1.0 + params.lmr[3] as f32) * (l1 * l2 * l3 + 1.0).ln();

                extension -= reduction as i32;

                if see(board, mv.src, mv.dst, params) < SEE_THRESHOLD {
                    extension -= 1;
                }
            }

            let mut next = *board;
            let mut applied = mv;
            next.do_move(&mut applied, params);
            self.history.push(&next, &applied);

            let next_score = if N::PV {
                if searched == 0 {
                    -self.search::<PvNode>(
                        &next,
                        -beta,
                        -alpha,
                        max_depth + extension,
                        current_depth + 1,
                        params,
                    )
                } else {
                    let probe = -self.search::<CutNode>(
                        &next,
                        -(alpha + 1),
                        -alpha,
                        max_depth + extension,
                        current_depth + 1,
                        params,
                    );
                    if probe > alpha && probe < beta && !self.aborted {
                        -self.search::<PvNode>(
                            &next,
                            -beta,
                            -alpha,
                            max_depth + extension,
                            current_depth + 1,
                            params,
                        )
                    } else {
                        probe
                    }
                }
            } else {
                let probe = -self.search::<N::Zw>(
                    &next,
                    -(alpha + 1),
                    -alpha,
                    max_depth + extension,
                    current_depth + 1,
                    params,
                );
                // A reduced move that improves alpha is re-searched at its
                // full depth before being believed.
                if probe > alpha && extension < 0 && !self.aborted {
                    -self.search::<N::Zw>(
                        &next,
                        -(alpha + 1),
                        -alpha,
                        max_depth,
                        current_depth + 1,
                        params,
                    )
                } else {
                    probe
                }
            };

            self.history.pop();

            if self.aborted {
                return best;
            }

            moves[index].ordinal = next_score.inner();

            if next_score > best {
                self.stack[ply].best_move = Some(mv);
                best = next_score;
            }

            if next_score > alpha {
                if next_score >= beta {
                    // A fail-high: reward the move and remember it as a
                    // killer if it was quiet.
                    self.butterfly.add(moving, mv.dst, 1);

                    if quiet {
                        let entry = &mut self.stack[ply];
                        if entry.killer1 != Some(mv) {
                            entry.killer2 = entry.killer1;
                            entry.killer1 = Some(mv);
                        }
                    }

                    self.stack[ply].pv.clear();
                    return beta;
                }

                alpha = next_score;

                let (current, rest) = self.stack.split_at_mut(ply + 1);
                current[ply].pv.copy_backward(&rest[0].pv, mv);
                current[ply].pv_move = Some(mv);
            }

            searched += 1;
        }

        best
    }

    /// Quiescence: search captures (or evasions while in check) until the
    /// position goes quiet, standing pat on the static evaluation.
    fn quiescence<N: NodeKind>(
        &mut self,
        board: &Board,
        mut alpha: Score,
        beta: Score,
        current_depth: i32,
        max_depth: i32,
        params: &Params,
    ) -> Score {
        if current_depth >= MAX_PLY as i32 - 1 {
            self.aborted = true;
            return alpha;
        }

        self.node_count += 1;

        let in_check = board.checkers().is_nonempty();

        let stand_pat = if in_check {
            -Score::WIN + current_depth
        } else {
            let eval = self.evaluator.evaluate(board, alpha, beta, params);
            if eval > alpha {
                if eval >= beta {
                    return eval;
                }
                alpha = eval;
            }
            eval
        };

        let mut moves = MoveList::new();
        movegen::generate_captures(board, &mut moves);

        if moves.is_empty() {
            return if in_check {
                -Score::WIN + current_depth
            } else {
                stand_pat
            };
        }

        if in_check {
            let ply = current_depth as usize;
            let (pv_move, killers) = {
                let entry = &self.stack[ply];
                (entry.pv.first(), [entry.killer1, entry.killer2])
            };
            movegen::order_moves(
                board,
                &mut moves,
                pv_move,
                killers,
                &self.butterfly,
                params,
                N::PV,
            );
        } else {
            movegen::order_quiescence_moves(board, &mut moves, params);
        }

        let mut best = stand_pat;
        let mut searched: u64 = 0;

        for mv in moves.iter() {
            let captured = board.piece_at(mv.dst);

            if !in_check {
                // Delta pruning: even winning this piece cleanly cannot
                // bring the score near alpha.
                let optimistic = stand_pat + params.material[captured.index()].mg + DELTA_MARGIN;
                if optimistic < alpha {
                    continue;
                }

                // Losing exchanges are not worth resolving.
                if see(board, mv.src, mv.dst, params) < SEE_THRESHOLD {
                    continue;
                }
            }

            let mut next = *board;
            let mut applied = *mv;
            next.do_move(&mut applied, params);

            let next_score = if N::PV {
                if searched == 0 {
                    -self.quiescence::<PvNode>(
                        &next,
                        -beta,
                        -alpha,
                        current_depth + 1,
                        max_depth,
                        params,
                    )
                } else {
                    let probe = -self.quiescence::<CutNode>(
                        &next,
                        -(alpha + 1),
                        -alpha,
                        current_depth + 1,
                        max_depth,
                        params,
                    );
                    if probe > alpha && probe < beta && !self.aborted {
                        -self.quiescence::<PvNode>(
                            &next,
                            -beta,
                            -alpha,
                            current_depth + 1,
                            max_depth,
                            params,
                        )
                    } else {
                        probe
                    }
                }
            } else {
                -self.quiescence::<N::Zw>(
                    &next,
                    -(alpha + 1),
                    -alpha,
                    current_depth + 1,
                    max_depth,
                    params,
                )
            };

            if self.aborted {
                return best;
            }

            if next_score > best {
                best = next_score;
            }

            if next_score > alpha {
                if next_score >= beta {
                    break;
                }
                alpha = next_score;
            }

            searched += 1;
        }

        best
    }

    /// Prints one thinking line: `depth score time-cs nodes pv`.
    fn emit_thinking(&self, depth: i32, score: Score, pv: &PrincipalVariation) {
        let time_cs = self.clock.elapsed_ms(self.node_count) / 10;
        println!(
            "{depth} {} {time_cs} {} {pv}",
            format_score(score),
            self.node_count
        );
    }
}

/// Renders a score for protocol output: centipawns, or a `±(10000 - plies)`
/// mate value scaled to two decimals.
fn format_score(score: Score) -> String {
    if score.is_mate() {
        let mapped = if score > Score::DRAW {
            10_000 - (Score::WIN - score).inner()
        } else {
            -10_000 + (Score::WIN + score).inner()
        };
        format!("{:.2}", mapped as f32 / 100.0)
    } else {
        format!("{}", score.inner() * 100 / PAWN_SCORE)
    }
}

/// Static exchange evaluation of the capture sequence on `dst`, starting
/// with the piece on `src`.
///
/// Both sides are assumed to always recapture with their least valuable
/// attacker whose path to the square is open; attackers behind blockers stay
/// in the pool, because captures ahead of them can clear the way.
pub fn see(board: &Board, src: Square, dst: Square, params: &Params) -> i32 {
    let value = |kind: PieceKind| params.material[kind.index()].mg;

    let moving = board.piece_at(src);
    let first_victim = board.piece_at(dst);

    // Winning the exchange outright needs no swap-off analysis.
    if value(first_victim) > value(moving) {
        return value(first_victim) - value(moving);
    }

    // Every piece of either colour bearing on the destination square.
    let white_pawns = board.pieces_of(Color::White, PieceKind::Pawn);
    let black_pawns = board.pieces_of(Color::Black, PieceKind::Pawn);
    let mut attackers = (tables::pawn_captures(Color::White, dst) & black_pawns)
        | (tables::pawn_captures(Color::Black, dst) & white_pawns);

    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ] {
        attackers |= tables::piece_moves(kind, dst)
            & (board.pieces_of(Color::White, kind) | board.pieces_of(Color::Black, kind));
    }

    if attackers.is_empty() {
        return 0;
    }

    // The first exchange is forced: the mover leaves `src`, the victim
    // disappears from `dst`.
    attackers &= !(src.bitboard() | dst.bitboard());
    let mut occupied = board.occupied() & !src.bitboard();

    let mut side = board.side_to_move().opponent();
    if (attackers & board.pieces_of(side, PieceKind::All)).is_empty() {
        return value(first_victim);
    }

    let mut gain = [0i32; 32];
    gain[0] = value(first_victim);
    let mut depth = 0usize;

    // The least-valuable-attacker scan restarts from each side's cheapest
    // kind seen so far.
    let mut cheapest = [PieceKind::Pawn; Color::COUNT];
    let mut on_square = moving;

    loop {
        // Find the least valuable attacker of `side` with an open path.
        let mut chosen: Option<(Square, PieceKind)> = None;

        let mut kind = cheapest[side.index()];
        'kinds: while kind <= PieceKind::King {
            for candidate in attackers & board.pieces_of(side, kind) {
                if (tables::in_between(candidate, dst) & occupied).is_empty() {
                    chosen = Some((candidate, kind));
                    break 'kinds;
                }
                // Blocked for now; a later capture may open the ray.
            }
            kind = PieceKind::from_index(kind.index() + 1);
        }

        let Some((attack_src, attack_kind)) = chosen else {
            break;
        };
        cheapest[side.index()] = attack_kind;

        depth += 1;
        gain[depth] = value(on_square) - gain[depth - 1];

        // The king can never actually be given up.
        if on_square == PieceKind::King {
            break;
        }

        // Neither continuing nor stopping can turn this around.
        if -gain[depth - 1] < 0 && gain[depth] < 0 {
            break;
        }

        attackers &= !attack_src.bitboard();
        occupied &= !attack_src.bitboard();
        on_square = attack_kind;
        side = side.opponent();

        if (attackers & board.pieces_of(side, PieceKind::All)).is_empty() {
            break;
        }

        if depth + 1 >= gain.len() {
            break;
        }
    }

    // Fold the swap-off back: at every step the side to move may stop.
    while depth > 0 {
        gain[depth - 1] = (-gain[depth]).min(gain[depth - 1]);
        depth -= 1;
    }

    gain[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn see_fen(fen: &str, mv: &str) -> i32 {
        let params = Params::new();
        let board = Board::from_fen(fen, &params).unwrap();
        let mv: Move = mv.parse().unwrap();
        see(&board, mv.src, mv.dst, &params)
    }

    #[test]
    fn see_simple_win() {
        // Undefended pawn: RxP wins a clean pawn.
        assert_eq!(
            see_fen("7k/8/8/3p4/8/8/3R4/7K w - - 0 1", "d2d5"),
            PAWN_SCORE
        );
    }

    #[test]
    fn see_defended_pawn_loses_the_rook() {
        // The pawn is defended by a pawn: RxP, pxR nets a pawn for a rook.
        assert_eq!(
            see_fen("7k/4p3/3p4/8/8/8/3R4/7K w - - 0 1", "d2d6"),
            PAWN_SCORE - crate::score::ROOK_SCORE
        );
    }

    #[test]
    fn see_equal_trade_backed_up() {
        // PxP recaptured by a pawn, but our pawn was also backed: net zero
        // either way once both sides stop sensibly.
        assert_eq!(
            see_fen("7k/8/2p1p3/3p4/2P1P3/8/3P4/7K w - - 0 1", "c4d5"),
            0
        );
    }

    #[test]
    fn see_capturing_a_bigger_piece_is_instant() {
        // PxQ short-circuits: no swap-off needed.
        assert_eq!(
            see_fen("7k/8/8/3q4/2P5/8/8/7K w - - 0 1", "c4d5"),
            QUEEN_SEE_GAIN
        );
    }

    const QUEEN_SEE_GAIN: i32 = crate::score::QUEEN_SCORE - PAWN_SCORE;

    #[test]
    fn see_xray_attackers_join_in() {
        // White queen behind the rook: QxP is met by pxQ... but the rook
        // battery means the recapture loses the exchange war. Here RxP wins
        // the pawn; after pxR, QxP recaptures because the ray opened.
        let score = see_fen("7k/8/2p5/3p4/8/8/3R4/3Q3K w - - 0 1", "d2d5");
        // Rook takes pawn (+P), pawn takes rook (-R), queen takes pawn (+P).
        assert_eq!(score, 2 * PAWN_SCORE - crate::score::ROOK_SCORE);
    }

    #[test]
    fn mate_and_stalemate_results() {
        let params = Params::new();
        let searcher = Searcher::new(&params, 1024);

        // Fool's mate: White is checkmated.
        let board = Board::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
            &params,
        )
        .unwrap();
        assert_eq!(searcher.check_board_game_result(&board, true), GameResult::Loss);

        // Stalemate.
        let board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", &params).unwrap();
        assert_eq!(searcher.check_board_game_result(&board, true), GameResult::Draw);

        // Insufficient material.
        let board = Board::from_fen("8/8/4k3/8/8/3K1N2/8/8 w - - 0 1", &params).unwrap();
        assert_eq!(searcher.check_board_game_result(&board, true), GameResult::Draw);
    }

    #[test]
    fn score_formatting() {
        assert_eq!(format_score(Score::new(PAWN_SCORE)), "100");
        assert_eq!(format_score(Score::new(-PAWN_SCORE / 2)), "-50");
        // Mate in 3 plies.
        assert_eq!(format_score(Score::WIN - 3), "99.97");
        assert_eq!(format_score(-Score::WIN + 3), "-99.97");
    }
}
