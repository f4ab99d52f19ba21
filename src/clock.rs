/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::{Duration, Instant};

use crate::MAX_PLY;

/// Fallback assumption for moves remaining when no time control says
/// otherwise.
const DEFAULT_MOVES_TO_GO: u32 = 30;

/// How often, in nodes, the wall clock is actually consulted mid-search.
const CHECK_INTERVAL: u64 = 2048;

/// The search's time-management oracle.
///
/// The driver configures one limit (or several) via the protocol commands;
/// the searcher only ever asks [`Clock::should_continue_search`]. With an
/// `nps` budget set, time is synthetic: it is measured in searched nodes
/// rather than wall time, which makes games reproducible across machines.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    start: Instant,

    /// Fixed depth limit (`sd`).
    max_depth: Option<i32>,

    /// Fixed per-move search time (`st`).
    search_time: Option<Duration>,

    /// Fixed per-move node budget (`sn`).
    max_nodes: Option<u64>,

    /// Declared nodes-per-second budget (`nps`); makes time synthetic.
    nps: Option<u64>,

    /// Engine's remaining clock (`time`).
    time_left: Option<Duration>,

    /// Opponent's remaining clock (`otim`); informational.
    opponent_time_left: Option<Duration>,

    /// Tournament control (`level`): moves per session and increment.
    level_moves: Option<u32>,
    increment: Duration,

    /// Budget allocated for the current move, derived at search start.
    allocated: Option<Duration>,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            max_depth: None,
            search_time: None,
            max_nodes: None,
            nps: None,
            time_left: None,
            opponent_time_left: None,
            level_moves: None,
            increment: Duration::ZERO,
            allocated: None,
        }
    }

    /// `sd`: cap the iterative-deepening depth.
    pub fn set_depth(&mut self, depth: i32) {
        self.max_depth = Some(depth.clamp(1, MAX_PLY as i32 - 1));
    }

    /// `st`: think exactly this long per move.
    pub fn set_search_time(&mut self, time: Duration) {
        self.search_time = Some(time);
    }

    /// `sn`: cap the searched nodes per move.
    pub fn set_nodes(&mut self, nodes: u64) {
        self.max_nodes = Some(nodes);
    }

    /// `nps`: account time as `nodes / nps` instead of wall time.
    pub fn set_nps(&mut self, nps: u64) {
        self.nps = Some(nps.max(1));
    }

    /// `time`: the engine's remaining clock.
    pub fn set_time_left(&mut self, time: Duration) {
        self.time_left = Some(time);
    }

    /// `otim`: the opponent's remaining clock.
    pub fn set_opponent_time_left(&mut self, time: Duration) {
        self.opponent_time_left = Some(time);
    }

    /// `level`: tournament time control.
    pub fn set_level(&mut self, moves: u32, base: Duration, increment: Duration) {
        self.level_moves = (moves > 0).then_some(moves);
        self.increment = increment;
        // Until a `time` update arrives, the session base is what remains.
        self.time_left.get_or_insert(base);
    }

    /// Starts the clock for one search and allocates this move's budget.
    pub fn start_search(&mut self) {
        self.start = Instant::now();

        self.allocated = if let Some(fixed) = self.search_time {
            Some(fixed)
        } else {
            self.time_left.map(|left| {
                let moves_to_go = self.level_moves.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);
                left / moves_to_go + self.increment / 2
            })
        };
    }

    /// Elapsed time in milliseconds; synthetic when an nps budget is set.
    pub fn elapsed_ms(&self, nodes: u64) -> u64 {
        match self.nps {
            Some(nps) => 1000 * nodes / nps,
            None => self.start.elapsed().as_millis() as u64,
        }
    }

    /// The searcher's continuation oracle.
    ///
    /// Called with the target depth before each iteration, and with a depth
    /// of zero from inside the tree, where wall-clock reads are amortised to
    /// every [`CHECK_INTERVAL`] nodes.
    pub fn should_continue_search(&self, depth: i32, nodes: u64) -> bool {
        if let Some(max_depth) = self.max_depth {
            if depth > max_depth {
                return false;
            }
        }

        if let Some(max_nodes) = self.max_nodes {
            if nodes >= max_nodes {
                return false;
            }
        }

        // Mid-search calls only pay for a clock read occasionally.
        if depth == 0 && nodes % CHECK_INTERVAL != 0 {
            return true;
        }

        if let Some(allocated) = self.allocated {
            if self.elapsed_ms(nodes) >= allocated.as_millis() as u64 {
                return false;
            }
        }

        true
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
