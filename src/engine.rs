/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fs,
    io::{self, BufRead},
    path::Path,
    sync::mpsc::{self, Receiver, Sender},
};

use anyhow::{Context, Result};
use threadpool::ThreadPool;

use crate::{
    parse_command, print_perft, Board, Clock, EngineCommand, Evaluator, GameResult, Move, Params,
    Score, Searcher, TranspositionTable,
};

/// The engine driver: owns the board history, the searcher, the clock, and
/// the parameter bag, and executes protocol commands against them.
///
/// A pool thread reads stdin and forwards parsed commands over a channel;
/// the driver drains it in a blocking loop, so a running search finishes
/// before the next command is seen.
pub struct Engine {
    params: Params,
    searcher: Searcher,
    clock: Clock,

    /// Every position reached in the current game, oldest first. The last
    /// entry is the current board; `undo` pops one.
    boards: Vec<Board>,

    /// When set, user moves are applied without an automatic reply.
    force: bool,

    /// Threadpool hosting the stdin reader.
    pool: ThreadPool,

    sender: Sender<EngineCommand>,
    receiver: Receiver<EngineCommand>,
}

impl Engine {
    /// Creates an engine with the given transposition-table slot count.
    pub fn new(tt_size: usize) -> Self {
        let params = Params::new();
        let searcher = Searcher::new(&params, tt_size);
        let board = Board::start_position(&params);

        let (sender, receiver) = mpsc::channel();
        let pool = ThreadPool::with_name(
            format!("{} input thread", env!("CARGO_PKG_NAME")),
            num_cpus::get().min(2),
        );

        Self {
            params,
            searcher,
            clock: Clock::new(),
            boards: vec![board],
            force: false,
            pool,
            sender,
            receiver,
        }
    }

    /// Creates an engine with the default transposition-table size.
    pub fn with_defaults() -> Self {
        Self::new(TranspositionTable::DEFAULT_SIZE)
    }

    /// The current position.
    pub fn board(&self) -> &Board {
        self.boards.last().expect("board stack is never empty")
    }

    /// Checks the current position against the game-ending rules, including
    /// mate and stalemate detection.
    pub fn game_result(&self) -> GameResult {
        self.searcher.check_board_game_result(self.board(), true)
    }

    /// Feeds a command into the engine's queue.
    pub fn send_command(&self, command: EngineCommand) -> Result<()> {
        self.sender.send(command)?;
        Ok(())
    }

    /// Runs the blocking protocol loop until `quit`.
    pub fn run(&mut self) -> Result<()> {
        let name = env!("CARGO_PKG_NAME");
        let version = env!("CARGO_PKG_VERSION");
        println!("{name} {version}");

        // The reader lives on the pool so the driver can block in search.
        let sender = self.sender.clone();
        self.pool.execute(move || {
            if let Err(err) = input_handler(sender) {
                eprintln!("input thread exited: {err}");
            }
        });

        while let Ok(command) = self.receiver.recv() {
            if !self.execute(command) {
                break;
            }
        }

        Ok(())
    }

    /// Executes one command; returns `false` when the engine should exit.
    pub fn execute(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::XBoard => {
                println!(
                    "feature setboard=1 usermove=1 time=1 analyze=0 myname=\"{} {}\" name=1 nps=1 done=1",
                    env!("CARGO_PKG_NAME"),
                    env!("CARGO_PKG_VERSION"),
                );
            }

            EngineCommand::New => {
                self.boards = vec![Board::start_position(&self.params)];
                self.searcher.reset();
                self.clock = Clock::new();
                self.force = false;
            }

            EngineCommand::SetBoard(fen) => match Board::from_fen(&fen, &self.params) {
                Ok(board) => {
                    self.boards = vec![board];
                    self.searcher.history.clear();
                }
                Err(err) => {
                    println!("tellusererror Illegal position: {err:#}");
                    self.boards = vec![Board::cleared()];
                }
            },

            EngineCommand::UserMove(text) => match text.parse::<Move>() {
                Ok(mv) => {
                    self.play_move(mv);
                    if !self.force {
                        self.go();
                    }
                }
                Err(err) => println!("Illegal move ({err:#}): {text}"),
            },

            EngineCommand::Undo => {
                if self.boards.len() > 1 {
                    self.boards.pop();
                    self.searcher.history.pop();
                }
            }

            EngineCommand::Force => self.force = true,

            EngineCommand::Go => {
                self.force = false;
                self.go();
            }

            EngineCommand::SetDepth(depth) => self.clock.set_depth(depth),
            EngineCommand::SetTime(seconds) => self
                .clock
                .set_search_time(std::time::Duration::from_secs(seconds)),
            EngineCommand::SetNodes(nodes) => self.clock.set_nodes(nodes),
            EngineCommand::SetNps(nps) => self.clock.set_nps(nps),
            EngineCommand::Time(cs) => self
                .clock
                .set_time_left(std::time::Duration::from_millis(cs * 10)),
            EngineCommand::OpponentTime(cs) => self
                .clock
                .set_opponent_time_left(std::time::Duration::from_millis(cs * 10)),
            EngineCommand::Level {
                moves,
                base,
                increment,
            } => self.clock.set_level(moves, base, increment),

            EngineCommand::Perft(depth) => {
                print_perft(self.board(), depth);
            }

            EngineCommand::Eval => {
                let mut evaluator = Evaluator::new(&self.params);
                let score =
                    evaluator.evaluate(self.board(), -Score::WIN, Score::WIN, &self.params);
                println!("{score}");
            }

            EngineCommand::SetValue { name, value } => {
                // Unknown names are ignored so personalities can be shared
                // between engine versions.
                if self.params.set(&name, value) {
                    self.refresh_parameters();
                }
            }

            EngineCommand::Personality(path) => {
                if let Err(err) = self.load_personality(&path) {
                    eprintln!("personality {}: {err:#}", path.display());
                }
            }

            EngineCommand::Ping(token) => println!("pong {token}"),

            EngineCommand::Quit => return false,
        }

        true
    }

    /// Applies a move to the current position and records it in the history.
    fn play_move(&mut self, mv: Move) {
        let mut next = *self.board();
        let mut applied = mv;
        next.do_move(&mut applied, &self.params);

        self.searcher.history.push(&next, &applied);
        self.boards.push(next);
    }

    /// Searches the current position and plays the chosen move.
    fn go(&mut self) {
        let mut clock = self.clock;
        clock.start_search();

        let board = *self.board();
        let report = self.searcher.run(&board, &self.params, clock);

        let Some(best) = report.best_move else {
            // No legal moves: announce the result instead of a move.
            match self.searcher.check_board_game_result(self.board(), true) {
                GameResult::Loss if self.board().side_to_move().is_white() => {
                    println!("0-1 {{Black mates}}")
                }
                GameResult::Loss => println!("1-0 {{White mates}}"),
                _ => println!("1/2-1/2 {{Draw}}"),
            }
            return;
        };

        self.play_move(best);
        println!("move {best}");
    }

    /// Loads a `name value` personality file, ignoring unknown names. A
    /// malformed value aborts the remainder, as the file is read as one
    /// whitespace-delimited stream.
    fn load_personality(&mut self, path: &Path) -> Result<()> {
        let Ok(content) = fs::read_to_string(path) else {
            // Unreadable personalities are silently skipped.
            return Ok(());
        };

        let mut tokens = content.split_whitespace();
        let mut changed = false;

        while let Some(name) = tokens.next() {
            let Some(value) = tokens.next() else { break };
            let Ok(value) = value.parse::<i32>() else {
                break;
            };

            changed |= self.params.set(name, value);
        }

        if changed {
            self.refresh_parameters();
        }

        Ok(())
    }

    /// Rebuilds the derived tables and refreshes the incremental sums of
    /// every stored board after a parameter change.
    fn refresh_parameters(&mut self) {
        self.params.rebuild();

        for board in self.boards.iter_mut() {
            board.material_eval = board.calculate_material_eval(&self.params);
            board.pst_eval = board.calculate_pst_eval(&self.params);
        }
    }
}

/// Reads stdin lines, parses them, and forwards commands to the engine.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(command) => {
                let quitting = command == EngineCommand::Quit;
                sender.send(command).context("Engine loop hung up")?;
                if quitting {
                    break;
                }
            }
            Err(err) => println!("Error ({err:#}): {line}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usermove_and_undo_round_trip() {
        let mut engine = Engine::new(1024);
        engine.force = true;

        let initial_hash = engine.board().hash();

        engine.execute(EngineCommand::UserMove("e2e4".into()));
        engine.execute(EngineCommand::UserMove("e7e5".into()));
        assert_ne!(engine.board().hash(), initial_hash);

        engine.execute(EngineCommand::Undo);
        engine.execute(EngineCommand::Undo);
        assert_eq!(engine.board().hash(), initial_hash);
    }

    #[test]
    fn setboard_accepts_and_rejects() {
        let mut engine = Engine::new(1024);

        let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
        engine.execute(EngineCommand::SetBoard(fen.into()));
        assert_eq!(engine.board().piece_count(), 10);

        engine.execute(EngineCommand::SetBoard("not a fen".into()));
        assert_eq!(engine.board().piece_count(), 0);
    }

    #[test]
    fn new_resets_everything() {
        let mut engine = Engine::new(1024);
        engine.force = true;

        engine.execute(EngineCommand::UserMove("e2e4".into()));
        engine.execute(EngineCommand::New);

        let fresh = Board::start_position(&engine.params);
        assert_eq!(engine.board().hash(), fresh.hash());
        assert!(!engine.force);
    }

    #[test]
    fn setvalue_refreshes_incremental_sums() {
        let mut engine = Engine::new(1024);

        // White is a pawn up, so the material sum actually moves.
        engine.execute(EngineCommand::SetBoard(
            "rnbqkbnr/ppppppp1/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".into(),
        ));

        let before = engine.board().material_eval;
        engine.execute(EngineCommand::SetValue {
            name: "material-pawn-mg".into(),
            value: 200,
        });

        let board = engine.board();
        assert_eq!(
            board.material_eval,
            board.calculate_material_eval(&engine.params)
        );
        assert_ne!(board.material_eval, before);
        assert_eq!(board.material_eval.mg, 200);

        // Unknown names change nothing.
        engine.execute(EngineCommand::SetValue {
            name: "material-dragon-mg".into(),
            value: 999,
        });
        assert_eq!(engine.board().material_eval.mg, 200);
    }

    #[test]
    fn personality_files_apply_known_names_and_skip_unknown_ones() {
        use crate::PieceKind;

        let mut engine = Engine::new(1024);
        let path = std::env::temp_dir().join("skink-personality-test.txt");
        fs::write(
            &path,
            "material-pawn-mg 150\nmaterial-dragon-eg 3\npst-knight-center-mg 4\n",
        )
        .unwrap();

        engine.execute(EngineCommand::Personality(path.clone()));
        fs::remove_file(&path).ok();

        // The known names before and after the unknown one both applied.
        assert_eq!(engine.params.material[PieceKind::Pawn.index()].mg, 150);
        assert_ne!(
            engine.params.pst[PieceKind::Knight.index()][crate::Square::E4.index()].mg,
            0
        );

        // A missing file is silently skipped.
        engine.execute(EngineCommand::Personality(
            std::env::temp_dir().join("skink-no-such-personality.txt"),
        ));
    }

    #[test]
    fn repetition_is_reported_after_shuffling() {
        let mut engine = Engine::new(1024);
        engine.force = true;

        for mv in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
            engine.execute(EngineCommand::UserMove(mv.into()));
        }

        assert_eq!(
            engine.searcher.check_board_game_result(engine.board(), true),
            GameResult::Draw
        );
    }
}
