/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::Result;
use clap::{Parser, Subcommand};
use skink::{Engine, EngineCommand, TranspositionTable};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Transposition table size in slots, rounded up to a power of two.
    #[arg(long, default_value_t = TranspositionTable::DEFAULT_SIZE)]
    hash: usize,

    /// Position to load instead of the starting position.
    #[arg(long)]
    fen: Option<String>,

    /// Run one command and exit instead of entering the protocol loop.
    #[command(subcommand)]
    command: Option<OneShot>,
}

#[derive(Debug, Subcommand)]
enum OneShot {
    /// Count leaf nodes of the legal move tree to the given depth.
    Perft {
        #[arg(default_value_t = 1)]
        depth: u32,
    },

    /// Print the static evaluation of the position.
    Eval,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut engine = Engine::new(cli.hash);

    if let Some(fen) = cli.fen {
        engine.execute(EngineCommand::SetBoard(fen));
    }

    match cli.command {
        Some(OneShot::Perft { depth }) => {
            engine.execute(EngineCommand::Perft(depth));
        }
        Some(OneShot::Eval) => {
            engine.execute(EngineCommand::Eval);
        }
        None => engine.run()?,
    }

    Ok(())
}
