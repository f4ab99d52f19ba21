/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Parsing of protocol commands.
//!
//! The protocol is line-oriented and whitespace-delimited, in the xboard
//! style: one command token followed by its arguments. Parsing is a plain
//! tokenizer; anything unrecognised is an error the driver reports without
//! touching the engine.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// A command for the engine to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Protocol handshake; answered with the engine's feature line.
    XBoard,

    /// Reset to the starting position and clear all search state.
    New,

    /// Load the given FEN.
    SetBoard(String),

    /// Apply a move from the driver. Not validated against the move
    /// generator; drivers are trusted.
    UserMove(String),

    /// Take back the last played move.
    Undo,

    /// Stop auto-replying to user moves.
    Force,

    /// Search the current position and play the chosen move.
    Go,

    /// Fix the maximum search depth.
    SetDepth(i32),

    /// Fix the per-move search time, in seconds.
    SetTime(u64),

    /// Fix the per-move node budget.
    SetNodes(u64),

    /// Declare a nodes-per-second budget; time becomes synthetic.
    SetNps(u64),

    /// The engine's remaining clock, in centiseconds.
    Time(u64),

    /// The opponent's remaining clock, in centiseconds.
    OpponentTime(u64),

    /// Tournament time control: moves per session, base, increment.
    Level {
        moves: u32,
        base: Duration,
        increment: Duration,
    },

    /// Count leaf nodes of the move tree to the given depth.
    Perft(u32),

    /// Print the static evaluation of the current position.
    Eval,

    /// Update one named evaluation parameter.
    SetValue { name: String, value: i32 },

    /// Load a personality file of `name value` lines.
    Personality(PathBuf),

    /// Liveness check; answered with `pong`.
    Ping(i32),

    /// Terminate the engine.
    Quit,
}

/// Parses one protocol line into an [`EngineCommand`].
pub fn parse_command(line: &str) -> Result<EngineCommand> {
    let mut tokens = line.split_whitespace();
    let command = tokens.next().context("Empty command")?;

    let mut next = |what: &str| {
        tokens
            .next()
            .with_context(|| format!("'{command}' is missing its {what} argument"))
            .map(str::to_string)
    };

    let cmd = match command {
        "xboard" => EngineCommand::XBoard,
        "new" => EngineCommand::New,
        "setboard" => {
            let fen = line
                .split_once(char::is_whitespace)
                .map(|(_, rest)| rest.trim().to_string())
                .context("'setboard' is missing its FEN argument")?;
            EngineCommand::SetBoard(fen)
        }
        "usermove" => EngineCommand::UserMove(next("move")?),
        "undo" => EngineCommand::Undo,
        "force" => EngineCommand::Force,
        "go" => EngineCommand::Go,
        "sd" => EngineCommand::SetDepth(next("depth")?.parse().context("Bad depth")?),
        "st" => EngineCommand::SetTime(next("seconds")?.parse().context("Bad time")?),
        "sn" => EngineCommand::SetNodes(next("nodes")?.parse().context("Bad node count")?),
        "nps" => EngineCommand::SetNps(next("rate")?.parse().context("Bad nps")?),
        "time" => EngineCommand::Time(next("centiseconds")?.parse().context("Bad time")?),
        "otim" => EngineCommand::OpponentTime(next("centiseconds")?.parse().context("Bad time")?),
        "level" => {
            let moves = next("move count")?.parse().context("Bad move count")?;
            let base = parse_level_base(&next("base time")?)?;
            let increment_seconds: u64 = next("increment")?.parse().context("Bad increment")?;

            EngineCommand::Level {
                moves,
                base,
                increment: Duration::from_secs(increment_seconds),
            }
        }
        "perft" => EngineCommand::Perft(next("depth")?.parse().context("Bad depth")?),
        "eval" => EngineCommand::Eval,
        "setvalue" => EngineCommand::SetValue {
            name: next("name")?,
            value: next("value")?.parse().context("Bad value")?,
        },
        "personality" => EngineCommand::Personality(PathBuf::from(next("path")?)),
        "ping" => EngineCommand::Ping(next("token")?.parse().context("Bad ping token")?),
        "quit" => EngineCommand::Quit,
        _ => bail!("Unknown command: {command}"),
    };

    Ok(cmd)
}

/// Parses the `level` base time.
///
/// Arena sends plain minutes; cutechess-cli sends `M:S`, sometimes with a
/// leading slash.
fn parse_level_base(token: &str) -> Result<Duration> {
    let token = token.strip_prefix('/').unwrap_or(token);

    let (minutes, seconds) = match token.split_once(':') {
        Some((m, s)) => (
            m.parse::<u64>().context("Bad base minutes")?,
            s.parse::<u64>().context("Bad base seconds")?,
        ),
        None => (token.parse::<u64>().context("Bad base minutes")?, 0),
    };

    Ok(Duration::from_secs(minutes * 60 + seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_commands() {
        assert_eq!(parse_command("new").unwrap(), EngineCommand::New);
        assert_eq!(parse_command("go").unwrap(), EngineCommand::Go);
        assert_eq!(parse_command("ping 42").unwrap(), EngineCommand::Ping(42));
        assert_eq!(parse_command("sd 8").unwrap(), EngineCommand::SetDepth(8));
        assert_eq!(parse_command("quit").unwrap(), EngineCommand::Quit);
    }

    #[test]
    fn setboard_keeps_the_whole_fen() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        assert_eq!(
            parse_command(&format!("setboard {fen}")).unwrap(),
            EngineCommand::SetBoard(fen.to_string())
        );
    }

    #[test]
    fn level_base_formats() {
        // Arena style: minutes only.
        assert_eq!(
            parse_command("level 40 5 0").unwrap(),
            EngineCommand::Level {
                moves: 40,
                base: Duration::from_secs(300),
                increment: Duration::ZERO,
            }
        );

        // Cutechess style: M:S with a slash.
        assert_eq!(
            parse_command("level 0 /0:30 1").unwrap(),
            EngineCommand::Level {
                moves: 0,
                base: Duration::from_secs(30),
                increment: Duration::from_secs(1),
            }
        );
    }

    #[test]
    fn errors_are_reported() {
        assert!(parse_command("").is_err());
        assert!(parse_command("frobnicate").is_err());
        assert!(parse_command("sd").is_err());
        assert!(parse_command("setvalue material-pawn-mg").is_err());
        assert!(parse_command("ping x").is_err());
    }
}
