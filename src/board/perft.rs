/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Instant;

use crate::{movegen, Board, MoveList};

/// Counts the leaf nodes of the legal move tree to the given depth.
///
/// Moves are applied without hash or evaluation bookkeeping; only the attack
/// cache is maintained.
pub fn perft(board: &Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    movegen::generate_all_moves(board, &mut moves);

    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves.iter() {
        let mut next = *board;
        let mut applied = *mv;
        next.do_move_no_precalc(&mut applied);
        nodes += perft(&next, depth - 1);
    }

    nodes
}

/// Runs a perft printing each root move's subtree count, then a summary with
/// elapsed time and nodes per second.
pub fn print_perft(board: &Board, depth: u32) -> u64 {
    let start = Instant::now();

    let total = if depth == 0 {
        1
    } else {
        let mut moves = MoveList::new();
        movegen::generate_all_moves(board, &mut moves);

        let mut total = 0;
        for mv in moves.iter() {
            let mut next = *board;
            let mut applied = *mv;
            next.do_move_no_precalc(&mut applied);

            let nodes = perft(&next, depth - 1);
            println!("{mv}: {nodes}");
            total += nodes;
        }
        total
    };

    let elapsed = start.elapsed().as_millis() as u64;
    let nps = if elapsed == 0 {
        total
    } else {
        1000 * total / elapsed
    };

    println!("Total: {total} Moves");
    println!("Time: {elapsed} ms ({nps} nps)");

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Params;

    fn perft_fen(fen: &str, depth: u32) -> u64 {
        let params = Params::new();
        let board = Board::from_fen(fen, &params).unwrap();
        perft(&board, depth)
    }

    #[test]
    fn perft_initial_shallow() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(perft_fen(fen, 1), 20);
        assert_eq!(perft_fen(fen, 2), 400);
        assert_eq!(perft_fen(fen, 3), 8_902);
    }

    #[test]
    fn perft_kiwipete_shallow() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        assert_eq!(perft_fen(fen, 1), 48);
        assert_eq!(perft_fen(fen, 2), 2_039);
        assert_eq!(perft_fen(fen, 3), 97_862);
    }

    #[test]
    fn perft_en_passant_pins() {
        let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
        assert_eq!(perft_fen(fen, 1), 14);
        assert_eq!(perft_fen(fen, 2), 191);
        assert_eq!(perft_fen(fen, 3), 2_812);
        assert_eq!(perft_fen(fen, 4), 43_238);
    }
}
