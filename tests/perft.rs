/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use skink::{perft, Board, Params};

fn test_perft_fen_nodes(depth: u32, fen: &str, expected: u64) {
    let params = Params::new();
    let board = Board::from_fen(fen, &params).unwrap();
    let nodes = perft(&board, depth);
    assert_eq!(nodes, expected, "perft({depth}) failed on {fen}");
}

mod initial_position {
    use super::*;

    const FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn perft_1() {
        test_perft_fen_nodes(1, FEN, 20);
    }

    #[test]
    fn perft_2() {
        test_perft_fen_nodes(2, FEN, 400);
    }

    #[test]
    fn perft_3() {
        test_perft_fen_nodes(3, FEN, 8_902);
    }

    #[test]
    fn perft_4() {
        test_perft_fen_nodes(4, FEN, 197_281);
    }

    #[test]
    fn perft_5() {
        test_perft_fen_nodes(5, FEN, 4_865_609);
    }
}

/// "Kiwipete" exercises castling, pins, en passant, and promotions at once.
mod kiwipete {
    use super::*;

    const FEN: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn perft_1() {
        test_perft_fen_nodes(1, FEN, 48);
    }

    #[test]
    fn perft_2() {
        test_perft_fen_nodes(2, FEN, 2_039);
    }

    #[test]
    fn perft_3() {
        test_perft_fen_nodes(3, FEN, 97_862);
    }

    #[test]
    fn perft_4() {
        test_perft_fen_nodes(4, FEN, 4_085_603);
    }

    #[test]
    #[ignore = "large; run with --ignored for the full suite"]
    fn perft_5() {
        test_perft_fen_nodes(5, FEN, 193_690_690);
    }
}

/// An endgame full of en-passant pins and discovered checks.
mod position_three {
    use super::*;

    const FEN: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

    #[test]
    fn perft_1() {
        test_perft_fen_nodes(1, FEN, 14);
    }

    #[test]
    fn perft_4() {
        test_perft_fen_nodes(4, FEN, 43_238);
    }

    #[test]
    fn perft_5() {
        test_perft_fen_nodes(5, FEN, 674_624);
    }
}

mod promotions {
    use super::*;

    const FEN: &str = "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1";

    #[test]
    fn perft_1() {
        test_perft_fen_nodes(1, FEN, 24);
    }

    #[test]
    fn perft_2() {
        test_perft_fen_nodes(2, FEN, 496);
    }

    #[test]
    fn perft_3() {
        test_perft_fen_nodes(3, FEN, 9_483);
    }

    #[test]
    fn perft_4() {
        test_perft_fen_nodes(4, FEN, 182_838);
    }
}
