/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use skink::{
    Board, Clock, Engine, EngineCommand, GameResult, Move, Params, Score, SearchReport, Searcher,
    MAX_PLY,
};

fn search_fen(fen: &str, depth: i32) -> SearchReport {
    let params = Params::new();
    let mut searcher = Searcher::new(&params, 1 << 16);
    let board = Board::from_fen(fen, &params).unwrap();

    let mut clock = Clock::new();
    clock.set_depth(depth);
    clock.start_search();

    searcher.run(&board, &params, clock)
}

#[test]
fn fools_mate_is_recognised() {
    // White has already been mated by Qh4; any depth must report the mate.
    let report = search_fen(
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        1,
    );

    assert_eq!(report.best_move, None);
    assert!(report.score <= -(Score::WIN - MAX_PLY as i32));
}

#[test]
fn mate_in_two_is_found() {
    // Reinfeld #1: 1. Nf6+ gxf6 2. Bf7#.
    let report = search_fen(
        "r2qkb1r/pp2nppp/3p4/2pNN1B1/2BnP3/3P4/PPP2PPP/R2bK2R w KQkq - 1 0",
        4,
    );

    let expected: Move = "d5f6".parse().unwrap();
    assert_eq!(report.best_move, Some(expected), "pv was {}", report.pv);

    // Mate for White within three plies.
    assert!(report.score.is_mate());
    assert!((Score::WIN - report.score).inner() <= 3);
}

#[test]
fn stalemate_scores_draw() {
    let report = search_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 3);
    assert_eq!(report.best_move, None);
    assert_eq!(report.score, Score::DRAW);
}

#[test]
fn repetition_is_a_draw() {
    let mut engine = Engine::new(1 << 12);
    engine.execute(EngineCommand::Force);

    for mv in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
        engine.execute(EngineCommand::UserMove(mv.to_string()));
    }

    assert_eq!(engine.game_result(), GameResult::Draw);
}

#[test]
fn insufficient_material_is_a_draw() {
    let mut engine = Engine::new(1 << 12);
    engine.execute(EngineCommand::SetBoard(
        "8/8/4k3/8/8/3K1N2/8/8 w - - 0 1".to_string(),
    ));

    assert_eq!(engine.game_result(), GameResult::Draw);
}

#[test]
fn search_round_trip_preserves_the_position() {
    let mut engine = Engine::new(1 << 14);
    let initial_hash = engine.board().hash();

    engine.execute(EngineCommand::SetDepth(2));

    // Two full moves: the engine replies to each user move.
    engine.execute(EngineCommand::UserMove("e2e4".to_string()));
    engine.execute(EngineCommand::UserMove("d2d4".to_string()));

    // Four plies were played; undo them all.
    for _ in 0..4 {
        engine.execute(EngineCommand::Undo);
    }

    assert_eq!(engine.board().hash(), initial_hash);
    assert_eq!(engine.board().hash(), engine.board().calculate_hash());
}

#[test]
fn deeper_searches_still_find_the_mate() {
    // A back-rank mate in one: Ra8#.
    let report = search_fen("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1", 3);

    let expected: Move = "a1a8".parse().unwrap();
    assert_eq!(report.best_move, Some(expected), "pv was {}", report.pv);
    assert_eq!(report.score, Score::WIN - 1);
}
