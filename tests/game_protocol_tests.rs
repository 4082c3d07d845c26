// tests/game_protocol_tests.rs
//
// Протокол одной партии через Manager (ChannelPlayer + ManualClock):
//
//  1) GAME_PAIRED: текст объявления, состояния игроков.
//  2) ACK: первый ждёт соперника, второй стартует партию, YOUR_MOVE только белым.
//  3) Не-ACK в NeedsAck: INFO, без отключения.
//  4) Мат белыми (детский мат): [1, 0], "Checkmate", запись в архиве.
//  5) Мат чёрными (дурацкий мат): [0, 1].
//  6) Ход не в свою очередь: INFO, состояние не меняется.
//  7) Нелегальный ход: INFO + повторный YOUR_MOVE.
//  8) Сдача, сдача не в свою очередь.
//  9) SAY доступен обоим, лишние пробелы схлопываются.
// 10) Троекратное повторение: ничья 0.5-0.5.
// 11) Неизвестный action в игре: INFO.
// 12) Наблюдатель: GAME_STATE на WATCH, потом все сообщения партии, UNWATCH.
// 13) Отключение до ACK: партия прервана, оставшийся снова в очереди.

mod common;

use chess_arena::chess::Termination;
use chess_arena::domain::PlayerState;
use chess_arena::engine::GameState;

use common::{disconnected, messages, texts, Arena, START};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// -----------------------------------------
// 1) GAME_PAIRED
// -----------------------------------------

#[test]
fn pairing_announces_game_to_both_players() {
    let mut arena = Arena::standard();
    arena.join(1, "amy");
    arena.join(2, "zed");
    arena.frames(1);
    arena.frames(2);

    arena.manager.sweep_pairings();

    let frames = arena.frames(1);
    let msgs = messages(&frames);
    assert_eq!(msgs[0], ("INFO".to_string(), "Paired with player for game".to_string()));
    assert_eq!(msgs[1].0, "GAME_PAIRED");

    let parts: Vec<&str> = msgs[1].1.split(' ').collect();
    assert_eq!(parts.len(), 5);
    // Без истории пары белыми идёт второй из кандидатов.
    assert_eq!(&parts[1..], &["zed", "amy", "300.00", "0.00"]);

    let game_id = parts[0];
    for id in [1, 2] {
        let p = arena.manager.player(id).unwrap();
        assert_eq!(p.state, PlayerState::InGameNeedsAck);
        assert_eq!(p.current_game.as_deref(), Some(game_id));
    }
    assert_eq!(arena.game(game_id).state(), GameState::NeedsAck);
    assert_eq!(texts(&arena.frames(2), "GAME_PAIRED").len(), 1);
}

// -----------------------------------------
// 2) ACK
// -----------------------------------------

#[test]
fn both_acks_start_the_game() {
    let mut arena = Arena::standard();
    let p = arena.pair(1, "amy", 2, "zed");

    arena.line(p.white, &format!("ACK {}", p.game_id));
    let frames = arena.frames(p.white);
    assert_eq!(
        texts(&frames, "INFO"),
        vec!["Waiting for opponent to acknowledge game".to_string()]
    );
    assert_eq!(arena.manager.player(p.white).unwrap().state, PlayerState::InGameAcked);
    assert_eq!(arena.game(&p.game_id).state(), GameState::NeedsAck);

    arena.line(p.black, &format!("ACK {}", p.game_id));

    let expected_state = format!("{} zed amy 300.00 300.00 {}", p.game_id, START_FEN);
    let white = arena.frames(p.white);
    let black = arena.frames(p.black);

    for frames in [&white, &black] {
        assert!(texts(frames, "INFO")
            .contains(&"Both players have acknowledged game. Starting...".to_string()));
        assert_eq!(texts(frames, "GAME_STARTED"), vec![expected_state.clone()]);
    }
    assert_eq!(texts(&white, "YOUR_MOVE"), vec![expected_state]);
    assert!(texts(&black, "YOUR_MOVE").is_empty());

    assert_eq!(arena.game(&p.game_id).state(), GameState::InProgress);
    assert_eq!(arena.manager.player(p.white).unwrap().state, PlayerState::Playing);
    assert_eq!(arena.manager.player(p.black).unwrap().state, PlayerState::Playing);
}

// -----------------------------------------
// 3) Не-ACK в NeedsAck
// -----------------------------------------

#[test]
fn non_ack_message_while_waiting_is_only_informational() {
    let mut arena = Arena::standard();
    let p = arena.pair(1, "amy", 2, "zed");

    arena.line(p.white, &format!("MOVE {} e2e4", p.game_id));
    let frames = arena.frames(p.white);

    assert_eq!(
        texts(&frames, "INFO"),
        vec!["ignoring message type MOVE while waiting for ack".to_string()]
    );
    assert!(!disconnected(&frames));
    assert_eq!(arena.game(&p.game_id).state(), GameState::NeedsAck);
}

// -----------------------------------------
// 4) Мат белыми
// -----------------------------------------

#[test]
fn scholars_mate_finishes_game_for_white() {
    let mut arena = Arena::new(1, 300.0, 0.0);
    let p = arena.start(1, "amy", 2, "zed");

    arena.play(&p, &["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"]);

    let game = arena.game(&p.game_id);
    assert_eq!(game.state(), GameState::Finished);
    assert_eq!(game.outcomes(), [1.0, 0.0]);
    assert_eq!(game.status(), "Checkmate");
    assert_eq!(game.outcome_str(), "Game over: 1-0 Checkmate");

    let white = arena.frames(p.white);
    assert_eq!(
        texts(&white, "GAME_OVER"),
        vec![format!("{} 1-0 Checkmate", p.game_id)]
    );
    assert!(texts(&white, "INFO").contains(&"Game over: 1-0 Checkmate".to_string()));

    let records = arena.archive.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcomes, [1.0, 0.0]);
    assert_eq!(records[0].termination, "Checkmate");
    assert_eq!(records[0].moves.last().map(String::as_str), Some("Qxf7#"));

    // Оба снова в очереди на спаривание.
    for id in [p.white, p.black] {
        let player = arena.manager.player(id).unwrap();
        assert_eq!(player.state, PlayerState::WaitingPairing);
        assert_eq!(player.current_game, None);
        assert_eq!(player.last_game_done_at, Some(common::START));
    }
}

// -----------------------------------------
// 5) Мат чёрными
// -----------------------------------------

#[test]
fn fools_mate_finishes_game_for_black() {
    let mut arena = Arena::standard();
    let p = arena.start(1, "amy", 2, "zed");

    arena.play(&p, &["f2f3", "e7e5", "g2g4", "d8h4"]);

    let game = arena.game(&p.game_id);
    assert_eq!(game.state(), GameState::Finished);
    assert_eq!(game.outcomes(), [0.0, 1.0]);
    assert_eq!(game.status(), "Checkmate");
    assert_eq!(
        texts(&arena.frames(p.black), "GAME_OVER"),
        vec![format!("{} 0-1 Checkmate", p.game_id)]
    );
}

// -----------------------------------------
// 6) Ход не в свою очередь
// -----------------------------------------

#[test]
fn move_out_of_turn_is_rejected_without_state_change() {
    let mut arena = Arena::standard();
    let p = arena.start(1, "amy", 2, "zed");

    arena.line(p.black, &format!("MOVE {} e2e4", p.game_id));

    let black = arena.frames(p.black);
    assert_eq!(
        texts(&black, "INFO"),
        vec!["Ignoring message. It's not your move".to_string()]
    );
    assert!(!disconnected(&black));
    assert!(arena.frames(p.white).is_empty());

    let game = arena.game(&p.game_id);
    assert_eq!(game.board().ply_count(), 0);
    assert_eq!(game.cur_index(), 0);
    assert_eq!(game.state(), GameState::InProgress);

    // Белые ходят как ни в чём не бывало.
    arena.line(p.white, &format!("MOVE {} e2e4", p.game_id));
    assert_eq!(arena.game(&p.game_id).board().ply_count(), 1);
}

// -----------------------------------------
// 7) Нелегальный ход
// -----------------------------------------

#[test]
fn illegal_move_reprompts_same_mover() {
    let mut arena = Arena::standard();
    let p = arena.start(1, "amy", 2, "zed");

    arena.line(p.white, &format!("MOVE {} e2e5", p.game_id));

    let white = arena.frames(p.white);
    let msgs = messages(&white);
    assert_eq!(msgs[0], ("INFO".to_string(), "Move e2e5 is not legal".to_string()));
    assert_eq!(msgs[1].0, "YOUR_MOVE");
    assert!(!disconnected(&white));
    assert_eq!(arena.game(&p.game_id).board().ply_count(), 0);

    arena.line(p.white, &format!("MOVE {} nonsense", p.game_id));
    let white = arena.frames(p.white);
    assert_eq!(texts(&white, "INFO"), vec!["Move nonsense is not legal".to_string()]);
}

#[test]
fn player_moved_carries_normalized_move_and_clocks() {
    let mut arena = Arena::new(2, 300.0, 2.0);
    let p = arena.start(1, "amy", 2, "zed");

    arena.advance(10.0);
    arena.line(p.white, &format!("MOVE {} E2E4", p.game_id));

    let black = arena.frames(p.black);
    let moved = texts(&black, "PLAYER_MOVED");
    assert_eq!(moved.len(), 1);
    assert!(moved[0].starts_with(&format!("{} zed e2-e4 zed amy 292.00 300.00 ", p.game_id)));
    assert_eq!(texts(&black, "YOUR_MOVE").len(), 1);
    assert_eq!(arena.game(&p.game_id).cur_index(), 1);
}

// -----------------------------------------
// 8) Сдача
// -----------------------------------------

#[test]
fn resignation_scores_opponent() {
    let mut arena = Arena::standard();
    let p = arena.start(1, "amy", 2, "zed");

    arena.line(p.white, &format!("RESIGN {}", p.game_id));

    let game = arena.game(&p.game_id);
    assert_eq!(game.outcomes(), [0.0, 1.0]);
    assert_eq!(game.status(), "Resignation");
    assert_eq!(
        texts(&arena.frames(p.black), "GAME_OVER"),
        vec![format!("{} 0-1 Resignation", p.game_id)]
    );
}

#[test]
fn resignation_out_of_turn_is_ignored() {
    let mut arena = Arena::standard();
    let p = arena.start(1, "amy", 2, "zed");

    arena.line(p.black, &format!("RESIGN {}", p.game_id));

    assert_eq!(
        texts(&arena.frames(p.black), "INFO"),
        vec!["Ignoring message. It's not your move".to_string()]
    );
    assert_eq!(arena.game(&p.game_id).state(), GameState::InProgress);
}

// -----------------------------------------
// 9) SAY
// -----------------------------------------

#[test]
fn chat_is_open_to_both_players() {
    let mut arena = Arena::standard();
    let p = arena.start(1, "amy", 2, "zed");

    arena.line(p.black, &format!("SAY {} good   luck", p.game_id));

    for id in [p.white, p.black] {
        assert_eq!(
            texts(&arena.frames(id), "SAID"),
            vec!["amy good luck".to_string()]
        );
    }
}

// -----------------------------------------
// 10) Троекратное повторение
// -----------------------------------------

#[test]
fn threefold_repetition_is_a_draw() {
    let mut arena = Arena::standard();
    let p = arena.start(1, "amy", 2, "zed");

    arena.play(
        &p,
        &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"],
    );

    let game = arena.game(&p.game_id);
    assert_eq!(game.state(), GameState::Finished);
    assert_eq!(game.outcomes(), [0.5, 0.5]);
    assert_eq!(game.status(), Termination::ThreefoldRepetition.reason());
    assert_eq!(
        texts(&arena.frames(p.white), "GAME_OVER"),
        vec![format!("{} 0.5-0.5 Threefold repetition", p.game_id)]
    );
    assert_eq!(arena.archive.records()[0].outcomes, [0.5, 0.5]);
}

// -----------------------------------------
// 11) Неизвестный action
// -----------------------------------------

#[test]
fn unknown_action_in_game_is_informational() {
    let mut arena = Arena::standard();
    let p = arena.start(1, "amy", 2, "zed");

    arena.line(p.white, &format!("dance {}", p.game_id));

    let white = arena.frames(p.white);
    assert_eq!(texts(&white, "INFO"), vec!["ignoring message type DANCE.".to_string()]);
    assert!(!disconnected(&white));
}

// -----------------------------------------
// 12) Наблюдатель
// -----------------------------------------

#[test]
fn observer_gets_snapshot_and_updates_until_unwatch() {
    let mut arena = Arena::standard();
    let p = arena.start(1, "amy", 2, "zed");

    arena.connect(3);
    arena.line(3, &format!("WATCH {}", p.game_id));

    let snapshot = texts(&arena.frames(3), "GAME_STATE");
    assert_eq!(
        snapshot,
        vec![format!("{} zed amy 300.00 300.00 {}", p.game_id, START_FEN)]
    );
    assert!(arena
        .manager
        .player(3)
        .unwrap()
        .observing_games
        .contains(&p.game_id));

    arena.line(p.white, &format!("MOVE {} d2d4", p.game_id));
    assert_eq!(texts(&arena.frames(3), "PLAYER_MOVED").len(), 1);

    arena.line(3, &format!("UNWATCH {}", p.game_id));
    arena.line(p.black, &format!("MOVE {} d7d5", p.game_id));
    assert!(arena.frames(3).is_empty());
    assert!(arena.game(&p.game_id).observers().is_empty());
}

// -----------------------------------------
// 13) Отключение до ACK
// -----------------------------------------

#[test]
fn disconnect_before_ack_requeues_the_opponent() {
    let mut arena = Arena::standard();
    let p = arena.pair(1, "amy", 2, "zed");

    arena.manager.player_disconnected(p.black);

    let game = arena.game(&p.game_id);
    assert_eq!(game.state(), GameState::Aborted);
    assert_eq!(game.status(), "opponent disconnected before ack");

    let frames = arena.frames(p.white);
    assert!(!disconnected(&frames));
    assert_eq!(
        texts(&frames, "GAME_ABORTED"),
        vec!["opponent disconnected before ack".to_string()]
    );

    let survivor = arena.manager.player(p.white).unwrap();
    assert_eq!(survivor.state, PlayerState::WaitingPairing);
    assert!(survivor.current_game.is_none());
    assert_eq!(survivor.last_game_done_at, Some(START));
    assert!(arena.archive.records().is_empty());

    // До конца паузы новый соперник не подбирается.
    arena.join(3, "bob");
    arena.frames(3);
    arena.manager.sweep_pairings();
    assert!(texts(&arena.frames(p.white), "GAME_PAIRED").is_empty());

    arena.advance(6.0);
    let next = arena.repair(3, "bob", p.white);
    assert_ne!(next.game_id, p.game_id);
    assert!(next.white == p.white || next.black == p.white);
    assert_eq!(arena.game(&next.game_id).state(), GameState::NeedsAck);
    assert_eq!(
        arena.manager.player(p.white).unwrap().current_game.as_deref(),
        Some(next.game_id.as_str())
    );
}
