// tests/server_tests.rs
//
// Цикл событий и TCP транспорт:
//
//  1) run_event_loop: события из канала + периодические свипы доводят партию
//     до конца; после закрытия канала менеджер возвращается с архивом.
//  2) serve + handle_connection: настоящий сокет, построчный протокол,
//     DISCONNECT закрывает соединение со стороны сервера.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;

use chess_arena::infra::{IdGenerator, IdentityRng, InMemoryGameArchive, ManualClock};
use chess_arena::server::{run_event_loop, serve, ArenaEvent};
use chess_arena::time_ctrl::SweepSchedule;
use chess_arena::transport::{ChannelPlayer, Frame};
use chess_arena::Manager;

const WAIT: Duration = Duration::from_secs(5);

fn fast_schedule() -> SweepSchedule {
    SweepSchedule {
        pairing: Duration::from_millis(10),
        timeouts: Duration::from_millis(10),
        clocks: Duration::from_secs(3600),
    }
}

fn manager(archive: &InMemoryGameArchive) -> Manager<IdentityRng> {
    let mut manager = Manager::with_rng(
        Box::new(archive.clone()),
        Box::new(ManualClock::new(1_000.0)),
        IdentityRng,
    );
    manager.create_tournament("t", 2, 300.0, 0.0).unwrap();
    manager
}

/// Ждать кадр с нужным action, пропуская остальные.
async fn expect_frame(rx: &mut UnboundedReceiver<Frame>, action: &str) -> String {
    loop {
        let frame = timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for frame")
            .expect("channel closed");
        if frame.action() == Some(action) {
            return frame.text().unwrap_or_default().to_string();
        }
    }
}

fn message(tx: &UnboundedSender<ArenaEvent>, id: u64, action: &str, text: &str) {
    tx.send(ArenaEvent::Message {
        id,
        action: action.to_string(),
        text: text.to_string(),
    })
    .unwrap();
}

// -----------------------------------------
// 1) Цикл событий
// -----------------------------------------

#[tokio::test]
async fn event_loop_runs_a_game_to_the_end() {
    let archive = InMemoryGameArchive::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let running = tokio::spawn(run_event_loop(manager(&archive), rx, fast_schedule()));

    let (amy, mut amy_rx) = ChannelPlayer::boxed();
    let (zed, mut zed_rx) = ChannelPlayer::boxed();
    tx.send(ArenaEvent::Connected { id: 1, handle: amy }).unwrap();
    tx.send(ArenaEvent::Connected { id: 2, handle: zed }).unwrap();
    message(&tx, 1, "join", "t amy");
    message(&tx, 2, "JOIN", "t zed");

    let paired = expect_frame(&mut amy_rx, "GAME_PAIRED").await;
    let game_id = paired.split(' ').next().unwrap().to_string();
    assert!(paired.starts_with(&format!("{game_id} zed amy ")));
    expect_frame(&mut zed_rx, "GAME_PAIRED").await;

    message(&tx, 1, "ACK", &game_id);
    message(&tx, 2, "ACK", &game_id);
    expect_frame(&mut zed_rx, "YOUR_MOVE").await;

    // Дурацкий мат: zed белыми проигрывает.
    for (id, mv) in [(2, "f2f3"), (1, "e7e5"), (2, "g2g4"), (1, "d8h4")] {
        message(&tx, id, "MOVE", &format!("{game_id} {mv}"));
    }
    let over = expect_frame(&mut amy_rx, "GAME_OVER").await;
    assert_eq!(over, format!("{game_id} 0-1 Checkmate"));

    drop(tx);
    let manager = timeout(WAIT, running).await.unwrap().unwrap();

    let records = archive.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].moves, vec!["f3", "e5", "g4", "Qh4#"]);
    assert_eq!(manager.standings("t").unwrap()["amy"].score, 1.0);
}

#[tokio::test]
async fn disconnect_event_forfeits_running_game() {
    let archive = InMemoryGameArchive::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let running = tokio::spawn(run_event_loop(manager(&archive), rx, fast_schedule()));

    let (amy, mut amy_rx) = ChannelPlayer::boxed();
    let (zed, mut zed_rx) = ChannelPlayer::boxed();
    tx.send(ArenaEvent::Connected { id: 1, handle: amy }).unwrap();
    tx.send(ArenaEvent::Connected { id: 2, handle: zed }).unwrap();
    tx.send(ArenaEvent::Line { id: 1, line: "JOIN t amy".into() }).unwrap();
    tx.send(ArenaEvent::Line { id: 2, line: "JOIN t zed".into() }).unwrap();

    let paired = expect_frame(&mut amy_rx, "GAME_PAIRED").await;
    let game_id = paired.split(' ').next().unwrap().to_string();
    tx.send(ArenaEvent::Line { id: 1, line: format!("ACK {game_id}") }).unwrap();
    tx.send(ArenaEvent::Line { id: 2, line: format!("ACK {game_id}") }).unwrap();
    expect_frame(&mut zed_rx, "YOUR_MOVE").await;

    tx.send(ArenaEvent::Disconnected { id: 2 }).unwrap();
    let over = expect_frame(&mut amy_rx, "GAME_OVER").await;
    assert_eq!(over, format!("{game_id} 0-1 Resignation by disconnect"));

    drop(tx);
    let manager = timeout(WAIT, running).await.unwrap().unwrap();
    assert!(manager.player(2).is_none());
    assert_eq!(archive.records()[0].termination, "Resignation by disconnect");
}

// -----------------------------------------
// 2) TCP
// -----------------------------------------

async fn read_until(lines: &mut Lines<BufReader<OwnedReadHalf>>, prefix: &str) -> String {
    loop {
        let line = timeout(WAIT, lines.next_line())
            .await
            .expect("timed out waiting for line")
            .expect("read failed")
            .expect("connection closed");
        if line.starts_with(prefix) {
            return line;
        }
    }
}

#[tokio::test]
async fn tcp_clients_play_over_line_protocol() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let archive = InMemoryGameArchive::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let acceptor = tokio::spawn(serve(listener, tx, Arc::new(IdGenerator::new())));
    let running = tokio::spawn(run_event_loop(manager(&archive), rx, fast_schedule()));

    let (amy_read, mut amy_write) = TcpStream::connect(addr).await.unwrap().into_split();
    let mut amy = BufReader::new(amy_read).lines();
    amy_write.write_all(b"JOIN t amy\n").await.unwrap();

    let (zed_read, mut zed_write) = TcpStream::connect(addr).await.unwrap().into_split();
    let mut zed = BufReader::new(zed_read).lines();
    zed_write.write_all(b"join t zed\r\n").await.unwrap();

    let paired = read_until(&mut amy, "GAME_PAIRED ").await;
    let game_id = paired.split(' ').nth(1).unwrap().to_string();

    amy_write.write_all(format!("ACK {game_id}\n").as_bytes()).await.unwrap();
    zed_write.write_all(format!("ACK {game_id}\n").as_bytes()).await.unwrap();

    let prompt = read_until(&mut zed, "YOUR_MOVE ").await;
    assert!(prompt.starts_with(&format!("YOUR_MOVE {game_id} zed amy 300.00 300.00 ")));

    zed_write
        .write_all(format!("SAY {game_id} good   luck\n").as_bytes())
        .await
        .unwrap();
    assert_eq!(read_until(&mut amy, "SAID ").await, "SAID zed good luck");

    zed_write
        .write_all(format!("RESIGN {game_id}\n").as_bytes())
        .await
        .unwrap();
    assert_eq!(
        read_until(&mut amy, "GAME_OVER ").await,
        format!("GAME_OVER {game_id} 0-1 Resignation")
    );

    // DISCONNECT: сервер закрывает сокет сам.
    amy_write.write_all(b"DISCONNECT\n").await.unwrap();
    let eof = timeout(WAIT, async {
        loop {
            match amy.next_line().await {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }
    })
    .await;
    assert!(eof.is_ok());

    // Уход amy виден оставшемуся игроку.
    assert_eq!(
        read_until(&mut zed, "INFO Player amy left").await,
        "INFO Player amy left tournament (1 active players)"
    );

    acceptor.abort();
    running.abort();
    assert_eq!(archive.records().len(), 1);
}
