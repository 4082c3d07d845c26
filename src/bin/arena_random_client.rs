// src/bin/arena_random_client.rs
//
// Бот для нагрузки и отладки: JOIN, ACK на каждую пару, случайный легальный ход
// на каждый YOUR_MOVE.

use clap::Parser;
use rand::seq::SliceRandom;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use chess_arena::api::protocol::{self, format_message, parse_line, tokens};
use chess_arena::chess::ChessBoard;
use chess_arena::telemetry::init_telemetry;

/// Random-move client for the chess arena
#[derive(Parser, Debug)]
#[command(name = "arena_random_client")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Tournament to join
    #[arg(short, long, default_value = "a")]
    tournament: String,

    /// Player name (no spaces)
    #[arg(short, long)]
    name: String,
}

/// Ответ на одно сообщение сервера.
fn respond(action: &str, text: &str) -> Option<(String, String)> {
    let parts = tokens(text);
    match action {
        protocol::GAME_PAIRED => {
            let game_id = parts.first()?;
            info!(game_id, white = ?parts.get(1), black = ?parts.get(2), "paired, sending ack");
            Some((protocol::ACK.to_string(), game_id.to_string()))
        }
        protocol::YOUR_MOVE => {
            // <id> <white> <black> <wt> <bt> <fen...>
            if parts.len() < 6 {
                return None;
            }
            let fen = parts[5..].join(" ");
            let board = match ChessBoard::from_fen(&fen) {
                Ok(board) => board,
                Err(err) => {
                    warn!(error = %err, "cannot parse position");
                    return None;
                }
            };
            let moves = board.legal_uci_moves();
            let choice = moves.choose(&mut rand::thread_rng())?;
            Some((protocol::MOVE.to_string(), format!("{} {}", parts[0], choice)))
        }
        protocol::GAME_OVER | protocol::GAME_ABORTED | protocol::INFO => {
            info!(action, text, "server");
            None
        }
        _ => {
            debug!(action, text, "server");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_telemetry();

    info!(host = %args.host, port = args.port, "connecting");
    let stream = TcpStream::connect((args.host.as_str(), args.port)).await?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let join = format!("{} {}", args.tournament, args.name);
    writer
        .write_all(format_message(protocol::JOIN, &join).as_bytes())
        .await?;

    while let Some(line) = lines.next_line().await? {
        let Some((action, text)) = parse_line(&line) else {
            continue;
        };
        if let Some((reply_action, reply_text)) = respond(&action, &text) {
            writer
                .write_all(format_message(&reply_action, &reply_text).as_bytes())
                .await?;
        }
    }

    info!("server closed the connection");
    Ok(())
}
