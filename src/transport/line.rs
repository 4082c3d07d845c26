// src/transport/line.rs
//! Построчный TCP транспорт: `ACTION[ text]\n` в обе стороны.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

use crate::api::protocol::format_message;
use crate::domain::{PlayerHandle, PlayerId};
use crate::server::ArenaEvent;

/// Что писать в сокет.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    Line(String),
    Close,
}

/// Хэндл TCP игрока: кладёт готовые строки в очередь задачи соединения.
#[derive(Clone, Debug)]
pub struct LinePlayer {
    tx: UnboundedSender<Outbound>,
}

impl LinePlayer {
    pub fn new(tx: UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }
}

impl PlayerHandle for LinePlayer {
    fn send(&self, action: &str, text: &str) {
        let _ = self.tx.send(Outbound::Line(format_message(action, text)));
    }

    fn force_disconnect(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

/// Обслуживание одного соединения.
///
/// Входящие строки уходят в цикл событий, исходящие берутся из очереди
/// `LinePlayer`. Закрытие с любой стороны заканчивается `Disconnected`.
pub async fn handle_connection(
    stream: TcpStream,
    id: PlayerId,
    events: UnboundedSender<ArenaEvent>,
) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "?".to_string());
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let (tx, mut outbound) = mpsc::unbounded_channel();
    let handle: Box<dyn PlayerHandle> = Box::new(LinePlayer::new(tx));
    if events.send(ArenaEvent::Connected { id, handle }).is_err() {
        return;
    }
    debug!(player = id, %peer, "connection opened");

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if events.send(ArenaEvent::Line { id, line }).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    debug!(player = id, error = %err, "read failed");
                    break;
                }
            },
            out = outbound.recv() => match out {
                Some(Outbound::Line(text)) => {
                    if writer.write_all(text.as_bytes()).await.is_err() {
                        break;
                    }
                }
                Some(Outbound::Close) | None => break,
            },
        }
    }

    let _ = writer.shutdown().await;
    debug!(player = id, %peer, "connection closed");
    let _ = events.send(ArenaEvent::Disconnected { id });
}
