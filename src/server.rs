// src/server.rs
//! Цикл событий арены.
//!
//! Менеджер живёт в одной задаче и меняется только здесь: события
//! соединений и тики трёх таймеров обрабатываются строго по одному.

use std::fmt;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::domain::{PlayerHandle, PlayerId};
use crate::engine::RandomSource;
use crate::infra::IdGenerator;
use crate::time_ctrl::SweepSchedule;
use crate::tournament::Manager;
use crate::transport::handle_connection;

/// Событие транспорта для цикла менеджера.
pub enum ArenaEvent {
    Connected {
        id: PlayerId,
        handle: Box<dyn PlayerHandle>,
    },
    /// Сырая строка (построчный транспорт).
    Line { id: PlayerId, line: String },
    /// Уже разобранное сообщение (message-framed транспорт).
    Message {
        id: PlayerId,
        action: String,
        text: String,
    },
    Disconnected { id: PlayerId },
}

impl fmt::Debug for ArenaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaEvent::Connected { id, .. } => f.debug_struct("Connected").field("id", id).finish(),
            ArenaEvent::Line { id, line } => f
                .debug_struct("Line")
                .field("id", id)
                .field("line", line)
                .finish(),
            ArenaEvent::Message { id, action, text } => f
                .debug_struct("Message")
                .field("id", id)
                .field("action", action)
                .field("text", text)
                .finish(),
            ArenaEvent::Disconnected { id } => {
                f.debug_struct("Disconnected").field("id", id).finish()
            }
        }
    }
}

impl<R: RandomSource> Manager<R> {
    /// Применить одно событие транспорта.
    pub fn handle_event(&mut self, event: ArenaEvent) {
        match event {
            ArenaEvent::Connected { id, handle } => self.player_connected(id, handle),
            ArenaEvent::Line { id, line } => self.receive_line(id, &line),
            ArenaEvent::Message { id, action, text } => self.receive(id, &action, &text),
            ArenaEvent::Disconnected { id } => self.player_disconnected(id),
        }
    }
}

/// Крутить менеджер, пока живы отправители событий.
///
/// Возвращает менеджер обратно (для финальных отчётов и тестов).
pub async fn run_event_loop<R: RandomSource>(
    mut manager: Manager<R>,
    mut events: UnboundedReceiver<ArenaEvent>,
    schedule: SweepSchedule,
) -> Manager<R> {
    let mut pairing = time::interval(schedule.pairing);
    let mut timeouts = time::interval(schedule.timeouts);
    let mut clocks = time::interval(schedule.clocks);
    for timer in [&mut pairing, &mut timeouts, &mut clocks] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => manager.handle_event(event),
                None => break,
            },
            _ = pairing.tick() => manager.sweep_pairings(),
            _ = timeouts.tick() => manager.sweep_timeouts(),
            _ = clocks.tick() => manager.sweep_clocks(),
        }
    }

    info!("event loop stopped");
    manager
}

/// Accept-цикл: каждое соединение в своей задаче, события в общий канал.
pub async fn serve(
    listener: TcpListener,
    events: UnboundedSender<ArenaEvent>,
    ids: Arc<IdGenerator>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, "accept failed");
                continue;
            }
        };
        if events.is_closed() {
            return Ok(());
        }
        let id = ids.next_player_id();
        info!(player = id, %peer, "accepted connection");
        tokio::spawn(handle_connection(stream, id, events.clone()));
    }
}
