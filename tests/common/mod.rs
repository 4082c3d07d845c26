// tests/common/mod.rs
//
// Общая обвязка для интеграционных тестов:
//  - Manager с ручными часами, in-memory архивом и RNG без перемешивания;
//  - игроки – ChannelPlayer, их входящие кадры копятся в очередях;
//  - хелперы "спарить" и "спарить и начать".

#![allow(dead_code)]

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedReceiver;

use chess_arena::domain::PlayerId;
use chess_arena::engine::Game;
use chess_arena::infra::{IdentityRng, InMemoryGameArchive, ManualClock};
use chess_arena::transport::{drain, ChannelPlayer, Frame};
use chess_arena::Manager;

pub const T: &str = "t";
pub const START: f64 = 1_000.0;

pub struct Arena {
    pub manager: Manager<IdentityRng>,
    pub clock: ManualClock,
    pub archive: InMemoryGameArchive,
    inboxes: HashMap<PlayerId, UnboundedReceiver<Frame>>,
}

/// Результат спаривания: id партии и кто каким цветом.
#[derive(Clone, Debug)]
pub struct Paired {
    pub game_id: String,
    pub white: PlayerId,
    pub black: PlayerId,
}

impl Arena {
    pub fn new(games_per_pair: u32, time_limit: f64, increment: f64) -> Self {
        let clock = ManualClock::new(START);
        let archive = InMemoryGameArchive::new();
        let mut manager = Manager::with_rng(
            Box::new(archive.clone()),
            Box::new(clock.clone()),
            IdentityRng,
        );
        manager
            .create_tournament(T, games_per_pair, time_limit, increment)
            .expect("tournament must be created");
        Self {
            manager,
            clock,
            archive,
            inboxes: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        Self::new(2, 300.0, 0.0)
    }

    pub fn connect(&mut self, id: PlayerId) {
        let (handle, rx) = ChannelPlayer::boxed();
        self.manager.player_connected(id, handle);
        self.inboxes.insert(id, rx);
    }

    pub fn join(&mut self, id: PlayerId, name: &str) {
        self.connect(id);
        self.line(id, &format!("JOIN {T} {name}"));
    }

    pub fn line(&mut self, id: PlayerId, line: &str) {
        self.manager.receive_line(id, line);
    }

    pub fn frames(&mut self, id: PlayerId) -> Vec<Frame> {
        drain(self.inboxes.get_mut(&id).expect("unknown test player"))
    }

    pub fn advance(&self, secs: f64) {
        self.clock.advance(secs);
    }

    pub fn game(&self, game_id: &str) -> &Game {
        self.manager
            .game_for_id(game_id)
            .expect("game must exist")
    }

    /// Подключить двух игроков и прогнать подбор пар.
    pub fn pair(&mut self, a: PlayerId, a_name: &str, b: PlayerId, b_name: &str) -> Paired {
        self.join(a, a_name);
        self.join(b, b_name);
        self.frames(a);
        self.frames(b);
        self.repair(a, a_name, b)
    }

    /// Подбор пар для уже подключённых игроков.
    pub fn repair(&mut self, a: PlayerId, a_name: &str, b: PlayerId) -> Paired {
        self.manager.sweep_pairings();
        let paired = texts(&self.frames(a), "GAME_PAIRED");
        self.frames(b);
        let text = paired.last().expect("GAME_PAIRED must be sent");
        let parts: Vec<&str> = text.split(' ').collect();
        let game_id = parts[0].to_string();
        let (white, black) = if parts[1] == a_name { (a, b) } else { (b, a) };
        Paired {
            game_id,
            white,
            black,
        }
    }

    /// Спарить и оба ACK. Очереди после старта пустые.
    pub fn start(&mut self, a: PlayerId, a_name: &str, b: PlayerId, b_name: &str) -> Paired {
        let p = self.pair(a, a_name, b, b_name);
        self.ack_both(&p);
        p
    }

    pub fn ack_both(&mut self, p: &Paired) {
        self.line(p.white, &format!("ACK {}", p.game_id));
        self.line(p.black, &format!("ACK {}", p.game_id));
        self.frames(p.white);
        self.frames(p.black);
    }

    /// Сыграть ходы по очереди (белые первые).
    pub fn play(&mut self, p: &Paired, moves: &[&str]) {
        for (i, m) in moves.iter().enumerate() {
            let who = if i % 2 == 0 { p.white } else { p.black };
            self.line(who, &format!("MOVE {} {}", p.game_id, m));
        }
    }
}

/// Тексты всех сообщений с данным action.
pub fn texts(frames: &[Frame], action: &str) -> Vec<String> {
    frames
        .iter()
        .filter(|f| f.action() == Some(action))
        .filter_map(|f| f.text().map(str::to_string))
        .collect()
}

/// Пары (action, text) без Disconnect.
pub fn messages(frames: &[Frame]) -> Vec<(String, String)> {
    frames
        .iter()
        .filter_map(|f| match f {
            Frame::Message { action, text } => Some((action.clone(), text.clone())),
            Frame::Disconnect => None,
        })
        .collect()
}

pub fn disconnected(frames: &[Frame]) -> bool {
    frames.iter().any(|f| *f == Frame::Disconnect)
}
