// src/domain/player.rs

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{GameId, PlayerId, Timestamp};
use crate::time_ctrl::PAIRING_COOLDOWN_SECS;

/// Что транспорт умеет делать с подключённым игроком.
///
/// Реализаций две: построчный TCP и message-framed канал
/// (см. `crate::transport`). Ядро хранит хэндл, но соединением не владеет.
pub trait PlayerHandle: Send {
    /// Отправить сообщение `ACTION[ text]`.
    fn send(&self, action: &str, text: &str);

    /// Попросить транспорт закрыть соединение.
    ///
    /// Само отключение приходит потом отдельным событием
    /// (`Manager::player_disconnected`).
    fn force_disconnect(&self);
}

/// Жизненный цикл игрока.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PlayerState {
    /// Подключился, ждём JOIN.
    Connecting,
    /// В турнире, ждёт пару.
    WaitingPairing,
    /// Спарен, ещё не прислал ACK.
    InGameNeedsAck,
    /// Прислал ACK, ждёт соперника.
    InGameAcked,
    /// Партия идёт.
    Playing,
}

/// Подключённый игрок (или наблюдатель).
pub struct Player {
    pub id: PlayerId,
    /// Имя появляется только после JOIN.
    pub name: Option<String>,
    pub tournament: Option<String>,
    pub state: PlayerState,
    /// Текущая партия (по id, без владения).
    pub current_game: Option<GameId>,
    /// Партии, за которыми наблюдает.
    pub observing_games: BTreeSet<GameId>,
    /// Когда закончилась последняя партия (None – ещё не играл).
    pub last_game_done_at: Option<Timestamp>,
    handle: Box<dyn PlayerHandle>,
}

impl Player {
    pub fn new(id: PlayerId, handle: Box<dyn PlayerHandle>) -> Self {
        Self {
            id,
            name: None,
            tournament: None,
            state: PlayerState::Connecting,
            current_game: None,
            observing_games: BTreeSet::new(),
            last_game_done_at: None,
            handle,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    pub fn send(&self, action: &str, text: &str) {
        self.handle.send(action, text);
    }

    pub fn force_disconnect(&self) {
        self.handle.force_disconnect();
    }

    /// Прошла ли пауза после прошлой партии.
    pub fn cooldown_elapsed(&self, now: Timestamp) -> bool {
        match self.last_game_done_at {
            None => true,
            Some(done) => now - done > PAIRING_COOLDOWN_SECS,
        }
    }

    /// Можно ли сейчас спаривать игрока.
    pub fn is_free(&self, now: Timestamp) -> bool {
        self.state == PlayerState::WaitingPairing && self.cooldown_elapsed(now)
    }

    /// Партия закончилась: вернуть игрока в очередь на спаривание.
    pub fn release(&mut self, now: Timestamp) {
        self.current_game = None;
        self.last_game_done_at = Some(now);
        self.state = PlayerState::WaitingPairing;
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tournament", &self.tournament)
            .field("state", &self.state)
            .field("current_game", &self.current_game)
            .field("observing_games", &self.observing_games)
            .field("last_game_done_at", &self.last_game_done_at)
            .finish()
    }
}

/// Все подключённые игроки по id.
///
/// Турниры и партии держат только `PlayerId`, а отправка сообщений идёт
/// через этот реестр. Отправка отключившемуся игроку – молча no-op.
#[derive(Debug, Default)]
pub struct Sessions {
    players: HashMap<PlayerId, Player>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn send(&self, id: PlayerId, action: &str, text: &str) {
        match self.players.get(&id) {
            Some(p) => p.send(action, text),
            None => debug!(player = id, action, "dropping message for disconnected player"),
        }
    }

    pub fn force_disconnect(&self, id: PlayerId) {
        if let Some(p) = self.players.get(&id) {
            p.force_disconnect();
        }
    }
}
