use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::domain::{GameId, PlayerId};

/// Генерация ID подключений на монотонном счётчике.
///
/// Один генератор делят accept-цикл сервера и тесты, поэтому счётчик атомарный.
#[derive(Debug)]
pub struct IdGenerator {
    player_counter: AtomicU64,
}

impl IdGenerator {
    /// Создать генератор, первый id = 1.
    pub fn new() -> Self {
        Self {
            player_counter: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn next_player_id(&self) -> PlayerId {
        self.player_counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Глобально уникальный id партии: uuid v4 в hex без дефисов.
pub fn next_game_id() -> GameId {
    Uuid::new_v4().simple().to_string()
}
