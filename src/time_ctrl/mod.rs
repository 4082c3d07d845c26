// src/time_ctrl/mod.rs
//! Контроль времени партий.
//!
//! Здесь собираем:
//! - правила (`TimeControl`, протокольные таймауты);
//! - шахматные часы одной партии (`GameClock`);
//! - расписание периодических свипов менеджера (`SweepSchedule`).

pub mod clock;
pub mod time_rules;

pub use clock::GameClock;
pub use time_rules::{TimeControl, ACK_TIMEOUT_SECS, PAIRING_COOLDOWN_SECS};

use std::time::Duration;

/// Как часто менеджер гоняет свои периодические проходы.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepSchedule {
    /// Подбор пар.
    pub pairing: Duration,
    /// Проверка таймаутов (ACK и флаги).
    pub timeouts: Duration,
    /// Рассылка CLOCK_UPDATE.
    pub clocks: Duration,
}

impl SweepSchedule {
    pub const fn standard() -> Self {
        Self {
            pairing: Duration::from_secs(3),
            timeouts: Duration::from_secs(1),
            clocks: Duration::from_secs(5),
        }
    }
}

impl Default for SweepSchedule {
    fn default() -> Self {
        Self::standard()
    }
}
