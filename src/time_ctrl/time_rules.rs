// src/time_ctrl/time_rules.rs
//! Контроль времени партии (`limit+increment`) и протокольные таймауты.
//!
//! Здесь только "правила", без состояния и без привязки к конкретной партии.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Сколько секунд даём обоим игрокам на ACK после спаривания.
pub const ACK_TIMEOUT_SECS: f64 = 20.0;

/// Пауза после окончания партии, прежде чем игрока можно спарить снова.
pub const PAIRING_COOLDOWN_SECS: f64 = 5.0;

/// Контроль времени: базовый лимит на партию + добавка за ход (Фишер).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimeControl {
    /// Сколько секунд у каждой стороны на старте партии.
    pub time_limit: f64,
    /// Сколько секунд добавляется ходившему после каждого хода.
    pub increment: f64,
}

impl TimeControl {
    pub const fn new(time_limit: f64, increment: f64) -> Self {
        Self {
            time_limit,
            increment,
        }
    }

    /// Классика сервера: 5 минут без добавки.
    pub const fn standard() -> Self {
        Self::new(300.0, 0.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.time_limit.is_finite() || self.time_limit <= 0.0 {
            return Err(format!("time limit must be positive, got {}", self.time_limit));
        }
        if !self.increment.is_finite() || self.increment < 0.0 {
            return Err(format!("increment must not be negative, got {}", self.increment));
        }
        Ok(())
    }
}

/// Формат из PGN-заголовка `TimeControl`: `300+0`, `60.5+2`.
impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.time_limit, self.increment)
    }
}

impl FromStr for TimeControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (limit, increment) = s
            .trim()
            .split_once('+')
            .ok_or_else(|| format!("time control `{s}` is not in limit+increment form"))?;

        let time_limit: f64 = limit
            .trim()
            .parse()
            .map_err(|_| format!("bad time limit `{limit}`"))?;
        let increment: f64 = increment
            .trim()
            .parse()
            .map_err(|_| format!("bad increment `{increment}`"))?;

        Ok(Self::new(time_limit, increment))
    }
}
