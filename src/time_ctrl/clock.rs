// src/time_ctrl/clock.rs
//! Шахматные часы партии: две стороны, тикает только та, чей ход.

use serde::{Deserialize, Serialize};

use crate::domain::Timestamp;

use super::TimeControl;

/// Состояние часов.
///
/// `times[i]`: остаток стороны `i` на момент последней границы хода.
/// "Живой" остаток ходящей стороны считается на лету:
/// `times[cur_index] - (now - cur_move_started_at)`, но не меньше нуля.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GameClock {
    pub times: [f64; 2],
    /// Чей сейчас ход (0 = белые, 1 = чёрные).
    pub cur_index: usize,
    /// Когда начался текущий ход.
    pub cur_move_started_at: Timestamp,
    /// Идут ли часы (только пока партия InProgress).
    pub running: bool,
    pub increment: f64,
}

impl GameClock {
    pub fn new(control: TimeControl) -> Self {
        Self {
            times: [control.time_limit, control.time_limit],
            cur_index: 0,
            cur_move_started_at: 0.0,
            running: false,
            increment: control.increment,
        }
    }

    /// Запустить часы ходящей стороны (старт партии).
    pub fn start(&mut self, now: Timestamp) {
        self.running = true;
        self.cur_move_started_at = now;
    }

    /// Сколько ходящая сторона уже думает над текущим ходом.
    pub fn thinking_time(&self, now: Timestamp) -> f64 {
        if !self.running {
            return 0.0;
        }
        (now - self.cur_move_started_at).max(0.0)
    }

    /// Остатки обеих сторон с учётом текущего раздумья.
    pub fn live_times(&self, now: Timestamp) -> [f64; 2] {
        let mut times = self.times;
        if self.running {
            let idx = self.cur_index;
            times[idx] = (times[idx] - self.thinking_time(now)).max(0.0);
        }
        times
    }

    /// Флаг упал: у ходящей стороны время кончилось.
    pub fn is_flagged(&self, now: Timestamp) -> bool {
        self.running && self.times[self.cur_index] <= self.thinking_time(now)
    }

    /// Ход сделан в момент `now`: списываем раздумье, добавляем инкремент ходившему.
    ///
    /// Сторону НЕ переключаем: сначала партия проверяет мат/ничью.
    pub fn complete_move(&mut self, now: Timestamp) {
        self.times = self.live_times(now);
        self.cur_move_started_at = now;
        self.times[self.cur_index] += self.increment;
    }

    /// Передать ход другой стороне.
    pub fn switch_side(&mut self) {
        self.cur_index = (self.cur_index + 1) % 2;
    }

    /// Остановить часы, зафиксировав живые остатки.
    pub fn stop(&mut self, now: Timestamp) {
        self.times = self.live_times(now);
        self.cur_move_started_at = now;
        self.running = false;
    }
}
