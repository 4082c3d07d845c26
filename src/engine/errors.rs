use thiserror::Error;

use crate::chess::ChessError;

/// Ошибки координатора.
///
/// Текст ошибки уходит клиенту как есть в строке `INFO`, поэтому формулировки
/// английские и без технических деталей.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// Плохие параметры турнира (имя, лимиты).
    #[error("{0}")]
    Config(String),

    /// Сообщение не соответствует текущему состоянию игрока.
    #[error("{0}")]
    Protocol(String),

    /// Текст хода не соответствует легальному ходу. Лечится локально.
    #[error("Move {0} is not legal")]
    IllegalMove(String),

    /// Нет такой партии / турнира / игрока.
    #[error("{0}")]
    NotFound(String),
}

impl ArenaError {
    pub fn config(msg: impl Into<String>) -> Self {
        ArenaError::Config(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        ArenaError::Protocol(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ArenaError::NotFound(msg.into())
    }

    /// Ошибки, после которых соединение закрывается.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ArenaError::IllegalMove(_))
    }
}

impl From<ChessError> for ArenaError {
    fn from(err: ChessError) -> Self {
        match err {
            ChessError::IllegalMove(m) | ChessError::InvalidMove(m) | ChessError::InvalidSan(m) => {
                ArenaError::IllegalMove(m)
            }
            ChessError::InvalidFen(m) => ArenaError::Protocol(format!("Invalid FEN: {m}")),
        }
    }
}
