//! Доменная модель арены: игроки, турниры, идентификаторы.

pub mod player;
pub mod tournament;

/// Идентификатор подключения (выдаёт транспорт через `IdGenerator`).
pub type PlayerId = u64;
/// Глобально уникальный id партии (hex uuid).
pub type GameId = String;
/// Unix timestamp в секундах (с дробной частью – часы партий идут в долях секунды).
pub type Timestamp = f64;

pub use player::*;
pub use tournament::*;
