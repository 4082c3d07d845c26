//! Шахматная арена: турниры, подбор пар, судейство партий по строковому протоколу.
//!
//! Слои:
//! - `domain` – игроки, реестр сессий, турнир;
//! - `engine` – партия: ACK, ходы, часы, итог;
//! - `tournament` – `Manager` и алгоритм подбора пар;
//! - `chess` – правила (shakmaty), нормализация ходов, PGN;
//! - `time_ctrl` – контроль времени и часы;
//! - `infra` – id, RNG, время, архив;
//! - `api` / `transport` / `server` – протокол, транспорты и цикл событий.

pub mod api;
pub mod chess;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod infra;
pub mod server;
pub mod telemetry;
pub mod time_ctrl;
pub mod tournament;
pub mod transport;

pub use domain::{GameId, PlayerId, Timestamp};
pub use engine::{ArenaError, Game, GameState};
pub use tournament::Manager;
