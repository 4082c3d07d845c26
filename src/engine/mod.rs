//! Судейство партий: протокол ACK/ходов, часы, итог.
//!
//! Высокоуровневый объект: `Game`
//! Основные операции:
//!   - `Game::send_paired` – объявить пару
//!   - `Game::handle_message` – ACK / MOVE / RESIGN / SAY участника
//!   - `Game::check_timeout` – таймаут ACK или флаг
//!   - `Game::player_disconnected` – форфейт / прерывание

pub mod actions;
pub mod context;
pub mod errors;
pub mod game_loop;

pub use actions::GameCommand;
pub use context::GameContext;
pub use errors::ArenaError;
pub use game_loop::{
    Game, GameState, Seat, ABORT_NOT_ACKED, ABORT_OPPONENT_LEFT, STATUS_DISCONNECT,
    STATUS_OUT_OF_TIME, STATUS_RESIGNATION,
};

/// RNG интерфейс для подбора пар.
/// Реализации лежат в infra (обёртки над `rand`).
pub trait RandomSource {
    fn shuffle<T>(&mut self, slice: &mut [T]);
}
