//! Инфраструктурный слой вокруг координатора:
//! - генерация ID;
//! - RNG-реализации для подбора пар;
//! - источники времени;
//! - архив завершённых партий.

pub mod clock;
pub mod ids;
pub mod persistence;
pub mod rng;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::*;
pub use persistence::{open_history, ArchiveError, GameArchive, InMemoryGameArchive, PgnFileArchive};
pub use rng::*;
