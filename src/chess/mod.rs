//! Адаптер шахматных правил.
//!
//! Сами правила (генерация ходов, мат/пат, FEN/SAN) живут в shakmaty,
//! здесь только то, что нужно координатору партий:
//!   - `ChessBoard` – позиция + история, терминальные состояния;
//!   - `notation` – нормализация текста хода от клиента;
//!   - `record` – PGN-запись партии для архива.

pub mod board;
pub mod notation;
pub mod record;

pub use board::{is_threefold_repetition, ChessBoard, ChessError, Termination};
pub use notation::{normalize_move, to_uci, Side};
pub use record::{GameRecord, PgnReader, RecordError};
