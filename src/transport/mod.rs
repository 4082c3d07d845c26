//! Транспорты для `PlayerHandle`:
//! - `line` – построчный TCP (tokio);
//! - `channel` – кадры в канале внутри процесса.

pub mod channel;
pub mod line;

pub use channel::{drain, ChannelPlayer, Frame};
pub use line::{handle_connection, LinePlayer, Outbound};
