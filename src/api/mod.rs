//! Внешний интерфейс арены.
//!
//! Здесь описываются:
//! - построчный протокол (protocol.rs): разбор/сборка `ACTION[ text]` и имена action;
//! - запросы (queries.rs): только чтение, сводки турниров для выдачи в JSON.

pub mod protocol;
pub mod queries;

pub use protocol::{format_message, parse_line};
pub use queries::*;
