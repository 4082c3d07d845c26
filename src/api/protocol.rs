// src/api/protocol.rs
//! Построчный протокол: одно сообщение на строку, формат `ACTION[ text]`.
//!
//! Action на проводе регистронезависим, внутри всегда upper-case.

// Входящие.
pub const JOIN: &str = "JOIN";
pub const WATCH: &str = "WATCH";
pub const UNWATCH: &str = "UNWATCH";
pub const DISCONNECT: &str = "DISCONNECT";
pub const ACK: &str = "ACK";
pub const MOVE: &str = "MOVE";
pub const RESIGN: &str = "RESIGN";
pub const SAY: &str = "SAY";

// Исходящие.
pub const INFO: &str = "INFO";
pub const GAME_PAIRED: &str = "GAME_PAIRED";
pub const GAME_STARTED: &str = "GAME_STARTED";
pub const YOUR_MOVE: &str = "YOUR_MOVE";
pub const PLAYER_MOVED: &str = "PLAYER_MOVED";
pub const CLOCK_UPDATE: &str = "CLOCK_UPDATE";
pub const GAME_STATE: &str = "GAME_STATE";
pub const SAID: &str = "SAID";
pub const GAME_OVER: &str = "GAME_OVER";
pub const GAME_ABORTED: &str = "GAME_ABORTED";

/// Разобрать строку в (ACTION, text). Пустая строка -> None.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (action, text) = match line.split_once(' ') {
        Some((action, text)) => (action, text.trim()),
        None => (line, ""),
    };
    Some((action.to_uppercase(), text.to_string()))
}

/// Собрать строку для отправки (с `\n` на конце).
pub fn format_message(action: &str, text: &str) -> String {
    if text.is_empty() {
        format!("{}\n", action.to_uppercase())
    } else {
        format!("{} {}\n", action.to_uppercase(), text)
    }
}

/// Токены текста без пустых (двойные пробелы не считаются).
pub fn tokens(text: &str) -> Vec<&str> {
    text.split(' ').filter(|s| !s.is_empty()).collect()
}
