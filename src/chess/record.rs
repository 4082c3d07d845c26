// src/chess/record.rs
//! PGN-запись завершённой партии: то, что пишем в архив и читаем при старте.
//!
//! Помимо стандартных тегов (`Event`, `White`, `Black`, `Result`) храним свои:
//! `GamesPerPair`, `TimeControl`, `Date` / `EventDate` (Unix timestamp),
//! `GameID`, `Termination`. По ним при реплее восстанавливаются турниры.

use std::fmt::Write as _;
use std::io::{BufRead, Lines};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chess::ChessError;
use crate::domain::{GameId, Timestamp};
use crate::time_ctrl::TimeControl;

/// Ошибки чтения архива.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("I/O error while reading game record: {0}")]
    Io(#[from] std::io::Error),

    #[error("Game record has no headers")]
    NoHeaders,

    #[error("Game record is missing header `{0}`")]
    MissingHeader(&'static str),

    #[error("Bad value for header `{name}`: {value}")]
    BadHeader { name: &'static str, value: String },

    #[error("Malformed header line `{0}`")]
    MalformedHeader(String),

    /// Ходы записи не проигрываются с начальной позиции.
    #[error("Bad movetext: {0}")]
    Movetext(#[from] ChessError),
}

/// Одна завершённая партия в том виде, в каком она лежит в архиве.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GameRecord {
    pub game_id: GameId,
    pub tournament: String,
    pub tournament_created_at: Timestamp,
    pub games_per_pair: u32,
    pub time_control: TimeControl,
    pub white: String,
    pub black: String,
    pub created_at: Timestamp,
    pub termination: String,
    /// Очки белых и чёрных: `[1, 0]`, `[0, 1]`, `[0.5, 0.5]`.
    pub outcomes: [f64; 2],
    /// Ходы в SAN.
    pub moves: Vec<String>,
}

impl GameRecord {
    /// Значение тега `Result`.
    pub fn result_tag(&self) -> String {
        format!(
            "{}-{}",
            score_token(self.outcomes[0]),
            score_token(self.outcomes[1])
        )
    }

    /// Сериализовать в PGN (заголовки, пустая строка, ходы, пустая строка).
    pub fn to_pgn(&self) -> String {
        let result = self.result_tag();
        let mut out = String::new();

        let headers: [(&str, String); 10] = [
            ("Event", self.tournament.clone()),
            ("White", self.white.clone()),
            ("Black", self.black.clone()),
            ("Result", result.clone()),
            ("GamesPerPair", self.games_per_pair.to_string()),
            ("TimeControl", self.time_control.to_string()),
            ("Date", self.created_at.to_string()),
            ("EventDate", self.tournament_created_at.to_string()),
            ("GameID", self.game_id.clone()),
            ("Termination", self.termination.clone()),
        ];
        for (name, value) in headers.iter() {
            let _ = writeln!(out, "[{} \"{}\"]", name, escape(value));
        }
        out.push('\n');

        for (ply, san) in self.moves.iter().enumerate() {
            if ply % 2 == 0 {
                let _ = write!(out, "{}. ", ply / 2 + 1);
            }
            out.push_str(san);
            out.push(' ');
        }
        out.push_str(&result);
        out.push_str("\n\n");
        out
    }

    /// Разобрать одну запись из уже выделенных строк заголовков и ходов.
    fn from_parts(headers: Vec<(String, String)>, movetext: &str) -> Result<Self, RecordError> {
        if headers.is_empty() {
            return Err(RecordError::NoHeaders);
        }

        let get = |name: &'static str| -> Result<String, RecordError> {
            headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .ok_or(RecordError::MissingHeader(name))
        };
        let num = |name: &'static str| -> Result<f64, RecordError> {
            let value = get(name)?;
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| RecordError::BadHeader { name, value })
        };

        let games_per_pair = {
            let value = get("GamesPerPair")?;
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| RecordError::BadHeader {
                    name: "GamesPerPair",
                    value,
                })?
        };
        let time_control = {
            let value = get("TimeControl")?;
            value
                .parse::<TimeControl>()
                .map_err(|_| RecordError::BadHeader {
                    name: "TimeControl",
                    value,
                })?
        };
        let outcomes = {
            let value = get("Result")?;
            parse_result(&value).ok_or(RecordError::BadHeader {
                name: "Result",
                value,
            })?
        };

        Ok(Self {
            game_id: get("GameID")?,
            tournament: get("Event")?,
            tournament_created_at: num("EventDate")?,
            games_per_pair,
            time_control,
            white: get("White")?,
            black: get("Black")?,
            created_at: num("Date")?,
            termination: get("Termination")?,
            outcomes,
            moves: parse_movetext(movetext),
        })
    }
}

/// `0.5` -> `1/2`, `1` -> `1`, `0` -> `0`.
fn score_token(score: f64) -> String {
    if score == 0.5 {
        "1/2".to_string()
    } else {
        format!("{score}")
    }
}

fn parse_result(value: &str) -> Option<[f64; 2]> {
    let (white, black) = value.trim().split_once('-')?;
    let parse = |s: &str| -> Option<f64> {
        if s == "1/2" {
            Some(0.5)
        } else {
            s.parse().ok()
        }
    };
    Some([parse(white)?, parse(black)?])
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// `[Name "Value"]` -> (Name, Value).
fn parse_header(line: &str) -> Result<(String, String), RecordError> {
    let inner = line
        .trim()
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or_else(|| RecordError::MalformedHeader(line.to_string()))?;

    let (name, value) = inner
        .split_once(char::is_whitespace)
        .ok_or_else(|| RecordError::MalformedHeader(line.to_string()))?;

    let value = value
        .trim()
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(|| RecordError::MalformedHeader(line.to_string()))?;

    Ok((name.to_string(), unescape(value)))
}

/// Достаём из movetext только SAN-токены: номера ходов, результат и
/// комментарии `{...}` пропускаем.
fn parse_movetext(movetext: &str) -> Vec<String> {
    let mut moves = Vec::new();
    let mut in_comment = false;

    for token in movetext.split_whitespace() {
        if in_comment {
            if token.ends_with('}') {
                in_comment = false;
            }
            continue;
        }
        if token.starts_with('{') {
            in_comment = !token.ends_with('}');
            continue;
        }
        if matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*") {
            continue;
        }

        // `12.e4` и `12...e5`: номер хода может быть приклеен к ходу.
        let token = token.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
        if token.is_empty() {
            continue;
        }
        moves.push(token.to_string());
    }

    moves
}

/// Потоковый читатель архива: одна `GameRecord` на итерацию.
pub struct PgnReader<R: BufRead> {
    lines: Lines<R>,
    pending: Option<String>,
}

impl<R: BufRead> PgnReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            pending: None,
        }
    }

    fn next_line(&mut self) -> Option<std::io::Result<String>> {
        if let Some(line) = self.pending.take() {
            return Some(Ok(line));
        }
        self.lines.next()
    }

    fn read_record(&mut self) -> Option<Result<GameRecord, RecordError>> {
        // Пропускаем пустые строки между записями.
        let first = loop {
            match self.next_line()? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => break line,
                Err(e) => return Some(Err(e.into())),
            }
        };

        let mut headers = Vec::new();
        let mut movetext = String::new();
        let mut line = Some(first);

        // Заголовки.
        while let Some(current) = line.take() {
            let trimmed = current.trim();
            if trimmed.starts_with('[') {
                match parse_header(trimmed) {
                    Ok(h) => headers.push(h),
                    Err(e) => return Some(Err(e)),
                }
                line = match self.next_line() {
                    Some(Ok(next)) => Some(next),
                    Some(Err(e)) => return Some(Err(e.into())),
                    None => None,
                };
            } else {
                line = Some(current);
                break;
            }
        }

        // Пустые строки между заголовками и ходами.
        while let Some(current) = line.take() {
            if !current.trim().is_empty() {
                line = Some(current);
                break;
            }
            line = match self.next_line() {
                Some(Ok(next)) => Some(next),
                Some(Err(e)) => return Some(Err(e.into())),
                None => None,
            };
        }

        // Ходы: до пустой строки или до заголовка следующей записи.
        while let Some(current) = line.take() {
            let trimmed = current.trim();
            if trimmed.is_empty() {
                break;
            }
            if trimmed.starts_with('[') {
                self.pending = Some(current);
                break;
            }
            movetext.push_str(trimmed);
            movetext.push(' ');
            line = match self.next_line() {
                Some(Ok(next)) => Some(next),
                Some(Err(e)) => return Some(Err(e.into())),
                None => None,
            };
        }

        Some(GameRecord::from_parts(headers, &movetext))
    }
}

impl<R: BufRead> Iterator for PgnReader<R> {
    type Item = Result<GameRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record()
    }
}
