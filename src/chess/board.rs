// src/chess/board.rs
//! Доска партии поверх shakmaty.
//!
//! Что даёт наружу:
//! - проверку и применение хода в UCI-форме;
//! - детекцию терминальных состояний (мат, пат, мало материала,
//!   троекратное повторение, правило 50 ходов);
//! - FEN текущей позиции и SAN-историю партии (для PGN-архива).

use std::str::FromStr;

use shakmaty::{
    fen::Fen, san::San, san::SanPlus, uci::UciMove, CastlingMode, Chess, EnPassantMode, Move,
    Position,
};
use thiserror::Error;

/// Ошибки адаптера правил.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("Move {0} is not legal")]
    IllegalMove(String),

    #[error("Move {0} is not a valid move")]
    InvalidMove(String),

    #[error("Invalid SAN `{0}`")]
    InvalidSan(String),

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
}

/// Почему партия закончилась по позиции на доске.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Сторона, сделавшая последний ход, поставила мат.
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoves,
}

impl Termination {
    /// Текст причины, который уходит в GAME_OVER и в PGN `Termination`.
    pub fn reason(self) -> &'static str {
        match self {
            Termination::Checkmate => "Checkmate",
            Termination::Stalemate => "Stalemate",
            Termination::InsufficientMaterial => "Insufficient material",
            Termination::ThreefoldRepetition => "Threefold repetition",
            Termination::FiftyMoves => "Fifty moves without capture or pawn push",
        }
    }

    pub fn is_draw(self) -> bool {
        !matches!(self, Termination::Checkmate)
    }
}

/// Позиция + история партии.
#[derive(Clone, Debug)]
pub struct ChessBoard {
    position: Chess,
    /// Сыгранные ходы в SAN (с `+`/`#`).
    san_history: Vec<String>,
    /// Ключи повторения для каждой позиции партии, включая стартовую.
    repetition_keys: Vec<String>,
}

impl ChessBoard {
    /// Стандартная начальная позиция.
    pub fn new() -> Self {
        Self::from_position(Chess::default())
    }

    /// Позиция из FEN (для клиентов, которые получают FEN в YOUR_MOVE).
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fen: Fen = fen
            .trim()
            .parse()
            .map_err(|e| ChessError::InvalidFen(format!("{e}")))?;
        let position: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| ChessError::InvalidFen(format!("{e}")))?;
        Ok(Self::from_position(position))
    }

    /// Восстановить партию из SAN-ходов (реплей архива).
    pub fn from_san_moves<S: AsRef<str>>(moves: &[S]) -> Result<Self, ChessError> {
        let mut board = Self::new();
        for token in moves {
            let token = token.as_ref();
            let san = SanPlus::from_str(token)
                .map_err(|_| ChessError::InvalidSan(token.to_string()))?;
            let m = san
                .san
                .to_move(&board.position)
                .map_err(|_| ChessError::IllegalMove(token.to_string()))?;
            board.push(&m);
        }
        Ok(board)
    }

    fn from_position(position: Chess) -> Self {
        let key = repetition_key(&position);
        Self {
            position,
            san_history: Vec::new(),
            repetition_keys: vec![key],
        }
    }

    /// FEN текущей позиции.
    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn san_history(&self) -> &[String] {
        &self.san_history
    }

    pub fn ply_count(&self) -> usize {
        self.san_history.len()
    }

    /// Все легальные ходы в UCI (для ботов).
    pub fn legal_uci_moves(&self) -> Vec<String> {
        self.position
            .legal_moves()
            .iter()
            .map(|m| UciMove::from_move(m, CastlingMode::Standard).to_string())
            .collect()
    }

    /// Проверить ход в UCI-форме и применить его. Возвращает SAN хода.
    pub fn play_uci(&mut self, uci: &str) -> Result<String, ChessError> {
        let parsed: UciMove = uci
            .parse()
            .map_err(|_| ChessError::InvalidMove(uci.to_string()))?;

        let m = parsed
            .to_move(&self.position)
            .map_err(|_| ChessError::IllegalMove(uci.to_string()))?;

        if !self.position.is_legal(&m) {
            return Err(ChessError::IllegalMove(uci.to_string()));
        }

        Ok(self.push(&m))
    }

    fn push(&mut self, m: &Move) -> String {
        // SAN считается от позиции ДО хода.
        let san = San::from_move(&self.position, m);
        self.position.play_unchecked(m);

        let suffix = if self.position.is_checkmate() {
            "#"
        } else if self.position.is_check() {
            "+"
        } else {
            ""
        };
        let san = format!("{san}{suffix}");

        self.san_history.push(san.clone());
        self.repetition_keys.push(repetition_key(&self.position));
        san
    }

    /// Терминальное состояние после последнего хода.
    ///
    /// Порядок важен: сначала мат, потом ничьи.
    pub fn termination(&self) -> Option<Termination> {
        if self.position.is_checkmate() {
            return Some(Termination::Checkmate);
        }
        if self.position.is_stalemate() {
            return Some(Termination::Stalemate);
        }
        if self.position.is_insufficient_material() {
            return Some(Termination::InsufficientMaterial);
        }
        if is_threefold_repetition(&self.repetition_keys) {
            return Some(Termination::ThreefoldRepetition);
        }
        if self.position.halfmoves() >= 100 {
            return Some(Termination::FiftyMoves);
        }
        None
    }
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Ключ позиции для повторений: расстановка, очередь хода, рокировки, en passant.
/// Счётчики полуходов/ходов в ключ не входят.
fn repetition_key(position: &Chess) -> String {
    let fen = Fen::from_position(position.clone(), EnPassantMode::Legal).to_string();
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Партия заканчивается в момент, когда текущая позиция (последний ключ)
/// встретилась в истории третий раз. Заявлять ничью не нужно.
pub fn is_threefold_repetition(keys: &[String]) -> bool {
    let Some(current) = keys.last() else {
        return false;
    };
    keys.iter().filter(|k| *k == current).count() >= 3
}
