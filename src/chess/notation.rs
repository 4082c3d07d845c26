// src/chess/notation.rs
//! Нормализация текста хода от клиента.
//!
//! Клиенты шлют ходы как попало: `e2e4`, `E2-E4`, `O-O`, `e7e8q`, `e7-e8=Q`.
//! Приводим к каноничному виду `e2-e4` / `e7-e8=Q` (его же рассылаем в
//! PLAYER_MOVED), а из него получаем UCI для движка правил.

/// Сторона, от имени которой пришёл ход (нужна для рокировки).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn from_index(index: usize) -> Self {
        if index == 0 {
            Side::White
        } else {
            Side::Black
        }
    }
}

/// Привести текст хода к виду `from-to[=P]`.
pub fn normalize_move(side: Side, raw: &str) -> String {
    let raw = raw.trim();
    let upper = raw.to_uppercase();

    if upper == "O-O" || upper == "0-0" {
        return match side {
            Side::White => "e1-g1".to_string(),
            Side::Black => "e8-g8".to_string(),
        };
    }
    if upper == "O-O-O" || upper == "0-0-0" {
        return match side {
            Side::White => "e1-c1".to_string(),
            Side::Black => "e8-c8".to_string(),
        };
    }

    let mut chars: Vec<char> = raw.to_lowercase().chars().collect();

    if !chars.contains(&'-') {
        let at = chars.len().min(2);
        chars.insert(at, '-');
    }

    if !chars.contains(&'=') && chars.len() > 5 {
        let at = chars.len() - 1;
        chars.insert(at, '=');
    }

    let len = chars.len();
    if len >= 2 && chars[len - 2] == '=' {
        chars[len - 1] = chars[len - 1].to_ascii_uppercase();
    }

    chars.into_iter().collect()
}

/// Каноничный ход -> UCI (`e7-e8=Q` -> `e7e8q`).
pub fn to_uci(normalized: &str) -> String {
    normalized
        .chars()
        .filter(|c| *c != '-' && *c != '=')
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_separator() {
        assert_eq!(normalize_move(Side::White, "e2e4"), "e2-e4");
        assert_eq!(normalize_move(Side::White, "E2-E4"), "e2-e4");
        assert_eq!(to_uci("e2-e4"), "e2e4");
    }

    #[test]
    fn castling_shorthand_depends_on_side() {
        assert_eq!(normalize_move(Side::White, "O-O"), "e1-g1");
        assert_eq!(normalize_move(Side::Black, "0-0"), "e8-g8");
        assert_eq!(normalize_move(Side::White, "o-o-o"), "e1-c1");
        assert_eq!(normalize_move(Side::Black, "O-O-O"), "e8-c8");
    }

    #[test]
    fn promotion_letter_is_placed_and_uppercased() {
        assert_eq!(normalize_move(Side::White, "e7e8q"), "e7-e8=Q");
        assert_eq!(normalize_move(Side::White, "e7-e8q"), "e7-e8=Q");
        assert_eq!(normalize_move(Side::Black, "b2-b1=n"), "b2-b1=N");
        assert_eq!(to_uci("e7-e8=Q"), "e7e8q");
    }

    #[test]
    fn short_garbage_does_not_panic() {
        assert_eq!(normalize_move(Side::White, "x"), "x-");
        assert_eq!(normalize_move(Side::White, ""), "-");
        assert_eq!(to_uci("x-"), "x");
    }
}
