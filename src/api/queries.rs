use serde::{Deserialize, Serialize};

use crate::domain::{Timestamp, Tournament};
use crate::engine::{Game, GameState};

/// Строка турнирной таблицы для выдачи наружу.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StandingRow {
    pub name: String,
    pub played: u32,
    pub score: f64,
}

/// Краткая информация о партии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GameSummary {
    pub id: String,
    pub white: String,
    pub black: String,
    pub state: GameState,
    /// `1-0`, `0.5-0.5`; пусто у идущих партий.
    pub result: String,
    pub status: String,
    pub moves: usize,
}

impl GameSummary {
    pub fn from_game(game: &Game) -> Self {
        let result = if game.state() == GameState::Finished {
            let o = game.outcomes();
            format!("{}-{}", o[0], o[1])
        } else {
            String::new()
        };
        Self {
            id: game.id.clone(),
            white: game.white().to_string(),
            black: game.black().to_string(),
            state: game.state(),
            result,
            status: game.status().to_string(),
            moves: game.board().ply_count(),
        }
    }
}

/// Сводка турнира (read-only, сериализуется в JSON).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TournamentSummary {
    pub name: String,
    pub created_at: Timestamp,
    pub games_per_pair: u32,
    pub time_limit: f64,
    pub increment: f64,
    pub active_players: usize,
    /// Завершённые, затем идущие партии.
    pub games: Vec<GameSummary>,
    /// По убыванию очков, при равенстве по имени.
    pub standings: Vec<StandingRow>,
}

impl TournamentSummary {
    pub fn from_tournament(t: &Tournament) -> Self {
        let games = t
            .completed_games()
            .into_iter()
            .chain(t.active_games())
            .map(GameSummary::from_game)
            .collect();

        let mut standings: Vec<StandingRow> = t
            .standings()
            .into_iter()
            .map(|(name, s)| StandingRow {
                name,
                played: s.played,
                score: s.score,
            })
            .collect();
        standings.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));

        Self {
            name: t.name.clone(),
            created_at: t.created_at,
            games_per_pair: t.config.games_per_pair,
            time_limit: t.config.time_control.time_limit,
            increment: t.config.time_control.increment,
            active_players: t.active_players(),
            games,
            standings,
        }
    }
}
