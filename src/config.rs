use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::domain::TournamentConfig;

/// Параметры процесса сервера.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// PGN архив завершённых партий.
    pub history: PathBuf,
    /// Турнир, который создаётся при старте (если его нет в архиве).
    pub default_tournament: String,
    pub tournament: TournamentConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            history: PathBuf::from("games.pgn"),
            default_tournament: "a".to_string(),
            tournament: TournamentConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Окружение (`.env` подхватывается через dotenvy) поверх значений по умолчанию.
    ///
    /// `ARENA_HOST`, `ARENA_PORT`, `ARENA_HISTORY`.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(host) = env::var("ARENA_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("ARENA_PORT") {
            config.port = port.parse()?;
        }
        if let Ok(history) = env::var("ARENA_HISTORY") {
            config.history = PathBuf::from(history);
        }
        Ok(config)
    }

    /// Флаги командной строки сильнее окружения.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(history) = &cli.history {
            self.history = history.clone();
        }
        self.default_tournament = cli.tournament.clone();
        self.tournament = TournamentConfig::new(cli.games_per_pair, cli.time_limit, cli.increment);
        self
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
