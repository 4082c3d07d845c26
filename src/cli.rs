//! CLI сервера арены.

use std::path::PathBuf;

use clap::Parser;

/// Шахматная арена: турниры по построчному протоколу
#[derive(Parser, Debug)]
#[command(name = "arena_server")]
#[command(about = "Подбирает пары, судит партии и пишет их в архив", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Хост (перекрывает ARENA_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Порт (перекрывает ARENA_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// PGN архив партий (перекрывает ARENA_HISTORY)
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Турнир, создаваемый при старте, если его нет в архиве
    #[arg(long, default_value = "a")]
    pub tournament: String,

    /// Партий на пару игроков
    #[arg(long, default_value_t = 2)]
    pub games_per_pair: u32,

    /// Секунд на часах у каждого в начале партии
    #[arg(long, default_value_t = 300.0)]
    pub time_limit: f64,

    /// Добавка в секундах за ход
    #[arg(long, default_value_t = 0.0)]
    pub increment: f64,

    /// Вывести сводки турниров в JSON после загрузки архива и выйти
    #[arg(long)]
    pub report: bool,
}
