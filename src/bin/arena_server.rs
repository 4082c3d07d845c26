// src/bin/arena_server.rs

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use chess_arena::cli::Cli;
use chess_arena::config::ServerConfig;
use chess_arena::infra::{
    open_history, GameArchive, IdGenerator, InMemoryGameArchive, PgnFileArchive, SystemClock,
};
use chess_arena::server::{run_event_loop, serve};
use chess_arena::telemetry::init_telemetry;
use chess_arena::time_ctrl::SweepSchedule;
use chess_arena::Manager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry();

    let config = ServerConfig::from_env()?.apply_cli(&cli);
    info!(?config, "starting arena");

    // В режиме отчёта архив только читаем.
    let archive: Box<dyn GameArchive + Send> = if cli.report {
        Box::new(InMemoryGameArchive::new())
    } else {
        Box::new(PgnFileArchive::open(&config.history)?)
    };
    let mut manager = Manager::new(archive, Box::new(SystemClock));

    match open_history(&config.history)? {
        Some(records) => {
            manager.load_history(records);
        }
        None => info!(path = %config.history.display(), "no archive yet, starting empty"),
    }

    if manager.tournament(&config.default_tournament).is_none() {
        let t = config.tournament;
        manager.create_tournament(
            &config.default_tournament,
            t.games_per_pair,
            t.time_control.time_limit,
            t.time_control.increment,
        )?;
    }

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&manager.summaries())?);
        return Ok(());
    }

    let listener = TcpListener::bind(config.listen_addr()?).await?;
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let ids = Arc::new(IdGenerator::new());

    let acceptor = tokio::spawn(serve(listener, events_tx, ids));

    tokio::select! {
        manager = run_event_loop(manager, events_rx, SweepSchedule::standard()) => {
            info!(tournaments = manager.tournaments().count(), "event loop finished");
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(err) = res {
                warn!(error = %err, "failed to listen for ctrl-c");
            }
            info!("shutting down");
        }
    }

    acceptor.abort();
    Ok(())
}
