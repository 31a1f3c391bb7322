//! rps-ledger binary entrypoint wiring the document store, autosave and the console driver.

use std::{
    io::{self, BufRead},
    sync::Arc,
    thread,
};

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rps_ledger::{
    config::AppConfig,
    console::{self, Command, HELP},
    dao::document_store::JsonFileBackend,
    services::{autosave, game_service::Session},
    state::{DocumentStore, SharedStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = open_store(&config).await;

    let autosave = autosave::spawn(store.clone(), config.autosave_interval);
    let mut session = Session::new(store);

    let outcome = run_console(&mut session).await;

    info!("waiting for data save operation");
    if !autosave.shutdown(config.shutdown_grace).await {
        warn!("exiting without confirmation of the final save");
    }
    info!("exiting");

    outcome
}

/// Open the file-backed document, or keep playing in memory when the file is unusable.
async fn open_store(config: &AppConfig) -> SharedStore {
    let backend = Arc::new(JsonFileBackend::new(&config.data_dir));
    match DocumentStore::open(backend, config.default_settings()).await {
        Ok(store) => store,
        Err(err) => {
            error!(
                error = %err,
                data_dir = %config.data_dir.display(),
                "game document unavailable; progress this session will not be saved to disk"
            );
            DocumentStore::detached(config.default_settings())
        }
    }
}

/// Read commands from stdin until `quit`, end of input, or a termination signal.
async fn run_console(session: &mut Session) -> anyhow::Result<()> {
    let mut lines = spawn_stdin_reader();
    println!("{HELP}");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            _ = &mut shutdown => break,
            line = lines.recv() => line,
        };
        let Some(line) = line.transpose().context("reading stdin")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                println!("{err}; type `help` for the command list");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        match console::respond(session, command).await {
            Ok(reply) => reply.iter().for_each(|line| println!("{line}")),
            Err(err) => println!("{err}"),
        }
    }

    Ok(())
}

/// Forward stdin lines from a plain thread so a pending read never holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Configure tracing subscribers; logs go to stderr so they stay out of the console output.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
