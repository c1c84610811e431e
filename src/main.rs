mod cli;

use crate::cli::{Cli, Commands, parse_prompt_line};
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::{error, info};
use sensor_console::{
    config::AppConfig,
    console::{Action, Console, ShutdownReason},
    device_client::DeviceHttpClient,
};
use std::{
    io::{BufRead, IsTerminal, Write},
    sync::Arc,
};
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    initialize();

    let config = AppConfig::get().clone();
    let client =
        Arc::new(DeviceHttpClient::new(&config.device).context("failed to create device client")?);

    let mut stdout = std::io::stdout();
    let console = Console::new(client, config).with_colors(stdout.is_terminal());

    let mut actions = match cli.command.unwrap_or(Commands::Monitor) {
        Commands::Monitor => spawn_prompt_reader(),
        command => {
            let actions = command.actions();
            let (tx, rx) = mpsc::channel(actions.len().max(1));
            for action in actions {
                tx.send(action)
                    .await
                    .context("failed to queue command")?;
            }
            rx
        }
    };

    while let ShutdownReason::Reload(reason) = console.run(&mut actions, &mut stdout).await? {
        info!("page reload after {reason}");
    }

    Ok(())
}

fn initialize() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| writeln!(f, "{}", record.args()));

    // stdout carries the rendered page
    builder.target(Target::Stderr).init();

    info!("{} version: {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}

/// Feed prompt lines from stdin to the console
///
/// Reads on a dedicated thread so a pending read never blocks shutdown.
fn spawn_prompt_reader() -> mpsc::Receiver<Action> {
    let (tx, rx) = mpsc::channel(16);

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("failed to read stdin: {e:#}");
                    break;
                }
            };

            match parse_prompt_line(&line) {
                None => {}
                Some(Ok(action)) => {
                    if tx.blocking_send(action).is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    let _ = e.print();
                }
            }
        }
    });

    rx
}
