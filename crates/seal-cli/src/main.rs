use std::process::ExitCode;

use clap::Parser;
use seal_sdk::CancellationToken;
use tracing::Level;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = cli::Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // Ctrl-C stops a long `verify --all` between objects.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let passed = tokio::task::spawn_blocking(move || commands::run_command(cli, &cancel)).await??;
    Ok(if passed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
