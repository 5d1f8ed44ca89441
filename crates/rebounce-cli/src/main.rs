mod cli;
mod commands;
mod daemon;
mod setup;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use rebounce_core::paths;
use setup::prepare_core;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logging: always write to file so daemon output survives
    let log_dir = paths::logs_dir()?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "rebounce.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    let core = prepare_core(cli.db_path).await?;
    match cli.command {
        Commands::Run => commands::run::run(core).await,
        Commands::Restart(args) => commands::restart::run(&core, args).await,
        Commands::Schedule { action } => commands::schedule::run(&core, action).await,
        Commands::Status => commands::status::run(&core).await,
    }
}
