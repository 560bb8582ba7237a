//! Lifelog Router CLI entry point.

use anyhow::Context;
use clap::Parser;

use lifelog_router::cli::{commands, handle_error, Cli, Commands};
use lifelog_router::infrastructure::logging::{LogConfig, LoggerImpl};
use lifelog_router::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let logger = LogConfig::try_from(&config.logging)
        .map_err(anyhow::Error::msg)
        .and_then(|log_config| LoggerImpl::init(&log_config))
        .context("Failed to initialize logging");
    let _logger = match logger {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, config, cli.json).await,
        Commands::Classify(args) => commands::classify::execute(args, config, cli.json).await,
        Commands::Ask(args) => commands::ask::execute(args, config, cli.json).await,
        Commands::Summary(args) => commands::summary::execute(args, config, cli.json).await,
        Commands::Ledger(args) => commands::ledger::execute(args, config, cli.json).await,
        Commands::Handlers(args) => commands::handlers::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
