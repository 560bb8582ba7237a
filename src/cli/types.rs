//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::commands::{
    ask::AskArgs, classify::ClassifyArgs, handlers::HandlersArgs, ledger::LedgerArgs, run::RunArgs,
    summary::SummaryArgs,
};

#[derive(Parser)]
#[command(name = "lifelog-router")]
#[command(
    about = "Route lifelog transcripts and chat messages to domain handlers",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .lifelog/config.yaml and .lifelog/local.yaml)
    #[arg(short, long, global = true, env = "LIFELOG_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the lifelog API and dispatch new events until interrupted
    Run(RunArgs),

    /// Classify text and print the routing decision without dispatching
    Classify(ClassifyArgs),

    /// Classify and dispatch one chat message
    Ask(AskArgs),

    /// Summarize every handler for a date
    Summary(SummaryArgs),

    /// Inspect the processed-event ledger
    Ledger(LedgerArgs),

    /// List registered handlers and their scheduled tasks
    Handlers(HandlersArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::ledger::LedgerCommands;
    use crate::domain::models::Source;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lifelog-router",
            "classify",
            "ran 5 miles",
            "--json",
            "--config",
            "x.yaml",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("x.yaml")));
        match cli.command {
            Commands::Classify(args) => {
                assert_eq!(args.text, vec!["ran 5 miles"]);
                assert_eq!(args.source, Source::Ambient);
            }
            _ => panic!("expected classify"),
        }
    }

    #[test]
    fn test_classify_source_flag() {
        let cli =
            Cli::try_parse_from(["lifelog-router", "classify", "--source", "interactive", "hi"])
                .unwrap();
        match cli.command {
            Commands::Classify(args) => assert_eq!(args.source, Source::Interactive),
            _ => panic!("expected classify"),
        }
        assert!(
            Cli::try_parse_from(["lifelog-router", "classify", "--source", "radio", "hi"])
                .is_err()
        );
    }

    #[test]
    fn test_ledger_subcommands() {
        let cli = Cli::try_parse_from(["lifelog-router", "ledger", "check", "evt-1"]).unwrap();
        match cli.command {
            Commands::Ledger(args) => {
                assert!(matches!(
                    args.command,
                    LedgerCommands::Check { ref event_id } if event_id == "evt-1"
                ));
            }
            _ => panic!("expected ledger"),
        }
    }
}
