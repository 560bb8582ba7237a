//! `lifelog-router ledger`: inspect the processed-event ledger.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::application::AppContext;
use crate::cli::output::{list_table, output, render_list, truncate, CommandOutput};
use crate::domain::models::{Config, ProcessedEventMarker};

#[derive(Args, Debug)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub command: LedgerCommands,
}

#[derive(Subcommand, Debug)]
pub enum LedgerCommands {
    /// List the most recently processed events
    List {
        /// Maximum number of markers to show
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
    /// Show whether one event has been processed
    Check {
        /// Source event id
        event_id: String,
    },
}

#[derive(Debug, Serialize)]
pub struct LedgerListOutput {
    pub markers: Vec<ProcessedEventMarker>,
    pub total: usize,
}

impl CommandOutput for LedgerListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["event", "processed at", "source", "disposition"]);
        for marker in &self.markers {
            table.add_row(vec![
                truncate(&marker.event_id, 40),
                marker.processed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                marker.source.to_string(),
                marker.disposition.to_string(),
            ]);
        }
        render_list("processed event", &table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct LedgerCheckOutput {
    pub event_id: String,
    pub processed: bool,
    pub marker: Option<ProcessedEventMarker>,
}

impl CommandOutput for LedgerCheckOutput {
    fn to_human(&self) -> String {
        match &self.marker {
            Some(marker) => format!(
                "{} was processed at {} ({}, {})",
                self.event_id,
                marker.processed_at.format("%Y-%m-%d %H:%M:%S UTC"),
                marker.source,
                marker.disposition
            ),
            None => format!("{} has not been processed", self.event_id),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: LedgerArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;

    match args.command {
        LedgerCommands::List { limit } => {
            let markers = ctx
                .ledger
                .list_recent(limit)
                .await
                .context("Failed to read the processed-event ledger")?;
            let out = LedgerListOutput {
                total: markers.len(),
                markers,
            };
            output(&out, json_mode);
        }
        LedgerCommands::Check { event_id } => {
            let marker = ctx
                .ledger
                .get(&event_id)
                .await
                .context("Failed to read the processed-event ledger")?;
            let out = LedgerCheckOutput {
                processed: marker.is_some(),
                event_id,
                marker,
            };
            output(&out, json_mode);
        }
    }

    ctx.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Disposition, Source};

    #[test]
    fn test_check_output_human() {
        let missing = LedgerCheckOutput {
            event_id: "evt-9".to_string(),
            processed: false,
            marker: None,
        };
        assert_eq!(missing.to_human(), "evt-9 has not been processed");

        let marker = ProcessedEventMarker::new("evt-1", Source::Ambient, Disposition::Dispatched);
        let found = LedgerCheckOutput {
            event_id: "evt-1".to_string(),
            processed: true,
            marker: Some(marker),
        };
        assert!(found.to_human().contains("(ambient, dispatched)"));
        assert_eq!(found.to_json()["processed"], true);
    }
}
