//! `lifelog-router run`: the ingestion daemon.

use std::future::Future;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::application::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::services::{CycleReport, IngestionStatus};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run a single polling cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RunOutput {
    Cycle(CycleReport),
    Stopped(IngestionStatus),
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        match self {
            Self::Cycle(report) => format!(
                "Fetched {} event(s): {} skipped, {} marked, {} left for retry",
                report.fetched, report.skipped, report.marked, report.left_unprocessed
            ),
            Self::Stopped(status) => format!(
                "Stopped after {} cycle(s) ({} failed): {} event(s) seen, \
                 {} skipped, {} marked, {} left for retry",
                status.cycles,
                status.failed_cycles,
                status.events_seen,
                status.events_skipped,
                status.events_marked,
                status.events_left_unprocessed
            ),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Call `stop` once `interrupt` fires. If the listener cannot be installed
/// the daemon keeps running and this future never completes.
async fn stop_on_interrupt<F, S>(interrupt: F, stop: S)
where
    F: Future<Output = std::io::Result<()>>,
    S: FnOnce(),
{
    match interrupt.await {
        Ok(()) => {
            tracing::info!("Interrupt received, stopping after the current cycle");
            stop();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C, stop the process externally");
            std::future::pending::<()>().await;
        }
    }
}

pub async fn execute(args: RunArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let ingestion = ctx.ingestion_loop()?;

    let out = if args.once {
        RunOutput::Cycle(ingestion.run_cycle().await.context("Ingestion cycle failed")?)
    } else {
        let handle = ingestion.handle();
        let stopper = tokio::spawn(stop_on_interrupt(tokio::signal::ctrl_c(), move || {
            handle.stop();
        }));

        ingestion.run().await;
        stopper.abort();
        RunOutput::Stopped(ingestion.status().await)
    };
    output(&out, json_mode);

    drop(ingestion);
    ctx.shutdown().await;
    Ok(())
}
