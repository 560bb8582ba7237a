//! `lifelog-router summary`: cross-handler summary for one date.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::application::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, DailySummary, Notification};

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Date in natural language ("yesterday", "Jan 14", "2025-01-14"); defaults to today
    pub date: Vec<String>,

    /// Also send the summary to the notification sink
    #[arg(long)]
    pub notify: bool,
}

#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    #[serde(flatten)]
    pub summary: DailySummary,
    pub notified: bool,
}

impl CommandOutput for SummaryOutput {
    fn to_human(&self) -> String {
        let (title, body) = self.summary.render();
        format!("{title}\n\n{body}")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: SummaryArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let date = ctx.dates.resolve_or_today(&args.date.join(" "));

    let summary = ctx.registry.summarize_all(date).await;
    if args.notify {
        let (title, body) = summary.render();
        ctx.dispatcher.notify(Notification::new(title, body)).await;
    }

    output(
        &SummaryOutput {
            summary,
            notified: args.notify,
        },
        json_mode,
    );

    ctx.shutdown().await;
    Ok(())
}
