//! `lifelog-router ask`: interactive dispatch of one chat message.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::application::AppContext;
use crate::cli::commands::classify::{decision_lines, describe_outcome};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ActionResult, Config, Disposition, Notification, RoutingDecision};

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Message text
    #[arg(required = true)]
    pub text: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AskOutput {
    pub outcome: String,
    pub disposition: Disposition,
    pub decision: RoutingDecision,
    pub results: Vec<ActionResult>,
    pub notifications: Vec<Notification>,
}

impl CommandOutput for AskOutput {
    fn to_human(&self) -> String {
        let mut lines = decision_lines(&self.decision);

        for result in self.results.iter().filter(|r| !r.success) {
            lines.push(format!(
                "{} failed: {}",
                result.handler_name,
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }
        for note in &self.notifications {
            lines.push(format!("\n# {}\n{}", note.title, note.body));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: AskArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let (decision, outcome) = ctx.handle_interactive(&args.text.join(" ")).await?;

    let out = AskOutput {
        outcome: describe_outcome(&decision),
        disposition: outcome.disposition,
        decision,
        results: outcome.results,
        notifications: outcome.notifications,
    };
    output(&out, json_mode);

    ctx.shutdown().await;
    Ok(())
}
