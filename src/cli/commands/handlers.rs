//! `lifelog-router handlers`: registered handlers and their scheduled tasks.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::application::AppContext;
use crate::cli::output::{list_table, output, render_list, truncate, CommandOutput};
use crate::domain::models::{Config, RegisteredTask};

#[derive(Args, Debug)]
pub struct HandlersArgs {
    /// Show every keyword instead of the first few
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
pub struct HandlerOutput {
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HandlersOutput {
    pub handlers: Vec<HandlerOutput>,
    pub scheduled_tasks: Vec<RegisteredTask>,
    #[serde(skip)]
    pub verbose: bool,
}

const KEYWORD_PREVIEW: usize = 4;

impl CommandOutput for HandlersOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["name", "description", "keywords"]);
        for handler in &self.handlers {
            let keywords = if self.verbose || handler.keywords.len() <= KEYWORD_PREVIEW {
                handler.keywords.join(", ")
            } else {
                format!(
                    "{}, +{} more",
                    handler.keywords[..KEYWORD_PREVIEW].join(", "),
                    handler.keywords.len() - KEYWORD_PREVIEW
                )
            };
            table.add_row(vec![handler.name.clone(), truncate(&handler.description, 60), keywords]);
        }
        let mut out = render_list("handler", &table, self.handlers.len());

        if !self.scheduled_tasks.is_empty() {
            let mut tasks = list_table(&["handler", "task", "at"]);
            for task in &self.scheduled_tasks {
                tasks.add_row(vec![
                    task.handler_name.clone(),
                    task.task.name.clone(),
                    task.task.at.format("%H:%M").to_string(),
                ]);
            }
            let rendered = render_list("scheduled task", &tasks, self.scheduled_tasks.len());
            out.push_str(&format!("\n\n{rendered}"));
        }
        out
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: HandlersArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;

    let out = HandlersOutput {
        handlers: ctx
            .registry
            .descriptors()
            .map(|d| HandlerOutput {
                name: d.name().to_string(),
                description: d.description().to_string(),
                keywords: d.keywords().to_vec(),
            })
            .collect(),
        scheduled_tasks: ctx.registry.scheduled_tasks(),
        verbose: args.verbose,
    };
    output(&out, json_mode);

    ctx.shutdown().await;
    Ok(())
}
