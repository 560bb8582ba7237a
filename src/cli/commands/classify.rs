//! `lifelog-router classify`: print a routing decision without acting on it.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::application::AppContext;
use crate::cli::output::{list_table, output, CommandOutput};
use crate::domain::models::{Config, DecisionOutcome, RoutingDecision, Source};
use crate::services::ClassificationContext;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Text to classify
    #[arg(required = true)]
    pub text: Vec<String>,

    /// Channel the text arrived on (ambient or interactive)
    #[arg(short, long, default_value = "ambient")]
    pub source: Source,
}

#[derive(Debug, Serialize)]
pub struct ClassifyOutput {
    pub text: String,
    pub source: Source,
    pub outcome: String,
    pub decision: RoutingDecision,
}

/// One-line description of a decision's primary outcome.
pub fn describe_outcome(decision: &RoutingDecision) -> String {
    match decision.outcome() {
        DecisionOutcome::Failed(error) => format!("error: {error}"),
        DecisionOutcome::Summary(Some(date)) => format!("summary for {date}"),
        DecisionOutcome::Summary(None) => "summary for today".to_string(),
        DecisionOutcome::Retrieval(_) => "retrieval".to_string(),
        DecisionOutcome::DirectAnswer(_) => "direct answer".to_string(),
        DecisionOutcome::NoAction if decision.out_of_scope => "out of scope".to_string(),
        DecisionOutcome::NoAction => "no action".to_string(),
        DecisionOutcome::Dispatch(calls) => format!("dispatch to {} handler(s)", calls.len()),
    }
}

pub(crate) fn decision_lines(decision: &RoutingDecision) -> Vec<String> {
    let mut lines = vec![
        format!("Outcome:   {}", describe_outcome(decision)),
        format!("Reasoning: {}", decision.reasoning),
    ];

    if let Some(query) = &decision.retrieval_query {
        lines.push(format!("Query:     {query}"));
    }
    if let Some(answer) = &decision.direct_answer {
        lines.push(format!("\n{answer}"));
    }
    if !decision.module_calls.is_empty() {
        let mut table = list_table(&["handler", "action", "confidence", "reasoning"]);
        for call in &decision.module_calls {
            table.add_row(vec![
                call.handler_name.clone(),
                call.action.to_string(),
                format!("{:.2}", call.confidence),
                call.reasoning.clone(),
            ]);
        }
        lines.push(format!("\n{table}"));
    }
    lines
}

impl CommandOutput for ClassifyOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Source:    {}", self.source)];
        lines.extend(decision_lines(&self.decision));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ClassifyArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let classifier = ctx.classifier()?;
    let text = args.text.join(" ");

    let decision = classifier
        .classify(&text, args.source, &ClassificationContext::default())
        .await;

    let out = ClassifyOutput {
        outcome: describe_outcome(&decision),
        text,
        source: args.source,
        decision,
    };
    output(&out, json_mode);

    ctx.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ModuleCall, RouteAction};
    use chrono::NaiveDate;

    #[test]
    fn test_describe_outcome() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
        assert_eq!(
            describe_outcome(&RoutingDecision::summary(date, "r")),
            "summary for 2025-01-14"
        );
        assert_eq!(describe_outcome(&RoutingDecision::out_of_scope("r")), "out of scope");

        let decision = RoutingDecision {
            module_calls: vec![ModuleCall::new("workout", RouteAction::Log, 0.9, "ran")],
            reasoning: "r".to_string(),
            ..RoutingDecision::default()
        };
        assert_eq!(describe_outcome(&decision), "dispatch to 1 handler(s)");
        assert!(decision_lines(&decision).iter().any(|l| l.contains("workout")));
    }
}
