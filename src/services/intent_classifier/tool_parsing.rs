//! Interpretation of tool invocations returned by the reasoning service.

use serde::Deserialize;

use crate::domain::models::{ModuleCall, RouteAction, RoutingDecision};
use crate::domain::ports::ToolInvocation;
use crate::services::date_parser::DateResolver;
use crate::services::handler_registry::HandlerRegistry;
use crate::services::tool_projection::{parse_tool_name, ToolTarget};

const DEFAULT_TOOL_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Default, Deserialize)]
struct SummaryArgs {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RetrievalArgs {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HandlerArgs {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
}

fn parse_args<'de, T: Deserialize<'de> + Default>(raw: &'de str) -> Result<T, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(raw)
}

/// Turn tool invocations into a decision.
///
/// The summary tool wins over the retrieval tool, which wins over handler
/// tools. Unknown tool names are skipped. Duplicate handler entries keep
/// the highest confidence. Any malformed argument object fails the whole
/// interpretation.
pub fn interpret(
    calls: &[ToolInvocation],
    text: &str,
    registry: &HandlerRegistry,
    dates: &DateResolver,
) -> Result<RoutingDecision, serde_json::Error> {
    let mut summary: Option<SummaryArgs> = None;
    let mut retrieval: Option<RetrievalArgs> = None;
    let mut module_calls: Vec<ModuleCall> = Vec::new();

    for call in calls {
        match parse_tool_name(&call.name) {
            ToolTarget::Summary => {
                let args: SummaryArgs = parse_args(&call.arguments)?;
                if summary.is_none() {
                    summary = Some(args);
                }
            }
            ToolTarget::Retrieval => {
                let args: RetrievalArgs = parse_args(&call.arguments)?;
                if retrieval.is_none() {
                    retrieval = Some(args);
                }
            }
            ToolTarget::Handler(name) => {
                let args: HandlerArgs = parse_args(&call.arguments)?;
                if registry.find_by_name(name).is_none() {
                    tracing::warn!(
                        tool = %call.name,
                        "Reasoning service selected an unregistered handler"
                    );
                    continue;
                }
                push_unique(&mut module_calls, handler_call(name, args));
            }
            ToolTarget::Unknown => {
                tracing::warn!(tool = %call.name, "Ignoring unknown tool invocation");
            }
        }
    }

    if let Some(args) = summary {
        let date = args
            .date
            .as_deref()
            .and_then(|d| dates.resolve(d))
            .unwrap_or_else(|| dates.today());
        let reasoning = args
            .reasoning
            .unwrap_or_else(|| format!("Summary request detected for {date}"));
        return Ok(RoutingDecision::summary(date, reasoning));
    }

    if let Some(args) = retrieval {
        let query = args
            .query
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| text.to_string());
        let reasoning = args
            .reasoning
            .unwrap_or_else(|| "Question about past records".to_string());
        return Ok(RoutingDecision::retrieval(query, reasoning));
    }

    let reasoning = format!("Selected {} handler(s)", module_calls.len());
    Ok(RoutingDecision::modules(module_calls, reasoning))
}

fn handler_call(name: &str, args: HandlerArgs) -> ModuleCall {
    let action = match args.action.as_deref() {
        None => RouteAction::Log,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(handler = name, action = raw, "Unknown action, defaulting to log");
            RouteAction::Log
        }),
    };
    ModuleCall::new(
        name,
        action,
        args.confidence.unwrap_or(DEFAULT_TOOL_CONFIDENCE),
        args.reasoning.unwrap_or_else(|| "Selected by reasoning service".to_string()),
    )
}

fn push_unique(calls: &mut Vec<ModuleCall>, call: ModuleCall) {
    match calls.iter_mut().find(|c| c.handler_name == call.handler_name) {
        Some(existing) if call.confidence > existing.confidence => *existing = call,
        Some(_) => {}
        None => calls.push(call),
    }
}

/// Turn a tool-selected handler decision into out of scope when its best
/// confidence is below `threshold`, or when no handler survived parsing.
pub fn apply_confidence_gate(decision: RoutingDecision, threshold: f64) -> RoutingDecision {
    if decision.is_summary_request || decision.needs_retrieval {
        return decision;
    }
    if decision.module_calls.is_empty() {
        return RoutingDecision::out_of_scope("No registered handler was selected");
    }

    let max = decision.max_confidence();
    if max < threshold {
        return RoutingDecision::out_of_scope(format!(
            "Max confidence {max:.2} is below threshold {threshold:.2}"
        ));
    }

    RoutingDecision {
        reasoning: format!("{} with max confidence {max:.2}", decision.reasoning),
        ..decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainResult;
    use crate::domain::models::{ActionResult, SummaryResult};
    use crate::domain::ports::Handler;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    struct Named(&'static str);

    #[async_trait]
    impl Handler for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            ""
        }
        fn keywords(&self) -> &[String] {
            &[]
        }
        fn question_patterns(&self) -> &[String] {
            &[]
        }
        async fn ingest(&self, _text: &str, _event_id: &str) -> DomainResult<ActionResult> {
            Ok(ActionResult::silent_success(self.0))
        }
        async fn summarize(&self, date: NaiveDate) -> DomainResult<SummaryResult> {
            Ok(SummaryResult {
                handler_name: self.0.to_string(),
                date,
                text: String::new(),
                data: serde_json::Value::Null,
            })
        }
    }

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(Named("nutrition"))).unwrap();
        registry.register(Arc::new(Named("sleep"))).unwrap();
        registry
    }

    fn dates() -> DateResolver {
        DateResolver::from_name("UTC")
            .unwrap()
            .with_fixed_today(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
    }

    #[test]
    fn test_summary_tool_wins() {
        let calls = vec![
            ToolInvocation::new("nutrition_module", r#"{"action":"log","confidence":0.9}"#),
            ToolInvocation::new("get_daily_summary", r#"{"date":"yesterday","confidence":0.2}"#),
        ];
        let decision = interpret(&calls, "text", &registry(), &dates()).unwrap();
        assert!(decision.is_summary_request);
        assert_eq!(decision.summary_date, NaiveDate::from_ymd_opt(2025, 1, 14));
        assert!(decision.module_calls.is_empty());
    }

    #[test]
    fn test_summary_date_defaults_to_today() {
        let calls = vec![ToolInvocation::new("get_daily_summary", r#"{"date":"whenever"}"#)];
        let decision = interpret(&calls, "text", &registry(), &dates()).unwrap();
        assert_eq!(decision.summary_date, NaiveDate::from_ymd_opt(2025, 1, 15));
    }

    #[test]
    fn test_retrieval_query_defaults_to_text() {
        let calls = vec![
            ToolInvocation::new("sleep_module", r#"{"action":"query","confidence":0.9}"#),
            ToolInvocation::new("answer_query_with_retrieval", "{}"),
        ];
        let decision =
            interpret(&calls, "what did I eat on monday", &registry(), &dates()).unwrap();
        assert!(decision.needs_retrieval);
        assert_eq!(decision.retrieval_query.as_deref(), Some("what did I eat on monday"));
    }

    #[test]
    fn test_handler_defaults_and_duplicates() {
        let calls = vec![
            ToolInvocation::new("sleep_module", ""),
            ToolInvocation::new("nutrition_module", r#"{"action":"query","confidence":0.75}"#),
            ToolInvocation::new("nutrition_module", r#"{"action":"log","confidence":0.95}"#),
            ToolInvocation::new("weather_module", r#"{"confidence":1.0}"#),
        ];
        let decision = interpret(&calls, "text", &registry(), &dates()).unwrap();
        assert_eq!(decision.module_calls.len(), 2);
        let sleep = &decision.module_calls[0];
        assert_eq!(sleep.action, RouteAction::Log);
        assert!((sleep.confidence - 0.8).abs() < f64::EPSILON);
        let nutrition = &decision.module_calls[1];
        assert_eq!(nutrition.action, RouteAction::Log);
        assert!((nutrition.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_arguments_fail() {
        let calls = vec![ToolInvocation::new("nutrition_module", "{not json")];
        assert!(interpret(&calls, "text", &registry(), &dates()).is_err());
    }

    #[test]
    fn test_confidence_gate_boundary() {
        let at = RoutingDecision::modules(
            vec![ModuleCall::new("nutrition", RouteAction::Log, 0.7, "")],
            "Selected 1 handler(s)",
        );
        let gated = apply_confidence_gate(at, 0.7);
        assert!(!gated.out_of_scope);
        assert_eq!(gated.module_calls.len(), 1);

        let below = RoutingDecision::modules(
            vec![ModuleCall::new("nutrition", RouteAction::Log, 0.6999, "")],
            "Selected 1 handler(s)",
        );
        let gated = apply_confidence_gate(below, 0.7);
        assert!(gated.out_of_scope);
        assert!(gated.module_calls.is_empty());
        assert!(gated.is_consistent());
    }

    #[test]
    fn test_gate_on_empty_calls() {
        let gated = apply_confidence_gate(RoutingDecision::modules(Vec::new(), ""), 0.7);
        assert!(gated.out_of_scope);
    }
}
