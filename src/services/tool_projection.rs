//! Projection of registered handlers onto reasoning-service tool declarations.
//!
//! Pure functions only: no client, no I/O. The classifier builds its tool
//! list here and maps invoked tool names back with [`parse_tool_name`].

use serde_json::json;

use crate::domain::ports::ToolDeclaration;
use crate::services::handler_registry::{HandlerDescriptor, HandlerRegistry};

/// Reserved tool for retrospective summaries.
pub const SUMMARY_TOOL: &str = "get_daily_summary";

/// Reserved tool for retrieval-augmented answers.
pub const RETRIEVAL_TOOL: &str = "answer_query_with_retrieval";

const HANDLER_TOOL_SUFFIX: &str = "_module";

/// What an invoked tool name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTarget<'a> {
    Summary,
    Retrieval,
    Handler(&'a str),
    Unknown,
}

pub fn handler_tool_name(handler_name: &str) -> String {
    format!("{handler_name}{HANDLER_TOOL_SUFFIX}")
}

pub fn parse_tool_name(name: &str) -> ToolTarget<'_> {
    match name {
        SUMMARY_TOOL => ToolTarget::Summary,
        RETRIEVAL_TOOL => ToolTarget::Retrieval,
        _ => match name.strip_suffix(HANDLER_TOOL_SUFFIX) {
            Some(handler) if !handler.is_empty() => ToolTarget::Handler(handler),
            _ => ToolTarget::Unknown,
        },
    }
}

pub fn summary_tool() -> ToolDeclaration {
    ToolDeclaration {
        name: SUMMARY_TOOL.to_string(),
        description: "Get a summary of everything tracked (meals, workouts, sleep, health markers) \
                      for one date. Use when the user asks for a summary or overview, or what they \
                      did on a particular day."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "date": {
                    "type": "string",
                    "description": "The date to summarize: 'today', 'yesterday', 'N days ago', \
                        or YYYY-MM-DD. Use 'today' when no date is given."
                },
                "confidence": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 1,
                    "description": "Confidence (0-1) that this is a summary request"
                },
                "reasoning": {
                    "type": "string",
                    "description": "Brief explanation"
                }
            },
            "required": ["date"]
        }),
    }
}

pub fn retrieval_tool() -> ToolDeclaration {
    ToolDeclaration {
        name: RETRIEVAL_TOOL.to_string(),
        description: "Answer a question about the user's past records (what they ate, how they \
                      slept, trends over time) by searching their history. Use for questions \
                      about specific past data rather than logging new data."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Self-contained search question"
                },
                "reasoning": {
                    "type": "string",
                    "description": "Brief explanation"
                }
            },
            "required": ["query"]
        }),
    }
}

pub fn handler_tool(descriptor: &HandlerDescriptor) -> ToolDeclaration {
    let mut description = descriptor.description().to_string();
    let sample: Vec<&str> = descriptor
        .keywords()
        .iter()
        .take(5)
        .map(String::as_str)
        .collect();
    if !sample.is_empty() {
        description.push_str(&format!(" Keywords: {}.", sample.join(", ")));
    }

    ToolDeclaration {
        name: handler_tool_name(descriptor.name()),
        description,
        parameters: json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["log", "query"],
                    "description": "'log' to record data, 'query' to answer a question"
                },
                "confidence": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 1,
                    "description": "Confidence (0-1) that this handler should act on the text"
                },
                "reasoning": {
                    "type": "string",
                    "description": "Brief explanation of why this handler was selected"
                }
            },
            "required": ["action", "confidence", "reasoning"]
        }),
    }
}

/// Summary tool first, then the retrieval tool when enabled, then one tool
/// per handler in registration order.
pub fn project_tools(registry: &HandlerRegistry, include_retrieval: bool) -> Vec<ToolDeclaration> {
    let mut tools = Vec::with_capacity(registry.len() + 2);
    tools.push(summary_tool());
    if include_retrieval {
        tools.push(retrieval_tool());
    }
    tools.extend(registry.descriptors().map(handler_tool));
    tools
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

    struct Named(&'static str, Vec<String>);

    #[async_trait]
    impl Handler for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "Tracks things."
        }
        fn keywords(&self) -> &[String] {
            &self.1
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
        let keywords: Vec<String> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        registry.register(Arc::new(Named("nutrition", keywords))).unwrap();
        registry.register(Arc::new(Named("sleep", Vec::new()))).unwrap();
        registry
    }

    #[test]
    fn test_projection_order_and_names() {
        let tools = project_tools(&registry(), true);
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![SUMMARY_TOOL, RETRIEVAL_TOOL, "nutrition_module", "sleep_module"]
        );
    }

    #[test]
    fn test_projection_without_retrieval() {
        let tools = project_tools(&registry(), false);
        assert!(tools.iter().all(|t| t.name != RETRIEVAL_TOOL));
        assert_eq!(tools.len(), 3);
    }

    #[test]
    fn test_handler_tool_schema() {
        let registry = registry();
        let tool = handler_tool(registry.find_by_name("nutrition").unwrap());
        assert_eq!(tool.parameters["properties"]["action"]["enum"], json!(["log", "query"]));
        assert_eq!(tool.parameters["required"], json!(["action", "confidence", "reasoning"]));
        assert!(tool.description.ends_with("Keywords: a, b, c, d, e."));
    }

    #[test]
    fn test_parse_tool_name() {
        assert_eq!(parse_tool_name(SUMMARY_TOOL), ToolTarget::Summary);
        assert_eq!(parse_tool_name(RETRIEVAL_TOOL), ToolTarget::Retrieval);
        assert_eq!(parse_tool_name("sleep_module"), ToolTarget::Handler("sleep"));
        assert_eq!(parse_tool_name("_module"), ToolTarget::Unknown);
        assert_eq!(parse_tool_name("weather"), ToolTarget::Unknown);
    }
}
