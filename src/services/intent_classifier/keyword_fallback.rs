//! Keyword routing used when the reasoning service is unavailable.

use crate::domain::models::{ModuleCall, RouteAction, RoutingDecision};
use crate::services::handler_registry::HandlerRegistry;

/// Match every handler's keywords and question patterns against `text`.
///
/// Matched handlers get `confidence` and action `query` when a question
/// pattern matched, else `log`. No match is out of scope. The result is
/// never confidence-gated.
pub fn route_by_keywords(
    text: &str,
    registry: &HandlerRegistry,
    confidence: f64,
    cause: &str,
) -> RoutingDecision {
    let module_calls: Vec<ModuleCall> = registry
        .descriptors()
        .filter_map(|descriptor| {
            let question = descriptor.matches_question(text);
            if !question && !descriptor.matches_keyword(text) {
                return None;
            }
            let action = if question {
                RouteAction::Query
            } else {
                RouteAction::Log
            };
            Some(ModuleCall::new(
                descriptor.name(),
                action,
                confidence,
                "Matched via keyword fallback",
            ))
        })
        .collect();

    if module_calls.is_empty() {
        return RoutingDecision::out_of_scope(format!(
            "Keyword fallback ({cause}): no handler matched"
        ));
    }

    RoutingDecision::modules(
        module_calls,
        format!("Keyword fallback ({cause})"),
    )
}
