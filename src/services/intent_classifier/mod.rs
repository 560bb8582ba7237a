//! Scope and intent classifier.
//!
//! `classify` never fails: every failure path degrades into a valid
//! [`RoutingDecision`], either with `error` set or through keyword fallback.
//!
//! Order of evaluation:
//! 1. empty text is out of scope
//! 2. explicit summary phrases resolve locally, with no reasoning call
//! 3. an empty registry is an error decision
//! 4. tool-based classification through the [`ReasoningService`]
//! 5. no tool invoked: scope gate, then direct answer or out of scope
//! 6. confidence gate on handler selections
//! 7. any reasoning failure or timeout: keyword fallback

mod keyword_fallback;
mod prompts;
mod summary_detection;
mod tool_parsing;

pub use keyword_fallback::route_by_keywords;
pub use summary_detection::detect as detect_summary_request;
pub use tool_parsing::apply_confidence_gate;

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::domain::models::{Config, RoutingDecision, Source};
use crate::domain::ports::{ReasoningError, ReasoningRequest, ReasoningResponse, ReasoningService};
use crate::services::date_parser::DateResolver;
use crate::services::handler_registry::HandlerRegistry;
use crate::services::scope_gate::ScopeGate;
use crate::services::tool_projection::project_tools;

/// Tunables for [`IntentClassifier`].
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub dispatch_threshold: f64,
    pub fallback_confidence: f64,
    pub classification_timeout: Duration,
    pub max_tokens: u32,
    pub allow_direct_answers: bool,
    pub direct_answers_for_ambient: bool,
    pub direct_answer_system_prompt: String,
}

impl ClassifierSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dispatch_threshold: config.routing.dispatch_threshold,
            fallback_confidence: config.routing.fallback_confidence,
            classification_timeout: Duration::from_secs(
                config.reasoning.classification_timeout_secs,
            ),
            max_tokens: config.reasoning.max_tokens,
            allow_direct_answers: config.scope.allow_direct_answers,
            direct_answers_for_ambient: config.scope.direct_answers_for_ambient,
            direct_answer_system_prompt: config.scope.direct_answer_system_prompt.clone(),
        }
    }
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Per-call context carried into logs.
#[derive(Debug, Clone, Default)]
pub struct ClassificationContext {
    pub event_id: Option<String>,
}

impl ClassificationContext {
    pub fn for_event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
        }
    }
}

pub struct IntentClassifier {
    reasoning: Arc<dyn ReasoningService>,
    registry: Arc<HandlerRegistry>,
    dates: DateResolver,
    scope_gate: ScopeGate,
    settings: ClassifierSettings,
    retrieval_enabled: bool,
}

impl IntentClassifier {
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        registry: Arc<HandlerRegistry>,
        dates: DateResolver,
        scope_gate: ScopeGate,
        settings: ClassifierSettings,
    ) -> Self {
        Self {
            reasoning,
            registry,
            dates,
            scope_gate,
            settings,
            retrieval_enabled: false,
        }
    }

    /// Declare the retrieval tool to the reasoning service.
    pub fn with_retrieval(mut self, enabled: bool) -> Self {
        self.retrieval_enabled = enabled;
        self
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    #[instrument(skip(self, text, context), fields(source = %source, event_id = ?context.event_id))]
    pub async fn classify(
        &self,
        text: &str,
        source: Source,
        context: &ClassificationContext,
    ) -> RoutingDecision {
        let text = text.trim();
        if text.is_empty() {
            return RoutingDecision::out_of_scope("Empty text");
        }

        if let Some(phrase) = summary_detection::detect(text) {
            let date = self.dates.resolve_or_today(text);
            tracing::debug!(phrase, %date, "Summary request detected");
            return RoutingDecision::summary(
                date,
                format!("Summary request detected for {date}"),
            );
        }

        if self.registry.is_empty() {
            return RoutingDecision::failed(
                "No handlers registered",
                "Nothing to route to",
            );
        }

        let request = ReasoningRequest {
            max_tokens: Some(self.settings.max_tokens),
            ..ReasoningRequest::new(
                prompts::classification_instruction(
                    source,
                    self.settings.dispatch_threshold,
                    self.retrieval_enabled,
                ),
                prompts::classification_user_message(text),
            )
            .with_tools(project_tools(&self.registry, self.retrieval_enabled))
        };

        let response = match self.invoke_with_timeout(request).await {
            Ok(response) if !response.is_empty() => response,
            Ok(_) => return self.fallback(text, "empty response"),
            Err(e) => return self.fallback(text, &e.to_string()),
        };

        if response.tool_calls.is_empty() {
            return self.without_tools(text, source, response.content).await;
        }

        match tool_parsing::interpret(&response.tool_calls, text, &self.registry, &self.dates) {
            Ok(decision) => apply_confidence_gate(decision, self.settings.dispatch_threshold),
            Err(e) => self.fallback(text, &format!("malformed tool arguments: {e}")),
        }
    }

    async fn invoke_with_timeout(
        &self,
        request: ReasoningRequest,
    ) -> Result<ReasoningResponse, ReasoningError> {
        tokio::time::timeout(self.settings.classification_timeout, self.reasoning.invoke(request))
            .await
            .unwrap_or(Err(ReasoningError::Timeout))
    }

    fn fallback(&self, text: &str, cause: &str) -> RoutingDecision {
        tracing::warn!(cause, "Classification failed, falling back to keyword matching");
        route_by_keywords(text, &self.registry, self.settings.fallback_confidence, cause)
    }

    async fn without_tools(
        &self,
        text: &str,
        source: Source,
        content: Option<String>,
    ) -> RoutingDecision {
        let verdict = self.scope_gate.check(text);
        let direct_allowed = self.settings.allow_direct_answers
            && (source == Source::Interactive || self.settings.direct_answers_for_ambient);

        if verdict.in_scope && direct_allowed {
            return self.direct_answer(text, verdict.reasoning).await;
        }

        let reasoning = if verdict.in_scope {
            content
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "No relevant handler for this request".to_string())
        } else {
            verdict.reasoning
        };
        RoutingDecision::out_of_scope(reasoning)
    }

    async fn direct_answer(&self, text: &str, scope_reasoning: String) -> RoutingDecision {
        let request = ReasoningRequest {
            max_tokens: Some(self.settings.max_tokens),
            ..ReasoningRequest::new(
                prompts::direct_answer_instruction(
                    &self.settings.direct_answer_system_prompt,
                    &self.registry.names(),
                ),
                text,
            )
        };

        match self.invoke_with_timeout(request).await {
            Ok(ReasoningResponse {
                content: Some(answer),
                ..
            }) if !answer.trim().is_empty() => RoutingDecision::direct_answer(
                answer.trim(),
                format!("In-scope query: {scope_reasoning}"),
            ),
            Ok(_) => RoutingDecision::failed(
                "Direct answer synthesis returned no content",
                scope_reasoning,
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Direct answer synthesis failed");
                RoutingDecision::failed(
                    format!("Direct answer synthesis failed: {e}"),
                    scope_reasoning,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainResult;
    use crate::domain::models::{ActionResult, RouteAction, ScopeConfig, SummaryResult};
    use crate::domain::ports::{Handler, ToolInvocation};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns scripted responses in order; errors once the script runs out.
    struct ScriptedReasoning {
        responses: Mutex<VecDeque<Result<ReasoningResponse, ReasoningError>>>,
        requests: Mutex<Vec<ReasoningRequest>>,
    }

    impl ScriptedReasoning {
        fn new(responses: Vec<Result<ReasoningResponse, ReasoningError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ReasoningService for ScriptedReasoning {
        async fn invoke(
            &self,
            request: ReasoningRequest,
        ) -> Result<ReasoningResponse, ReasoningError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ReasoningError::Transport("script exhausted".to_string())))
        }
    }

    struct SlowReasoning;

    #[async_trait]
    impl ReasoningService for SlowReasoning {
        async fn invoke(
            &self,
            _request: ReasoningRequest,
        ) -> Result<ReasoningResponse, ReasoningError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ReasoningResponse::text("too late"))
        }
    }

    struct KeywordHandler {
        name: &'static str,
        keywords: Vec<String>,
        patterns: Vec<String>,
    }

    impl KeywordHandler {
        fn new(name: &'static str, keywords: &[&str], patterns: &[&str]) -> Self {
            Self {
                name,
                keywords: keywords.iter().map(|s| (*s).to_string()).collect(),
                patterns: patterns.iter().map(|s| (*s).to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl Handler for KeywordHandler {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            ""
        }
        fn keywords(&self) -> &[String] {
            &self.keywords
        }
        fn question_patterns(&self) -> &[String] {
            &self.patterns
        }
        async fn ingest(&self, _text: &str, _event_id: &str) -> DomainResult<ActionResult> {
            Ok(ActionResult::silent_success(self.name))
        }
        async fn summarize(&self, date: NaiveDate) -> DomainResult<SummaryResult> {
            Ok(SummaryResult {
                handler_name: self.name.to_string(),
                date,
                text: String::new(),
                data: serde_json::Value::Null,
            })
        }
    }

    fn registry() -> Arc<HandlerRegistry> {
        let mut registry = HandlerRegistry::new();
        registry
            .register(Arc::new(KeywordHandler::new(
                "nutrition",
                &["smoothie", "log that"],
                &[r"how much (protein|calories)"],
            )))
            .unwrap();
        registry
            .register(Arc::new(KeywordHandler::new("workout", &["ran", "workout"], &[])))
            .unwrap();
        Arc::new(registry)
    }

    fn classifier(reasoning: Arc<dyn ReasoningService>) -> IntentClassifier {
        classifier_with(reasoning, registry(), ClassifierSettings::default())
    }

    fn classifier_with(
        reasoning: Arc<dyn ReasoningService>,
        registry: Arc<HandlerRegistry>,
        settings: ClassifierSettings,
    ) -> IntentClassifier {
        let dates = DateResolver::from_name("UTC")
            .unwrap()
            .with_fixed_today(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        IntentClassifier::new(
            reasoning,
            registry,
            dates,
            ScopeGate::new(&ScopeConfig::default()),
            settings,
        )
    }

    fn ctx() -> ClassificationContext {
        ClassificationContext::default()
    }

    #[tokio::test]
    async fn test_empty_text_is_out_of_scope_without_call() {
        let reasoning = ScriptedReasoning::new(vec![]);
        let decision = classifier(reasoning.clone())
            .classify("   ", Source::Ambient, &ctx())
            .await;
        assert!(decision.out_of_scope);
        assert_eq!(reasoning.request_count(), 0);
    }

    #[tokio::test]
    async fn test_summary_phrase_skips_reasoning() {
        let reasoning = ScriptedReasoning::new(vec![]);
        let decision = classifier(reasoning.clone())
            .classify("give me a summary for yesterday", Source::Interactive, &ctx())
            .await;
        assert!(decision.is_summary_request);
        assert_eq!(decision.summary_date, NaiveDate::from_ymd_opt(2025, 1, 14));
        assert_eq!(reasoning.request_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_registry_sets_error() {
        let reasoning = ScriptedReasoning::new(vec![]);
        let decision = classifier_with(
            reasoning.clone(),
            Arc::new(HandlerRegistry::new()),
            ClassifierSettings::default(),
        )
        .classify("I had a smoothie", Source::Ambient, &ctx())
        .await;
        assert!(decision.error.is_some());
        assert_eq!(reasoning.request_count(), 0);
    }

    #[tokio::test]
    async fn test_tool_selection_routes_to_handler() {
        let reasoning = ScriptedReasoning::new(vec![Ok(ReasoningResponse::tools(vec![
            ToolInvocation::new(
                "nutrition_module",
                r#"{"action":"log","confidence":0.92,"reasoning":"meal"}"#,
            ),
        ]))]);
        let decision = classifier(reasoning.clone())
            .classify("I had a smoothie. log that.", Source::Ambient, &ctx())
            .await;

        assert!(!decision.out_of_scope);
        assert_eq!(decision.module_calls.len(), 1);
        assert_eq!(decision.module_calls[0].handler_name, "nutrition");
        assert!(decision.module_calls[0].confidence >= 0.7);

        let requests = reasoning.requests.lock().unwrap();
        let names: Vec<_> = requests[0].tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["get_daily_summary", "nutrition_module", "workout_module"]);
    }

    #[tokio::test]
    async fn test_low_confidence_is_out_of_scope() {
        let reasoning = ScriptedReasoning::new(vec![Ok(ReasoningResponse::tools(vec![
            ToolInvocation::new("workout_module", r#"{"action":"log","confidence":0.5}"#),
        ]))]);
        let decision = classifier(reasoning)
            .classify("maybe a walk later", Source::Ambient, &ctx())
            .await;
        assert!(decision.out_of_scope);
        assert!(decision.module_calls.is_empty());
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_keywords() {
        let reasoning = ScriptedReasoning::new(vec![Err(ReasoningError::Transport(
            "connection refused".to_string(),
        ))]);
        let decision = classifier(reasoning)
            .classify("ran 5 miles", Source::Ambient, &ctx())
            .await;

        assert!(!decision.out_of_scope);
        assert_eq!(decision.module_calls.len(), 1);
        let call = &decision.module_calls[0];
        assert_eq!(call.handler_name, "workout");
        assert_eq!(call.action, RouteAction::Log);
        assert!((call.confidence - 0.6).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_fallback_question_is_query() {
        let reasoning = ScriptedReasoning::new(vec![Ok(ReasoningResponse::default())]);
        let decision = classifier(reasoning)
            .classify("how much protein today", Source::Interactive, &ctx())
            .await;
        assert_eq!(decision.module_calls.len(), 1);
        assert_eq!(decision.module_calls[0].action, RouteAction::Query);
    }

    #[tokio::test]
    async fn test_fallback_without_match_is_out_of_scope() {
        let reasoning = ScriptedReasoning::new(vec![Ok(ReasoningResponse::tools(vec![
            ToolInvocation::new("nutrition_module", "{oops"),
        ]))]);
        let decision = classifier(reasoning)
            .classify("the cat sat on the mat", Source::Ambient, &ctx())
            .await;
        assert!(decision.out_of_scope);
        assert!(decision.is_consistent());
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let settings = ClassifierSettings {
            classification_timeout: Duration::from_millis(50),
            ..ClassifierSettings::default()
        };
        let decision = classifier_with(Arc::new(SlowReasoning), registry(), settings)
            .classify("I had a smoothie", Source::Ambient, &ctx())
            .await;
        assert_eq!(decision.module_calls.len(), 1);
        assert!(decision.reasoning.contains("timed out"));
    }

    #[tokio::test]
    async fn test_interactive_no_tool_gets_direct_answer() {
        let reasoning = ScriptedReasoning::new(vec![
            Ok(ReasoningResponse::text("no tool needed")),
            Ok(ReasoningResponse::text("  Aim for eight hours.  ")),
        ]);
        let decision = classifier(reasoning.clone())
            .classify("how should I plan my evenings", Source::Interactive, &ctx())
            .await;

        assert_eq!(decision.direct_answer.as_deref(), Some("Aim for eight hours."));
        let requests = reasoning.requests.lock().unwrap();
        assert!(requests[1].tools.is_empty());
        assert!(requests[1].system_instruction.contains("Available handlers: nutrition, workout"));
    }

    #[tokio::test]
    async fn test_ambient_no_tool_is_out_of_scope_by_default() {
        let reasoning = ScriptedReasoning::new(vec![Ok(ReasoningResponse::text("nothing to log"))]);
        let decision = classifier(reasoning.clone())
            .classify("my neighbour is loud", Source::Ambient, &ctx())
            .await;
        assert!(decision.out_of_scope);
        assert_eq!(decision.reasoning, "nothing to log");
        assert_eq!(reasoning.request_count(), 1);
    }

    #[tokio::test]
    async fn test_deny_list_beats_direct_answer() {
        let reasoning = ScriptedReasoning::new(vec![Ok(ReasoningResponse::text("can't help"))]);
        let decision = classifier(reasoning.clone())
            .classify("what's the weather tomorrow", Source::Interactive, &ctx())
            .await;
        assert!(decision.out_of_scope);
        assert_eq!(reasoning.request_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_synthesis_sets_error() {
        let reasoning = ScriptedReasoning::new(vec![
            Ok(ReasoningResponse::text("no tool")),
            Err(ReasoningError::Api("overloaded".to_string())),
        ]);
        let decision = classifier(reasoning)
            .classify("tips for my routine", Source::Interactive, &ctx())
            .await;
        assert!(decision.error.as_deref().unwrap().contains("overloaded"));
    }
}
