//! Routing decision model.
//!
//! A [`RoutingDecision`] is the single output contract of the intent
//! classifier. Exactly one primary outcome is expected per decision, and
//! callers must read it through [`RoutingDecision::outcome`] so that the
//! priority order is applied in one place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Channel a piece of text arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Continuous ambient transcript feed (action-oriented context).
    Ambient,
    /// Interactive chat surface (questions, commands, refusals).
    Interactive,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ambient => "ambient",
            Self::Interactive => "interactive",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ambient" => Ok(Self::Ambient),
            "interactive" => Ok(Self::Interactive),
            other => Err(format!("Unknown source: {other}")),
        }
    }
}

/// What a handler is asked to do with the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAction {
    /// Record data from the text.
    Log,
    /// Answer a question from the handler's own records.
    Query,
}

impl RouteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "query" => Ok(Self::Query),
            other => Err(format!("Unknown action: {other}")),
        }
    }
}

/// One handler selected by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleCall {
    pub handler_name: String,
    pub action: RouteAction,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub reasoning: String,
}

impl ModuleCall {
    pub fn new(
        handler_name: impl Into<String>,
        action: RouteAction,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            handler_name: handler_name.into(),
            action,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
        }
    }
}

/// Structured result of classifying one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Selected handlers, at most one entry per handler.
    pub module_calls: Vec<ModuleCall>,
    pub is_summary_request: bool,
    pub summary_date: Option<NaiveDate>,
    pub needs_retrieval: bool,
    pub retrieval_query: Option<String>,
    pub direct_answer: Option<String>,
    pub out_of_scope: bool,
    /// Diagnostic set when classification itself failed.
    pub error: Option<String>,
    /// Human-readable explanation, for logs and the CLI.
    pub reasoning: String,
}

/// The primary outcome of a decision, resolved in dispatch priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome<'a> {
    Failed(&'a str),
    Summary(Option<NaiveDate>),
    Retrieval(Option<&'a str>),
    DirectAnswer(&'a str),
    NoAction,
    Dispatch(&'a [ModuleCall]),
}

impl RoutingDecision {
    pub fn out_of_scope(reasoning: impl Into<String>) -> Self {
        Self {
            out_of_scope: true,
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    pub fn summary(date: NaiveDate, reasoning: impl Into<String>) -> Self {
        Self {
            is_summary_request: true,
            summary_date: Some(date),
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    pub fn retrieval(query: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            needs_retrieval: true,
            retrieval_query: Some(query.into()),
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    pub fn direct_answer(answer: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            direct_answer: Some(answer.into()),
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    pub fn modules(module_calls: Vec<ModuleCall>, reasoning: impl Into<String>) -> Self {
        Self {
            module_calls,
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    /// Highest confidence across `module_calls`, or `0.0` when there are none.
    pub fn max_confidence(&self) -> f64 {
        self.module_calls
            .iter()
            .map(|c| c.confidence)
            .fold(0.0, f64::max)
    }

    /// Resolve the primary outcome.
    ///
    /// Order: error, summary, retrieval, direct answer, out-of-scope or
    /// empty calls, handler dispatch.
    pub fn outcome(&self) -> DecisionOutcome<'_> {
        if let Some(error) = self.error.as_deref() {
            return DecisionOutcome::Failed(error);
        }
        if self.is_summary_request {
            return DecisionOutcome::Summary(self.summary_date);
        }
        if self.needs_retrieval {
            return DecisionOutcome::Retrieval(self.retrieval_query.as_deref());
        }
        if let Some(answer) = self.direct_answer.as_deref() {
            return DecisionOutcome::DirectAnswer(answer);
        }
        if self.out_of_scope || self.module_calls.is_empty() {
            return DecisionOutcome::NoAction;
        }
        DecisionOutcome::Dispatch(&self.module_calls)
    }

    /// True when the decision claims at most one primary outcome and never
    /// pairs `out_of_scope` with handler calls.
    pub fn is_consistent(&self) -> bool {
        if self.out_of_scope && !self.module_calls.is_empty() {
            return false;
        }
        let primaries = [
            !self.module_calls.is_empty(),
            self.is_summary_request,
            self.needs_retrieval,
            self.direct_answer.is_some(),
            self.out_of_scope,
        ];
        primaries.iter().filter(|flag| **flag).count() <= 1
    }
}
