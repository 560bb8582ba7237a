//! Port for the external reasoning service.
//!
//! The classifier only depends on this tool/function-calling contract. The
//! concrete HTTP client lives in `infrastructure::claude`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A declarative tool the reasoning service may invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema of the argument object.
    pub parameters: serde_json::Value,
}

/// One tool invocation returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    /// Raw JSON argument text; may be malformed and is validated by the caller.
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningRequest {
    pub system_instruction: String,
    pub user_text: String,
    /// Empty for unconstrained text generation.
    pub tools: Vec<ToolDeclaration>,
    pub max_tokens: Option<u32>,
}

impl ReasoningRequest {
    pub fn new(system_instruction: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            user_text: user_text.into(),
            tools: Vec::new(),
            max_tokens: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }
}

/// Zero or more tool invocations, or free text when none were made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningResponse {
    pub tool_calls: Vec<ToolInvocation>,
    pub content: Option<String>,
}

impl ReasoningResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            tool_calls: Vec::new(),
            content: Some(content.into()),
        }
    }

    pub fn tools(tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            tool_calls,
            content: None,
        }
    }

    /// True when the response carries neither tool calls nor non-blank text.
    pub fn is_empty(&self) -> bool {
        self.tool_calls.is_empty()
            && self
                .content
                .as_deref()
                .map_or(true, |c| c.trim().is_empty())
    }
}

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Reasoning call timed out")]
    Timeout,

    #[error("API error: {0}")]
    Api(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn invoke(&self, request: ReasoningRequest) -> Result<ReasoningResponse, ReasoningError>;
}
