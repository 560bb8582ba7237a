//! Reasoning port backed by the Claude Messages API.

use async_trait::async_trait;

use super::client::{ClaudeClient, ClaudeClientConfig};
use super::errors::ClaudeApiError;
use super::types::{ContentBlock, Message, MessageRequest, MessageResponse, Tool};
use crate::domain::models::Config;
use crate::domain::ports::{
    ReasoningError, ReasoningRequest, ReasoningResponse, ReasoningService, ToolDeclaration,
    ToolInvocation,
};

pub struct ClaudeReasoningService {
    client: ClaudeClient,
    model: String,
    default_max_tokens: u32,
}

impl ClaudeReasoningService {
    pub fn new(client: ClaudeClient, model: impl Into<String>, default_max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            default_max_tokens,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ClaudeApiError> {
        let client = ClaudeClient::new(ClaudeClientConfig::from_config(config)?)?;
        Ok(Self::new(
            client,
            config.reasoning.model.clone(),
            config.reasoning.max_tokens,
        ))
    }

    fn build_request(&self, request: ReasoningRequest) -> MessageRequest {
        let tools = (!request.tools.is_empty())
            .then(|| request.tools.into_iter().map(to_tool).collect());

        MessageRequest {
            model: self.model.clone(),
            messages: vec![Message::user(request.user_text)],
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            system: Some(request.system_instruction).filter(|s| !s.is_empty()),
            tools,
        }
    }
}

fn to_tool(declaration: ToolDeclaration) -> Tool {
    Tool {
        name: declaration.name,
        description: declaration.description,
        input_schema: declaration.parameters,
    }
}

/// Text blocks are joined; tool_use inputs are re-serialized so the caller
/// validates them the same way regardless of provider.
fn to_response(response: MessageResponse) -> ReasoningResponse {
    let mut tool_calls = Vec::new();
    let mut texts = Vec::new();

    for block in response.content {
        match block {
            ContentBlock::Text { text } => texts.push(text),
            ContentBlock::ToolUse { name, input, .. } => {
                tool_calls.push(ToolInvocation::new(name, input.to_string()));
            }
            ContentBlock::Unsupported => {}
        }
    }

    let content = texts.join("\n");
    ReasoningResponse {
        tool_calls,
        content: (!content.trim().is_empty()).then_some(content),
    }
}

#[async_trait]
impl ReasoningService for ClaudeReasoningService {
    async fn invoke(&self, request: ReasoningRequest) -> Result<ReasoningResponse, ReasoningError> {
        let message_request = self.build_request(request);
        let response = self.client.send_message(&message_request).await?;
        Ok(to_response(response))
    }
}
