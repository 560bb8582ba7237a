//! Request and response types for the Claude Messages API
use serde::{Deserialize, Serialize};

/// Message request to send to Claude API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    /// Model identifier (e.g., "claude-3-5-haiku-20241022")
    pub model: String,

    /// Array of messages in the conversation
    pub messages: Vec<Message>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Tool definitions (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl MessageRequest {
    /// Single user turn with an optional system prompt.
    pub fn user_message(
        model: impl Into<String>,
        text: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(text)],
            max_tokens,
            system: None,
            tools: None,
        }
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: String,

    /// Plain text content
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Content block in a response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Block types this client does not consume (thinking, etc.)
    #[serde(other)]
    Unsupported,
}

/// Tool definition for function calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// JSON schema for tool input
    pub input_schema: serde_json::Value,
}

/// Response from Claude API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Unique message ID
    pub id: String,

    /// Array of content blocks in the response
    pub content: Vec<ContentBlock>,

    /// Model that generated the response
    pub model: String,

    /// Reason for stopping generation
    #[serde(default)]
    pub stop_reason: Option<StopReason>,

    /// Token usage statistics
    #[serde(default)]
    pub usage: Usage,
}

/// Reason why message generation stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    #[serde(other)]
    Other,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Number of input tokens
    pub input_tokens: u32,

    /// Number of output tokens
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_request_serialization() {
        let request = MessageRequest::user_message("claude-3-5-haiku-20241022", "Hello", 100);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-5-haiku-20241022");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello");
        assert!(json.get("tools").is_none());
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_response_with_tool_use_and_unknown_block() {
        let body = json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-haiku-20241022",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Routing."},
                {
                    "type": "tool_use",
                    "id": "tu_1",
                    "name": "workout_module",
                    "input": {"action": "log"}
                }
            ],
            "stop_reason": "tool_use",
            "stop_sequence": null,
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });

        let response: MessageResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.content.len(), 3);
        assert!(matches!(response.content[0], ContentBlock::Unsupported));
        assert!(matches!(
            &response.content[2],
            ContentBlock::ToolUse { name, .. } if name == "workout_module"
        ));
        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
    }
}
