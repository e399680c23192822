use serde::{Deserialize, Serialize};
use serde_json::Value;
use super::content::Content;
use super::tool::ToolCall;
use crate::traits::TokenUsage;

/// Geochat message types (high-level, provider-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt (instructions)
    System {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// User/Human message
    #[serde(rename = "user")]
    Human {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Assistant/AI message
    #[serde(rename = "assistant")]
    AI {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Content>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<TokenUsage>,
    },

    /// Tool result message
    Tool {
        tool_call_id: String,
        content: Content,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

/// One renderable piece of a message payload
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    ToolCall { name: String, args: Value },
    ToolResult(String),
}

impl Message {
    /// Create system message
    pub fn system(content: impl Into<Content>) -> Self {
        Self::System {
            content: content.into(),
            name: None,
        }
    }

    /// Create human message
    pub fn human(content: impl Into<Content>) -> Self {
        Self::Human {
            content: content.into(),
            name: None,
        }
    }

    /// Create AI message with text
    pub fn ai(content: impl Into<Content>) -> Self {
        Self::AI {
            content: Some(content.into()),
            tool_calls: None,
            name: None,
            usage: None,
        }
    }

    /// Create AI message with tool calls
    pub fn ai_with_tools(tool_calls: Vec<ToolCall>) -> Self {
        Self::AI {
            content: None,
            tool_calls: Some(tool_calls),
            name: None,
            usage: None,
        }
    }

    /// Create tool result message
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<Content>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            name: None,
        }
    }

    /// Attach token usage to an AI message; other roles are returned unchanged
    pub fn with_usage(self, token_usage: TokenUsage) -> Self {
        match self {
            Self::AI { content, tool_calls, name, .. } => Self::AI {
                content,
                tool_calls,
                name,
                usage: Some(token_usage),
            },
            other => other,
        }
    }

    /// Get role as string
    pub fn role(&self) -> &str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
            Self::AI { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }

    /// Short type tag used in exports: `system`, `human`, `ai` or `tool`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "human",
            Self::AI { .. } => "ai",
            Self::Tool { .. } => "tool",
        }
    }

    /// Plain text of the message, fragments joined by newlines
    pub fn text(&self) -> String {
        match self {
            Self::System { content, .. }
            | Self::Human { content, .. }
            | Self::Tool { content, .. } => content.joined_text(),
            Self::AI { content, .. } => content
                .as_ref()
                .map(Content::joined_text)
                .unwrap_or_default(),
        }
    }

    pub fn usage(&self) -> Option<&TokenUsage> {
        match self {
            Self::AI { usage, .. } => usage.as_ref(),
            _ => None,
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::AI { tool_calls: Some(calls), .. } => calls,
            _ => &[],
        }
    }

    /// Split the payload into typed blocks.
    ///
    /// Empty text fragments are dropped, so a message with nothing to show
    /// yields an empty vector. Tool call arguments that are not valid JSON
    /// are kept as a JSON string.
    pub fn blocks(&self) -> Vec<ContentBlock> {
        match self {
            Self::System { content, .. } | Self::Human { content, .. } => content
                .texts()
                .into_iter()
                .filter(|t| !t.is_empty())
                .map(|t| ContentBlock::Text(t.to_string()))
                .collect(),
            Self::AI { content, tool_calls, .. } => {
                let mut blocks: Vec<ContentBlock> = content
                    .iter()
                    .flat_map(|c| c.texts())
                    .filter(|t| !t.is_empty())
                    .map(|t| ContentBlock::Text(t.to_string()))
                    .collect();
                for call in tool_calls.iter().flatten() {
                    let args = call
                        .arguments_value()
                        .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
                    blocks.push(ContentBlock::ToolCall {
                        name: call.function.name.clone(),
                        args,
                    });
                }
                blocks
            }
            Self::Tool { content, .. } => {
                let text = content.joined_text();
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![ContentBlock::ToolResult(text)]
                }
            }
        }
    }
}
