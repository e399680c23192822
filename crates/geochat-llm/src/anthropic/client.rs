// Anthropic Messages API client

use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
use crate::types::{Message, ToolCall, ToolChoice};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic client (HTTP direct, no SDK)
pub struct AnthropicClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, ANTHROPIC_API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&api_key).context("Invalid API key format")?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn build_request_body(
        &self,
        model: &str,
        messages: Vec<Message>,
        options: &ChatOptions,
    ) -> Result<Value> {
        let mut system_parts: Vec<String> = Vec::new();
        let mut converted: Vec<Value> = Vec::new();

        for msg in messages {
            match msg {
                Message::System { content, .. } => {
                    system_parts.push(content.joined_text());
                }
                Message::Human { content, .. } => {
                    converted.push(serde_json::json!({
                        "role": "user",
                        "content": content.joined_text(),
                    }));
                }
                Message::AI { content, tool_calls, .. } => {
                    let mut blocks: Vec<Value> = Vec::new();
                    if let Some(content) = content {
                        let text = content.joined_text();
                        if !text.is_empty() {
                            blocks.push(serde_json::json!({"type": "text", "text": text}));
                        }
                    }
                    for call in tool_calls.unwrap_or_default() {
                        let input = call
                            .arguments_value()
                            .unwrap_or_else(|_| Value::Object(Map::new()));
                        blocks.push(serde_json::json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.function.name,
                            "input": input,
                        }));
                    }
                    if !blocks.is_empty() {
                        converted.push(serde_json::json!({
                            "role": "assistant",
                            "content": blocks,
                        }));
                    }
                }
                Message::Tool { tool_call_id, content, .. } => {
                    let block = serde_json::json!({
                        "type": "tool_result",
                        "tool_use_id": tool_call_id,
                        "content": content.joined_text(),
                    });
                    // Parallel tool results must share one user turn
                    match converted.last_mut() {
                        Some(last) if is_tool_result_turn(last) => {
                            if let Some(Value::Array(items)) = last.get_mut("content") {
                                items.push(block);
                            }
                        }
                        _ => converted.push(serde_json::json!({
                            "role": "user",
                            "content": [block],
                        })),
                    }
                }
            }
        }

        let mut obj = Map::new();
        obj.insert("model".to_string(), Value::from(model));
        obj.insert("messages".to_string(), Value::Array(converted));
        obj.insert(
            "max_tokens".to_string(),
            Value::from(options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
        );

        if !system_parts.is_empty() {
            obj.insert("system".to_string(), Value::from(system_parts.join("\n")));
        }
        if let Some(temp) = options.temperature {
            obj.insert("temperature".to_string(), serde_json::json!(temp));
        }

        let tools = options.tools.as_deref().unwrap_or_default();
        let tools_disabled = matches!(options.tool_choice, Some(ToolChoice::None(_)));
        if !tools.is_empty() && !tools_disabled {
            let tool_defs: Vec<Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.function.name,
                        "description": t.function.description.clone().unwrap_or_default(),
                        "input_schema": t.function.parameters,
                    })
                })
                .collect();
            obj.insert("tools".to_string(), Value::Array(tool_defs));

            match &options.tool_choice {
                Some(ToolChoice::Auto(_)) => {
                    obj.insert("tool_choice".to_string(), serde_json::json!({"type": "auto"}));
                }
                Some(ToolChoice::Required(_)) => {
                    obj.insert("tool_choice".to_string(), serde_json::json!({"type": "any"}));
                }
                Some(ToolChoice::Specific { function, .. }) => {
                    obj.insert(
                        "tool_choice".to_string(),
                        serde_json::json!({"type": "tool", "name": function.name}),
                    );
                }
                Some(ToolChoice::None(_)) | None => {}
            }
        }

        Ok(Value::Object(obj))
    }
}

fn is_tool_result_turn(message: &Value) -> bool {
    message.get("role").and_then(Value::as_str) == Some("user")
        && message
            .get("content")
            .and_then(Value::as_array)
            .is_some_and(|items| {
                items
                    .iter()
                    .all(|i| i.get("type").and_then(Value::as_str) == Some("tool_result"))
            })
}

#[async_trait]
impl ChatClient for AnthropicClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = self.build_request_body(&request.model, request.messages, &request.options)?;

        tracing::debug!(model = %request.model, "Anthropic messages request");

        let response = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error ({}): {}", status, error_text);
        }

        let raw: AnthropicResponse = response
            .json()
            .await
            .context("Failed to parse response")?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for block in &raw.content {
            match block.block_type.as_str() {
                "text" => {
                    if let Some(t) = &block.text {
                        text.push_str(t);
                    }
                }
                "tool_use" => {
                    if let (Some(id), Some(name)) = (&block.id, &block.name) {
                        let input = block.input.clone().unwrap_or_else(|| Value::Object(Map::new()));
                        tool_calls.push(ToolCall::new(id.clone(), name.clone(), input.to_string()));
                    }
                }
                _ => {}
            }
        }

        Ok(ChatResponse {
            content: if text.is_empty() { None } else { Some(text) },
            tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
            usage: Some(TokenUsage::new(raw.usage.input_tokens, raw.usage.output_tokens)),
            finish_reason: raw.stop_reason.clone(),
            raw: serde_json::to_value(&raw)?,
        })
    }

    fn provider(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub content: Vec<ContentBlockResponse>,
    pub stop_reason: Option<String>,
    pub usage: AnthropicUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContentBlockResponse {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}
