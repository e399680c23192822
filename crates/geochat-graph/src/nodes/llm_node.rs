use crate::node::{Node, NodeType};
use crate::types::{AgentConfig, AgentState};
use anyhow::{Context, Result};
use async_trait::async_trait;
use geochat_llm::{ChatClient, ChatOptions, ChatRequest, Message, Tool, ToolChoice};
use std::sync::Arc;
use std::time::Instant;

/// Calls the model with the thread's messages and the bound tools
pub struct CallModelNode {
    client: Arc<dyn ChatClient>,
    tools: Arc<Vec<Tool>>,
    config: AgentConfig,
}

impl CallModelNode {
    pub fn new(client: Arc<dyn ChatClient>, tools: Arc<Vec<Tool>>, config: AgentConfig) -> Self {
        Self { client, tools, config }
    }

    fn build_request(&self, state: &AgentState) -> ChatRequest {
        let mut options = ChatOptions::new();
        if !self.tools.is_empty() {
            options = options
                .tools(self.tools.as_ref().clone())
                .tool_choice(ToolChoice::auto());
        }
        if let Some(temp) = self.config.temperature {
            options = options.temperature(temp);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            options = options.max_tokens(max_tokens);
        }

        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        if let Some(prompt) = &self.config.system_prompt {
            messages.push(Message::system(prompt.as_str()));
        }
        messages.extend(state.messages.iter().cloned());

        ChatRequest::new(self.config.model.clone(), messages).with_options(options)
    }
}

#[async_trait]
impl Node for CallModelNode {
    async fn execute(&self, state: &mut AgentState) -> Result<()> {
        let request = self.build_request(state);
        let start = Instant::now();

        let response = self
            .client
            .chat(request)
            .await
            .with_context(|| format!("{} model call failed", self.client.provider()))?;

        tracing::info!(
            thread_id = %state.thread_id,
            model = %self.config.model,
            tool_calls = response.tool_calls.as_ref().map(Vec::len).unwrap_or(0),
            duration_ms = start.elapsed().as_millis() as u64,
            "Model responded"
        );

        state.add_message(response.into_message());
        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::CallModel
    }
}
