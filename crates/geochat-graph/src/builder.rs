use std::sync::Arc;
use anyhow::{anyhow, Context, Result};

use geochat_llm::ChatClient;
use geochat_mcp::ToolExecutor;
use geochat_persist::Checkpointer;
use crate::types::AgentConfig;

use crate::agent::Agent;

/// Builder for constructing an [`Agent`]
pub struct AgentBuilder {
    chat_client: Option<Arc<dyn ChatClient>>,
    tools: Option<Arc<dyn ToolExecutor>>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            chat_client: None,
            tools: None,
            checkpointer: None,
            config: AgentConfig::default(),
        }
    }

    /// Set the chat client
    pub fn chat_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.chat_client = Some(client);
        self
    }

    /// Set the tool executor
    pub fn tools(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.tools = Some(executor);
        self
    }

    /// Set the checkpoint store threads are read from and written to
    pub fn checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the agent; tool definitions are fetched here, once
    pub async fn build(self) -> Result<Agent> {
        let chat_client = self.chat_client
            .ok_or_else(|| anyhow!("Chat client is required"))?;
        let executor = self.tools
            .ok_or_else(|| anyhow!("Tool executor is required"))?;
        let checkpointer = self.checkpointer
            .ok_or_else(|| anyhow!("Checkpointer is required"))?;

        let tools = executor.tools().await.context("Failed to list tools")?;
        tracing::info!(
            provider = chat_client.provider(),
            model = %self.config.model,
            tool_count = tools.len(),
            "Agent built"
        );

        Ok(Agent::new(chat_client, executor, checkpointer, tools, self.config))
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
