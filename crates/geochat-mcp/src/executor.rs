use crate::client::{MCPClient, ToolResponse};
use crate::error::McpError;
use async_trait::async_trait;
use geochat_llm::Tool;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tool provider seen by the agent graph
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tool definitions bound to model requests
    async fn tools(&self) -> Result<Vec<Tool>, McpError>;

    /// Run a tool and return its textual result
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<String, McpError>;
}

/// A tool implemented in-process rather than by a tool server
#[async_trait]
pub trait LocalTool: Send + Sync {
    fn definition(&self) -> Tool;

    async fn call(&self, arguments: Value) -> Result<String, McpError>;
}

/// Tool executor that delegates to MCP servers and local tools.
///
/// MCP servers are consulted in registration order; local tools win
/// over server tools with the same name.
pub struct MCPToolExecutor {
    clients: Arc<RwLock<Vec<Arc<MCPClient>>>>,
    local_tools: Arc<RwLock<Vec<Arc<dyn LocalTool>>>>,
}

impl Default for MCPToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MCPToolExecutor {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(RwLock::new(Vec::new())),
            local_tools: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add an MCP server
    pub async fn add_server(&self, client: MCPClient) {
        tracing::debug!(server = %client.name(), "Registering MCP server");
        self.clients.write().await.push(Arc::new(client));
    }

    pub async fn add_local_tool(&self, tool: impl LocalTool + 'static) {
        self.local_tools.write().await.push(Arc::new(tool));
    }

    async fn find_local(&self, tool_name: &str) -> Option<Arc<dyn LocalTool>> {
        self.local_tools
            .read()
            .await
            .iter()
            .find(|t| t.definition().function.name == tool_name)
            .cloned()
    }

    async fn find_server(&self, tool_name: &str) -> Option<Arc<MCPClient>> {
        self.clients
            .read()
            .await
            .iter()
            .find(|c| c.has_tool(tool_name))
            .cloned()
    }
}

#[async_trait]
impl ToolExecutor for MCPToolExecutor {
    async fn tools(&self) -> Result<Vec<Tool>, McpError> {
        let mut all_tools: Vec<Tool> = Vec::new();

        for tool in self.local_tools.read().await.iter() {
            all_tools.push(tool.definition());
        }
        for client in self.clients.read().await.iter() {
            for tool in client.llm_tools() {
                if all_tools.iter().all(|t| t.function.name != tool.function.name) {
                    all_tools.push(tool);
                }
            }
        }

        Ok(all_tools)
    }

    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<String, McpError> {
        if let Some(tool) = self.find_local(tool_name).await {
            return tool.call(arguments).await;
        }

        match self.find_server(tool_name).await {
            Some(client) => {
                let responses = client.call_tool(tool_name, arguments).await?;
                Ok(ToolResponse::join_responses(&responses))
            }
            None => Err(McpError::UnknownTool(tool_name.to_string())),
        }
    }
}
