use crate::node::{Node, NodeType};
use crate::types::AgentState;
use anyhow::Result;
use async_trait::async_trait;
use geochat_mcp::ToolExecutor;
use std::sync::Arc;
use std::time::Instant;

/// Runs every tool call requested by the last model message
pub struct ToolNode {
    executor: Arc<dyn ToolExecutor>,
}

impl ToolNode {
    pub fn new(executor: Arc<dyn ToolExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Node for ToolNode {
    async fn execute(&self, state: &mut AgentState) -> Result<()> {
        let tool_calls = state.get_pending_tool_calls();

        for tool_call in tool_calls {
            let start = Instant::now();
            let name = tool_call.function.name.as_str();

            let outcome = match tool_call.arguments_value() {
                Ok(args) => self.executor.execute(name, args).await.map_err(|e| e.to_string()),
                Err(e) => Err(format!("invalid JSON arguments: {}", e)),
            };

            // Failures go back to the model as the tool's result
            let result = match outcome {
                Ok(result) => {
                    tracing::info!(
                        tool = %name,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Tool executed"
                    );
                    result
                }
                Err(e) => {
                    tracing::warn!(tool = %name, error = %e, "Tool execution failed");
                    format!("Tool execution failed: {}", e)
                }
            };

            state.add_tool_result(&tool_call, result);
        }

        Ok(())
    }

    fn node_type(&self) -> NodeType {
        NodeType::Tools
    }
}
