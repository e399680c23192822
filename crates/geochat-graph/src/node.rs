use anyhow::Result;
use async_trait::async_trait;
use crate::types::AgentState;

/// Core abstraction for a unit of computation in the graph
#[async_trait]
pub trait Node: Send + Sync {
    /// Run the node, appending its output messages to `state`
    async fn execute(&self, state: &mut AgentState) -> Result<()>;

    /// Return the type of this node
    fn node_type(&self) -> NodeType;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    CallModel,
    Tools,
}

impl NodeType {
    /// Node name reported in stream updates
    pub fn name(&self) -> &'static str {
        match self {
            NodeType::CallModel => "call_model",
            NodeType::Tools => "tools",
        }
    }
}
