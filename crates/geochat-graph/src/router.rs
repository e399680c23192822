use crate::node::NodeType;
use crate::types::AgentState;

/// Decides which node to execute next based on current state
pub trait Router: Send + Sync {
    fn next(&self, state: &AgentState, current: NodeType) -> NextNode;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextNode {
    CallModel,
    Tools,
    End,
}

/// Tool-calling loop: call_model -> tools (while tool calls are pending) -> call_model -> end
pub struct SimpleRouter;

impl Router for SimpleRouter {
    fn next(&self, state: &AgentState, current: NodeType) -> NextNode {
        match current {
            NodeType::CallModel => {
                if state.has_pending_tool_calls() {
                    NextNode::Tools
                } else {
                    NextNode::End
                }
            }
            NodeType::Tools => NextNode::CallModel,
        }
    }
}
