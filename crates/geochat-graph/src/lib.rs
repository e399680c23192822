pub mod agent;
pub mod builder;
pub mod history;
pub mod node;
pub mod nodes;
pub mod router;
pub mod types;

pub use agent::Agent;
pub use builder::AgentBuilder;
pub use history::get_messages;
pub use node::{Node, NodeType};
pub use router::{NextNode, Router, SimpleRouter};
pub use types::{AgentConfig, AgentState, StreamEvent};
