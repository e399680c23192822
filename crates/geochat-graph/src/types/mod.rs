pub mod config;
pub mod events;
pub mod state;

pub use config::AgentConfig;
pub use events::StreamEvent;
pub use state::AgentState;
