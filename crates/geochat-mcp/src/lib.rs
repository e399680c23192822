pub mod client;
pub mod env;
pub mod error;
pub mod executor;
pub mod map_tool;

pub use client::{MCPClient, ToolInfo, ToolResponse, ToolServerConfig};
pub use env::forwarded_env;
pub use error::McpError;
pub use executor::{LocalTool, MCPToolExecutor, ToolExecutor};
pub use map_tool::CreateMapTool;
