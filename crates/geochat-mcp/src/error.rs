use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("failed to spawn tool server '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("MCP handshake with '{server}' failed: {message}")]
    Handshake { server: String, message: String },

    #[error("MCP request failed: {0}")]
    Service(#[from] rmcp::ServiceError),

    #[error("Tool '{0}' not found")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool '{tool}' reported an error: {message}")]
    ToolFailed { tool: String, message: String },
}
