use rmcp::model::{CallToolRequestParam, RawContent, ResourceContents};
use rmcp::service::RunningService;
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use rmcp::{RoleClient, ServiceExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;

use crate::env::forwarded_process_env;
use crate::error::McpError;

/// How to launch a stdio tool server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    /// Exported to the child as `LOG_LEVEL`
    pub log_level: Option<String>,
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            name: "geocontext".to_string(),
            command: "npx".to_string(),
            args: vec!["-y".to_string(), "@mborne/geocontext".to_string()],
            log_level: None,
        }
    }
}

/// MCP client bound to one tool server process.
///
/// The process is spawned and the handshake done once in [`MCPClient::new_stdio`];
/// the advertised tools are cached for the lifetime of the client.
pub struct MCPClient {
    server_name: String,
    service: RunningService<RoleClient, ()>,
    tools: Vec<ToolInfo>,
}

impl MCPClient {
    /// Spawn the server, perform the MCP handshake and cache its tools
    pub async fn new_stdio(config: ToolServerConfig) -> Result<Self, McpError> {
        let env = forwarded_process_env(config.log_level.as_deref());

        let cmd = Command::new(&config.command).configure(|c| {
            c.args(&config.args);
            c.env_clear();
            c.envs(&env);
            c.stdin(Stdio::piped());
            c.stdout(Stdio::piped());
            c.stderr(Stdio::inherit());
        });

        tracing::info!(
            server = %config.name,
            command = %config.command,
            args = ?config.args,
            "Starting MCP tool server"
        );

        let transport = TokioChildProcess::new(cmd).map_err(|source| McpError::Spawn {
            command: config.command.clone(),
            source,
        })?;

        let service = ().serve(transport).await.map_err(|e| McpError::Handshake {
            server: config.name.clone(),
            message: e.to_string(),
        })?;

        let tools: Vec<ToolInfo> = service
            .list_all_tools()
            .await?
            .into_iter()
            .map(|tool| ToolInfo {
                name: tool.name.to_string(),
                description: tool.description.map(|d| d.to_string()),
                input_schema: Value::Object((*tool.input_schema).clone()),
            })
            .collect();

        tracing::info!(server = %config.name, tool_count = tools.len(), "MCP tools loaded");

        Ok(Self {
            server_name: config.name,
            service,
            tools,
        })
    }

    /// Tools advertised by the server at connection time
    pub fn list_tools(&self) -> &[ToolInfo] {
        &self.tools
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Tools in the format bound to model requests
    pub fn llm_tools(&self) -> Vec<geochat_llm::Tool> {
        self.tools.iter().map(ToolInfo::to_llm_tool).collect()
    }

    /// Call a tool on the MCP server.
    ///
    /// A result flagged `is_error` by the server is returned as
    /// [`McpError::ToolFailed`] carrying the server's message.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Vec<ToolResponse>, McpError> {
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(McpError::InvalidArguments {
                    tool: name.to_string(),
                    message: format!("expected a JSON object, got {}", other),
                })
            }
        };

        tracing::debug!(server = %self.server_name, tool = %name, "Calling MCP tool");

        let result = self
            .service
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments,
            })
            .await?;

        let responses: Vec<ToolResponse> = result
            .content
            .into_iter()
            .filter_map(|content| match content.raw {
                RawContent::Text(text) => Some(ToolResponse::Text { text: text.text }),
                RawContent::Image(image) => Some(ToolResponse::Image {
                    data: image.data,
                    mime_type: image.mime_type,
                }),
                RawContent::Resource(embedded) => Some(match embedded.resource {
                    ResourceContents::TextResourceContents { uri, mime_type, text, .. } => {
                        ToolResponse::Resource { uri, text: Some(text), mime_type }
                    }
                    ResourceContents::BlobResourceContents { uri, mime_type, .. } => {
                        ToolResponse::Resource { uri, text: None, mime_type }
                    }
                }),
                _ => None,
            })
            .collect();

        if result.is_error.unwrap_or(false) {
            return Err(McpError::ToolFailed {
                tool: name.to_string(),
                message: ToolResponse::join_responses(&responses),
            });
        }

        Ok(responses)
    }

    /// Get server name
    pub fn name(&self) -> &str {
        &self.server_name
    }
}

/// Tool information from MCP server
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInfo {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

impl ToolInfo {
    pub fn to_llm_tool(&self) -> geochat_llm::Tool {
        geochat_llm::Tool::new(
            self.name.clone(),
            self.description.clone().unwrap_or_default(),
            self.input_schema.clone(),
        )
    }
}

/// Response from tool execution
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse {
    Text { text: String },
    Image { data: String, mime_type: String },
    Resource { uri: String, text: Option<String>, mime_type: Option<String> },
}

impl fmt::Display for ToolResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { text } => f.write_str(text),
            Self::Image { mime_type, .. } => write!(f, "[Image: {}]", mime_type),
            Self::Resource { uri, text: Some(text), .. } => write!(f, "{}\n{}", uri, text),
            Self::Resource { uri, text: None, .. } => f.write_str(uri),
        }
    }
}

impl ToolResponse {
    /// Convert all responses to a single string
    pub fn join_responses(responses: &[ToolResponse]) -> String {
        responses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_is_geocontext() {
        let config = ToolServerConfig::default();
        assert_eq!(config.name, "geocontext");
        assert_eq!(config.command, "npx");
        assert_eq!(config.args, vec!["-y", "@mborne/geocontext"]);
    }

    #[test]
    fn test_join_responses() {
        let responses = vec![
            ToolResponse::Text { text: "{\"altitude\": 35}".into() },
            ToolResponse::Image { data: "...".into(), mime_type: "image/png".into() },
            ToolResponse::Resource {
                uri: "https://data.geopf.fr/x".into(),
                text: None,
                mime_type: None,
            },
        ];
        assert_eq!(
            ToolResponse::join_responses(&responses),
            "{\"altitude\": 35}\n[Image: image/png]\nhttps://data.geopf.fr/x"
        );
    }

    #[test]
    fn test_tool_info_to_llm_tool() {
        let info = ToolInfo {
            name: "geocode".into(),
            description: None,
            input_schema: serde_json::json!({"type": "object"}),
        };
        let tool = info.to_llm_tool();
        assert_eq!(tool.name(), "geocode");
        assert_eq!(tool.function.parameters["type"], "object");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let config = ToolServerConfig {
            name: "missing".into(),
            command: "/nonexistent/geochat-tool-server".into(),
            args: vec![],
            log_level: None,
        };
        let err = MCPClient::new_stdio(config).await.err().unwrap();
        assert!(matches!(err, McpError::Spawn { .. } | McpError::Handshake { .. }));
    }
}
