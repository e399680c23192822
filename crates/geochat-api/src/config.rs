use config::{Config as ConfigLoader, ConfigError, Environment, File};
use geochat_llm::{ModelSpec, ProviderKeys, DEFAULT_MODEL};
use geochat_mcp::ToolServerConfig;
use geochat_persist::{BackendSettings, PoolSettings};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Process settings.
///
/// Keys are flat so that each one maps to a single environment variable
/// (`MODEL_NAME`, `REDIS_ENABLED`, `SERVER_PORT`...).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Model
    pub model_name: String,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    pub max_iterations: usize,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub llm_base_url: Option<String>,

    // Checkpoint backend
    pub db_uri: Option<String>,
    pub redis_enabled: bool,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: u32,
    pub redis_password: Option<String>,
    pub postgres_enabled: bool,
    pub postgres_host: String,
    pub postgres_port: u16,
    pub postgres_user: String,
    pub postgres_password: String,
    pub postgres_db: String,
    pub postgres_pool_size: u32,
    pub postgres_acquire_timeout_ms: u64,

    // HTTP
    pub server_host: String,
    pub server_port: u16,
    pub chat_path: String,
    pub view_path: String,
    pub front_dir: String,
    /// Comma separated; `*` allows any origin, empty disables CORS headers
    pub cors_origins: String,
    pub request_timeout_secs: u64,

    // Logging
    pub log_level: String,
    pub log_format: String,

    // Tool server
    pub mcp_enabled: bool,
    pub mcp_command: String,
    /// Whitespace separated
    pub mcp_args: String,
    pub geocontext_log_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let backend = BackendSettings::default();
        let pool = PoolSettings::default();
        let tool_server = ToolServerConfig::default();

        Self {
            model_name: DEFAULT_MODEL.to_string(),
            temperature: None,
            system_prompt: None,
            max_iterations: 25,
            anthropic_api_key: None,
            openai_api_key: None,
            llm_base_url: None,

            db_uri: backend.db_uri,
            redis_enabled: backend.redis_enabled,
            redis_host: backend.redis_host,
            redis_port: backend.redis_port,
            redis_db: backend.redis_db,
            redis_password: backend.redis_password,
            postgres_enabled: backend.postgres_enabled,
            postgres_host: backend.postgres_host,
            postgres_port: backend.postgres_port,
            postgres_user: backend.postgres_user,
            postgres_password: backend.postgres_password,
            postgres_db: backend.postgres_db,
            postgres_pool_size: pool.max_connections,
            postgres_acquire_timeout_ms: pool.acquire_timeout.as_millis() as u64,

            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            chat_path: "/".to_string(),
            view_path: "/view".to_string(),
            front_dir: "front/dist".to_string(),
            cors_origins: "*".to_string(),
            request_timeout_secs: 300,

            log_level: "info".to_string(),
            log_format: "pretty".to_string(),

            mcp_enabled: true,
            mcp_command: tool_server.command,
            mcp_args: tool_server.args.join(" "),
            geocontext_log_level: None,
        }
    }
}

impl Settings {
    /// Load settings from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables, matched case-insensitively on the field name
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Load settings from a specific file (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    pub fn model_spec(&self) -> anyhow::Result<ModelSpec> {
        ModelSpec::parse(&self.model_name)
    }

    pub fn provider_keys(&self) -> ProviderKeys {
        ProviderKeys {
            openai_api_key: self.openai_api_key.clone(),
            anthropic_api_key: self.anthropic_api_key.clone(),
            base_url: self.llm_base_url.clone().filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            db_uri: self.db_uri.clone(),
            redis_enabled: self.redis_enabled,
            redis_host: self.redis_host.clone(),
            redis_port: self.redis_port,
            redis_db: self.redis_db,
            redis_password: self.redis_password.clone(),
            postgres_enabled: self.postgres_enabled,
            postgres_host: self.postgres_host.clone(),
            postgres_port: self.postgres_port,
            postgres_user: self.postgres_user.clone(),
            postgres_password: self.postgres_password.clone(),
            postgres_db: self.postgres_db.clone(),
        }
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.postgres_pool_size.max(1),
            acquire_timeout: Duration::from_millis(self.postgres_acquire_timeout_ms),
        }
    }

    pub fn tool_server(&self) -> ToolServerConfig {
        ToolServerConfig {
            name: "geocontext".to_string(),
            command: self.mcp_command.clone(),
            args: self.mcp_args.split_whitespace().map(str::to_string).collect(),
            log_level: self.geocontext_log_level.clone(),
        }
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Chat mount point without its trailing slash, `""` for the root
    pub fn chat_base(&self) -> String {
        normalize_base(&self.chat_path)
    }

    pub fn view_base(&self) -> String {
        normalize_base(&self.view_path)
    }
}

fn normalize_base(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geochat_llm::Provider;
    use geochat_persist::BackendKind;

    #[test]
    fn test_settings_structure() {
        let toml = r#"
            model_name = "openai:gpt-4o-mini"
            temperature = 0.2
            redis_enabled = true
            redis_host = "cache"
            redis_db = 2
            server_port = 9000
            chat_path = "/chat/"
            cors_origins = "http://localhost:3000, http://localhost:5173"
            mcp_args = "-y  @mborne/geocontext"
            log_format = "json"
        "#;

        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.server_port, 9000);
        assert_eq!(settings.temperature, Some(0.2));
        assert_eq!(settings.model_spec().unwrap().provider, Provider::OpenAI);
        assert_eq!(settings.chat_base(), "/chat");
        assert_eq!(settings.cors_origin_list().len(), 2);
        assert_eq!(settings.tool_server().args, vec!["-y", "@mborne/geocontext"]);
        assert_eq!(
            BackendKind::select(&settings.backend_settings()).unwrap(),
            BackendKind::Redis("redis://cache:6379/2".to_string())
        );

        // untouched keys keep their defaults
        assert_eq!(settings.view_base(), "/view");
        assert_eq!(settings.postgres_db, "geochat");
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.model_name, DEFAULT_MODEL);
        assert_eq!(settings.chat_base(), "");
        assert_eq!(settings.bind_addr(), "0.0.0.0:8000");
        assert_eq!(settings.pool_settings(), PoolSettings::default());
        assert_eq!(
            BackendKind::select(&settings.backend_settings()).unwrap(),
            BackendKind::Memory
        );
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("/"), "");
        assert_eq!(normalize_base("chat"), "/chat");
        assert_eq!(normalize_base("/a/b/"), "/a/b");
    }
}
