// Model selection: "provider:model" strings mapped to concrete chat clients

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::traits::ChatClient;

pub const DEFAULT_MODEL: &str = "anthropic:claude-3-5-sonnet-latest";

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Name of the setting holding this provider's key
    pub fn api_key_setting(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            other => bail!("Unsupported model provider: {}", other),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed model identifier such as `anthropic:claude-3-5-sonnet-latest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: Provider,
    pub model: String,
}

impl ModelSpec {
    /// Parse `provider:model`. A bare model name is resolved by prefix
    /// (`gpt-*`, `o1*`, `o3*` are OpenAI, `claude-*` is Anthropic).
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            bail!("Model name is empty");
        }

        if let Some((provider, model)) = value.split_once(':') {
            let model = model.trim();
            if model.is_empty() {
                bail!("Model name is missing in '{}'", value);
            }
            return Ok(Self {
                provider: provider.trim().parse()?,
                model: model.to_string(),
            });
        }

        let provider = if value.starts_with("claude") {
            Provider::Anthropic
        } else if value.starts_with("gpt") || value.starts_with("o1") || value.starts_with("o3") {
            Provider::OpenAI
        } else {
            bail!("Cannot infer provider for model '{}', use provider:model", value);
        };

        Ok(Self {
            provider,
            model: value.to_string(),
        })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// API keys available to the factory
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// Override for tests and compatible gateways
    pub base_url: Option<String>,
}

impl ProviderKeys {
    fn key_for(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Anthropic => self.anthropic_api_key.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }
}

/// Factory for creating LLM clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    /// Fail early when the selected provider has no key configured
    pub fn require_api_key(spec: &ModelSpec, keys: &ProviderKeys) -> Result<()> {
        if keys.key_for(spec.provider).is_none() {
            bail!(
                "{} is required for model {}",
                spec.provider.api_key_setting(),
                spec
            );
        }
        Ok(())
    }

    /// Create a chat client for the given model
    pub fn create_chat_client(spec: &ModelSpec, keys: &ProviderKeys) -> Result<Arc<dyn ChatClient>> {
        Self::require_api_key(spec, keys)?;
        let api_key = keys.key_for(spec.provider).unwrap_or_default().to_string();

        let client: Arc<dyn ChatClient> = match (spec.provider, keys.base_url.as_deref()) {
            (Provider::OpenAI, Some(base)) => {
                Arc::new(crate::openai::OpenAIClient::with_base_url(api_key, base)?)
            }
            (Provider::OpenAI, None) => Arc::new(crate::openai::OpenAIClient::new(api_key)?),
            (Provider::Anthropic, Some(base)) => {
                Arc::new(crate::anthropic::AnthropicClient::with_base_url(api_key, base)?)
            }
            (Provider::Anthropic, None) => {
                Arc::new(crate::anthropic::AnthropicClient::new(api_key)?)
            }
        };

        tracing::info!(provider = %spec.provider, model = %spec.model, "Chat client created");
        Ok(client)
    }
}
