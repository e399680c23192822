pub mod types;
pub mod traits;
pub mod config;
pub mod openai;
pub mod anthropic;

pub use traits::{
    ChatClient,
    ChatRequest, ChatResponse, ChatOptions,
    TokenUsage,
};

pub use config::{ClientFactory, ModelSpec, Provider, ProviderKeys, DEFAULT_MODEL};
pub use openai::OpenAIClient;
pub use anthropic::AnthropicClient;
pub use types::{Message, Content, ContentBlock, Tool, ToolCall, ToolChoice};
