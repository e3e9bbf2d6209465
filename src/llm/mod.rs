pub mod anthropic;
pub mod auth;
pub mod bedrock;
pub mod factory;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use auth::{auth_provider, AuthConfig, AuthFuture, AuthProvider, FnAuthProvider};
pub use bedrock::BedrockProvider;
pub use factory::{create_provider, settings_for, ProviderKind};
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use provider::{GenerationSettings, LlmProvider};
pub use types::{Message, Role, ToolCall, ToolDefinition, ToolInputSchema};
