pub mod default_config;
pub mod llm_provider;
pub mod llm_settings;

pub use llm_provider::LlmProvider;
pub use llm_settings::{BedrockSettings, LlmSettings, OllamaSettings, OpenRouterSettings};
