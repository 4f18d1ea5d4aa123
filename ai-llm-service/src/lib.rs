//! Completion backends behind one non-raising call.
//!
//! - [`config`]: explicit settings, loaded once from the environment
//! - [`conversation`]: turns in, [`CompletionResult`](conversation::CompletionResult) out
//! - [`provider`]: backend selection and dispatch
//! - [`services`]: OpenRouter, Ollama and Bedrock clients

pub mod config;
pub mod conversation;
pub mod error_handler;
pub mod provider;
pub mod services;
pub mod telemetry;

pub use conversation::{CompletionResult, Conversation, Role};
pub use error_handler::{AiLlmError, ConfigError};
pub use provider::{CompletionProvider, select_provider};
