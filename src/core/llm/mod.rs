//! LLM Client Module
//!
//! The generator interface used by the generation engine.
//!
//! # Module Structure
//!
//! - `types`: chat messages, requests and responses
//! - `provider`: the `LLMProvider` trait and `LLMError`
//! - `providers`: concrete provider implementations
//! - `registry`: model selector → provider lookup

pub mod provider;
pub mod providers;
pub mod registry;
pub mod types;

pub use provider::{LLMError, LLMProvider, Result};
pub use providers::OpenAICompatibleProvider;
pub use registry::ProviderRegistry;
pub use types::{ChatMessage, ChatRequest, ChatResponse, MessageRole, TokenUsage};
