//! LLM Provider Implementations

pub mod openai_compat;

pub use openai_compat::OpenAICompatibleProvider;
