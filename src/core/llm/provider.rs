//! LLM Provider Trait
//!
//! The generator seam. Every provider turns a [`ChatRequest`] into raw text; nothing
//! downstream assumes the text is well-formed.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{ChatRequest, ChatResponse};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout after {0}s")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LLMError>;

// ============================================================================
// Provider Trait
// ============================================================================

/// A generative text service.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Get the provider's unique identifier
    fn id(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;

    /// Send a chat completion request
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}
