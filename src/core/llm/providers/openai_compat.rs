//! OpenAI-Compatible Provider
//!
//! Speaks the `/chat/completions` protocol, which covers OpenAI itself and the many
//! gateways and local servers that mirror it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::core::llm::provider::{LLMError, LLMProvider, Result};
use crate::core::llm::types::{ChatMessage, ChatRequest, ChatResponse, TokenUsage};

/// Transport-level ceiling; the engine enforces its own, usually shorter, timeout.
const HTTP_TIMEOUT_SECS: u64 = 300;

pub struct OpenAICompatibleProvider {
    id: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    base_url: String,
    client: Client,
}

impl std::fmt::Debug for OpenAICompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAICompatibleProvider")
            .field("id", &self.id)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAICompatibleProvider {
    pub fn new(
        id: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        max_tokens: u32,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            id: id.into(),
            api_key,
            model: model.into(),
            max_tokens,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn build_messages(&self, request: &ChatRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.extend(request.messages.iter().cloned());

        messages
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": self.build_messages(&request),
            "max_tokens": request.max_tokens.unwrap_or(self.max_tokens)
        });
        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        let start = Instant::now();
        let mut req_builder = self.client.post(&url).header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            req_builder = req_builder.bearer_auth(key);
        }

        let resp = req_builder.json(&body).send().await?;
        let status = resp.status();
        let latency = start.elapsed().as_millis() as u64;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(LLMError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LLMError::AuthError("Invalid API key".to_string()));
        }

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let json: serde_json::Value = resp.json().await?;
        let choice = json["choices"].as_array().and_then(|arr| arr.first());

        let content = choice
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or_else(|| LLMError::InvalidResponse("Missing content".to_string()))?
            .to_string();

        let finish_reason = choice
            .and_then(|c| c["finish_reason"].as_str())
            .map(String::from);

        let usage = json["usage"].as_object().map(|u| TokenUsage {
            input_tokens: u["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["completion_tokens"].as_u64().unwrap_or(0) as u32,
        });

        tracing::debug!(
            provider = %self.id,
            model = %self.model,
            latency_ms = latency,
            "chat completion received"
        );

        Ok(ChatResponse {
            content,
            model: json["model"].as_str().unwrap_or(&self.model).to_string(),
            provider: self.id.clone(),
            usage,
            finish_reason,
            latency_ms: latency,
        })
    }
}
