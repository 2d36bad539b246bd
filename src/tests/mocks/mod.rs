//! Test doubles for the generator seam
//!
//! Storage seams use the `mockall` mocks generated next to their traits
//! (`MockGraphStore`, `MockLessonRepository`). The generator gets a hand-written
//! scripted provider instead: tests need to inspect every prompt it received and to
//! answer by inspecting the prompt, which is awkward through expectations.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::llm::{ChatRequest, ChatResponse, LLMError, LLMProvider};

type Responder = dyn Fn(&ChatRequest) -> Result<String, LLMError> + Send + Sync;

enum Script {
    Queue(Mutex<VecDeque<Result<String, LLMError>>>),
    Function(Box<Responder>),
}

/// Provider that answers from a script and records every request.
pub struct ScriptedProvider {
    id: String,
    script: Script,
    delay: Option<Duration>,
    calls: AtomicU32,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    /// Answer with `responses` in order; further calls fail with `InvalidResponse`.
    pub fn with_responses(responses: Vec<Result<String, LLMError>>) -> Self {
        Self::build(Script::Queue(Mutex::new(responses.into())))
    }

    /// Answer every call by running `responder` on the request.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String, LLMError> + Send + Sync + 'static,
    {
        Self::build(Script::Function(Box::new(responder)))
    }

    fn build(script: Script) -> Self {
        Self {
            id: "scripted".to_string(),
            script,
            delay: None,
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(user_prompt)
            .collect()
    }
}

/// Content of the last user message of a request.
pub fn user_prompt(request: &ChatRequest) -> String {
    request
        .messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(&self, request: ChatRequest) -> crate::core::llm::Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LLMError::InvalidResponse("script exhausted".to_string()))),
            Script::Function(responder) => responder(&request),
        }?;

        Ok(ChatResponse {
            content,
            model: "scripted-model".to_string(),
            provider: self.id.clone(),
            usage: None,
            finish_reason: Some("stop".to_string()),
            latency_ms: 0,
        })
    }
}
