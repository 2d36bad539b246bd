//! Provider Registry
//!
//! Maps a request's `model_selector` to a configured provider. Built once at startup
//! and injected; there is no global lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ProviderConfig;

use super::provider::{LLMProvider, Result};
use super::providers::OpenAICompatibleProvider;

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn LLMProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("selectors", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one OpenAI-compatible provider per configured selector.
    ///
    /// A provider whose API-key variable is unset is still registered; the endpoint
    /// rejects the call and the failure is handled like any transport error.
    pub fn from_config(configs: &BTreeMap<String, ProviderConfig>, max_tokens: u32) -> Result<Self> {
        let mut registry = Self::new();
        for (selector, config) in configs {
            let api_key = config
                .api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok());
            if config.api_key_env.is_some() && api_key.is_none() {
                tracing::warn!(selector = %selector, "API key variable for provider is not set");
            }
            let provider = OpenAICompatibleProvider::new(
                selector.clone(),
                api_key,
                config.model.clone(),
                max_tokens,
                config.base_url.clone(),
            )?;
            registry.register(selector.clone(), Arc::new(provider));
        }
        Ok(registry)
    }

    pub fn register(&mut self, selector: impl Into<String>, provider: Arc<dyn LLMProvider>) {
        self.providers.insert(selector.into(), provider);
    }

    pub fn get(&self, selector: &str) -> Option<Arc<dyn LLMProvider>> {
        self.providers.get(selector).cloned()
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.providers.contains_key(selector)
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}
