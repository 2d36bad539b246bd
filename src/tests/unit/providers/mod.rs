//! LLM Provider Unit Tests
//!
//! Uses wiremock for HTTP mocking to test:
//! - request formatting
//! - response parsing
//! - rate limit, auth and API error mapping
//! - the registry built from configuration

mod openai_compat_tests;
