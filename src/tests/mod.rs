//! Crate Test Suite
//!
//! - `mocks`: the scripted generator used by inline and suite tests
//! - `common`: fixtures for a small valid lesson
//! - `unit`: component tests that need HTTP or fixture setup
//! - `property`: proptest invariants
//! - `integration`: full compile runs against in-memory stores

pub(crate) mod common;
pub(crate) mod mocks;

mod integration;
mod property;
mod unit;
