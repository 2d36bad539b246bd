//! Property-based tests
//!
//! Invariants checked with proptest:
//!
//! - `extractor_props`: the embedded value is returned exactly; truncated input never
//!   yields a value
//! - `mastery_props`: updated mastery stays in `[0, 1]` for any input
//! - `engine_props`: at most `max_repair + 1` drafts per task
//! - `coordinator_props`: enhancement output length and order equal the input

mod coordinator_props;
mod engine_props;
mod extractor_props;
mod mastery_props;
