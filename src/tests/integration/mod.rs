//! Integration tests
//!
//! End-to-end compiles through the real engine, coordinator, resolver and SQLite
//! lesson store; only the generator and the graph store are doubles.

mod compile_pipeline;
