//! Unit tests that need more setup than an inline test module.

mod providers;
