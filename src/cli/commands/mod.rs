//! CLI command implementations.
//!
//! Each command lives in its own module with a `run` function.

pub mod config;
pub mod run;
