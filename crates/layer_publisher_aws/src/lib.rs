//! AWS-oriented adapters and step handlers for the layer publishing pipeline.
//!
//! This crate owns runtime integration details (state table, layer registry,
//! deployment bucket and event bus adapters), the per-step handlers invoked
//! from CI, and the command-line surface. Deterministic logic lives in
//! `layer_publisher_core`.

pub mod adapters;
pub mod aws;
pub mod cli;
pub mod handlers;
