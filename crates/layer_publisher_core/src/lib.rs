//! Shared layer publishing domain primitives.
//!
//! This crate owns the deterministic parts of the pipeline: layer models,
//! description hashing, classification and ordering of published versions,
//! template rendering, build plans and state-record updates. It intentionally
//! excludes AWS SDK concerns, which live in `layer_publisher_aws`.

pub mod build_plan;
pub mod classify;
pub mod contract;
pub mod description;
pub mod error;
pub mod naming;
pub mod notification;
pub mod ordering;
pub mod state;
pub mod template;

pub use error::{Error, Result, ValidationError};
