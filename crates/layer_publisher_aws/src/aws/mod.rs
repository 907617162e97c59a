//! SDK-backed implementations of the adapter traits.
//!
//! Handlers are synchronous, so every call bridges onto the ambient
//! multi-threaded Tokio runtime with `block_in_place`.

use std::future::Future;

pub mod dynamodb;
pub mod eventbridge;
pub mod lambda;
pub mod s3;
pub mod sts;

pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
