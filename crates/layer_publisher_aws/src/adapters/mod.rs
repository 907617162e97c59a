pub mod account;
pub mod artifact_bucket;
pub mod event_publisher;
pub mod layer_registry;
pub mod state_store;
