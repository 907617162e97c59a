use layer_publisher_core::state::StateUpdate;
use serde_json::{Map, Value};

/// Key-value record holding per-layer workflow state.
pub trait StateStore {
    /// Applies `update` to the record keyed by `identifier` and returns the
    /// record as it reads after the update.
    fn update_state(
        &self,
        identifier: &str,
        update: &StateUpdate,
    ) -> Result<Map<String, Value>, String>;
}
