use layer_publisher_core::notification::{
    publish_with_retry, FailureNotification, RetryPolicy, FAILURE_DETAIL_TYPE,
};
use layer_publisher_core::state::{Stage, StateUpdate};
use tracing::{error, info};

use crate::adapters::event_publisher::EventPublisher;
use crate::adapters::state_store::StateStore;

use super::HandlerError;

/// Marks `stage` failed and announces it on the event bus.
///
/// The state write happens first; a notification that still fails after
/// the policy's attempts surfaces as [`HandlerError::Notification`] with the
/// record already in FAILED. Returns the attempt that delivered the event.
pub fn set_failed(
    store: &impl StateStore,
    publisher: &impl EventPublisher,
    identifier: &str,
    stage: Stage,
    timestamp: &str,
    actions_url: &str,
    policy: RetryPolicy,
) -> Result<u32, HandlerError> {
    store
        .update_state(identifier, &StateUpdate::failed(stage, timestamp, actions_url))
        .map_err(HandlerError::Adapter)?;
    info!(identifier, stage = stage.as_str(), state = "FAILED", "updated item");

    let detail = FailureNotification::new(identifier, stage, actions_url, timestamp).detail_json();
    let attempt = publish_with_retry(policy, |_| publisher.put_event(FAILURE_DETAIL_TYPE, &detail))
        .map_err(|exhausted| {
            error!(
                identifier,
                attempts = exhausted.attempts,
                error = %exhausted.last_error,
                "failure notification not delivered"
            );
            exhausted
        })?;

    info!(identifier, attempt, "failure notification delivered");
    Ok(attempt)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use layer_publisher_core::state::{ATTR_GITHUB_ACTIONS_URL, ATTR_STATE_LAYER};
    use serde_json::Value;

    use super::*;
    use crate::handlers::testing::{FailingStateStore, FlakyPublisher, RecordingStateStore};

    const TS: &str = "2025-06-01T09:00:00.000000+09:00";
    const RUN_URL: &str = "https://github.com/o/r/actions/runs/7";

    fn immediate() -> RetryPolicy {
        RetryPolicy {
            backoff: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn marks_stage_failed_and_notifies() {
        let store = RecordingStateStore::new();
        let publisher = FlakyPublisher::new(0);

        let attempt = set_failed(&store, &publisher, "zstd", Stage::Layer, TS, RUN_URL, immediate())
            .expect("set failed should pass");

        assert_eq!(attempt, 1);
        let record = store.record("zstd").expect("record");
        assert_eq!(record[ATTR_STATE_LAYER], "FAILED");
        assert_eq!(record[ATTR_GITHUB_ACTIONS_URL], RUN_URL);

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, FAILURE_DETAIL_TYPE);
        let detail: Value = serde_json::from_str(&events[0].1).expect("detail");
        assert_eq!(detail["stage"], "layer");
        assert_eq!(detail["actionsUrl"], RUN_URL);
    }

    #[test]
    fn retries_transient_publish_errors() {
        let store = RecordingStateStore::new();
        let publisher = FlakyPublisher::new(2);

        let attempt =
            set_failed(&store, &publisher, "zstd", Stage::Generate, TS, RUN_URL, immediate())
                .expect("third attempt should succeed");

        assert_eq!(attempt, 3);
        assert_eq!(publisher.attempts(), 3);
        assert_eq!(publisher.events().len(), 1);
    }

    #[test]
    fn gives_up_after_three_attempts_with_state_already_failed() {
        let store = RecordingStateStore::new();
        let publisher = FlakyPublisher::new(u32::MAX);

        let error = set_failed(&store, &publisher, "zstd", Stage::Generate, TS, RUN_URL, immediate())
            .expect_err("notification should be exhausted");

        assert!(matches!(
            error,
            HandlerError::Notification(ref exhausted) if exhausted.attempts == 3
        ));
        assert_eq!(publisher.attempts(), 3);
        assert_eq!(
            store.record("zstd").expect("record")["stateGenerate"],
            "FAILED"
        );
    }

    #[test]
    fn state_errors_skip_notification() {
        let publisher = FlakyPublisher::new(0);

        set_failed(
            &FailingStateStore,
            &publisher,
            "zstd",
            Stage::Layer,
            TS,
            RUN_URL,
            immediate(),
        )
        .expect_err("state update should fail");

        assert_eq!(publisher.attempts(), 0);
    }
}
