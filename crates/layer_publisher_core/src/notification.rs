use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::{Stage, WorkflowState};

pub const NOTIFICATION_SOURCE: &str = "layer-publisher";
pub const FAILURE_DETAIL_TYPE: &str = "LayerPublishFailed";
pub const MAX_NOTIFICATION_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Event detail sent when a pipeline step fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FailureNotification {
    pub identifier: String,
    pub stage: Stage,
    pub state: WorkflowState,
    pub actions_url: String,
    pub failed_at: String,
}

impl FailureNotification {
    pub fn new(identifier: &str, stage: Stage, actions_url: &str, failed_at: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            stage,
            state: WorkflowState::Failed,
            actions_url: actions_url.to_string(),
            failed_at: failed_at.to_string(),
        }
    }

    pub fn detail_json(&self) -> String {
        serde_json::to_string(self).expect("notification detail should serialize")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_NOTIFICATION_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("gave up after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: String,
}

/// Calls `send` until it succeeds or the policy runs out of attempts,
/// waiting `backoff * attempt` between tries. Returns the attempt that
/// succeeded.
pub fn publish_with_retry(
    policy: RetryPolicy,
    mut send: impl FnMut(u32) -> Result<(), String>,
) -> Result<u32, RetryExhausted> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match send(attempt) {
            Ok(()) => return Ok(attempt),
            Err(error) => {
                warn!(attempt, max_attempts, %error, "notification publish failed");
                last_error = error;
            }
        }
        if attempt < max_attempts && !policy.backoff.is_zero() {
            thread::sleep(policy.backoff * attempt);
        }
    }

    Err(RetryExhausted {
        attempts: max_attempts,
        last_error,
    })
}
