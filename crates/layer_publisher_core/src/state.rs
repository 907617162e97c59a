//! Attribute updates applied to a layer's record in the state table.
//!
//! Each CI step sets a small, fixed group of attributes. [`StateUpdate`]
//! keeps them ordered so the rendered update expression is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
pub const KEY_ATTRIBUTE: &str = "identifier";

pub const ATTR_STATE_LAYER: &str = "stateLayer";
pub const ATTR_STATE_GENERATE: &str = "stateGenerate";
pub const ATTR_UPDATED_AT: &str = "updatedAt";
pub const ATTR_LAST_PUBLISHED_AT: &str = "lastPublishedAt";
pub const ATTR_LAST_GENERATED_AT: &str = "lastGeneratedAt";
pub const ATTR_ACTIONS_PUBLISH_URL: &str = "actionsPublishUrl";
pub const ATTR_GITHUB_ACTIONS_URL: &str = "githubActionsUrl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkflowState {
    Queued,
    Deploying,
    Published,
    Failed,
}

impl WorkflowState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Deploying => "DEPLOYING",
            Self::Published => "PUBLISHED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of the pipeline a state attribute tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Layer,
    Generate,
}

impl Stage {
    pub fn state_attribute(self) -> &'static str {
        match self {
            Self::Layer => ATTR_STATE_LAYER,
            Self::Generate => ATTR_STATE_GENERATE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layer => "layer",
            Self::Generate => "generate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    attributes: Vec<(&'static str, String)>,
}

/// `set #a = :a, ...` with its placeholder maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateExpression {
    pub expression: String,
    pub names: BTreeMap<String, String>,
    pub values: BTreeMap<String, String>,
}

impl StateUpdate {
    pub fn start_publish(timestamp: &str, actions_url: &str) -> Self {
        Self::transition(Stage::Layer, WorkflowState::Deploying, timestamp)
            .with(ATTR_ACTIONS_PUBLISH_URL, actions_url)
    }

    pub fn finish_publish(timestamp: &str) -> Self {
        Self::transition(Stage::Layer, WorkflowState::Published, timestamp)
            .with(ATTR_LAST_PUBLISHED_AT, timestamp)
    }

    pub fn start_generate(timestamp: &str) -> Self {
        Self::transition(Stage::Generate, WorkflowState::Deploying, timestamp)
    }

    pub fn complete_generate(timestamp: &str) -> Self {
        Self::transition(Stage::Generate, WorkflowState::Published, timestamp)
            .with(ATTR_LAST_GENERATED_AT, timestamp)
    }

    pub fn failed(stage: Stage, timestamp: &str, actions_url: &str) -> Self {
        Self::transition(stage, WorkflowState::Failed, timestamp)
            .with(ATTR_GITHUB_ACTIONS_URL, actions_url)
    }

    pub fn transition(stage: Stage, state: WorkflowState, timestamp: &str) -> Self {
        Self {
            attributes: vec![
                (stage.state_attribute(), state.as_str().to_string()),
                (ATTR_UPDATED_AT, timestamp.to_string()),
            ],
        }
    }

    fn with(mut self, name: &'static str, value: &str) -> Self {
        self.attributes.push((name, value.to_string()));
        self
    }

    pub fn attributes(&self) -> &[(&'static str, String)] {
        &self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn expression(&self) -> UpdateExpression {
        let assignments = self
            .attributes
            .iter()
            .map(|(name, _)| format!("#{name} = :{name}"))
            .collect::<Vec<_>>()
            .join(", ");

        UpdateExpression {
            expression: format!("set {assignments}"),
            names: self
                .attributes
                .iter()
                .map(|(name, _)| (format!("#{name}"), name.to_string()))
                .collect(),
            values: self
                .attributes
                .iter()
                .map(|(name, value)| (format!(":{name}"), value.clone()))
                .collect(),
        }
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    name.parse::<Tz>()
        .map_err(|_| ValidationError::new(format!("unknown timezone '{name}'")))
}

/// ISO-8601 with microseconds and a numeric offset, e.g.
/// `2025-06-01T09:00:00.123456+09:00`.
pub fn timestamp_in(timezone: Tz) -> String {
    Utc::now()
        .with_timezone(&timezone)
        .to_rfc3339_opts(SecondsFormat::Micros, false)
}
