//! In-memory adapters shared by the handler tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use layer_publisher_core::state::{StateUpdate, KEY_ATTRIBUTE};
use serde_json::{Map, Value};

use crate::adapters::account::AccountResolver;
use crate::adapters::artifact_bucket::{ArtifactBucket, BucketCreation};
use crate::adapters::event_publisher::EventPublisher;
use crate::adapters::state_store::StateStore;

/// Keeps one JSON record per identifier and applies updates the way the
/// table does: set attributes, return the whole item.
pub(crate) struct RecordingStateStore {
    records: Mutex<BTreeMap<String, Map<String, Value>>>,
    updates: Mutex<Vec<(String, StateUpdate)>>,
}

impl RecordingStateStore {
    pub(crate) fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_record(identifier: &str, record: Value) -> Self {
        let store = Self::new();
        let Value::Object(mut record) = record else {
            panic!("seed record must be an object");
        };
        record.insert(KEY_ATTRIBUTE.to_string(), Value::from(identifier));
        store
            .records
            .lock()
            .expect("poisoned mutex")
            .insert(identifier.to_string(), record);
        store
    }

    pub(crate) fn updates(&self) -> Vec<(String, StateUpdate)> {
        self.updates.lock().expect("poisoned mutex").clone()
    }

    pub(crate) fn record(&self, identifier: &str) -> Option<Map<String, Value>> {
        self.records
            .lock()
            .expect("poisoned mutex")
            .get(identifier)
            .cloned()
    }
}

impl StateStore for RecordingStateStore {
    fn update_state(
        &self,
        identifier: &str,
        update: &StateUpdate,
    ) -> Result<Map<String, Value>, String> {
        self.updates
            .lock()
            .expect("poisoned mutex")
            .push((identifier.to_string(), update.clone()));

        let mut records = self.records.lock().expect("poisoned mutex");
        let record = records.entry(identifier.to_string()).or_insert_with(|| {
            Map::from_iter([(KEY_ATTRIBUTE.to_string(), Value::from(identifier))])
        });
        for (name, value) in update.attributes() {
            record.insert((*name).to_string(), Value::from(value.as_str()));
        }
        Ok(record.clone())
    }
}

pub(crate) struct FailingStateStore;

impl StateStore for FailingStateStore {
    fn update_state(&self, _: &str, _: &StateUpdate) -> Result<Map<String, Value>, String> {
        Err("ResourceNotFoundException: table missing".to_string())
    }
}

pub(crate) struct FixedAccount(pub(crate) &'static str);

impl AccountResolver for FixedAccount {
    fn account_id(&self) -> Result<String, String> {
        Ok(self.0.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BucketCall {
    Create { bucket: String, region: String },
    Delete { bucket: String },
}

pub(crate) struct RecordingBucket {
    calls: Mutex<Vec<BucketCall>>,
    creation: BucketCreation,
}

impl RecordingBucket {
    pub(crate) fn new(creation: BucketCreation) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            creation,
        }
    }

    pub(crate) fn calls(&self) -> Vec<BucketCall> {
        self.calls.lock().expect("poisoned mutex").clone()
    }
}

impl ArtifactBucket for RecordingBucket {
    fn create_bucket(&self, bucket_name: &str, region: &str) -> Result<BucketCreation, String> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(BucketCall::Create {
                bucket: bucket_name.to_string(),
                region: region.to_string(),
            });
        Ok(self.creation)
    }

    fn delete_bucket(&self, bucket_name: &str) -> Result<usize, String> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(BucketCall::Delete {
                bucket: bucket_name.to_string(),
            });
        Ok(2)
    }
}

/// Fails the first `failures` sends, then accepts.
pub(crate) struct FlakyPublisher {
    failures: u32,
    events: Mutex<Vec<(String, String)>>,
    attempts: Mutex<u32>,
}

impl FlakyPublisher {
    pub(crate) fn new(failures: u32) -> Self {
        Self {
            failures,
            events: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
        }
    }

    pub(crate) fn attempts(&self) -> u32 {
        *self.attempts.lock().expect("poisoned mutex")
    }

    pub(crate) fn events(&self) -> Vec<(String, String)> {
        self.events.lock().expect("poisoned mutex").clone()
    }
}

impl EventPublisher for FlakyPublisher {
    fn put_event(&self, detail_type: &str, detail: &str) -> Result<(), String> {
        let mut attempts = self.attempts.lock().expect("poisoned mutex");
        *attempts += 1;
        if *attempts <= self.failures {
            return Err(format!("ThrottlingException on attempt {attempts}"));
        }
        self.events
            .lock()
            .expect("poisoned mutex")
            .push((detail_type.to_string(), detail.to_string()));
        Ok(())
    }
}
