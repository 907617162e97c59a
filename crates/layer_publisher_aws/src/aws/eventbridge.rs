use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use layer_publisher_core::notification::NOTIFICATION_SOURCE;

use crate::adapters::event_publisher::EventPublisher;

use super::block_on;

pub struct EventBridgePublisher {
    client: aws_sdk_eventbridge::Client,
    event_bus_name: String,
}

impl EventBridgePublisher {
    pub fn new(config: &aws_config::SdkConfig, event_bus_name: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_eventbridge::Client::new(config),
            event_bus_name: event_bus_name.into(),
        }
    }
}

impl EventPublisher for EventBridgePublisher {
    fn put_event(&self, detail_type: &str, detail: &str) -> Result<(), String> {
        let entry = PutEventsRequestEntry::builder()
            .event_bus_name(&self.event_bus_name)
            .source(NOTIFICATION_SOURCE)
            .detail_type(detail_type)
            .detail(detail)
            .build();

        let output = block_on(self.client.put_events().entries(entry).send())
            .map_err(|error| format!("failed to put event: {error}"))?;

        if output.failed_entry_count() > 0 {
            let reasons = output
                .entries()
                .iter()
                .filter_map(|entry| entry.error_message())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(format!("event bus rejected entry: {reasons}"));
        }
        Ok(())
    }
}
