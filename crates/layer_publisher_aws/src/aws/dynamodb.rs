use std::collections::HashMap;

use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use layer_publisher_core::state::{StateUpdate, KEY_ATTRIBUTE};
use serde_json::{json, Map, Number, Value};

use crate::adapters::state_store::StateStore;

use super::block_on;

pub struct DynamoStateStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoStateStore {
    pub fn new(config: &aws_config::SdkConfig, table_name: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_dynamodb::Client::new(config),
            table_name: table_name.into(),
        }
    }
}

impl StateStore for DynamoStateStore {
    fn update_state(
        &self,
        identifier: &str,
        update: &StateUpdate,
    ) -> Result<Map<String, Value>, String> {
        let expression = update.expression();
        let names: HashMap<String, String> = expression.names.into_iter().collect();
        let values: HashMap<String, AttributeValue> = expression
            .values
            .into_iter()
            .map(|(placeholder, value)| (placeholder, AttributeValue::S(value)))
            .collect();

        let output = block_on(
            self.client
                .update_item()
                .table_name(&self.table_name)
                .key(KEY_ATTRIBUTE, AttributeValue::S(identifier.to_string()))
                .update_expression(expression.expression)
                .set_expression_attribute_names(Some(names))
                .set_expression_attribute_values(Some(values))
                .return_values(ReturnValue::AllNew)
                .send(),
        )
        .map_err(|error| {
            format!(
                "failed to update state of '{identifier}' in {}: {error}",
                self.table_name
            )
        })?;

        Ok(output
            .attributes()
            .map(attributes_to_json)
            .unwrap_or_default())
    }
}

pub fn attributes_to_json(attributes: &HashMap<String, AttributeValue>) -> Map<String, Value> {
    attributes
        .iter()
        .map(|(name, value)| (name.clone(), attribute_to_json(value)))
        .collect()
}

/// Plain JSON view of an item, as later steps read it back from disk.
pub fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(text) => Value::String(text.clone()),
        AttributeValue::N(number) => number_to_json(number),
        AttributeValue::Bool(flag) => Value::Bool(*flag),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(items.iter().map(attribute_to_json).collect()),
        AttributeValue::M(map) => Value::Object(attributes_to_json(map)),
        AttributeValue::Ss(items) => json!(items),
        AttributeValue::Ns(items) => Value::Array(items.iter().map(|n| number_to_json(n)).collect()),
        AttributeValue::B(blob) => json!({ "type": "binary", "length": blob.as_ref().len() }),
        AttributeValue::Bs(blobs) => json!({ "type": "binary_set", "length": blobs.len() }),
        _ => Value::Null,
    }
}

fn number_to_json(number: &str) -> Value {
    if let Ok(integer) = number.parse::<i64>() {
        return Value::from(integer);
    }
    number
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(number.to_string()))
}
