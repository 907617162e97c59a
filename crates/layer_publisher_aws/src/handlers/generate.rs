use std::collections::BTreeSet;
use std::path::PathBuf;

use layer_publisher_core::classify::{aggregate, list_dump_files, load_records};
use layer_publisher_core::contract::{write_json_pretty, SourceData};
use layer_publisher_core::state::StateUpdate;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::adapters::state_store::StateStore;

use super::HandlerError;

pub const ALL_LAYERS_FILE: &str = "all_layers.json";
pub const SINGLE_LAYER_FILE: &str = "single_layer.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateConfig {
    /// Root of the downloaded per-region dumps.
    pub layers_dir: PathBuf,
    pub source_data_path: PathBuf,
    /// Where `all_layers.json` and `single_layer.json` are written.
    pub debug_dir: PathBuf,
    pub excluded_arns: BTreeSet<String>,
}

pub fn start_generate(
    store: &impl StateStore,
    identifier: &str,
    timestamp: &str,
) -> Result<Map<String, Value>, HandlerError> {
    let record = store
        .update_state(identifier, &StateUpdate::start_generate(timestamp))
        .map_err(HandlerError::Adapter)?;
    info!(identifier, state = "DEPLOYING", "generate started");
    Ok(record)
}

pub fn aggregate_layers(config: &AggregateConfig) -> Result<SourceData, HandlerError> {
    let files = list_dump_files(&config.layers_dir)?;
    let all_layers = load_records(&files, &config.excluded_arns)?;
    let source_data = aggregate(&all_layers.all_layers)?;

    write_json_pretty(config.debug_dir.join(ALL_LAYERS_FILE), &all_layers)?;
    match all_layers.all_layers.first() {
        Some(first) => write_json_pretty(config.debug_dir.join(SINGLE_LAYER_FILE), first)?,
        None => warn!(
            layers_dir = %config.layers_dir.display(),
            "no publisher layers found in dumps"
        ),
    }
    write_json_pretty(&config.source_data_path, &source_data)?;

    info!(
        dump_files = files.len(),
        layer_versions = all_layers.all_layers.len(),
        identifiers = source_data.layers.len(),
        path = %config.source_data_path.display(),
        "wrote source data"
    );
    Ok(source_data)
}

/// Aggregates the dumps and only then marks generation published, so a
/// failed aggregation leaves the record in DEPLOYING for the failure step.
pub fn complete_generate(
    store: &impl StateStore,
    identifier: &str,
    timestamp: &str,
    config: &AggregateConfig,
) -> Result<Map<String, Value>, HandlerError> {
    aggregate_layers(config)?;
    let record = store
        .update_state(identifier, &StateUpdate::complete_generate(timestamp))
        .map_err(HandlerError::Adapter)?;
    info!(identifier, state = "PUBLISHED", record = %serde_json::Value::Object(record.clone()), "updated item");
    Ok(record)
}
