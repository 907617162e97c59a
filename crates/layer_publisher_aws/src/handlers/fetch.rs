use std::path::{Path, PathBuf};

use layer_publisher_core::contract::{write_json_pretty, RegionLayerDump};
use tracing::info;

use crate::adapters::layer_registry::LayerRegistry;

use super::HandlerError;

pub const DEFAULT_DUMP_DIR: &str = "dist/layers";
pub const DUMP_FILE_NAME: &str = "layers.json";

pub fn dump_path(output_dir: &Path, region: &str) -> PathBuf {
    output_dir.join(region).join(DUMP_FILE_NAME)
}

/// Lists every version of every layer in the region and writes the
/// region's dump artifact. Returns where it was written.
pub fn fetch_layers(
    registry: &impl LayerRegistry,
    region: &str,
    output_dir: &Path,
) -> Result<(PathBuf, RegionLayerDump), HandlerError> {
    let layer_names = registry
        .list_layer_names()
        .map_err(HandlerError::Adapter)?;

    let mut layers = Vec::new();
    for layer_name in &layer_names {
        let versions = registry
            .list_layer_versions(layer_name)
            .map_err(HandlerError::Adapter)?;
        layers.extend(versions);
    }

    let dump = RegionLayerDump {
        region: region.to_string(),
        layers,
    };
    let path = dump_path(output_dir, region);
    write_json_pretty(&path, &dump)?;

    info!(
        region,
        layer_names = layer_names.len(),
        layer_versions = dump.layers.len(),
        path = %path.display(),
        "wrote region layer dump"
    );
    Ok((path, dump))
}
