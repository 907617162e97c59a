use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_LAYER_INFO_FILE: &str = "layer.json";
pub const DEFAULT_BUILD_CONFIG_FILE: &str = "build_config.json";
pub const DEFAULT_SOURCE_DATA_FILE: &str = "source_data.json";
pub const DEFAULT_INSTALL_SCRIPT_FILE: &str = "install.sh";

/// A layer as stored in the state table and handed to the publish steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayerDefinition {
    pub identifier: String,
    pub packages: Vec<String>,
    #[serde(default)]
    pub ignore_versions: Option<Vec<String>>,
    #[serde(default)]
    pub is_architecture_split: bool,
    #[serde(default)]
    pub note: Option<String>,
}

impl LayerDefinition {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path)
    }

    pub fn ignore_versions(&self) -> &[String] {
        self.ignore_versions.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildConfig {
    pub runtimes: Vec<String>,
}

impl BuildConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path)
    }
}

/// One item of a Lambda `ListLayerVersions` page, keyed the way the API
/// returns it so dumps stay interchangeable with CLI output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct LayerVersionListing {
    pub layer_version_arn: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_date: String,
    #[serde(default)]
    pub compatible_runtimes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_info: Option<String>,
    #[serde(default)]
    pub compatible_architectures: Vec<String>,
}

/// Per-region artifact written by the fetch step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionLayerDump {
    pub region: String,
    pub layers: Vec<LayerVersionListing>,
}

impl RegionLayerDump {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path)
    }
}

/// A published layer version flattened with the fields encoded in its
/// description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayerRecord {
    pub identifier: String,
    pub hash: String,
    pub packages: String,
    #[serde(default)]
    pub note: Option<String>,
    pub runtime: String,
    pub architectures: Vec<String>,
    pub layer_version_arn: String,
    pub created_at: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AllLayers {
    pub all_layers: Vec<LayerRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifiedLayers {
    pub identifier: String,
    pub latest_layers: Vec<LayerRecord>,
    pub all_layers: Vec<LayerRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SourceData {
    pub layers: Vec<ClassifiedLayers>,
}

pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|error| Error::io(path, error))?;
    serde_json::from_str(&text).map_err(|error| Error::json(path, error))
}

pub fn write_json_pretty(path: impl AsRef<Path>, value: &impl Serialize) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(value).map_err(|error| Error::json(path, error))?;
    write_text(path, &text)
}

pub fn write_text(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| Error::io(parent, error))?;
    }
    fs::write(path, text).map_err(|error| Error::io(path, error))
}
