//! Structured data embedded in a published layer's description.
//!
//! Every layer version carries `key=== value` lines naming its identifier,
//! package list and a content hash. The hash lets the aggregator recognise
//! the same build published to several regions.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_224};

use crate::contract::LayerDefinition;
use crate::error::{Error, Result};

pub const DESCRIPTION_SEPARATOR: &str = "=== ";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescriptionData {
    pub identifier: String,
    pub hash: String,
    pub packages: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DescriptionData {
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("identifier{DESCRIPTION_SEPARATOR}{}", self.identifier),
            format!("hash{DESCRIPTION_SEPARATOR}{}", self.hash),
            format!("packages{DESCRIPTION_SEPARATOR}{}", self.packages),
        ];
        if let Some(note) = self.note.as_deref().filter(|note| !note.is_empty()) {
            lines.push(format!("note{DESCRIPTION_SEPARATOR}{note}"));
        }
        lines
    }
}

pub fn calc_description_data(layer: &LayerDefinition) -> DescriptionData {
    let packages = layer.packages.join(", ");
    let note = layer.note.clone().filter(|note| !note.is_empty());
    let hash = content_hash(&layer.identifier, &packages, note.as_deref());

    DescriptionData {
        identifier: layer.identifier.clone(),
        hash,
        packages,
        note,
    }
}

/// SHA3-224 over the identity fields, encoded exactly as previously
/// published layers were so hashes stay comparable across releases.
pub fn content_hash(identifier: &str, packages: &str, note: Option<&str>) -> String {
    let mut fields = vec![("identifier", identifier), ("packages", packages)];
    if let Some(note) = note {
        fields.push(("note", note));
    }

    let body = fields
        .iter()
        .map(|(key, value)| format!("{}: {}", json_string(key), json_string(value)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut hasher = Sha3_224::new();
    hasher.update(format!("{{{body}}}").as_bytes());
    format!("{:x}", hasher.finalize())
}

fn json_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

pub fn parse_description(arn: &str, text: &str) -> Result<DescriptionData> {
    let mut identifier = None;
    let mut hash = None;
    let mut packages = None;
    let mut note = None;

    for line in text.lines().filter(|line| !line.is_empty()) {
        let Some((key, value)) = line.split_once(DESCRIPTION_SEPARATOR) else {
            return Err(Error::Description {
                arn: arn.to_string(),
                message: format!("line '{line}' is not a key{DESCRIPTION_SEPARATOR}value pair"),
            });
        };
        let value = Some(value.to_string());
        match key {
            "identifier" => identifier = value,
            "hash" => hash = value,
            "packages" => packages = value,
            "note" => note = value,
            _ => {}
        }
    }

    let missing = |field: &str| Error::Description {
        arn: arn.to_string(),
        message: format!("missing '{field}'"),
    };

    Ok(DescriptionData {
        identifier: identifier.ok_or_else(|| missing("identifier"))?,
        hash: hash.ok_or_else(|| missing("hash"))?,
        packages: packages.ok_or_else(|| missing("packages"))?,
        note,
    })
}
