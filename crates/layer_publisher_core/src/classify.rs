//! Grouping of published layer versions into the catalog.
//!
//! Records are grouped identifier -> content hash -> variant, where a variant
//! is one runtime/architecture/region combination. The hash group created
//! most recently becomes the identifier's latest set.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::contract::{
    AllLayers, ClassifiedLayers, LayerRecord, LayerVersionListing, RegionLayerDump, SourceData,
};
use crate::description::parse_description;
use crate::error::{Error, Result};
use crate::ordering::sort_records;

pub type VariantMap = IndexMap<String, LayerRecord>;
pub type HashGroups = IndexMap<String, VariantMap>;
pub type ClassifiedMap = IndexMap<String, HashGroups>;

pub fn list_dump_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|error| {
            let path = error.path().unwrap_or(root).to_path_buf();
            Error::io(path, error.into())
        })?;
        let is_json = entry
            .path()
            .extension()
            .is_some_and(|extension| extension == "json");
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

pub fn listing_to_record(listing: &LayerVersionListing, region: &str) -> Result<LayerRecord> {
    let arn = listing.layer_version_arn.as_str();
    let description = parse_description(arn, listing.description.as_deref().unwrap_or_default())?;
    let runtime = listing
        .compatible_runtimes
        .first()
        .ok_or_else(|| Error::Description {
            arn: arn.to_string(),
            message: "no compatible runtime".to_string(),
        })?;

    Ok(LayerRecord {
        identifier: description.identifier,
        hash: description.hash,
        packages: description.packages,
        note: description.note,
        runtime: runtime.clone(),
        architectures: listing.compatible_architectures.clone(),
        layer_version_arn: listing.layer_version_arn.clone(),
        created_at: listing.created_date.clone(),
        region: region.to_string(),
    })
}

/// Loads every dump in order. Excluded ARNs are dropped and versions that
/// were not published by this pipeline are skipped.
pub fn load_records(files: &[PathBuf], excluded_arns: &BTreeSet<String>) -> Result<AllLayers> {
    let mut all_layers = Vec::new();

    for path in files {
        let dump = RegionLayerDump::load(path)?;
        debug!(
            path = %path.display(),
            region = %dump.region,
            listings = dump.layers.len(),
            "loaded region dump"
        );

        for listing in &dump.layers {
            if excluded_arns.contains(&listing.layer_version_arn) {
                debug!(arn = %listing.layer_version_arn, "skipping excluded layer version");
                continue;
            }
            match listing_to_record(listing, &dump.region) {
                Ok(record) => all_layers.push(record),
                Err(Error::Description { arn, message }) => {
                    warn!(%arn, %message, "skipping layer version without publisher metadata");
                }
                Err(error) => return Err(error),
            }
        }
    }

    Ok(AllLayers { all_layers })
}

pub fn variant_key(record: &LayerRecord) -> String {
    format!(
        "{}:{}:{}",
        record.runtime,
        record.architectures.join(", "),
        record.region
    )
}

pub fn classify_layers(records: &[LayerRecord]) -> ClassifiedMap {
    let mut result = ClassifiedMap::new();
    for record in records {
        result
            .entry(record.identifier.clone())
            .or_default()
            .entry(record.hash.clone())
            .or_default()
            .insert(variant_key(record), record.clone());
    }
    result
}

pub fn fix_layers_for_identifier(
    identifier: &str,
    hash_groups: &HashGroups,
) -> Result<ClassifiedLayers> {
    let mut groups: Vec<(&str, &VariantMap)> = hash_groups
        .values()
        .map(|variants| {
            let created_at = variants
                .values()
                .map(|record| record.created_at.as_str())
                .max()
                .unwrap_or_default();
            (created_at, variants)
        })
        .collect();
    groups.sort_by(|(a, _), (b, _)| b.cmp(a));

    let mut latest_layers = Vec::new();
    let mut all_layers = Vec::new();
    for (index, (_, variants)) in groups.into_iter().enumerate() {
        let sorted = sort_records(variants.values().cloned().collect())?;
        if index == 0 {
            latest_layers.clone_from(&sorted);
        }
        all_layers.extend(sorted);
    }

    Ok(ClassifiedLayers {
        identifier: identifier.to_string(),
        latest_layers,
        all_layers,
    })
}

pub fn aggregate(records: &[LayerRecord]) -> Result<SourceData> {
    let layers = classify_layers(records)
        .iter()
        .map(|(identifier, hash_groups)| fix_layers_for_identifier(identifier, hash_groups))
        .collect::<Result<Vec<_>>>()?;
    Ok(SourceData { layers })
}
