use std::cmp::Reverse;

use crate::contract::LayerRecord;
use crate::error::{Error, Result};

pub const ARCH_BOTH: &str = "arm64,x86_64";
pub const ARCH_X86_64: &str = "x86_64";
pub const ARCH_ARM64: &str = "arm64";

/// Numeric components of a runtime name, e.g. `python3.13` -> `[3, 13]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RuntimeVersion(Vec<u32>);

impl RuntimeVersion {
    pub fn parse(runtime: &str) -> Result<Self> {
        let version = runtime.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        let components: Vec<u32> = version
            .split('.')
            .map_while(|part| part.parse::<u32>().ok())
            .collect();

        if components.is_empty() {
            return Err(Error::Runtime(runtime.to_string()));
        }
        Ok(Self(components))
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }
}

pub fn architecture_rank(architectures: &[String]) -> u8 {
    let mut sorted: Vec<&str> = architectures.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    match sorted.join(",").as_str() {
        ARCH_BOTH => 0,
        ARCH_X86_64 => 1,
        ARCH_ARM64 => 2,
        _ => 3,
    }
}

/// Display order of layer variants: newest runtime first, then
/// dual-architecture, x86_64, arm64, then region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    runtime: Reverse<RuntimeVersion>,
    architecture_rank: u8,
    region: String,
}

impl SortKey {
    pub fn for_record(record: &LayerRecord) -> Result<Self> {
        Ok(Self {
            runtime: Reverse(RuntimeVersion::parse(&record.runtime)?),
            architecture_rank: architecture_rank(&record.architectures),
            region: record.region.clone(),
        })
    }
}

/// Stable sort of records by [`SortKey`].
pub fn sort_records(records: Vec<LayerRecord>) -> Result<Vec<LayerRecord>> {
    let mut keyed = records
        .into_iter()
        .map(|record| SortKey::for_record(&record).map(|key| (key, record)))
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(keyed.into_iter().map(|(_, record)| record).collect())
}
