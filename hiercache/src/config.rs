use std::fmt;
use std::io::Read;
use clap::ValueEnum;
use serde::Deserialize;
use crate::address::Geometry;
use crate::error::CacheError;

/// A two-level cache configuration. Both levels share the block size
///
/// The counts are read as signed integers so that a negative value is reported as an invalid
/// geometry rather than a JSON type error
#[derive(Debug, Clone, Deserialize)]
pub struct HierarchyConfig {
    #[serde(rename = "L1_setBits", alias = "l1_set_bits")]
    pub l1_set_bits: i64,
    #[serde(rename = "L1_ways", alias = "l1_ways")]
    pub l1_ways: i64,
    #[serde(rename = "blockBits", alias = "block_bits")]
    pub block_bits: i64,
    #[serde(rename = "L2_setBits", alias = "l2_set_bits")]
    pub l2_set_bits: i64,
    #[serde(rename = "L2_ways", alias = "l2_ways")]
    pub l2_ways: i64,
    #[serde(default)]
    pub policy: ReplacementPolicyConfig,
    #[serde(default)]
    pub mode: CoherenceMode,
}

impl HierarchyConfig {
    pub fn from_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    /// Validates the configuration, returning the L1 and L2 geometries
    pub fn geometries(&self) -> Result<(Geometry, Geometry), CacheError> {
        let block_bits = bit_count("blockBits", self.block_bits)?;
        let l1 = Geometry::new(bit_count("L1_setBits", self.l1_set_bits)?, block_bits, way_count("L1_ways", self.l1_ways)?)?;
        let l2 = Geometry::new(bit_count("L2_setBits", self.l2_set_bits)?, block_bits, way_count("L2_ways", self.l2_ways)?)?;
        Ok((l1, l2))
    }
}

fn bit_count(field: &str, value: i64) -> Result<u32, CacheError> {
    u32::try_from(value).map_err(|_| CacheError::InvalidGeometry(format!("{field} must be a non-negative bit count, got {value}")))
}

fn way_count(field: &str, value: i64) -> Result<usize, CacheError> {
    usize::try_from(value)
        .ok()
        .filter(|ways| *ways > 0)
        .ok_or_else(|| CacheError::InvalidGeometry(format!("{field} must be positive, got {value}")))
}

/// The replacement policy used by both levels - lru or lfu. Defaults to lru.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, ValueEnum)]
pub enum ReplacementPolicyConfig {
    #[default]
    #[serde(alias = "lru")]
    #[value(name = "lru")]
    LeastRecentlyUsed,
    #[serde(alias = "lfu")]
    #[value(name = "lfu")]
    LeastFrequentlyUsed,
}

/// How the two levels share blocks - inclusive or exclusive. Defaults to inclusive.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, ValueEnum)]
pub enum CoherenceMode {
    /// Every block in L1 is also in L2
    #[default]
    #[serde(alias = "inclusive")]
    Inclusive,
    /// No block is in both L1 and L2, L2 holds the blocks evicted from L1
    #[serde(alias = "exclusive")]
    Exclusive,
}

impl fmt::Display for CoherenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoherenceMode::Inclusive => write!(f, "inclusive"),
            CoherenceMode::Exclusive => write!(f, "exclusive"),
        }
    }
}
