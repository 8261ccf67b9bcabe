mod cache;
mod policies;

use crate::address::Geometry;
use crate::cache::Cache;
use crate::config::CoherenceMode;
use crate::hierarchy::TwoLevelController;
use crate::replacement_policies::GenericPolicy;

pub(crate) fn build_cache(name: &str, set_index_bits: u32, block_offset_bits: u32, ways: usize, policy: impl Into<GenericPolicy>) -> Cache {
    Cache::new(name, Geometry::new(set_index_bits, block_offset_bits, ways).unwrap(), policy.into())
}

/// L1: 2 sets of 1 way, L2: 4 sets of 2 ways, 4-byte blocks
pub(crate) fn small_hierarchy(mode: CoherenceMode, policy: impl Into<GenericPolicy> + Copy) -> TwoLevelController {
    TwoLevelController::new(build_cache("L1", 1, 2, 1, policy), build_cache("L2", 2, 2, 2, policy), mode).unwrap()
}
