use std::fmt;
use std::io::BufRead;
use std::time::{Duration, Instant};
use log::info;
use serde::{Deserialize, Serialize};
use crate::cache::Cache;
use crate::config::{CoherenceMode, HierarchyConfig, ReplacementPolicyConfig};
use crate::error::{CacheError, SimulationError};
use crate::hierarchy::{AccessReport, TwoLevelController};
use crate::io::{TraceEntry, TraceReader};
use crate::replacement_policies::GenericPolicy;

/// The simulator feeds trace entries through a two-level hierarchy, and collects results.
///
/// It supports calling simulate multiple times, and will update the time taken to simulate and the
/// results accordingly
#[derive(Debug)]
pub struct Simulator {
    controller: TwoLevelController,
    result: HierarchyResult,
    simulation_time: Duration,
    entries: u64,
}

/// The result of a simulation. Can be serialised as JSON
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct HierarchyResult {
    /// Blocks which missed the last level and had to be fetched from memory
    pub main_memory_accesses: u64,
    pub caches: Vec<CacheResult>,
}

/// The result for an individual cache. Can be serialised as JSON
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CacheResult {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheResult {
    fn of(cache: &Cache) -> Self {
        let stats = cache.stats();
        Self {
            name: cache.name().to_string(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
        }
    }
}

impl fmt::Display for CacheResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hits:{} misses:{} evictions:{}", self.name, self.hits, self.misses, self.evictions)
    }
}

impl Simulator {

    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A cache configuration, usually resulting from parsing JSON
    /// * `policy`: The replacement policy for both levels
    /// * `mode`: Whether the hierarchy is inclusive or exclusive
    ///
    /// returns: Result<Simulator, CacheError>, failing if either geometry is invalid
    pub fn new(config: &HierarchyConfig, policy: ReplacementPolicyConfig, mode: CoherenceMode) -> Result<Self, CacheError> {
        let (l1_geometry, l2_geometry) = config.geometries()?;
        let policy = GenericPolicy::from(policy);
        let l1 = Cache::new("L1", l1_geometry, policy);
        let l2 = Cache::new("L2", l2_geometry, policy);
        Ok(Self::from_controller(TwoLevelController::new(l1, l2, mode)?))
    }

    /// Creates a simulator using the policy and mode named in the configuration
    pub fn from_config(config: &HierarchyConfig) -> Result<Self, CacheError> {
        Self::new(config, config.policy, config.mode)
    }

    pub fn from_controller(controller: TwoLevelController) -> Self {
        let mut simulator = Self {
            controller,
            result: HierarchyResult {
                main_memory_accesses: 0,
                caches: Vec::new(),
            },
            simulation_time: Duration::new(0, 0),
            entries: 0,
        };
        simulator.update_result();
        simulator
    }

    /// Replays already decoded trace entries
    ///
    /// # Arguments
    ///
    /// * `entries`: The trace entries, in order
    /// * `sink`: Called with each entry and what it did to the hierarchy
    ///
    /// returns: Result<&HierarchyResult, CacheError>
    pub fn replay<I>(&mut self, entries: I, mut sink: impl FnMut(&TraceEntry, &AccessReport)) -> Result<&HierarchyResult, CacheError>
    where
        I: IntoIterator<Item = TraceEntry>,
    {
        let start = self.begin();
        let outcome = entries.into_iter().try_for_each(|entry| -> Result<(), CacheError> {
            let report = self.step(&entry)?;
            sink(&entry, &report);
            Ok(())
        });
        self.finish(start);
        outcome?;
        Ok(&self.result)
    }

    /// Reads and replays a trace. Lines which aren't data references are skipped
    ///
    /// # Arguments
    ///
    /// * `reader`: The trace, one reference per line
    /// * `sink`: Called with each entry and what it did to the hierarchy
    ///
    /// returns: Result<&HierarchyResult, SimulationError>
    pub fn simulate<B: BufRead>(&mut self, reader: B, mut sink: impl FnMut(&TraceEntry, &AccessReport)) -> Result<&HierarchyResult, SimulationError> {
        let mut trace = TraceReader::new(reader)?;
        let start = self.begin();
        let outcome = trace.try_for_each(|entry| -> Result<(), SimulationError> {
            let entry = entry?;
            let report = self.step(&entry)?;
            sink(&entry, &report);
            Ok(())
        });
        self.finish(start);
        outcome?;
        Ok(&self.result)
    }

    fn step(&mut self, entry: &TraceEntry) -> Result<AccessReport, CacheError> {
        self.entries += 1;
        self.controller.access(entry.operation, entry.address)
    }

    fn begin(&self) -> Instant {
        info!(
            "replaying trace through a {} hierarchy (L1: {}, L2: {})",
            self.controller.mode(),
            self.controller.l1().geometry(),
            self.controller.l2().geometry()
        );
        Instant::now()
    }

    fn finish(&mut self, start: Instant) {
        self.simulation_time += start.elapsed();
        self.update_result();
        info!("replayed {} trace entries in {:?}", self.entries, self.simulation_time);
    }

    fn update_result(&mut self) {
        let caches = vec![CacheResult::of(self.controller.l1()), CacheResult::of(self.controller.l2())];
        // Main memory accesses are whatever misses the last cache
        self.result.main_memory_accesses = caches[1].misses;
        self.result.caches = caches;
    }

    pub fn result(&self) -> &HierarchyResult {
        &self.result
    }

    pub fn controller(&self) -> &TwoLevelController {
        &self.controller
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of invalid lines for each cache
    pub fn vacant_line_counts(&self) -> Vec<u64> {
        [self.controller.l1(), self.controller.l2()]
            .iter()
            .map(|cache| cache.vacant_line_count() as u64)
            .collect()
    }
}
