use std::ops::Range;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use crate::address::Geometry;
use crate::error::CacheError;
use crate::replacement_policies::{GenericPolicy, ReplacementPolicy};

/// A single way of a set. `tag` is only meaningful while `valid` is set
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Line {
    pub valid: bool,
    pub tag: u64,
    pub last_used_tick: u64,
    pub access_frequency: u64,
}

/// The result of a single cache access
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit,
    /// Missed, and the block went into a vacant way
    MissNoEvict { inserted: u64 },
    /// Missed, and the block replaced `evicted`
    MissWithEvict { evicted: u64, inserted: u64 },
}

impl AccessOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, AccessOutcome::Hit)
    }

    /// The block address pushed out by this access, if any
    pub fn evicted(&self) -> Option<u64> {
        match self {
            AccessOutcome::MissWithEvict { evicted, .. } => Some(*evicted),
            _ => None,
        }
    }
}

/// Running totals for one cache
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// A set-associative cache, parameterised by a replacement policy
///
/// All lines are held in one contiguous vector, set by set, so a set is the slice
/// `set * ways..(set + 1) * ways`. The vector is allocated once and never resized; evicting a
/// block only marks its line invalid
///
/// The cache keeps a logical clock which advances on every access and every fill, this is the
/// recency stamp used by LRU
#[derive(Debug)]
pub struct Cache<R: ReplacementPolicy = GenericPolicy> {
    name: String,
    geometry: Geometry,
    lines: Vec<Line>,
    replacement_policy: R,
    stats: CacheStats,
    tick: u64,
}

impl<R: ReplacementPolicy> Cache<R> {
    pub fn new(name: impl Into<String>, geometry: Geometry, policy: R) -> Self {
        Self {
            name: name.into(),
            lines: vec![Line::default(); geometry.num_sets() * geometry.ways()],
            geometry,
            replacement_policy: policy,
            stats: CacheStats::default(),
            tick: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    fn set_bounds(&self, address: u64) -> Range<usize> {
        let lower = self.geometry.set_index(address) as usize * self.geometry.ways();
        lower..lower + self.geometry.ways()
    }

    /// The lines of the set `address` maps to, indexed by way
    pub fn set(&self, address: u64) -> &[Line] {
        &self.lines[self.set_bounds(address)]
    }

    /// Returns true iff the block holding `address` is present. Touches no counters
    pub fn probe(&self, address: u64) -> bool {
        self.find_way(address).is_some()
    }

    /// Returns the way holding the block for `address`, if present
    pub fn find_way(&self, address: u64) -> Option<usize> {
        let tag = self.geometry.tag(address);
        self.set(address)
            .iter()
            .position(|line| line.valid && line.tag == tag)
    }

    /// Returns true iff the set `address` maps to has an invalid line
    pub fn has_vacancy(&self, address: u64) -> bool {
        self.first_vacant_way(address).is_some()
    }

    fn first_vacant_way(&self, address: u64) -> Option<usize> {
        self.set(address).iter().position(|line| !line.valid)
    }

    /// Asks the replacement policy for a victim in the set `address` maps to
    ///
    /// Calling this on a set with a vacant line is a caller error
    pub fn select_victim_way(&self, address: u64) -> Result<usize, CacheError> {
        let no_victim = || CacheError::NoVictimAvailable {
            address,
            set: self.geometry.set_index(address),
        };
        if self.has_vacancy(address) {
            return Err(no_victim());
        }
        self.replacement_policy
            .select_victim(self.set(address))
            .ok_or_else(no_victim)
    }

    /// The index into `lines` of a way in the set `address` maps to
    fn line_index(&self, address: u64, way: usize) -> Result<usize, CacheError> {
        let ways = self.geometry.ways();
        if way >= ways {
            return Err(CacheError::WayOutOfRange { address, way, ways });
        }
        Ok(self.set_bounds(address).start + way)
    }

    /// Invalidates a way in the set `address` maps to and counts an eviction
    ///
    /// returns: Result<Option<u64>, CacheError>, the block address the line held, or `None` if it
    /// was already invalid
    pub fn evict_way(&mut self, address: u64, way: usize) -> Result<Option<u64>, CacheError> {
        let set = self.geometry.set_index(address);
        let index = self.line_index(address, way)?;
        let line = &mut self.lines[index];
        if !line.valid {
            return Ok(None);
        }
        line.valid = false;
        let evicted = self.geometry.reconstruct(line.tag, set);
        self.stats.evictions += 1;
        debug!("{}: evicted block {evicted:#x} from set {set} way {way}", self.name);
        Ok(Some(evicted))
    }

    /// Installs the block for `address` into a way, which the caller must have emptied
    pub fn install_way(&mut self, address: u64, way: usize) -> Result<(), CacheError> {
        let tag = self.geometry.tag(address);
        let index = self.line_index(address, way)?;
        let line = &mut self.lines[index];
        debug_assert!(!line.valid, "installing over a valid line");
        line.valid = true;
        line.tag = tag;
        self.replacement_policy.on_install(line, self.tick);
        Ok(())
    }

    /// Removes a block if present, without counting an eviction
    ///
    /// Only an exact block address can match, since every stored line reconstructs to an aligned
    /// address
    ///
    /// returns: bool, whether the block was present
    pub fn flush(&mut self, block_address: u64) -> bool {
        if self.geometry.block_address(block_address) != block_address {
            return false;
        }
        match self.find_way(block_address) {
            Some(way) => {
                let index = self.set_bounds(block_address).start + way;
                self.lines[index].valid = false;
                trace!("{}: flushed block {block_address:#x}", self.name);
                true
            }
            None => false,
        }
    }

    /// Looks a reference up, counting a hit or a miss and refreshing the policy on a hit, but never
    /// installing anything
    pub fn lookup(&mut self, address: u64) -> bool {
        self.tick += 1;
        match self.find_way(address) {
            Some(way) => {
                self.stats.hits += 1;
                let index = self.set_bounds(address).start + way;
                self.replacement_policy.on_hit(&mut self.lines[index], self.tick);
                true
            }
            None => {
                self.stats.misses += 1;
                false
            }
        }
    }

    /// A full access: count the hit or miss, and on a miss install the block, evicting a victim if
    /// the set is full
    pub fn access(&mut self, address: u64) -> Result<AccessOutcome, CacheError> {
        let outcome = if self.lookup(address) {
            AccessOutcome::Hit
        } else {
            let inserted = self.geometry.block_address(address);
            match self.allocate(address)? {
                Some(evicted) => AccessOutcome::MissWithEvict { evicted, inserted },
                None => AccessOutcome::MissNoEvict { inserted },
            }
        };
        trace!("{}: {address:#x} -> {outcome:?}", self.name);
        Ok(outcome)
    }

    /// Installs a block handed down from another level without counting a hit or miss. A block
    /// which is already present is left alone
    ///
    /// returns: Result<Option<u64>, CacheError>, the block evicted to make room
    pub fn fill(&mut self, address: u64) -> Result<Option<u64>, CacheError> {
        self.tick += 1;
        if self.probe(address) {
            return Ok(None);
        }
        self.allocate(address)
    }

    fn allocate(&mut self, address: u64) -> Result<Option<u64>, CacheError> {
        let (way, evicted) = match self.first_vacant_way(address) {
            Some(way) => (way, None),
            None => {
                let way = self.select_victim_way(address)?;
                (way, self.evict_way(address, way)?)
            }
        };
        self.install_way(address, way)?;
        Ok(evicted)
    }

    /// Block addresses of the valid lines in the set `address` maps to
    pub fn set_blocks(&self, address: u64) -> Vec<u64> {
        let set = self.geometry.set_index(address);
        self.set(address)
            .iter()
            .filter(|line| line.valid)
            .map(|line| self.geometry.reconstruct(line.tag, set))
            .collect()
    }

    /// Every valid block address in the cache, set by set
    pub fn valid_blocks(&self) -> impl Iterator<Item = u64> + '_ {
        let ways = self.geometry.ways();
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.valid)
            .map(move |(index, line)| self.geometry.reconstruct(line.tag, (index / ways) as u64))
    }

    /// The number of valid lines in the set `address` maps to
    pub fn occupancy(&self, address: u64) -> usize {
        self.set(address).iter().filter(|line| line.valid).count()
    }

    /// Gets the number of invalid cache lines. Useful for analysing cache performance or debugging
    pub fn vacant_line_count(&self) -> usize {
        self.lines.iter().filter(|line| !line.valid).count()
    }
}
