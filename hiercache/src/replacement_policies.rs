use crate::cache::Line;
use crate::config::ReplacementPolicyConfig;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// Policies hold no state of their own: the recency and frequency counters live on each line and
/// are maintained by the cache through `on_hit` and `on_install`
pub trait ReplacementPolicy {
    /// Picks the way to evict from a full set
    ///
    /// Only valid lines are candidates. Ties go to the lowest way index
    ///
    /// # Arguments
    ///
    /// * `lines`: The lines of the set, indexed by way
    ///
    /// returns: Option<usize>, `None` only if no line in the set is valid
    fn select_victim(&self, lines: &[Line]) -> Option<usize>;

    /// Updates a line's metadata when it is hit at logical time `tick`
    fn on_hit(&self, line: &mut Line, tick: u64);

    /// Initialises a line's metadata when a block is installed into it at logical time `tick`
    fn on_install(&self, line: &mut Line, tick: u64);
}

/// Least Recently Used replacement policy
///
/// The cache stamps each line with its logical clock on every hit and install, so the victim is
/// simply the valid line with the oldest stamp
#[derive(Debug, Default, Copy, Clone)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn select_victim(&self, lines: &[Line]) -> Option<usize> {
        min_valid_by(lines, |line| line.last_used_tick)
    }

    fn on_hit(&self, line: &mut Line, tick: u64) {
        line.last_used_tick = tick;
    }

    fn on_install(&self, line: &mut Line, tick: u64) {
        line.last_used_tick = tick;
    }
}

/// Least frequently used replacement policy
///
/// A freshly installed line starts at a frequency of 1, each hit adds one
#[derive(Debug, Default, Copy, Clone)]
pub struct LeastFrequentlyUsed;

impl ReplacementPolicy for LeastFrequentlyUsed {
    fn select_victim(&self, lines: &[Line]) -> Option<usize> {
        min_valid_by(lines, |line| line.access_frequency)
    }

    fn on_hit(&self, line: &mut Line, _tick: u64) {
        line.access_frequency += 1;
    }

    fn on_install(&self, line: &mut Line, _tick: u64) {
        line.access_frequency = 1;
    }
}

// Strict less-than keeps the first minimum, which gives lowest-way tie breaking
fn min_valid_by(lines: &[Line], key: impl Fn(&Line) -> u64) -> Option<usize> {
    let mut min_value = u64::MAX;
    let mut min_index = None;
    let mut way = 0;
    while way < lines.len() {
        let line = &lines[way];
        if line.valid && (min_index.is_none() || key(line) < min_value) {
            min_value = key(line);
            min_index = Some(way);
        }
        way += 1;
    }
    min_index
}

/// Enum for the policies provided by the library
///
/// Both levels of a hierarchy share one concrete cache type this way. Explicitly branching on the
/// variants lets the compiler see the concrete policy and inline it, which a trait object would
/// hide on every access
#[derive(Debug, Copy, Clone)]
pub enum GenericPolicy {
    LeastRecentlyUsed(LeastRecentlyUsed),
    LeastFrequentlyUsed(LeastFrequentlyUsed),
}

impl From<LeastRecentlyUsed> for GenericPolicy {
    fn from(value: LeastRecentlyUsed) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<LeastFrequentlyUsed> for GenericPolicy {
    fn from(value: LeastFrequentlyUsed) -> Self {
        Self::LeastFrequentlyUsed(value)
    }
}

impl From<ReplacementPolicyConfig> for GenericPolicy {
    fn from(value: ReplacementPolicyConfig) -> Self {
        match value {
            ReplacementPolicyConfig::LeastRecentlyUsed => LeastRecentlyUsed.into(),
            ReplacementPolicyConfig::LeastFrequentlyUsed => LeastFrequentlyUsed.into(),
        }
    }
}

impl ReplacementPolicy for GenericPolicy {
    fn select_victim(&self, lines: &[Line]) -> Option<usize> {
        match self {
            GenericPolicy::LeastRecentlyUsed(p) => p.select_victim(lines),
            GenericPolicy::LeastFrequentlyUsed(p) => p.select_victim(lines),
        }
    }

    fn on_hit(&self, line: &mut Line, tick: u64) {
        match self {
            GenericPolicy::LeastRecentlyUsed(p) => p.on_hit(line, tick),
            GenericPolicy::LeastFrequentlyUsed(p) => p.on_hit(line, tick),
        }
    }

    fn on_install(&self, line: &mut Line, tick: u64) {
        match self {
            GenericPolicy::LeastRecentlyUsed(p) => p.on_install(line, tick),
            GenericPolicy::LeastFrequentlyUsed(p) => p.on_install(line, tick),
        }
    }
}
