use std::fmt;
use thiserror::Error;
use crate::config::CoherenceMode;

/// Errors raised by the caches and the two-level controller. None of these are recoverable within
/// a run: cache state is a deterministic function of the trace prefix, so retrying changes nothing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The geometry can't describe a cache, e.g. zero ways or more index bits than an address has
    #[error("invalid cache geometry: {0}")]
    InvalidGeometry(String),

    /// The inclusion or exclusivity property failed after an access. This is a protocol bug
    #[error("{0}")]
    InvariantViolation(Box<Violation>),

    /// A victim was requested from a set which still has an invalid line
    #[error("no victim available for address {address:#x}: set {set} still has a vacant line")]
    NoVictimAvailable { address: u64, set: u64 },

    /// A way index past the end of the set
    #[error("way {way} is out of range for address {address:#x}: sets have {ways} ways")]
    WayOutOfRange { address: u64, way: usize, ways: usize },
}

/// Details of a coherence failure, including the contents of the two sets involved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub mode: CoherenceMode,
    /// The address of the access after which the check failed
    pub address: u64,
    /// The L1 block which broke the property
    pub block: u64,
    /// Valid block addresses in the L1 set holding `block`
    pub l1_set: Vec<u64>,
    /// Valid block addresses in the L2 set `block` maps to
    pub l2_set: Vec<u64>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let property = match self.mode {
            CoherenceMode::Inclusive => "inclusive property violated: L1 block not found in L2",
            CoherenceMode::Exclusive => "exclusive property violated: L1 block found in L2",
        };
        write!(
            f,
            "{property} (block {:#x}, after access to {:#x}); L1 set: {}; L2 set: {}",
            self.block,
            self.address,
            format_blocks(&self.l1_set),
            format_blocks(&self.l2_set)
        )
    }
}

fn format_blocks(blocks: &[u64]) -> String {
    let inner = blocks
        .iter()
        .map(|b| format!("{b:#x}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{inner}]")
}

/// Errors raised while replaying a trace from a reader
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("couldn't read the trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("couldn't build the trace parser: {0}")]
    Pattern(#[from] regex::Error),
}
