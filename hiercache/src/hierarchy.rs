use std::fmt;
use log::{debug, error};
use crate::cache::{AccessOutcome, Cache};
use crate::config::CoherenceMode;
use crate::error::{CacheError, Violation};
use crate::replacement_policies::{GenericPolicy, ReplacementPolicy};

/// A memory reference kind from the trace
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    Load,
    Store,
    /// A load followed by a store to the same address
    Modify,
}

impl Operation {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'L' => Some(Operation::Load),
            'S' => Some(Operation::Store),
            'M' => Some(Operation::Modify),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Operation::Load => 'L',
            Operation::Store => 'S',
            Operation::Modify => 'M',
        }
    }

    /// How many references the operation makes. A modify is charged as a load then a store
    pub fn references(&self) -> usize {
        match self {
            Operation::Modify => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Everything that happened across both levels for one reference
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    pub l1: AccessOutcome,
    /// Whether L2 held the block. `None` when L1 hit and L2 was never consulted
    pub l2_hit: Option<bool>,
    /// Block installed into L2: the missed block when inclusive, the L1 victim when exclusive
    pub l2_inserted: Option<u64>,
    /// Block evicted from L2 to make room for `l2_inserted`
    pub l2_evicted: Option<u64>,
    /// Block removed from L1 because L2 evicted it (inclusive)
    pub l1_flushed: Option<u64>,
    /// Block removed from L2 because it moved up into L1 (exclusive)
    pub l2_flushed: Option<u64>,
}

impl Transition {
    fn new(l1: AccessOutcome) -> Self {
        Self {
            l1,
            l2_hit: None,
            l2_inserted: None,
            l2_evicted: None,
            l1_flushed: None,
            l2_flushed: None,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.l1 {
            AccessOutcome::Hit => write!(f, "L1 hit")?,
            AccessOutcome::MissNoEvict { inserted } => write!(f, "L1 miss [insert_block: {inserted:#x}]")?,
            AccessOutcome::MissWithEvict { evicted, inserted } => {
                write!(f, "L1 evict [victim_block: {evicted:#x} insert_block: {inserted:#x}]")?
            }
        }
        match self.l2_hit {
            Some(true) => write!(f, " L2 hit")?,
            Some(false) => write!(f, " L2 miss")?,
            None => {}
        }
        match (self.l2_evicted, self.l2_inserted) {
            (Some(victim), Some(insert)) => write!(f, " [victim_block: {victim:#x} insert_block: {insert:#x}]")?,
            (None, Some(insert)) => write!(f, " [insert_block: {insert:#x}]")?,
            _ => {}
        }
        if let Some(block) = self.l2_flushed {
            write!(f, " (moved {block:#x} from L2 to L1)")?;
        }
        if let Some(block) = self.l1_flushed {
            write!(f, " (flushed {block:#x} from L1)")?;
        }
        Ok(())
    }
}

/// The outcome of one trace entry. A modify carries two transitions, the load then the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReport {
    pub operation: Operation,
    pub address: u64,
    pub transitions: Vec<Transition>,
}

impl fmt::Display for AccessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:x}", self.operation, self.address)?;
        for transition in &self.transitions {
            write!(f, " {transition};")?;
        }
        Ok(())
    }
}

/// Drives an L1 and an L2 cache as one hierarchy
///
/// The two caches never refer to each other. Every cross-level effect is an explicit call made
/// here, after which the inclusion or exclusivity property is checked before control returns to
/// the caller
#[derive(Debug)]
pub struct TwoLevelController<R: ReplacementPolicy = GenericPolicy> {
    l1: Cache<R>,
    l2: Cache<R>,
    mode: CoherenceMode,
}

impl<R: ReplacementPolicy> TwoLevelController<R> {
    /// Creates a controller from two caches, which must agree on the block size
    pub fn new(l1: Cache<R>, l2: Cache<R>, mode: CoherenceMode) -> Result<Self, CacheError> {
        let (l1_block, l2_block) = (l1.geometry().block_offset_bits(), l2.geometry().block_offset_bits());
        if l1_block != l2_block {
            return Err(CacheError::InvalidGeometry(format!(
                "L1 and L2 must share a block size, got {l1_block} and {l2_block} block offset bits"
            )));
        }
        Ok(Self { l1, l2, mode })
    }

    pub fn l1(&self) -> &Cache<R> {
        &self.l1
    }

    pub fn l2(&self) -> &Cache<R> {
        &self.l2
    }

    pub fn mode(&self) -> CoherenceMode {
        self.mode
    }

    /// Replays one trace entry against the hierarchy
    ///
    /// # Arguments
    ///
    /// * `operation`: The kind of reference, a modify makes two
    /// * `address`: The referenced address, it needn't be block aligned
    ///
    /// returns: Result<AccessReport, CacheError>
    pub fn access(&mut self, operation: Operation, address: u64) -> Result<AccessReport, CacheError> {
        let mut transitions = Vec::with_capacity(operation.references());
        for _ in 0..operation.references() {
            let transition = match self.mode {
                CoherenceMode::Inclusive => self.access_inclusive(address)?,
                CoherenceMode::Exclusive => self.access_exclusive(address)?,
            };
            self.check_invariant(address)?;
            transitions.push(transition);
        }
        Ok(AccessReport { operation, address, transitions })
    }

    fn access_inclusive(&mut self, address: u64) -> Result<Transition, CacheError> {
        let l1 = self.l1.access(address)?;
        let mut transition = Transition::new(l1);
        if l1.is_hit() {
            return Ok(transition);
        }
        // An L1 victim needs nothing from L2, which holds everything L1 does
        let l2 = self.l2.access(address)?;
        transition.l2_hit = Some(l2.is_hit());
        match l2 {
            AccessOutcome::Hit => {}
            AccessOutcome::MissNoEvict { inserted } => transition.l2_inserted = Some(inserted),
            AccessOutcome::MissWithEvict { evicted, inserted } => {
                transition.l2_inserted = Some(inserted);
                transition.l2_evicted = Some(evicted);
                if self.l1.flush(evicted) {
                    debug!("back-invalidated block {evicted:#x} from {}", self.l1.name());
                    transition.l1_flushed = Some(evicted);
                }
            }
        }
        Ok(transition)
    }

    fn access_exclusive(&mut self, address: u64) -> Result<Transition, CacheError> {
        let l1 = self.l1.access(address)?;
        let mut transition = Transition::new(l1);
        if l1.is_hit() {
            return Ok(transition);
        }
        let l2_hit = self.l2.lookup(address);
        transition.l2_hit = Some(l2_hit);
        if l2_hit {
            // L1 has already taken the block over
            let block = self.l2.geometry().block_address(address);
            self.l2.flush(block);
            transition.l2_flushed = Some(block);
        }
        if let Some(victim) = l1.evicted() {
            // L2 is a victim cache here, whatever it evicts is dropped
            let displaced = self.l2.fill(victim)?;
            debug!("demoted block {victim:#x} from {} to {}", self.l1.name(), self.l2.name());
            transition.l2_inserted = Some(victim);
            transition.l2_evicted = displaced;
        }
        Ok(transition)
    }

    /// Checks the inclusion or exclusivity property over every valid L1 block
    ///
    /// # Arguments
    ///
    /// * `address`: The access the check follows, used only for reporting
    pub fn check_invariant(&self, address: u64) -> Result<(), CacheError> {
        let expect_in_l2 = self.mode == CoherenceMode::Inclusive;
        match self.l1.valid_blocks().find(|block| self.l2.probe(*block) != expect_in_l2) {
            Some(block) => {
                let violation = Violation {
                    mode: self.mode,
                    address,
                    block,
                    l1_set: self.l1.set_blocks(block),
                    l2_set: self.l2.set_blocks(block),
                };
                error!("{violation}");
                Err(CacheError::InvariantViolation(Box::new(violation)))
            }
            None => Ok(()),
        }
    }
}
