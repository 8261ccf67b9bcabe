use std::fmt;
use std::mem::size_of;
use crate::cache::Line;
use crate::error::CacheError;

/// The shape of a cache: how many sets it has, how large a block is, and how many ways each set
/// holds. Also decodes addresses for that shape.
///
/// The masks are computed once on construction, the decoding functions are then a shift and a mask
/// each. Every decoding function is total over the 64-bit address space, including the degenerate
/// case where both bit counts are zero
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Geometry {
    set_index_bits: u32,
    block_offset_bits: u32,
    ways: usize,
    block_alignment_bit_mask: u64,
    set_selection_bit_mask: u64,
}

impl Geometry {
    /// Creates a geometry, rejecting shapes which can't exist
    ///
    /// # Arguments
    ///
    /// * `set_index_bits`: log2 of the number of sets
    /// * `block_offset_bits`: log2 of the block size in bytes
    /// * `ways`: the number of lines in each set, at least one
    ///
    /// returns: Result<Geometry, CacheError>
    pub fn new(set_index_bits: u32, block_offset_bits: u32, ways: usize) -> Result<Self, CacheError> {
        if ways == 0 {
            return Err(CacheError::InvalidGeometry("a set needs at least one way".to_string()));
        }
        if set_index_bits.checked_add(block_offset_bits).map_or(true, |bits| bits > u64::BITS) {
            return Err(CacheError::InvalidGeometry(format!(
                "{set_index_bits} set index bits and {block_offset_bits} block offset bits overflow a {}-bit address",
                u64::BITS
            )));
        }
        // The sets are stored contiguously, so every line has to fit in one allocation
        let bytes = 1usize
            .checked_shl(set_index_bits)
            .and_then(|sets| sets.checked_mul(ways))
            .and_then(|lines| lines.checked_mul(size_of::<Line>()))
            .filter(|bytes| *bytes <= isize::MAX as usize);
        if bytes.is_none() {
            return Err(CacheError::InvalidGeometry(format!(
                "{} sets of {ways} ways can't be stored on this platform",
                1u128 << set_index_bits
            )));
        }
        Ok(Self {
            set_index_bits,
            block_offset_bits,
            ways,
            block_alignment_bit_mask: !low_bits(block_offset_bits),
            set_selection_bit_mask: low_bits(set_index_bits),
        })
    }

    pub fn set_index_bits(&self) -> u32 {
        self.set_index_bits
    }

    pub fn block_offset_bits(&self) -> u32 {
        self.block_offset_bits
    }

    pub fn ways(&self) -> usize {
        self.ways
    }

    pub fn num_sets(&self) -> usize {
        1 << self.set_index_bits
    }

    /// The block size in bytes, saturating for a block which spans the whole address space
    pub fn block_size(&self) -> u64 {
        1u64.checked_shl(self.block_offset_bits).unwrap_or(u64::MAX)
    }

    /// Zeroes the block offset bits of an address
    pub fn block_address(&self, address: u64) -> u64 {
        address & self.block_alignment_bit_mask
    }

    /// The set an address maps to. Always less than `num_sets`
    pub fn set_index(&self, address: u64) -> u64 {
        address.checked_shr(self.block_offset_bits).unwrap_or(0) & self.set_selection_bit_mask
    }

    /// The high-order bits above the set index. Set bits are not re-embedded
    pub fn tag(&self, address: u64) -> u64 {
        address
            .checked_shr(self.block_offset_bits + self.set_index_bits)
            .unwrap_or(0)
    }

    /// Rebuilds the block address stored by a line from its tag and the set it sits in
    pub fn reconstruct(&self, tag: u64, set_index: u64) -> u64 {
        tag.checked_shl(self.block_offset_bits + self.set_index_bits).unwrap_or(0)
            | set_index.checked_shl(self.block_offset_bits).unwrap_or(0)
    }
}

/// A mask of the lowest `bits` bits
fn low_bits(bits: u32) -> u64 {
    1u64.checked_shl(bits).map_or(u64::MAX, |v| v - 1)
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sets x {} ways, {}-byte blocks", self.num_sets(), self.ways, self.block_size())
    }
}
