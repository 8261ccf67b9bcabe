//! # HierCache
//!
//! HierCache is a library for simulating a two-level set-associative cache hierarchy
//!
//! It provides a cache implementation parameterised by a replacement policy, a controller which
//! keeps an L1 and an L2 cache coherent under either an inclusive or an exclusive discipline, and
//! a simulator which replays memory traces against that hierarchy
//!
//! The simulator only tracks which blocks are present at each level, never the data they hold

/// Address decomposition into block address, set index and tag
pub mod address;

/// Contains the implementation of a single set-associative cache
pub mod cache;

/// Contains definitions for the JSON input format, and the policy and mode selectors
pub mod config;

/// Error types shared by the whole library
pub mod error;

/// Contains the two-level controller implementing the inclusive and exclusive protocols
pub mod hierarchy;

/// Trace file reading
pub mod io;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator used to replay a trace against a two-level configuration
pub mod simulator;

#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
