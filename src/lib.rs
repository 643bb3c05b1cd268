//! # ORTHOSET
//!
//! Exhaustive search for orthogonal sets in a labeled response matrix
//! (mutants in rows, compounds in columns).
//!
//! ## Pipeline
//!
//! 1. **Conditioning**: values below a floor are raised to it
//! 2. **Enumeration**: every m-row × n-column sub-selection, lazily
//! 3. **Buffering**: fixed-size chunks bound peak memory
//! 4. **Dispatch**: round-robin shares on a fixed rayon pool
//! 5. **Scoring**: RMS deviation of the normalised Gram matrix from the
//!    identity (or the condition number)
//! 6. **Aggregation**: threshold, then one total-order sort
//! 7. **Formatting**: top-K table with labels and compound→mutant pairs
//! 8. **Networks**: complete graphs on D nodes built from 2×2 results
//!
//! Results are identical for any worker count and buffer length.

pub mod data;
pub mod error;
pub mod network;
pub mod report;
pub mod runtime;
pub mod search;

pub use error::{OrthoError, Result};

/// Run-wide defaults.
pub mod config {
    /// Rows and columns per selection.
    pub const DEFAULT_DIMENSION: usize = 2;

    /// Worker threads.
    pub const DEFAULT_WORKERS: usize = 1;

    /// Scores at or above this are dropped.
    pub const DEFAULT_THRESHOLD: f64 = 1.0;

    /// Combinations per chunk.
    pub const DEFAULT_BUFFER_LEN: usize = 1_000_000;

    /// Rows in the output table.
    pub const DEFAULT_LIST_LEN: usize = 1000;

    /// Measurement floor applied before searching.
    pub const DEFAULT_FLOOR: f64 = 1000.0;

    /// Nodes per network in the network subcommand.
    pub const DEFAULT_NETWORK_DIM: usize = 3;

    /// Row fraction kept by the subsample subcommand.
    pub const DEFAULT_SUBSAMPLE_FRACTION: f64 = 0.2;

    /// Files written by the subsample subcommand.
    pub const DEFAULT_SUBSAMPLE_COUNT: usize = 5;
}
