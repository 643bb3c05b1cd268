//! Search engine: enumeration, scoring, buffering, parallel dispatch and
//! ranking of row/column sub-selections.

pub mod aggregate;
pub mod buffer;
pub mod combination;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod scoring;

pub use aggregate::{Aggregator, Rankable, ScoredResult};
pub use combination::{Combination, CombinationSpace};
pub use config::SearchConfig;
pub use dispatch::WorkerPool;
pub use engine::{run_search, run_search_with, SearchOutcome, SearchStats};
pub use scoring::{Metric, SubmatrixScorer};
