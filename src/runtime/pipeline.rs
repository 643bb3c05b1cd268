//! End-to-end run: matrix in → ranked tables out.
//!
//! Stages, in order:
//! 1. Validate the configuration against the matrix
//! 2. Condition a private copy of the matrix with the floor
//! 3. Exhaustive search (enumerate, buffer, dispatch, aggregate)
//! 4. Format the top-K table
//! 5. Optionally compose D-node networks from the pairwise table, score and
//!    format them
//!
//! One worker pool serves both the search and the network stage.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::data::matrix::LabeledMatrix;
use crate::error::Result;
use crate::network::composer::{score_networks, ComposeStats, NetworkComposer};
use crate::network::edge::edges_from_table;
use crate::report::formatter::{format_networks, format_ranked, NetworkTable, RankedTable};
use crate::search::config::SearchConfig;
use crate::search::dispatch::WorkerPool;
use crate::search::engine::{run_search_with, SearchStats};

/// Per-run stage timings (in microseconds).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub condition_us: u64,
    pub search_us: u64,
    pub format_us: u64,
    pub network_us: u64,
    pub total_us: u64,
}

impl StageTimings {
    /// Compute percentage breakdown.
    pub fn breakdown(&self) -> Vec<(&str, f32)> {
        let t = self.total_us as f32;
        if t == 0.0 {
            return vec![];
        }
        vec![
            ("condition", self.condition_us as f32 / t * 100.0),
            ("search", self.search_us as f32 / t * 100.0),
            ("format", self.format_us as f32 / t * 100.0),
            ("network", self.network_us as f32 / t * 100.0),
        ]
    }
}

/// Output of the network stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkReport {
    pub compose: ComposeStats,

    /// Accepted networks that could not be scored.
    pub degenerate: u64,

    pub table: NetworkTable,
}

/// Everything a run produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub config: SearchConfig,
    pub stats: SearchStats,
    pub table: RankedTable,
    pub networks: Option<NetworkReport>,
    pub timings: StageTimings,
}

impl PipelineReport {
    /// Serialise the report (bincode).
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialise a report written by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("failed to write report '{}'", path.display()))?;
        tracing::info!("Saved run report to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read report '{}'", path.display()))?;
        Self::from_bytes(&bytes)
            .with_context(|| format!("failed to decode report '{}'", path.display()))
    }
}

/// The run orchestrator.
pub struct OrthoPipeline {
    pub config: SearchConfig,

    /// Completed runs on this instance.
    runs: usize,
}

impl OrthoPipeline {
    pub fn new(config: SearchConfig) -> Self {
        Self { config, runs: 0 }
    }

    /// Run every stage on `raw`, which is left untouched.
    pub fn run(&mut self, raw: &LabeledMatrix) -> Result<PipelineReport> {
        let config = &self.config;
        config.validate_for(raw)?;
        let start = Instant::now();
        let mut timings = StageTimings::default();

        tracing::info!(
            "Run: {}x{} matrix, {}x{} selections, P={}, T={}, B={}, metric={}",
            raw.nrows(),
            raw.ncols(),
            config.m,
            config.n,
            config.workers,
            config.threshold,
            config.buffer_len,
            config.metric.name(),
        );

        let t = Instant::now();
        let mut matrix = raw.clone();
        let clamped = matrix.apply_floor(config.floor);
        tracing::debug!(
            "Raised {} cell(s) to the floor of {}",
            clamped,
            config.floor
        );
        timings.condition_us = t.elapsed().as_micros() as u64;

        let workers = WorkerPool::new(config.workers)?;

        let t = Instant::now();
        let outcome = run_search_with(&matrix, config, &config.metric, &workers)?;
        timings.search_us = t.elapsed().as_micros() as u64;

        let t = Instant::now();
        let table = format_ranked(
            &outcome.ranked,
            &matrix,
            config.metric,
            config.m,
            config.n,
            config.list_len,
        );
        timings.format_us = t.elapsed().as_micros() as u64;

        let networks = match config.network_dim {
            Some(dim) => {
                let t = Instant::now();
                let pool = edges_from_table(&table)?;
                let composer = NetworkComposer::new(dim, config.buffer_len)?;
                let (accepted, compose) = composer.compose(&pool, &workers)?;
                let (ranked, degenerate) = score_networks(accepted, &matrix, &config.metric)?;
                let table = format_networks(&ranked, dim, config.metric, config.list_len);
                timings.network_us = t.elapsed().as_micros() as u64;
                tracing::info!(
                    "Network stage: {} networks ranked, {} degenerate",
                    table.len(),
                    degenerate
                );
                Some(NetworkReport {
                    compose,
                    degenerate,
                    table,
                })
            }
            None => None,
        };

        timings.total_us = start.elapsed().as_micros() as u64;
        self.runs += 1;

        Ok(PipelineReport {
            config: config.clone(),
            stats: outcome.stats,
            table,
            networks,
            timings,
        })
    }

    pub fn runs(&self) -> usize {
        self.runs
    }
}
