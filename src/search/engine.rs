//! The search loop: enumerate → buffer → dispatch → aggregate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::data::matrix::LabeledMatrix;
use crate::error::{OrthoError, Result};
use crate::search::aggregate::{Aggregator, ScoredResult};
use crate::search::buffer::{BufferPlan, BufferedExt};
use crate::search::combination::{Combination, CombinationSpace};
use crate::search::config::SearchConfig;
use crate::search::dispatch::WorkerPool;
use crate::search::scoring::{score_combination, SubmatrixScorer};

/// Counters for one search run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Size of the search space, if representable.
    pub total: Option<u128>,

    /// Combinations scored.
    pub examined: u64,

    /// Combinations skipped because they could not be scored.
    pub degenerate: u64,

    /// Combinations kept under the threshold.
    pub survivors: usize,

    /// Chunks dispatched.
    pub chunks: usize,

    /// Wall-clock time of the search loop.
    pub elapsed_ms: f64,
}

impl SearchStats {
    /// Fraction of examined combinations that survived the threshold.
    pub fn survival_rate(&self) -> f64 {
        if self.examined == 0 {
            0.0
        } else {
            self.survivors as f64 / self.examined as f64
        }
    }
}

/// Ranked survivors plus counters.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub ranked: Vec<ScoredResult>,
    pub stats: SearchStats,
}

/// Search with the metric named in `config`, on a private pool.
///
/// The matrix is expected to be conditioned already.
pub fn run_search(matrix: &LabeledMatrix, config: &SearchConfig) -> Result<SearchOutcome> {
    let pool = WorkerPool::new(config.workers)?;
    run_search_with(matrix, config, &config.metric, &pool)
}

/// Search with an explicit scorer and pool.
pub fn run_search_with<S: SubmatrixScorer + ?Sized>(
    matrix: &LabeledMatrix,
    config: &SearchConfig,
    scorer: &S,
    pool: &WorkerPool,
) -> Result<SearchOutcome> {
    config.validate_for(matrix)?;
    let start = Instant::now();

    let space = CombinationSpace::new(matrix.nrows(), matrix.ncols(), config.m, config.n);
    let plan = BufferPlan::new(space.total(), config.buffer_len);
    match plan.total {
        Some(total) => tracing::info!(
            "Searching {} combinations of {}x{} in {} chunk(s), at most {} resident, {} worker(s)",
            total,
            config.m,
            config.n,
            plan.chunks.unwrap_or_default(),
            plan.peak_resident(),
            pool.workers(),
        ),
        None => tracing::warn!(
            "Search space for {}x{} exceeds u128; proceeding chunk by chunk",
            config.m,
            config.n
        ),
    }

    let threshold = config.threshold;
    let degenerate = AtomicU64::new(0);
    let keep = |comb: &Combination| -> Result<Option<ScoredResult>> {
        match score_combination(matrix, comb, scorer) {
            Ok(score) if score < threshold => Ok(Some(ScoredResult {
                score,
                combination: comb.clone(),
            })),
            Ok(_) => Ok(None),
            Err(OrthoError::Numeric(_)) => {
                degenerate.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    };

    let mut aggregator = Aggregator::new();
    let mut examined = 0u64;
    for (chunk_idx, chunk) in space.iter().buffered(config.buffer_len).enumerate() {
        let survivors = pool.run_chunk(chunk_idx, &chunk, &keep)?;
        tracing::debug!(
            "chunk {}: {} combinations, {} kept",
            chunk_idx,
            chunk.len(),
            survivors.len()
        );
        examined += chunk.len() as u64;
        aggregator.push_chunk(survivors);
    }

    let chunks = aggregator.chunks();
    let ranked = aggregator.finish();
    let stats = SearchStats {
        total: plan.total,
        examined,
        degenerate: degenerate.into_inner(),
        survivors: ranked.len(),
        chunks,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    };

    tracing::info!(
        "Examined {} combinations: {} kept, {} degenerate, {:.1} ms",
        stats.examined,
        stats.survivors,
        stats.degenerate,
        stats.elapsed_ms
    );
    if ranked.is_empty() {
        tracing::warn!("No combination scored below threshold {}", threshold);
    }

    Ok(SearchOutcome { ranked, stats })
}
