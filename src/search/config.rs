//! Run configuration.
//!
//! Every recognised option lives in one immutable struct handed to the
//! pipeline entry point; nothing is read from global state.

use serde::{Deserialize, Serialize};

use crate::config;
use crate::data::matrix::LabeledMatrix;
use crate::error::{OrthoError, Result};
use crate::search::scoring::Metric;

/// Options for one search run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Rows (mutants) per selection.
    pub m: usize,

    /// Columns (compounds) per selection.
    pub n: usize,

    /// Worker threads.
    pub workers: usize,

    /// Results with score >= threshold are dropped.
    pub threshold: f64,

    /// Combinations held in memory per chunk.
    pub buffer_len: usize,

    /// Rows in the ranked table.
    pub list_len: usize,

    /// Node count for network composition; `None` skips that stage.
    pub network_dim: Option<usize>,

    /// Values below this are raised to it before searching.
    pub floor: f64,

    pub metric: Metric,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            m: config::DEFAULT_DIMENSION,
            n: config::DEFAULT_DIMENSION,
            workers: config::DEFAULT_WORKERS,
            threshold: config::DEFAULT_THRESHOLD,
            buffer_len: config::DEFAULT_BUFFER_LEN,
            list_len: config::DEFAULT_LIST_LEN,
            network_dim: None,
            floor: config::DEFAULT_FLOOR,
            metric: Metric::default(),
        }
    }
}

impl SearchConfig {
    /// Square selections: m = n = `dim`.
    pub fn square(dim: usize) -> Self {
        Self {
            m: dim,
            n: dim,
            ..Default::default()
        }
    }

    /// Checks that do not depend on the matrix.
    pub fn validate(&self) -> Result<()> {
        if self.m == 0 || self.n == 0 {
            return Err(OrthoError::InvalidConfig(format!(
                "selection size must be at least 1x1, got {}x{}",
                self.m, self.n
            )));
        }
        if self.workers == 0 {
            return Err(OrthoError::InvalidConfig(
                "worker count must be at least 1".into(),
            ));
        }
        if self.buffer_len == 0 {
            return Err(OrthoError::InvalidConfig(
                "buffer length must be at least 1".into(),
            ));
        }
        if self.threshold.is_nan() || self.threshold < 0.0 {
            return Err(OrthoError::InvalidConfig(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if !self.floor.is_finite() {
            return Err(OrthoError::InvalidConfig(format!(
                "floor must be finite, got {}",
                self.floor
            )));
        }
        if let Some(dim) = self.network_dim {
            if dim <= 2 {
                return Err(OrthoError::InvalidConfig(format!(
                    "network dimension must be greater than 2, got {dim}"
                )));
            }
            if self.m != 2 || self.n != 2 {
                return Err(OrthoError::InvalidConfig(format!(
                    "network composition needs a 2x2 pairwise search, got {}x{}",
                    self.m, self.n
                )));
            }
        }
        Ok(())
    }

    /// Full validation against the matrix about to be searched.
    pub fn validate_for(&self, matrix: &LabeledMatrix) -> Result<()> {
        self.validate()?;
        if self.m > matrix.nrows() || self.n > matrix.ncols() {
            return Err(OrthoError::InvalidConfig(format!(
                "cannot select {}x{} from a {}x{} matrix",
                self.m,
                self.n,
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        Ok(())
    }
}
