//! Labeled response matrix: mutants in rows, compounds in columns.
//!
//! The matrix is validated on construction (rectangular, finite, one unique
//! label per row and column) and conditioned once with a floor before a
//! search. After that it is only ever read.

use std::cmp::Ordering;
use std::collections::HashSet;

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{OrthoError, Result};

/// A dense `f64` matrix with row and column labels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledMatrix {
    values: Array2<f64>,
    row_labels: Vec<String>,
    col_labels: Vec<String>,
}

impl LabeledMatrix {
    /// Build from an existing array. Label counts must match the shape,
    /// labels must be unique per axis, and every value must be finite.
    pub fn new(
        values: Array2<f64>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
    ) -> Result<Self> {
        let (rows, cols) = values.dim();
        if row_labels.len() != rows {
            return Err(OrthoError::data_format(
                "row labels",
                format!("{} labels for {} rows", row_labels.len(), rows),
            ));
        }
        if col_labels.len() != cols {
            return Err(OrthoError::data_format(
                "column labels",
                format!("{} labels for {} columns", col_labels.len(), cols),
            ));
        }
        check_unique("row labels", &row_labels)?;
        check_unique("column labels", &col_labels)?;

        if let Some(((r, c), v)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(OrthoError::data_format(
                format!("row '{}', column '{}'", row_labels[r], col_labels[c]),
                format!("value {v} is not finite"),
            ));
        }

        Ok(Self {
            values,
            row_labels,
            col_labels,
        })
    }

    /// Build from row vectors, rejecting ragged input.
    pub fn from_rows(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let width = col_labels.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                let label = row_labels.get(i).map(String::as_str).unwrap_or("?");
                return Err(OrthoError::data_format(
                    format!("row {} ('{}')", i + 1, label),
                    format!("expected {} values, found {}", width, row.len()),
                ));
            }
        }
        let height = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((height, width), flat)
            .map_err(|e| OrthoError::data_format("matrix", e.to_string()))?;
        Self::new(values, row_labels, col_labels)
    }

    /// Number of rows (mutants).
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of columns (compounds).
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn row_label(&self, idx: usize) -> &str {
        &self.row_labels[idx]
    }

    pub fn col_label(&self, idx: usize) -> &str {
        &self.col_labels[idx]
    }

    /// Position of a row label, if present.
    pub fn row_index(&self, label: &str) -> Option<usize> {
        self.row_labels.iter().position(|l| l == label)
    }

    /// Position of a column label, if present.
    pub fn col_index(&self, label: &str) -> Option<usize> {
        self.col_labels.iter().position(|l| l == label)
    }

    /// Clamp every value below `floor` up to `floor`, in place.
    /// Returns the number of cells that were raised.
    pub fn apply_floor(&mut self, floor: f64) -> usize {
        let mut clamped = 0;
        self.values.mapv_inplace(|v| {
            if v < floor {
                clamped += 1;
                floor
            } else {
                v
            }
        });
        clamped
    }

    /// Copy out the sub-matrix at the given row and column indices,
    /// in the order given.
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Array2<f64> {
        self.values.select(Axis(0), rows).select(Axis(1), cols)
    }

    /// Keep only the given rows, in the order given.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            values: self.values.select(Axis(0), rows),
            row_labels: rows.iter().map(|&r| self.row_labels[r].clone()).collect(),
            col_labels: self.col_labels.clone(),
        }
    }
}

/// Natural label ordering: numeric labels first, compared by value (so
/// mutant "9" sorts before "10"), then the rest lexicographically.
pub fn label_order(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn check_unique(what: &str, labels: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(OrthoError::data_format(
                what,
                format!("duplicate label '{label}'"),
            ));
        }
    }
    Ok(())
}
