//! Orthogonality scoring of sub-matrices.
//!
//! The default metric normalises each column to unit length, forms the Gram
//! matrix over the smaller side and measures its RMS deviation from the
//! identity:
//!
//! ```text
//! score = sqrt(mean((G - I)^2))
//! ```
//!
//! A score of 0 means the normalised sub-matrix is perfectly orthogonal.
//! The alternative metric is the 2-norm condition number of the raw
//! sub-matrix (σ_max / σ_min), which is 1 for an orthogonal matrix with
//! equal column norms.

use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::matrix::LabeledMatrix;
use crate::error::{OrthoError, Result};
use crate::search::combination::Combination;

/// Scores one extracted sub-matrix. Implementations must be deterministic
/// and free of side effects; workers call them concurrently.
pub trait SubmatrixScorer: Send + Sync {
    fn score(&self, sub: ArrayView2<'_, f64>) -> Result<f64>;
}

/// Built-in scoring metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// RMS deviation of the normalised Gram matrix from the identity.
    #[default]
    RmsIdentity,
    /// Condition number of the raw sub-matrix.
    ConditionNumber,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::RmsIdentity => "rms-identity",
            Metric::ConditionNumber => "condition-number",
        }
    }

    /// Human-facing index for a score on an m×n selection; larger is better.
    pub fn orthogonality_index(&self, score: f64, m: usize, n: usize) -> f64 {
        match self {
            Metric::RmsIdentity => 2.0 * reference_worst(m, n) / score,
            Metric::ConditionNumber => 1.0 / score,
        }
    }
}

impl SubmatrixScorer for Metric {
    fn score(&self, sub: ArrayView2<'_, f64>) -> Result<f64> {
        let score = match self {
            Metric::RmsIdentity => rms_identity_score(sub)?,
            Metric::ConditionNumber => condition_number(sub)?,
        };
        if score.is_finite() {
            Ok(score)
        } else {
            Err(OrthoError::Numeric(format!("non-finite score {score}")))
        }
    }
}

/// Extract the sub-matrix for `comb` and score it.
pub fn score_combination<S: SubmatrixScorer + ?Sized>(
    matrix: &LabeledMatrix,
    comb: &Combination,
    scorer: &S,
) -> Result<f64> {
    let sub = matrix.select(&comb.rows, &comb.cols);
    scorer.score(sub.view())
}

/// Divide every column by its Euclidean norm.
pub fn normalize_columns(sub: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let mut out = sub.to_owned();
    for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
        let norm = col.dot(&col).sqrt();
        if !(norm > 0.0 && norm.is_finite()) {
            return Err(OrthoError::Numeric(format!(
                "column {j} has norm {norm}, cannot normalise"
            )));
        }
        col /= norm;
    }
    Ok(out)
}

/// Gram matrix over the smaller side: `A·Aᵀ` (m×m) when m ≤ n, else `Aᵀ·A`.
pub fn gram(a: ArrayView2<'_, f64>) -> Array2<f64> {
    if a.nrows() <= a.ncols() {
        a.dot(&a.t())
    } else {
        a.t().dot(&a)
    }
}

/// RMS deviation of `a` from the (possibly rectangular) identity.
pub fn rms_from_identity(a: ArrayView2<'_, f64>) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = a
        .indexed_iter()
        .map(|((i, j), &v)| {
            let target = if i == j { 1.0 } else { 0.0 };
            (v - target).powi(2)
        })
        .sum();
    (sum_sq / a.len() as f64).sqrt()
}

/// The default orthogonality score.
pub fn rms_identity_score(sub: ArrayView2<'_, f64>) -> Result<f64> {
    let normalized = normalize_columns(sub)?;
    Ok(rms_from_identity(gram(normalized.view()).view()))
}

/// σ_max / σ_min of the raw sub-matrix.
pub fn condition_number(sub: ArrayView2<'_, f64>) -> Result<f64> {
    let (rows, cols) = sub.dim();
    let dm = DMatrix::from_fn(rows, cols, |i, j| sub[[i, j]]);
    let sv = dm.singular_values();
    let max = sv.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = sv.iter().cloned().fold(f64::INFINITY, f64::min);
    // Rank-deficient within rounding: treat as singular.
    if !(min > max * f64::EPSILON * rows.max(cols) as f64) {
        return Err(OrthoError::Numeric(format!(
            "singular {rows}x{cols} sub-matrix (smallest singular value {min})"
        )));
    }
    Ok(max / min)
}

/// RMS deviation of an all-ones m×n matrix from the identity; the
/// reference "worst case" the orthogonality index is scaled against.
pub fn reference_worst(m: usize, n: usize) -> f64 {
    rms_from_identity(Array2::ones((m, n)).view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity_scores_zero() {
        for k in 1..=5 {
            let eye = Array2::<f64>::eye(k);
            assert_eq!(rms_identity_score(eye.view()).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_scaled_diagonal_scores_zero() {
        let diag = array![[5000.0, 0.0], [0.0, 1200.0]];
        assert_eq!(Metric::RmsIdentity.score(diag.view()).unwrap(), 0.0);
    }

    #[test]
    fn test_known_two_by_two_score() {
        // Columns [9,1] and [1,9]: off-diagonal Gram entry 18/82.
        let a = array![[9.0, 1.0], [1.0, 9.0]];
        let expected = (18.0 / 82.0) / 2f64.sqrt();
        let score = rms_identity_score(a.view()).unwrap();
        assert!((score - expected).abs() < 1e-12, "{score} vs {expected}");
    }

    #[test]
    fn test_all_ones_matches_reference_worst() {
        let ones = Array2::<f64>::ones((2, 2));
        let score = rms_identity_score(ones.view()).unwrap();
        assert!((score - reference_worst(2, 2)).abs() < 1e-12);
        assert!((reference_worst(2, 2) - 0.5f64.sqrt()).abs() < 1e-12);
        let idx = Metric::RmsIdentity.orthogonality_index(score, 2, 2);
        assert!((idx - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_column_is_numeric_error() {
        let a = array![[1.0, 0.0], [2.0, 0.0]];
        let err = rms_identity_score(a.view()).unwrap_err();
        assert!(err.is_numeric());
    }

    #[test]
    fn test_gram_uses_smaller_side() {
        let tall = Array2::<f64>::ones((3, 2));
        assert_eq!(gram(tall.view()).dim(), (2, 2));
        let wide = Array2::<f64>::ones((2, 3));
        assert_eq!(gram(wide.view()).dim(), (2, 2));
    }

    #[test]
    fn test_rectangular_orthogonal_scores_zero() {
        let a = array![[3.0, 0.0], [0.0, 2.0], [0.0, 0.0]];
        assert!(rms_identity_score(a.view()).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_condition_number() {
        let a = array![[2.0, 0.0], [0.0, 1.0]];
        let cond = Metric::ConditionNumber.score(a.view()).unwrap();
        assert!((cond - 2.0).abs() < 1e-9);

        let singular = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(Metric::ConditionNumber.score(singular.view()).is_err());
    }

    #[test]
    fn test_score_combination_extracts_selection() {
        let m = LabeledMatrix::new(
            array![[1.0, 5.0, 0.0], [7.0, 7.0, 7.0], [0.0, 5.0, 1.0]],
            vec!["a".into(), "b".into(), "c".into()],
            vec!["x".into(), "y".into(), "z".into()],
        )
        .unwrap();
        let comb = Combination::new(vec![0, 2], vec![0, 2]);
        let score = score_combination(&m, &comb, &Metric::RmsIdentity).unwrap();
        assert_eq!(score, 0.0);
    }
}
