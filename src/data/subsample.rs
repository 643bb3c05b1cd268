//! Random row subsampling, for checking how stable hits are when part of
//! the mutant panel is dropped.

use rand::seq::index::sample;
use rand::Rng;

use crate::data::matrix::LabeledMatrix;
use crate::error::{OrthoError, Result};

/// Draw `floor(fraction * rows)` distinct rows without replacement.
/// Sampled rows keep their original relative order.
pub fn subsample_rows<R: Rng + ?Sized>(
    matrix: &LabeledMatrix,
    fraction: f64,
    rng: &mut R,
) -> Result<LabeledMatrix> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(OrthoError::InvalidConfig(format!(
            "subsample fraction must be in (0, 1], got {fraction}"
        )));
    }
    let total = matrix.nrows();
    let keep = (fraction * total as f64).floor() as usize;
    if keep == 0 {
        return Err(OrthoError::InvalidConfig(format!(
            "fraction {fraction} of {total} rows selects nothing"
        )));
    }
    let mut rows = sample(rng, total, keep).into_vec();
    rows.sort_unstable();
    Ok(matrix.take_rows(&rows))
}

/// Draw `count` independent subsamples.
pub fn subsample_many<R: Rng + ?Sized>(
    matrix: &LabeledMatrix,
    fraction: f64,
    count: usize,
    rng: &mut R,
) -> Result<Vec<LabeledMatrix>> {
    (0..count)
        .map(|_| subsample_rows(matrix, fraction, rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn matrix(rows: usize) -> LabeledMatrix {
        let values = Array2::from_shape_fn((rows, 2), |(r, c)| (r * 10 + c) as f64);
        LabeledMatrix::new(
            values,
            (0..rows).map(|r| format!("m{r}")).collect(),
            vec!["a".into(), "b".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_subsample_size_and_order() {
        let m = matrix(10);
        let mut rng = StdRng::seed_from_u64(11);
        let sub = subsample_rows(&m, 0.35, &mut rng).unwrap();
        assert_eq!(sub.nrows(), 3);
        assert_eq!(sub.ncols(), 2);

        let idx: Vec<usize> = sub
            .row_labels()
            .iter()
            .map(|l| m.row_index(l).unwrap())
            .collect();
        assert!(idx.windows(2).all(|w| w[0] < w[1]));
        for (i, &r) in idx.iter().enumerate() {
            assert_eq!(sub.values()[[i, 1]], m.values()[[r, 1]]);
        }
    }

    #[test]
    fn test_subsample_is_seeded() {
        let m = matrix(20);
        let a = subsample_many(&m, 0.5, 3, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = subsample_many(&m, 0.5, 3, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_subsample_rejects_bad_fraction() {
        let m = matrix(4);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(subsample_rows(&m, 0.0, &mut rng).is_err());
        assert!(subsample_rows(&m, 1.5, &mut rng).is_err());
        assert!(subsample_rows(&m, 0.1, &mut rng).is_err());
    }
}
