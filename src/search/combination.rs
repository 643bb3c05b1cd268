//! Combination enumeration.
//!
//! The search space is the Cartesian product of every m-subset of rows with
//! every n-subset of columns. Both subsets are produced in lexicographic
//! order, rows as the outer loop, so the sequence is deterministic and a
//! fresh iterator always replays it from the start.

use serde::{Deserialize, Serialize};

/// One candidate sub-selection: sorted row indices and sorted column indices.
///
/// The derived ordering (rows first, then columns) matches enumeration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Combination {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl Combination {
    /// Build a combination; index order is normalised so equal sets compare equal.
    pub fn new(mut rows: Vec<usize>, mut cols: Vec<usize>) -> Self {
        rows.sort_unstable();
        cols.sort_unstable();
        Self { rows, cols }
    }

    /// (m, n) of the selected sub-matrix.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }
}

/// Lexicographic k-subsets of `0..n`.
#[derive(Clone, Debug)]
pub struct IndexCombinations {
    n: usize,
    k: usize,
    current: Option<Vec<usize>>,
}

impl IndexCombinations {
    pub fn new(n: usize, k: usize) -> Self {
        let current = (k <= n).then(|| (0..k).collect());
        Self { n, k, current }
    }
}

impl Iterator for IndexCombinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let out = self.current.take()?;

        // Rightmost position that can still be incremented.
        if let Some(i) = (0..self.k).rev().find(|&i| out[i] < self.n - self.k + i) {
            let mut succ = out.clone();
            succ[i] += 1;
            for j in i + 1..self.k {
                succ[j] = succ[j - 1] + 1;
            }
            self.current = Some(succ);
        }
        Some(out)
    }
}

/// Dimensions of a search space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CombinationSpace {
    pub nrows: usize,
    pub ncols: usize,
    pub m: usize,
    pub n: usize,
}

impl CombinationSpace {
    pub fn new(nrows: usize, ncols: usize, m: usize, n: usize) -> Self {
        Self { nrows, ncols, m, n }
    }

    /// C(R, m) · C(C, n), or `None` if it does not fit in a `u128`.
    pub fn total(&self) -> Option<u128> {
        binomial(self.nrows, self.m)?.checked_mul(binomial(self.ncols, self.n)?)
    }

    /// A fresh enumeration of the whole space.
    pub fn iter(&self) -> Combinations {
        let mut rows = IndexCombinations::new(self.nrows, self.m);
        let current_rows = rows.next();
        Combinations {
            ncols: self.ncols,
            n: self.n,
            rows,
            current_rows,
            cols: IndexCombinations::new(self.ncols, self.n),
        }
    }
}

impl IntoIterator for &CombinationSpace {
    type Item = Combination;
    type IntoIter = Combinations;

    fn into_iter(self) -> Combinations {
        self.iter()
    }
}

/// Lazy product of row and column combinations.
#[derive(Clone, Debug)]
pub struct Combinations {
    ncols: usize,
    n: usize,
    rows: IndexCombinations,
    current_rows: Option<Vec<usize>>,
    cols: IndexCombinations,
}

impl Iterator for Combinations {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        loop {
            let rows = self.current_rows.as_ref()?;
            if let Some(cols) = self.cols.next() {
                return Some(Combination {
                    rows: rows.clone(),
                    cols,
                });
            }
            self.current_rows = self.rows.next();
            self.cols = IndexCombinations::new(self.ncols, self.n);
        }
    }
}

/// Binomial coefficient C(n, k) with overflow detection.
pub fn binomial(n: usize, k: usize) -> Option<u128> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc * (n - i) is always divisible by (i + 1) at this point.
        acc = acc.checked_mul((n - i) as u128)? / (i as u128 + 1);
    }
    Some(acc)
}
