//! Ranked tables: map index-level results back to labels.
//!
//! Each entry carries its 1-based rank, the raw score, the orthogonality
//! index, the sorted row and column labels, the sub-matrix in that order,
//! and a column→row label pairing.
//!
//! Pairing has two branches. The primary one pairs each column with the
//! row holding that column's largest response. If two columns pick the same
//! row the pairing is ambiguous, and the fallback pairs the c-th column with
//! the c-th row, both in sorted label order.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::matrix::{label_order, LabeledMatrix};
use crate::network::composer::ScoredNetwork;
use crate::search::aggregate::ScoredResult;
use crate::search::scoring::Metric;

/// Which pairing branch produced an entry's pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingMethod {
    /// Each column paired with the row of its maximum value.
    MaxResponse,
    /// Positional pairing in sorted label order.
    Positional,
}

/// A compound (column) paired with a mutant (row).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelPair {
    pub column: String,
    pub row: String,
}

/// One row of the ranked table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub score: f64,
    pub orthogonality_index: f64,
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub submatrix: Array2<f64>,
    pub pairs: Vec<LabelPair>,
    pub pairing: PairingMethod,
}

/// Top-K ranked results of a search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedTable {
    pub m: usize,
    pub n: usize,
    pub metric: Metric,
    pub entries: Vec<RankedEntry>,
}

impl RankedTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the top-`list_len` table from a ranked result list.
///
/// A `list_len` beyond the number of results yields every result.
pub fn format_ranked(
    ranked: &[ScoredResult],
    matrix: &LabeledMatrix,
    metric: Metric,
    m: usize,
    n: usize,
    list_len: usize,
) -> RankedTable {
    if list_len > ranked.len() {
        tracing::warn!(
            "Requested {} rows but only {} results are available",
            list_len,
            ranked.len()
        );
    }

    let entries = ranked
        .iter()
        .take(list_len)
        .enumerate()
        .map(|(i, result)| {
            let comb = &result.combination;
            let row_idx = sorted_by_label(&comb.rows, |r| matrix.row_label(r));
            let col_idx = sorted_by_label(&comb.cols, |c| matrix.col_label(c));
            let rows: Vec<String> = row_idx
                .iter()
                .map(|&r| matrix.row_label(r).to_string())
                .collect();
            let cols: Vec<String> = col_idx
                .iter()
                .map(|&c| matrix.col_label(c).to_string())
                .collect();
            let submatrix = matrix.select(&row_idx, &col_idx);
            let (pairs, pairing) = pair_labels(submatrix.view(), &rows, &cols);

            RankedEntry {
                rank: i + 1,
                score: result.score,
                orthogonality_index: metric.orthogonality_index(result.score, m, n),
                rows,
                cols,
                submatrix,
                pairs,
                pairing,
            }
        })
        .collect();

    RankedTable {
        m,
        n,
        metric,
        entries,
    }
}

/// Pair columns with rows of `sub`, whose axes are labelled by `rows`/`cols`.
pub fn pair_labels(
    sub: ArrayView2<'_, f64>,
    rows: &[String],
    cols: &[String],
) -> (Vec<LabelPair>, PairingMethod) {
    let mut used = HashSet::with_capacity(cols.len());
    let mut pairs = Vec::with_capacity(cols.len());
    for (j, column) in sub.axis_iter(Axis(1)).enumerate() {
        let Some(best) = first_argmax(column) else {
            break;
        };
        if !used.insert(best) {
            return (positional_pairs(rows, cols), PairingMethod::Positional);
        }
        pairs.push(LabelPair {
            column: cols[j].clone(),
            row: rows[best].clone(),
        });
    }
    if pairs.len() == cols.len() {
        (pairs, PairingMethod::MaxResponse)
    } else {
        (positional_pairs(rows, cols), PairingMethod::Positional)
    }
}

fn positional_pairs(rows: &[String], cols: &[String]) -> Vec<LabelPair> {
    cols.iter()
        .zip(rows)
        .map(|(c, r)| LabelPair {
            column: c.clone(),
            row: r.clone(),
        })
        .collect()
}

/// Index of the first maximum; `None` for an empty column.
fn first_argmax(column: ArrayView1<'_, f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in column.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

fn sorted_by_label<'a, F>(indices: &[usize], label: F) -> Vec<usize>
where
    F: Fn(usize) -> &'a str,
{
    let mut out = indices.to_vec();
    out.sort_by(|&a, &b| label_order(label(a), label(b)));
    out
}

/// One row of the network table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub rank: usize,
    pub score: f64,
    pub orthogonality_index: f64,
    pub compounds: Vec<String>,
    pub mutants: Vec<String>,
    /// Ranks (in the pairwise table) of the edges forming the network.
    pub source_ranks: Vec<usize>,
}

/// Top-K composed networks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkTable {
    pub dim: usize,
    pub metric: Metric,
    pub entries: Vec<NetworkEntry>,
}

impl NetworkTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Network variant of [`format_ranked`].
pub fn format_networks(
    ranked: &[ScoredNetwork],
    dim: usize,
    metric: Metric,
    list_len: usize,
) -> NetworkTable {
    let entries = ranked
        .iter()
        .take(list_len)
        .enumerate()
        .map(|(i, scored)| {
            let compounds = scored.network.compounds();
            let mutants = scored.network.mutants();
            NetworkEntry {
                rank: i + 1,
                score: scored.score,
                orthogonality_index: metric.orthogonality_index(
                    scored.score,
                    mutants.len(),
                    compounds.len(),
                ),
                compounds,
                mutants,
                source_ranks: scored.network.source_ranks(),
            }
        })
        .collect();

    NetworkTable {
        dim,
        metric,
        entries,
    }
}
