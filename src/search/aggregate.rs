//! Result aggregation: collect survivors from every chunk, then sort once.
//!
//! Ordering is ascending by score with ties broken by the candidate's
//! identity in enumeration order. Because the sort is total, the ranked
//! output does not depend on worker count or buffer length.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::search::combination::Combination;

/// Anything that can be ranked by the aggregator.
pub trait Rankable {
    fn score(&self) -> f64;

    /// Deterministic tie-break between equal scores.
    fn tie_break(&self, other: &Self) -> Ordering;

    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.score()
            .total_cmp(&other.score())
            .then_with(|| self.tie_break(other))
    }
}

/// A scored combination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub score: f64,
    pub combination: Combination,
}

impl Rankable for ScoredResult {
    fn score(&self) -> f64 {
        self.score
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        self.combination.cmp(&other.combination)
    }
}

/// Accumulates per-chunk survivors.
#[derive(Debug)]
pub struct Aggregator<T> {
    results: Vec<T>,
    chunks: usize,
}

impl<T: Rankable> Aggregator<T> {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            chunks: 0,
        }
    }

    /// Append one chunk's survivors.
    pub fn push_chunk(&mut self, survivors: Vec<T>) {
        self.results.extend(survivors);
        self.chunks += 1;
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of chunks seen so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Sort and return the canonical ranking.
    pub fn finish(mut self) -> Vec<T> {
        self.results.sort_by(|a, b| a.rank_cmp(b));
        self.results
    }
}

impl<T: Rankable> Default for Aggregator<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(score: f64, rows: &[usize], cols: &[usize]) -> ScoredResult {
        ScoredResult {
            score,
            combination: Combination::new(rows.to_vec(), cols.to_vec()),
        }
    }

    #[test]
    fn test_sorted_ascending() {
        let mut agg = Aggregator::new();
        agg.push_chunk(vec![
            scored(0.5, &[0, 1], &[0, 1]),
            scored(0.1, &[0, 2], &[0, 1]),
        ]);
        agg.push_chunk(vec![scored(0.3, &[1, 2], &[0, 1])]);
        assert_eq!(agg.chunks(), 2);
        let ranked = agg.finish();
        let scores: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.1, 0.3, 0.5]);
    }

    #[test]
    fn test_ties_follow_enumeration_order() {
        let mut agg = Aggregator::new();
        agg.push_chunk(vec![scored(0.2, &[1, 2], &[0, 1])]);
        agg.push_chunk(vec![
            scored(0.2, &[0, 1], &[1, 2]),
            scored(0.2, &[0, 1], &[0, 2]),
        ]);
        let ranked = agg.finish();
        let combos: Vec<&Combination> = ranked.iter().map(|r| &r.combination).collect();
        assert_eq!(
            combos,
            vec![
                &Combination::new(vec![0, 1], vec![0, 2]),
                &Combination::new(vec![0, 1], vec![1, 2]),
                &Combination::new(vec![1, 2], vec![0, 1]),
            ]
        );
    }

    #[test]
    fn test_order_independent_of_arrival() {
        let items = vec![
            scored(0.4, &[0, 1], &[0, 1]),
            scored(0.1, &[0, 2], &[0, 1]),
            scored(0.4, &[0, 2], &[1, 2]),
            scored(0.0, &[1, 2], &[0, 2]),
        ];
        let mut a = Aggregator::new();
        a.push_chunk(items.clone());
        let mut b = Aggregator::new();
        for item in items.into_iter().rev() {
            b.push_chunk(vec![item]);
        }
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_empty() {
        let agg: Aggregator<ScoredResult> = Aggregator::default();
        assert!(agg.is_empty());
        assert!(agg.finish().is_empty());
    }
}
