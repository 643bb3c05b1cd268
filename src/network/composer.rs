//! Compose pairwise results into D-node networks.
//!
//! A candidate is a set of D·(D−1)/2 edges drawn from the pool. It is
//! accepted when its edges are all distinct and touch exactly D nodes, i.e.
//! when it is a complete graph on D nodes. Candidates are streamed through
//! the same buffering and worker pool as the search itself.
//!
//! Drawing D edges per candidate, rather than D·(D−1)/2, only works for
//! D = 3: D distinct edges never complete a graph on D ≥ 4 nodes.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::matrix::{label_order, LabeledMatrix};
use crate::error::{OrthoError, Result};
use crate::network::edge::{CandidateEdge, Edge, Node};
use crate::search::aggregate::{Aggregator, Rankable};
use crate::search::buffer::{BufferPlan, BufferedExt};
use crate::search::combination::{binomial, IndexCombinations};
use crate::search::dispatch::WorkerPool;
use crate::search::scoring::SubmatrixScorer;

/// Edges in a complete graph on `dim` nodes.
pub fn expected_edges(dim: usize) -> usize {
    dim * dim.saturating_sub(1) / 2
}

/// Lifecycle of one candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateState {
    /// Gathering nodes and edges from its members.
    Collecting,

    /// Everything gathered; counts not yet checked.
    Validating,

    /// Forms a complete graph on D nodes.
    Accepted,

    /// Wrong node or edge count.
    Rejected,
}

/// One combination of pool edges under evaluation.
pub struct NetworkCandidate<'a> {
    pub state: CandidateState,
    members: Vec<usize>,
    nodes: BTreeSet<&'a Node>,
    edges: BTreeSet<&'a Edge>,
}

impl<'a> NetworkCandidate<'a> {
    /// `members` are indices into the edge pool.
    pub fn new(members: Vec<usize>) -> Self {
        Self {
            state: CandidateState::Collecting,
            members,
            nodes: BTreeSet::new(),
            edges: BTreeSet::new(),
        }
    }

    /// Union the members' nodes and edges. Collecting → Validating.
    pub fn collect(&mut self, pool: &'a [CandidateEdge]) {
        if self.state != CandidateState::Collecting {
            return;
        }
        for &idx in &self.members {
            let edge = &pool[idx].edge;
            self.nodes.extend(edge.nodes());
            self.edges.insert(edge);
        }
        self.state = CandidateState::Validating;
    }

    /// Validating → Accepted | Rejected. Returns whether it was accepted.
    pub fn validate(&mut self, dim: usize) -> bool {
        if self.state == CandidateState::Validating {
            self.state = if is_complete_network(self.nodes.len(), self.edges.len(), dim) {
                CandidateState::Accepted
            } else {
                CandidateState::Rejected
            };
        }
        self.state == CandidateState::Accepted
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The accepted network, or `None` for any other state.
    pub fn into_network(self, pool: &[CandidateEdge]) -> Option<Network> {
        if self.state != CandidateState::Accepted {
            return None;
        }
        Some(Network {
            edges: self.members.iter().map(|&i| pool[i].clone()).collect(),
            nodes: self.nodes.into_iter().cloned().collect(),
            members: self.members,
        })
    }
}

/// Exactly `dim` nodes and exactly `dim·(dim−1)/2` distinct edges.
pub fn is_complete_network(nodes: usize, edges: usize, dim: usize) -> bool {
    nodes == dim && edges == expected_edges(dim)
}

/// An accepted network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Pool indices, ascending.
    pub members: Vec<usize>,
    pub edges: Vec<CandidateEdge>,
    pub nodes: Vec<Node>,
}

impl Network {
    /// Distinct compound labels in natural order.
    pub fn compounds(&self) -> Vec<String> {
        distinct_sorted(self.nodes.iter().map(|n| n.column.as_str()))
    }

    /// Distinct mutant labels in natural order.
    pub fn mutants(&self) -> Vec<String> {
        distinct_sorted(self.nodes.iter().map(|n| n.row.as_str()))
    }

    /// Pairwise-table ranks of the member edges.
    pub fn source_ranks(&self) -> Vec<usize> {
        self.edges.iter().map(|e| e.rank).collect()
    }
}

fn distinct_sorted<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let set: BTreeSet<&str> = labels.collect();
    let mut out: Vec<String> = set.into_iter().map(str::to_string).collect();
    out.sort_by(|a, b| label_order(a, b));
    out
}

/// Counters for one composition run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeStats {
    pub pool: usize,
    pub candidates: u64,
    pub accepted: usize,
    pub chunks: usize,
}

/// Streams edge combinations and keeps the complete graphs.
#[derive(Clone, Debug)]
pub struct NetworkComposer {
    dim: usize,
    buffer_len: usize,
}

impl NetworkComposer {
    pub fn new(dim: usize, buffer_len: usize) -> Result<Self> {
        if dim <= 2 {
            return Err(OrthoError::InvalidConfig(format!(
                "network dimension must be greater than 2, got {dim}"
            )));
        }
        if buffer_len == 0 {
            return Err(OrthoError::InvalidConfig(
                "buffer length must be at least 1".into(),
            ));
        }
        Ok(Self { dim, buffer_len })
    }

    /// Accepted networks ordered by member indices.
    pub fn compose(
        &self,
        pool: &[CandidateEdge],
        workers: &WorkerPool,
    ) -> Result<(Vec<Network>, ComposeStats)> {
        let k = expected_edges(self.dim);
        let plan = BufferPlan::new(binomial(pool.len(), k), self.buffer_len);
        tracing::info!(
            "Composing {}-node networks from {} edges: {:?} candidates of {} edges",
            self.dim,
            pool.len(),
            plan.total,
            k
        );

        let dim = self.dim;
        let accept = |members: &Vec<usize>| -> Result<Option<Network>> {
            let mut candidate = NetworkCandidate::new(members.clone());
            candidate.collect(pool);
            candidate.validate(dim);
            Ok(candidate.into_network(pool))
        };

        let mut networks = Vec::new();
        let mut stats = ComposeStats {
            pool: pool.len(),
            ..Default::default()
        };
        for (chunk_idx, chunk) in IndexCombinations::new(pool.len(), k)
            .buffered(self.buffer_len)
            .enumerate()
        {
            let accepted = workers.run_chunk(chunk_idx, &chunk, &accept)?;
            tracing::debug!(
                "network chunk {}: {} candidates, {} accepted",
                chunk_idx,
                chunk.len(),
                accepted.len()
            );
            stats.candidates += chunk.len() as u64;
            stats.chunks += 1;
            networks.extend(accepted);
        }

        networks.sort_by(|a, b| a.members.cmp(&b.members));
        stats.accepted = networks.len();
        tracing::info!(
            "Accepted {} of {} candidate networks",
            stats.accepted,
            stats.candidates
        );
        Ok((networks, stats))
    }
}

/// A network with its score over the distinct mutants × compounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredNetwork {
    pub score: f64,
    pub network: Network,
}

impl Rankable for ScoredNetwork {
    fn score(&self) -> f64 {
        self.score
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        self.network.members.cmp(&other.network.members)
    }
}

/// Score one network on the conditioned matrix.
pub fn score_network<S: SubmatrixScorer + ?Sized>(
    network: &Network,
    matrix: &LabeledMatrix,
    scorer: &S,
) -> Result<f64> {
    let mut rows = BTreeSet::new();
    let mut cols = BTreeSet::new();
    for node in &network.nodes {
        let row = matrix
            .row_index(&node.row)
            .ok_or_else(|| unknown_node("mutant", &node.row))?;
        let col = matrix
            .col_index(&node.column)
            .ok_or_else(|| unknown_node("compound", &node.column))?;
        rows.insert(row);
        cols.insert(col);
    }
    let rows: Vec<usize> = rows.into_iter().collect();
    let cols: Vec<usize> = cols.into_iter().collect();
    scorer.score(matrix.select(&rows, &cols).view())
}

fn unknown_node(kind: &str, label: &str) -> OrthoError {
    OrthoError::data_format("network node", format!("unknown {kind} '{label}'"))
}

/// Score and rank networks; degenerate ones are skipped and counted.
pub fn score_networks<S: SubmatrixScorer + ?Sized>(
    networks: Vec<Network>,
    matrix: &LabeledMatrix,
    scorer: &S,
) -> Result<(Vec<ScoredNetwork>, u64)> {
    let mut degenerate = 0u64;
    let mut aggregator = Aggregator::new();
    let mut scored = Vec::with_capacity(networks.len());
    for network in networks {
        match score_network(&network, matrix, scorer) {
            Ok(score) => scored.push(ScoredNetwork { score, network }),
            Err(OrthoError::Numeric(reason)) => {
                tracing::debug!("skipping network {:?}: {}", network.members, reason);
                degenerate += 1;
            }
            Err(e) => return Err(e),
        }
    }
    aggregator.push_chunk(scored);
    Ok((aggregator.finish(), degenerate))
}
