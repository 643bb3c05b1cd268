//! Nodes and edges of the pairwise graph.
//!
//! A 2×2 ranked entry pairs two compounds with two mutants. Each pair is a
//! node; the entry itself links the two nodes.

use serde::{Deserialize, Serialize};

use crate::error::{OrthoError, Result};
use crate::report::formatter::RankedTable;

/// One (compound, mutant) pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    pub column: String,
    pub row: String,
}

/// Undirected link between two nodes; `a <= b` always holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub a: Node,
    pub b: Node,
}

impl Edge {
    pub fn new(x: Node, y: Node) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    pub fn nodes(&self) -> [&Node; 2] {
        [&self.a, &self.b]
    }
}

/// An edge with the rank of the table entry it came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateEdge {
    pub rank: usize,
    pub edge: Edge,
}

/// Reinterpret every entry of a pairwise table as an edge, keeping rank order.
pub fn edges_from_table(table: &RankedTable) -> Result<Vec<CandidateEdge>> {
    if table.m != 2 || table.n != 2 {
        return Err(OrthoError::InvalidConfig(format!(
            "edges need a 2x2 table, got {}x{}",
            table.m, table.n
        )));
    }

    table
        .entries
        .iter()
        .map(|entry| match entry.pairs.as_slice() {
            [p, q] => Ok(CandidateEdge {
                rank: entry.rank,
                edge: Edge::new(
                    Node {
                        column: p.column.clone(),
                        row: p.row.clone(),
                    },
                    Node {
                        column: q.column.clone(),
                        row: q.row.clone(),
                    },
                ),
            }),
            other => Err(OrthoError::data_format(
                format!("rank {}", entry.rank),
                format!("expected 2 label pairs, found {}", other.len()),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    use crate::report::formatter::{LabelPair, PairingMethod, RankedEntry};
    use crate::search::scoring::Metric;

    fn node(c: &str, r: &str) -> Node {
        Node {
            column: c.into(),
            row: r.into(),
        }
    }

    #[test]
    fn test_edge_is_canonical() {
        let e1 = Edge::new(node("b", "2"), node("a", "1"));
        let e2 = Edge::new(node("a", "1"), node("b", "2"));
        assert_eq!(e1, e2);
        assert_eq!(e1.a, node("a", "1"));
    }

    fn entry(rank: usize, pairs: Vec<LabelPair>) -> RankedEntry {
        RankedEntry {
            rank,
            score: 0.1 * rank as f64,
            orthogonality_index: 1.0,
            rows: vec!["1".into(), "2".into()],
            cols: vec!["a".into(), "b".into()],
            submatrix: array![[1.0, 0.0], [0.0, 1.0]],
            pairs,
            pairing: PairingMethod::MaxResponse,
        }
    }

    fn pair(c: &str, r: &str) -> LabelPair {
        LabelPair {
            column: c.into(),
            row: r.into(),
        }
    }

    #[test]
    fn test_edges_from_table() {
        let table = RankedTable {
            m: 2,
            n: 2,
            metric: Metric::RmsIdentity,
            entries: vec![
                entry(1, vec![pair("b", "2"), pair("a", "1")]),
                entry(2, vec![pair("a", "1"), pair("c", "3")]),
            ],
        };
        let edges = edges_from_table(&table).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].rank, 1);
        assert_eq!(edges[0].edge, Edge::new(node("a", "1"), node("b", "2")));
    }

    #[test]
    fn test_rejects_non_pairwise_table() {
        let table = RankedTable {
            m: 3,
            n: 3,
            metric: Metric::RmsIdentity,
            entries: Vec::new(),
        };
        assert!(matches!(
            edges_from_table(&table),
            Err(OrthoError::InvalidConfig(_))
        ));
    }
}
