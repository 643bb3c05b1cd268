//! Network composition: lift pairwise (2×2) results into D-node networks
//! whose nodes are pairwise linked by retained results.

pub mod composer;
pub mod edge;

pub use composer::{
    expected_edges, score_network, score_networks, ComposeStats, Network, NetworkComposer,
    ScoredNetwork,
};
pub use edge::{edges_from_table, CandidateEdge, Edge, Node};
