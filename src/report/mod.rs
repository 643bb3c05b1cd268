//! Human-facing output: ranked and network tables and their CSV form.

pub mod export;
pub mod formatter;

pub use export::{save_network_csv, save_ranked_csv, write_network_csv, write_ranked_csv};
pub use formatter::{
    format_networks, format_ranked, pair_labels, LabelPair, NetworkEntry, NetworkTable,
    PairingMethod, RankedEntry, RankedTable,
};
