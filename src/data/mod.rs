//! Input data: the labeled response matrix, its CSV form, and subsampling.

pub mod matrix;
pub mod subsample;
pub mod table;

pub use matrix::{label_order, LabeledMatrix};
