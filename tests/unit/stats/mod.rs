//! Tests for e-values and effective search spaces

pub mod evalue;
pub mod search_space;
