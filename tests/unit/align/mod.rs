//! Tests for the Needleman-Wunsch aligner

pub mod guards;
pub mod properties;
