//! End-to-end tests of the search engine

pub mod chunking;
pub mod engine;
pub mod programs;
