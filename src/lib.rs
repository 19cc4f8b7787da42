pub mod common;
pub mod error;
pub mod sequence;
pub mod utils;

pub mod align;
pub mod stats;

pub mod core;

pub use error::{BlastError, BlastResult, ErrorKind};
