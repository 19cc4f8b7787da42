//! Pairwise global alignment.

pub mod format;
pub mod nw;
pub mod result;
pub mod traceback;

pub use format::{Segment, TextFormat};
pub use nw::{EndSpaceFree, MatrixType, NwAligner, Progress, ProgressCallback};
pub use result::{AlignmentStats, Transcript, TranscriptOp};
