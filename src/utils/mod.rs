pub mod dust;
pub mod matrix;
pub mod seg;

pub use matrix::ScoringMatrix;

/// Half-open range `[start, end)` of residues hidden from seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskedInterval {
    pub start: usize,
    pub end: usize,
}

impl MaskedInterval {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }
}
