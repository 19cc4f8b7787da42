use std::fmt;

use crate::error::{BlastError, BlastResult};

/// One column of a pairwise alignment.
///
/// `Insert` places a space in the first sequence (consumes only the
/// second); `Delete` places a space in the second (consumes only the
/// first).
///
/// The two frameshift ops only occur in out-of-frame alignments, where
/// one side is a nucleotide strand read codon by codon. They consume
/// nothing: they follow the column whose codon was shortened to two
/// nucleotides (`FrameShiftBack`) or lengthened to four
/// (`FrameShiftForward`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranscriptOp {
    Match,
    Replace,
    Insert,
    Delete,
    Intron,
    FrameShiftBack,
    FrameShiftForward,
}

impl TranscriptOp {
    pub fn symbol(self) -> char {
        match self {
            TranscriptOp::Match => 'M',
            TranscriptOp::Replace => 'R',
            TranscriptOp::Insert => 'I',
            TranscriptOp::Delete => 'D',
            TranscriptOp::Intron => '+',
            TranscriptOp::FrameShiftBack => '/',
            TranscriptOp::FrameShiftForward => '\\',
        }
    }

    pub fn from_symbol(c: char) -> BlastResult<Self> {
        match c {
            'M' => Ok(TranscriptOp::Match),
            'R' => Ok(TranscriptOp::Replace),
            'I' => Ok(TranscriptOp::Insert),
            'D' => Ok(TranscriptOp::Delete),
            '+' => Ok(TranscriptOp::Intron),
            '/' => Ok(TranscriptOp::FrameShiftBack),
            '\\' => Ok(TranscriptOp::FrameShiftForward),
            other => Err(BlastError::Internal(format!(
                "unknown transcript symbol '{other}'"
            ))),
        }
    }

    #[inline]
    pub fn consumes_first(self) -> bool {
        matches!(
            self,
            TranscriptOp::Match | TranscriptOp::Replace | TranscriptOp::Delete
        )
    }

    #[inline]
    pub fn consumes_second(self) -> bool {
        matches!(
            self,
            TranscriptOp::Match | TranscriptOp::Replace | TranscriptOp::Insert | TranscriptOp::Intron
        )
    }

    #[inline]
    pub fn is_frame_shift(self) -> bool {
        matches!(self, TranscriptOp::FrameShiftBack | TranscriptOp::FrameShiftForward)
    }

    #[inline]
    pub fn is_aligned(self) -> bool {
        matches!(self, TranscriptOp::Match | TranscriptOp::Replace)
    }
}

/// Edit transcript of an alignment, in left-to-right order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    ops: Vec<TranscriptOp>,
}

impl Transcript {
    pub fn new(ops: Vec<TranscriptOp>) -> Self {
        Self { ops }
    }

    pub fn parse(text: &str) -> BlastResult<Self> {
        text.chars()
            .map(TranscriptOp::from_symbol)
            .collect::<BlastResult<Vec<_>>>()
            .map(Self::new)
    }

    pub fn ops(&self) -> &[TranscriptOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.ops.clear();
    }

    /// Residues of the first sequence covered by the transcript.
    pub fn first_len(&self) -> usize {
        self.ops.iter().filter(|op| op.consumes_first()).count()
    }

    /// Residues of the second sequence covered by the transcript.
    pub fn second_len(&self) -> usize {
        self.ops.iter().filter(|op| op.consumes_second()).count()
    }

    /// Run-length encoded form: consecutive equal ops collapsed.
    pub fn runs(&self) -> Vec<(TranscriptOp, usize)> {
        let mut runs: Vec<(TranscriptOp, usize)> = Vec::new();
        for &op in &self.ops {
            match runs.last_mut() {
                Some((last, n)) if *last == op => *n += 1,
                _ => runs.push((op, 1)),
            }
        }
        runs
    }

    /// Column counts. Frameshifts are counted apart and take no column.
    pub fn stats(&self) -> AlignmentStats {
        let mut stats = AlignmentStats::default();
        let mut prev: Option<TranscriptOp> = None;
        for &op in &self.ops {
            match op {
                TranscriptOp::Match => stats.matches += 1,
                TranscriptOp::Replace => stats.mismatches += 1,
                TranscriptOp::Insert | TranscriptOp::Delete | TranscriptOp::Intron => {
                    stats.gaps += 1;
                    if prev != Some(op) {
                        stats.gap_opens += 1;
                    }
                }
                TranscriptOp::FrameShiftBack | TranscriptOp::FrameShiftForward => {
                    stats.frame_shifts += 1;
                    continue;
                }
            }
            stats.length += 1;
            prev = Some(op);
        }
        stats
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{}", op.symbol())?;
        }
        Ok(())
    }
}

impl FromIterator<TranscriptOp> for Transcript {
    fn from_iter<I: IntoIterator<Item = TranscriptOp>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Column counts of an alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentStats {
    pub matches: usize,
    pub mismatches: usize,
    pub gaps: usize,
    pub gap_opens: usize,
    pub frame_shifts: usize,
    pub length: usize,
}

impl AlignmentStats {
    /// Percent identity over all columns.
    pub fn identity(&self) -> f64 {
        if self.length == 0 {
            return 0.0;
        }
        100.0 * self.matches as f64 / self.length as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let t = Transcript::parse("MMRIID+").unwrap();
        assert_eq!(t.to_string(), "MMRIID+");
        assert_eq!(t.first_len(), 4);
        assert_eq!(t.second_len(), 6);
        assert!(Transcript::parse("MX").is_err());
    }

    #[test]
    fn test_stats() {
        let t = Transcript::parse("MMRIIMDM").unwrap();
        let s = t.stats();
        assert_eq!(s.matches, 4);
        assert_eq!(s.mismatches, 1);
        assert_eq!(s.gaps, 3);
        assert_eq!(s.gap_opens, 2);
        assert_eq!(s.length, 8);
        assert!((s.identity() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_shifts_take_no_column() {
        let t = Transcript::parse("MMM/MRD\\\\M").unwrap();
        assert_eq!(t.to_string(), "MMM/MRD\\\\M");
        assert_eq!(t.first_len(), 7);
        assert_eq!(t.second_len(), 6);
        let s = t.stats();
        assert_eq!(s.frame_shifts, 3);
        assert_eq!(s.length, 7);
        assert_eq!((s.gaps, s.gap_opens), (1, 1));
    }

    #[test]
    fn test_runs() {
        let t = Transcript::parse("MMMIIDM").unwrap();
        assert_eq!(
            t.runs(),
            vec![
                (TranscriptOp::Match, 3),
                (TranscriptOp::Insert, 2),
                (TranscriptOp::Delete, 1),
                (TranscriptOp::Match, 1),
            ]
        );
    }
}
