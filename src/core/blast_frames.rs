//! Reading-frame coordinate helpers
//!
//! Translated sides are searched frame by frame in amino-acid offsets.
//! Out-of-frame extension instead runs over the mixed-frame buffer of a
//! strand, whose entry `p` is the codon starting at nucleotide `p`, so a
//! seed has to be moved into that space once before extension.

use crate::core::blast_options::Program;
use crate::core::query_info::QueryBlock;
use crate::sequence::translation::{mixed_frame, reverse_complement};

pub const CODON_LENGTH: usize = 3;

/// Nucleotide shift of a reading frame on its strand.
#[inline]
pub fn frame_phase(frame: i8) -> usize {
    (frame.unsigned_abs() as usize).saturating_sub(1)
}

/// Strand offset of the codon holding amino acid `aa` of `frame`.
#[inline]
pub fn aa_to_mixed(frame: i8, aa: usize) -> usize {
    aa * CODON_LENGTH + frame_phase(frame)
}

/// Mixed-frame buffers of both strands of a nucleotide subject.
#[derive(Debug, Clone, Default)]
pub struct SubjectMixedFrames {
    plus: Vec<u8>,
    minus: Vec<u8>,
}

impl SubjectMixedFrames {
    pub fn new(nucleotides: &[u8]) -> Self {
        Self {
            plus: mixed_frame(nucleotides),
            minus: mixed_frame(&reverse_complement(nucleotides)),
        }
    }

    pub fn strand(&self, frame: i8) -> &[u8] {
        if frame < 0 {
            &self.minus
        } else {
            &self.plus
        }
    }
}

/// Seed of an out-of-frame extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnapSeed {
    pub context: usize,
    /// Offset on the protein side (query context or subject chunk).
    pub protein_off: usize,
    /// Codon start on the strand of the translated side. For a
    /// translated query this is local to the strand of the context; for
    /// a translated subject it counts from the start of the whole strand.
    pub mixed_off: usize,
}

/// Move a gapped start point given in frame-local amino-acid offsets
/// into mixed-frame space. `q_off` is local to `context`, `s_off` to the
/// subject chunk starting at amino acid `chunk_offset` of its frame.
/// Programs without exactly one translated side have no such mapping.
pub fn translate_hsps_to_dnap_coord(
    query: &QueryBlock,
    context: usize,
    q_off: usize,
    s_off: usize,
    subject_frame: i8,
    chunk_offset: usize,
) -> Option<DnapSeed> {
    match query.program() {
        Program::Blastx => Some(DnapSeed {
            context,
            protein_off: s_off,
            mixed_off: aa_to_mixed(query.context(context).frame, q_off),
        }),
        Program::Tblastn => Some(DnapSeed {
            context,
            protein_off: q_off,
            mixed_off: aa_to_mixed(subject_frame, s_off + chunk_offset),
        }),
        _ => None,
    }
}

/// One-based, inclusive coordinates on the original sequence of the
/// half-open range `[start, end)`. Ranges on the minus strand come back
/// with `start > end`.
///
/// `translated` ranges are amino-acid offsets within `frame`, unless
/// `out_of_frame` is set, in which case they are already nucleotide
/// offsets on the strand. `seq_len` is the nucleotide length.
pub fn sequence_coords(
    start: usize,
    end: usize,
    frame: i8,
    translated: bool,
    out_of_frame: bool,
    seq_len: usize,
) -> (usize, usize) {
    let (nt_start, nt_end) = if translated && !out_of_frame {
        (aa_to_mixed(frame, start), aa_to_mixed(frame, end))
    } else {
        (start, end)
    };
    if frame < 0 {
        (seq_len - nt_start, seq_len + 1 - nt_end)
    } else {
        (nt_start + 1, nt_end)
    }
}
