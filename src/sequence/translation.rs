//! Six-frame translation and mixed-frame buffers for translated searches.
//!
//! Frames are numbered 1..3 on the plus strand and -1..-3 on the minus
//! strand. Translation uses the standard genetic code; codons containing
//! an ambiguity code translate to `X`.

use bio::alphabets::dna;

use super::{Alphabet, AA_X, NT_N, NUM_BASES};

/// Standard genetic code, codons indexed as 16*b1 + 4*b2 + b3 with
/// T=0, C=1, A=2, G=3.
const STANDARD_CODE: &[u8; 64] =
    b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

/// Frame order used for translated contexts: 1, 2, 3, -1, -2, -3.
pub const FRAMES: [i8; 6] = [1, 2, 3, -1, -2, -3];

/// A translated reading frame.
#[derive(Debug, Clone)]
pub struct TranslatedFrame {
    pub frame: i8,
    /// Protein codes.
    pub residues: Vec<u8>,
    /// Length of the nucleotide sequence the frame was translated from.
    pub nucleotide_len: usize,
}

#[inline]
fn codon_index(code: u8) -> Option<usize> {
    // nucleotide codes are A=0, C=1, G=2, T=3
    match code {
        0 => Some(2),
        1 => Some(1),
        2 => Some(3),
        3 => Some(0),
        _ => None,
    }
}

/// Translate one codon of nucleotide codes into a protein code.
#[inline]
pub fn translate_codon(codon: &[u8]) -> u8 {
    let (Some(b1), Some(b2), Some(b3)) = (
        codon_index(codon[0]),
        codon_index(codon[1]),
        codon_index(codon[2]),
    ) else {
        return AA_X;
    };
    let aa = STANDARD_CODE[16 * b1 + 4 * b2 + b3];
    Alphabet::Protein.encode(aa).unwrap_or(AA_X)
}

fn translate_from(nt: &[u8], start: usize) -> Vec<u8> {
    if start >= nt.len() {
        return Vec::new();
    }
    nt[start..].chunks_exact(3).map(translate_codon).collect()
}

/// Reverse complement of nucleotide codes.
pub fn reverse_complement(nt: &[u8]) -> Vec<u8> {
    let text: Vec<u8> = nt.iter().map(|&c| Alphabet::Nucleotide.decode(c)).collect();
    dna::revcomp(text)
        .into_iter()
        .map(|c| Alphabet::Nucleotide.encode(c).unwrap_or(NT_N))
        .collect()
}

/// Translate a nucleotide sequence in one frame.
pub fn translate_frame(nt: &[u8], frame: i8) -> Vec<u8> {
    let shift = (frame.unsigned_abs() as usize).saturating_sub(1);
    if frame > 0 {
        translate_from(nt, shift)
    } else {
        translate_from(&reverse_complement(nt), shift)
    }
}

/// All six frames in context order. Frames too short to hold a codon are
/// kept as empty sequences so context numbering stays fixed.
pub fn six_frames(nt: &[u8]) -> Vec<TranslatedFrame> {
    let rc = reverse_complement(nt);
    FRAMES
        .iter()
        .map(|&frame| {
            let shift = (frame.unsigned_abs() as usize) - 1;
            let source = if frame > 0 { nt } else { &rc[..] };
            TranslatedFrame {
                frame,
                residues: translate_from(source, shift),
                nucleotide_len: nt.len(),
            }
        })
        .collect()
}

/// Context index (0..6) of a frame.
#[inline]
pub fn frame_to_context(frame: i8) -> usize {
    if frame > 0 {
        (frame - 1) as usize
    } else {
        (2 - frame) as usize
    }
}

/// Frame of a context index (0..6).
#[inline]
pub fn context_to_frame(context: usize) -> i8 {
    FRAMES[context % 6]
}

/// Mixed-frame buffer of one strand: entry `p` holds the translation of
/// the codon starting at nucleotide `p`, so the three frames of the strand
/// interleave with stride 3.
pub fn mixed_frame(strand: &[u8]) -> Vec<u8> {
    if strand.len() < 3 {
        return Vec::new();
    }
    strand.windows(3).map(translate_codon).collect()
}

/// True when the code is one of A, C, G, T.
#[inline]
pub fn is_base(code: u8) -> bool {
    code < NUM_BASES
}
