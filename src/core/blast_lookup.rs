//! Lookup table front end
//!
//! The concrete tables live in `blast_aalookup` (protein neighborhood
//! words) and `blast_nalookup` (exact nucleotide words, optionally with
//! the compressed megablast index). The word finder only sees this enum.

use log::warn;

use crate::core::blast_aalookup::AaLookupTable;
use crate::core::blast_nalookup::NaLookupTable;
use crate::core::blast_options::SearchOptions;
use crate::core::query_info::QueryBlock;
use crate::error::{BlastError, BlastResult};
use crate::utils::ScoringMatrix;

/// Seed type, picked once from the program and options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Protein,
    Nucleotide,
    Megablast,
}

impl LookupKind {
    pub fn for_options(options: &SearchOptions) -> Self {
        if !options.program.is_nucleotide() {
            LookupKind::Protein
        } else if options.megablast {
            LookupKind::Megablast
        } else {
            LookupKind::Nucleotide
        }
    }
}

/// One word hit: offset into the concatenated query and into the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPair {
    pub q_off: u32,
    pub s_off: u32,
}

#[derive(Debug, Clone)]
pub enum LookupTable {
    Protein(AaLookupTable),
    Nucleotide(NaLookupTable),
}

impl LookupTable {
    /// Index every unmasked word of the query block. Fails when the word
    /// size does not suit the alphabet or when no query word could be
    /// indexed for a reason other than masking.
    pub fn new(
        query: &QueryBlock,
        options: &SearchOptions,
        matrix: &ScoringMatrix,
    ) -> BlastResult<Self> {
        if query.total_length() > u32::MAX as usize {
            return Err(BlastError::Configuration(format!(
                "concatenated query of {} residues is too long to index",
                query.total_length()
            )));
        }
        let table = match LookupKind::for_options(options) {
            LookupKind::Protein => LookupTable::Protein(AaLookupTable::new(
                query,
                options.word_size,
                options.word_threshold,
                matrix,
            )?),
            LookupKind::Nucleotide => {
                LookupTable::Nucleotide(NaLookupTable::exact(query, options.word_size)?)
            }
            LookupKind::Megablast => {
                LookupTable::Nucleotide(NaLookupTable::megablast(query, options.word_size)?)
            }
        };
        if table.num_entries() == 0 {
            if query.masked_count() == 0 {
                return Err(BlastError::Configuration(format!(
                    "no query word of size {} could be indexed",
                    options.word_size
                )));
            }
            warn!(
                "low-complexity masking left no query word of size {}; nothing will be found",
                options.word_size
            );
        }
        Ok(table)
    }

    pub fn kind(&self) -> LookupKind {
        match self {
            LookupTable::Protein(_) => LookupKind::Protein,
            LookupTable::Nucleotide(t) if t.is_megablast() => LookupKind::Megablast,
            LookupTable::Nucleotide(_) => LookupKind::Nucleotide,
        }
    }

    /// Seed length a hit stands for.
    pub fn word_size(&self) -> usize {
        match self {
            LookupTable::Protein(t) => t.word_size(),
            LookupTable::Nucleotide(t) => t.word_size(),
        }
    }

    /// Length of the indexed words; shorter than `word_size` for
    /// megablast.
    pub fn lut_word_length(&self) -> usize {
        match self {
            LookupTable::Protein(t) => t.word_size(),
            LookupTable::Nucleotide(t) => t.lut_word_length(),
        }
    }

    pub fn num_entries(&self) -> usize {
        match self {
            LookupTable::Protein(t) => t.num_entries(),
            LookupTable::Nucleotide(t) => t.num_entries(),
        }
    }

    pub fn longest_chain(&self) -> usize {
        match self {
            LookupTable::Protein(t) => t.longest_chain(),
            LookupTable::Nucleotide(t) => t.longest_chain(),
        }
    }

    /// Scan `subject` from word position `start`, appending hits to
    /// `pairs` until it would exceed `max_pairs`. Returns the position to
    /// resume from; the scan is complete once that reaches
    /// `subject.len()`.
    pub fn scan_subject(
        &self,
        subject: &[u8],
        start: usize,
        pairs: &mut Vec<OffsetPair>,
        max_pairs: usize,
    ) -> usize {
        match self {
            LookupTable::Protein(t) => t.scan_subject(subject, start, pairs, max_pairs),
            LookupTable::Nucleotide(t) => t.scan_subject(subject, start, pairs, max_pairs),
        }
    }
}

/// Append a chain of query offsets for subject position `s_off`, unless
/// the buffer already holds hits and the chain would overflow it.
#[inline]
pub(crate) fn push_chain(
    pairs: &mut Vec<OffsetPair>,
    chain: &[u32],
    s_off: usize,
    max_pairs: usize,
) -> bool {
    if !pairs.is_empty() && pairs.len() + chain.len() > max_pairs {
        return false;
    }
    pairs.extend(chain.iter().map(|&q_off| OffsetPair {
        q_off,
        s_off: s_off as u32,
    }));
    true
}
