//! Nucleotide lookup tables
//!
//! Words are packed two bits per base (A=0, C=1, G=2, T=3); any word
//! containing an ambiguity code is neither indexed nor scanned.
//!
//! The exact table indexes every query word of `word_size` bases and the
//! subject is scanned at every position. The megablast table indexes
//! short `MB_LUT_WORD` words and scans the subject with a stride of
//! `word_size - MB_LUT_WORD + 1`; any exact match of `word_size` bases
//! contains a scanned short word, and the word finder confirms the full
//! match with [`exact_match_extend`].

use std::ops::RangeInclusive;

use rustc_hash::FxHashMap;

use crate::core::blast_lookup::{push_chain, OffsetPair};
use crate::core::query_info::QueryBlock;
use crate::error::{BlastError, BlastResult};
use crate::sequence::NUM_BASES;

pub const NA_WORD_SIZES: RangeInclusive<usize> = 4..=32;

/// Indexed word length of the megablast table.
pub const MB_LUT_WORD: usize = 12;

#[inline]
fn word_mask(len: usize) -> u64 {
    if len >= 32 {
        u64::MAX
    } else {
        (1u64 << (2 * len)) - 1
    }
}

/// Packed form of a word, or `None` if it holds an ambiguity code.
#[inline]
pub fn pack_word(word: &[u8]) -> Option<u64> {
    word.iter().try_fold(0u64, |key, &c| {
        (c < NUM_BASES).then(|| (key << 2) | c as u64)
    })
}

#[derive(Debug, Clone)]
pub struct NaLookupTable {
    word_size: usize,
    lut_word: usize,
    stride: usize,
    table: FxHashMap<u64, Vec<u32>>,
    longest_chain: usize,
}

impl NaLookupTable {
    /// Exact-word table for contiguous seeds of `word_size` bases.
    pub fn exact(query: &QueryBlock, word_size: usize) -> BlastResult<Self> {
        if !NA_WORD_SIZES.contains(&word_size) {
            return Err(BlastError::Configuration(format!(
                "nucleotide word size must be in {}..={}, got {word_size}",
                NA_WORD_SIZES.start(),
                NA_WORD_SIZES.end()
            )));
        }
        Ok(Self::index(query, word_size, word_size, 1))
    }

    /// Compressed table for long seeds.
    pub fn megablast(query: &QueryBlock, word_size: usize) -> BlastResult<Self> {
        if word_size < MB_LUT_WORD {
            return Err(BlastError::Configuration(format!(
                "megablast word size must be at least {MB_LUT_WORD}, got {word_size}"
            )));
        }
        Ok(Self::index(
            query,
            word_size,
            MB_LUT_WORD,
            word_size - MB_LUT_WORD + 1,
        ))
    }

    fn index(query: &QueryBlock, word_size: usize, lut_word: usize, stride: usize) -> Self {
        let mut table: FxHashMap<u64, Vec<u32>> = FxHashMap::default();
        let mask = word_mask(lut_word);

        for ctx in query.contexts() {
            let residues = &query.sequence()[ctx.offset..ctx.end()];
            let mut key = 0u64;
            let mut valid = 0usize;
            for (i, &c) in residues.iter().enumerate() {
                if c >= NUM_BASES || query.is_masked(ctx.offset + i) {
                    valid = 0;
                    continue;
                }
                key = ((key << 2) | c as u64) & mask;
                valid += 1;
                if valid >= lut_word {
                    let q_off = (ctx.offset + i + 1 - lut_word) as u32;
                    table.entry(key).or_default().push(q_off);
                }
            }
        }

        let longest_chain = table.values().map(Vec::len).max().unwrap_or(0);
        Self {
            word_size,
            lut_word,
            stride,
            table,
            longest_chain,
        }
    }

    pub fn word_size(&self) -> usize {
        self.word_size
    }

    pub fn lut_word_length(&self) -> usize {
        self.lut_word
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn is_megablast(&self) -> bool {
        self.lut_word < self.word_size
    }

    pub fn num_entries(&self) -> usize {
        self.table.len()
    }

    pub fn longest_chain(&self) -> usize {
        self.longest_chain
    }

    pub fn lookup(&self, word: &[u8]) -> Option<&[u32]> {
        pack_word(word).and_then(|key| self.table.get(&key).map(Vec::as_slice))
    }

    pub fn scan_subject(
        &self,
        subject: &[u8],
        start: usize,
        pairs: &mut Vec<OffsetPair>,
        max_pairs: usize,
    ) -> usize {
        if self.stride == 1 {
            self.scan_contiguous(subject, start, pairs, max_pairs)
        } else {
            self.scan_strided(subject, start, pairs, max_pairs)
        }
    }

    fn scan_contiguous(
        &self,
        subject: &[u8],
        start: usize,
        pairs: &mut Vec<OffsetPair>,
        max_pairs: usize,
    ) -> usize {
        let w = self.lut_word;
        let mask = word_mask(w);
        let mut key = 0u64;
        let mut valid = 0usize;

        for i in start..subject.len() {
            let c = subject[i];
            if c >= NUM_BASES {
                valid = 0;
                continue;
            }
            key = ((key << 2) | c as u64) & mask;
            valid += 1;
            if valid < w {
                continue;
            }
            let s_off = i + 1 - w;
            if let Some(chain) = self.table.get(&key) {
                if !push_chain(pairs, chain, s_off, max_pairs) {
                    return s_off;
                }
            }
        }
        subject.len()
    }

    fn scan_strided(
        &self,
        subject: &[u8],
        start: usize,
        pairs: &mut Vec<OffsetPair>,
        max_pairs: usize,
    ) -> usize {
        let w = self.lut_word;
        let mut s_off = start.div_ceil(self.stride) * self.stride;
        while s_off + w <= subject.len() {
            if let Some(chain) = pack_word(&subject[s_off..s_off + w]).and_then(|k| self.table.get(&k)) {
                if !push_chain(pairs, chain, s_off, max_pairs) {
                    return s_off;
                }
            }
            s_off += self.stride;
        }
        subject.len()
    }
}

/// Confirm that the short-word hit at (`q_off`, `s_off`) lies inside an
/// exact match of at least `word_size` bases. Offsets are local to
/// `query` and `subject`. Returns the start of the full exact match on
/// both sequences.
pub fn exact_match_extend(
    query: &[u8],
    subject: &[u8],
    q_off: usize,
    s_off: usize,
    lut_word: usize,
    word_size: usize,
) -> Option<(usize, usize)> {
    let same = |q: usize, s: usize| query[q] == subject[s] && query[q] < NUM_BASES;

    let mut left = 0;
    while left < q_off.min(s_off) && same(q_off - left - 1, s_off - left - 1) {
        left += 1;
    }
    let mut right = 0;
    let (q_end, s_end) = (q_off + lut_word, s_off + lut_word);
    while q_end + right < query.len()
        && s_end + right < subject.len()
        && left + lut_word + right < word_size
        && same(q_end + right, s_end + right)
    {
        right += 1;
    }

    (left + lut_word + right >= word_size).then(|| (q_off - left, s_off - left))
}
