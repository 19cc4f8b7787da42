//! Protein lookup table
//!
//! Every query word of length `word_size` is indexed together with its
//! neighborhood: all words over the standard letters (stop excluded)
//! whose score against the query word reaches the threshold. The query
//! word itself is always indexed so exact matches are never missed.
//! Words containing a stop are not indexed.

use std::ops::RangeInclusive;

use rustc_hash::FxHashMap;

use crate::core::blast_lookup::{push_chain, OffsetPair};
use crate::core::query_info::QueryBlock;
use crate::error::{BlastError, BlastResult};
use crate::sequence::{Alphabet, AA_STOP};
use crate::utils::ScoringMatrix;

pub const AA_WORD_SIZES: RangeInclusive<usize> = 2..=5;

/// Word keys are base-`ALPHABET_SIZE` numbers over residue codes.
const ALPHABET_SIZE: u32 = 25;

#[inline]
fn word_key(word: &[u8]) -> u32 {
    word.iter()
        .fold(0u32, |key, &c| key * ALPHABET_SIZE + c as u32)
}

#[derive(Debug, Clone)]
pub struct AaLookupTable {
    word_size: usize,
    threshold: i32,
    table: FxHashMap<u32, Vec<u32>>,
    longest_chain: usize,
}

impl AaLookupTable {
    pub fn new(
        query: &QueryBlock,
        word_size: usize,
        threshold: i32,
        matrix: &ScoringMatrix,
    ) -> BlastResult<Self> {
        if !AA_WORD_SIZES.contains(&word_size) {
            return Err(BlastError::Configuration(format!(
                "protein word size must be in {}..={}, got {word_size}",
                AA_WORD_SIZES.start(),
                AA_WORD_SIZES.end()
            )));
        }
        if matrix.alphabet() != Alphabet::Protein {
            return Err(BlastError::Configuration(format!(
                "protein lookup table needs a protein matrix, got '{}'",
                matrix.name()
            )));
        }

        let mut lut = Self {
            word_size,
            threshold,
            table: FxHashMap::default(),
            longest_chain: 0,
        };

        // best score any letter reaches against each residue
        let row_max: Vec<i32> = (0..matrix.size() as u8)
            .map(|a| {
                (0..AA_STOP)
                    .map(|b| matrix.score(a, b))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for ctx in query.contexts() {
            if ctx.length < word_size {
                continue;
            }
            let residues = &query.sequence()[ctx.offset..ctx.end()];
            for pos in 0..=ctx.length - word_size {
                let word = &residues[pos..pos + word_size];
                if word.iter().any(|&c| c >= AA_STOP)
                    || (pos..pos + word_size).any(|p| query.is_masked(ctx.offset + p))
                {
                    continue;
                }
                let q_off = (ctx.offset + pos) as u32;
                lut.add(word_key(word), q_off);
                if threshold > 0 {
                    lut.add_neighbors(word, q_off, matrix, &row_max);
                }
            }
        }

        lut.longest_chain = lut.table.values().map(Vec::len).max().unwrap_or(0);
        Ok(lut)
    }

    fn add(&mut self, key: u32, q_off: u32) {
        let chain = self.table.entry(key).or_default();
        if chain.last() != Some(&q_off) {
            chain.push(q_off);
        }
    }

    fn add_neighbors(&mut self, word: &[u8], q_off: u32, matrix: &ScoringMatrix, row_max: &[i32]) {
        // suffix_max[i]: best score reachable over positions i..
        let mut suffix_max = vec![0i32; word.len() + 1];
        for i in (0..word.len()).rev() {
            suffix_max[i] = suffix_max[i + 1] + row_max[word[i] as usize];
        }
        if suffix_max[0] < self.threshold {
            return;
        }

        let mut neighbor = vec![0u8; word.len()];
        let mut found = Vec::new();
        collect_neighbors(
            word,
            matrix,
            &suffix_max,
            self.threshold,
            0,
            0,
            &mut neighbor,
            &mut found,
        );
        for key in found {
            self.add(key, q_off);
        }
    }

    pub fn word_size(&self) -> usize {
        self.word_size
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn num_entries(&self) -> usize {
        self.table.len()
    }

    pub fn longest_chain(&self) -> usize {
        self.longest_chain
    }

    /// Query offsets indexed under `word`.
    pub fn lookup(&self, word: &[u8]) -> Option<&[u32]> {
        self.table.get(&word_key(word)).map(Vec::as_slice)
    }

    pub fn scan_subject(
        &self,
        subject: &[u8],
        start: usize,
        pairs: &mut Vec<OffsetPair>,
        max_pairs: usize,
    ) -> usize {
        let w = self.word_size;
        if subject.len() < w || start + w > subject.len() {
            return subject.len();
        }
        let modulus = ALPHABET_SIZE.pow(w as u32);
        let mut key = word_key(&subject[start..start + w - 1]);

        for s in start..=subject.len() - w {
            key = (key * ALPHABET_SIZE + subject[s + w - 1] as u32) % modulus;
            if let Some(chain) = self.table.get(&key) {
                if !push_chain(pairs, chain, s, max_pairs) {
                    return s;
                }
            }
        }
        subject.len()
    }
}

#[allow(clippy::too_many_arguments)]
fn collect_neighbors(
    word: &[u8],
    matrix: &ScoringMatrix,
    suffix_max: &[i32],
    threshold: i32,
    pos: usize,
    score: i32,
    neighbor: &mut [u8],
    found: &mut Vec<u32>,
) {
    if pos == word.len() {
        if score >= threshold {
            found.push(word_key(neighbor));
        }
        return;
    }
    for letter in 0..AA_STOP {
        let next = score + matrix.score(word[pos], letter);
        if next + suffix_max[pos + 1] < threshold {
            continue;
        }
        neighbor[pos] = letter;
        collect_neighbors(word, matrix, suffix_max, threshold, pos + 1, next, neighbor, found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blast_options::Program;
    use crate::sequence::Sequence;

    fn block(text: &[u8]) -> QueryBlock {
        let q = Sequence::new("q", text, Alphabet::Protein).unwrap();
        QueryBlock::new(Program::Blastp, &[q]).unwrap()
    }

    fn encode(text: &[u8]) -> Vec<u8> {
        text.iter()
            .map(|&c| Alphabet::Protein.encode(c).unwrap())
            .collect()
    }

    #[test]
    fn test_exact_words_are_indexed_below_threshold() {
        // AAA scores 12 against itself, below the threshold
        let lut = AaLookupTable::new(&block(b"AAAW"), 3, 13, &ScoringMatrix::blosum62()).unwrap();
        assert_eq!(lut.lookup(&encode(b"AAA")), Some(&[0u32][..]));
    }

    #[test]
    fn test_neighbors_reach_threshold() {
        let m = ScoringMatrix::blosum62();
        let lut = AaLookupTable::new(&block(b"WWW"), 3, 11, &m).unwrap();
        // W/W = 11, W/Y = 2, W/F = 1: WWY scores 24
        assert!(lut.lookup(&encode(b"WWY")).is_some());
        // WAA scores 11 - 3 - 3 = 5
        assert!(lut.lookup(&encode(b"WAA")).is_none());
        for key in lut.table.keys() {
            let mut k = *key;
            let mut word = [0u8; 3];
            for slot in word.iter_mut().rev() {
                *slot = (k % ALPHABET_SIZE) as u8;
                k /= ALPHABET_SIZE;
            }
            let score: i32 = word.iter().map(|&c| m.score(c, encode(b"W")[0])).sum();
            assert!(score >= 11);
        }
    }

    #[test]
    fn test_stop_words_skipped() {
        let lut = AaLookupTable::new(&block(b"MK*"), 3, 0, &ScoringMatrix::blosum62()).unwrap();
        assert_eq!(lut.num_entries(), 0);
    }

    #[test]
    fn test_word_size_range() {
        let b = block(b"MKVLATW");
        assert!(AaLookupTable::new(&b, 1, 11, &ScoringMatrix::blosum62()).is_err());
        assert!(AaLookupTable::new(&b, 6, 11, &ScoringMatrix::blosum62()).is_err());
    }

    #[test]
    fn test_scan_resumes_when_buffer_fills() {
        let lut = AaLookupTable::new(&block(b"MKVMKV"), 3, 0, &ScoringMatrix::blosum62()).unwrap();
        let subject = encode(b"MKVMKV");
        let mut pairs = Vec::new();
        let next = lut.scan_subject(&subject, 0, &mut pairs, 2);
        // MKV at 0 has two query offsets, filling the buffer
        assert_eq!(pairs.len(), 2);
        assert_eq!(next, 1);
        let mut all = pairs.clone();
        let mut start = next;
        while start < subject.len() {
            pairs.clear();
            start = lut.scan_subject(&subject, start, &mut pairs, 8);
            all.extend_from_slice(&pairs);
        }
        // 2 + KVM + VMK + 2
        assert_eq!(all.len(), 6);
        assert!(all.contains(&OffsetPair { q_off: 3, s_off: 3 }));
    }
}
