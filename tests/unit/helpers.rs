//! Test utilities shared by the integration tests
//!
//! - Deterministic pseudo-random sequences
//! - Sequence constructors
//! - HSP summaries for comparing result sets

use blastcore::core::blast_hits::ResultSet;
use blastcore::sequence::{Alphabet, Sequence};

/// Linear congruential generator, enough to make reproducible sequences.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    pub fn pick(&mut self, symbols: &[u8]) -> u8 {
        symbols[self.next_u32() as usize % symbols.len()]
    }
}

pub fn random_dna(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..len).map(|_| rng.pick(b"ACGT")).collect()
}

pub fn random_protein(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..len).map(|_| rng.pick(b"ARNDCQEGHILKMFPSTWYV")).collect()
}

pub fn nt(id: &str, text: &[u8]) -> Sequence {
    Sequence::new(id, text, Alphabet::Nucleotide).unwrap()
}

pub fn aa(id: &str, text: &[u8]) -> Sequence {
    Sequence::new(id, text, Alphabet::Protein).unwrap()
}

/// One codon per amino acid, standard genetic code.
pub fn back_translate(protein: &[u8]) -> Vec<u8> {
    protein
        .iter()
        .flat_map(|&a| {
            let codon: &[u8; 3] = match a {
                b'A' => b"GCT",
                b'R' => b"CGT",
                b'N' => b"AAT",
                b'D' => b"GAT",
                b'C' => b"TGT",
                b'Q' => b"CAA",
                b'E' => b"GAA",
                b'G' => b"GGT",
                b'H' => b"CAT",
                b'I' => b"ATT",
                b'L' => b"CTG",
                b'K' => b"AAA",
                b'M' => b"ATG",
                b'F' => b"TTT",
                b'P' => b"CCG",
                b'S' => b"TCT",
                b'T' => b"ACC",
                b'W' => b"TGG",
                b'Y' => b"TAT",
                b'V' => b"GTG",
                _ => panic!("no codon for {}", a as char),
            };
            codon.iter().copied()
        })
        .collect()
}

/// (oid, context, q_start, q_end, s_start, s_end, score) of every HSP,
/// in result order.
pub type HspSummary = (usize, usize, usize, usize, usize, usize, i32);

pub fn summarize(results: &ResultSet) -> Vec<HspSummary> {
    results
        .hsps()
        .map(|(_, list, h)| (list.oid, h.context, h.q_start, h.q_end, h.s_start, h.s_end, h.score))
        .collect()
}

/// Assert two e-values agree to a relative tolerance.
pub fn assert_evalue_close(actual: f64, expected: f64, tolerance: f64) {
    let diff = if expected == 0.0 {
        actual.abs()
    } else {
        ((actual - expected) / expected).abs()
    };
    assert!(
        diff <= tolerance,
        "e-value mismatch: actual={actual}, expected={expected}, relative diff={diff}"
    );
}
