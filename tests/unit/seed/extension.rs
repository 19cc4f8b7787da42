//! Ungapped extension and x-drop monotonicity

use blastcore::core::blast_diagnostics::ReturnStats;
use blastcore::core::blast_extend::ungapped_extend;
use blastcore::core::{SearchEngine, SearchOptions};
use blastcore::sequence::InMemorySource;
use blastcore::utils::ScoringMatrix;
use proptest::prelude::*;

use super::super::helpers::{nt, random_dna};

fn transition(base: u8) -> u8 {
    match base {
        b'A' => b'G',
        b'G' => b'A',
        b'C' => b'T',
        _ => b'C',
    }
}

/// Search statistics of a blastn run for each ungapped x-drop, in bits.
fn stats_by_x_drop(query: &[u8], subject: &[u8], x_drops: &[f64]) -> Vec<ReturnStats> {
    let source = InMemorySource::new(vec![nt("s", subject)]);
    x_drops
        .iter()
        .map(|&bits| {
            let mut options = SearchOptions::blastn();
            options.x_drop_ungapped = bits;
            let engine = SearchEngine::new(options, &[nt("q", query)]).unwrap();
            engine.search(&source).unwrap().stats
        })
        .collect()
}

#[test]
fn test_lower_x_drop_never_adds_gapped_extensions() {
    // three 20-base blocks on one diagonal, split by two transitions;
    // no word of the subject hits another diagonal or the minus strand
    let query = random_dna(200, 62);
    let mut subject = query.clone();
    for pos in [20, 41] {
        subject[pos] = transition(subject[pos]);
    }

    // raw x-drops 26, 4, 3 and 2: the last two stop at each mismatch
    let stats = stats_by_x_drop(&query, &subject, &[20.0, 3.0, 2.0, 1.0]);
    let seeds: Vec<u64> = stats.iter().map(|s| s.good_init_extends).collect();
    let gapped: Vec<u64> = stats.iter().map(|s| s.gapped_extensions).collect();
    assert_eq!(seeds, vec![1, 1, 3, 3]);
    assert_eq!(gapped, vec![1, 1, 1, 1]);
    assert!(gapped.windows(2).all(|w| w[1] <= w[0]));
    assert!(stats.iter().all(|s| s.seeds_contained + s.gapped_extensions == s.good_init_extends));
}

#[test]
fn test_extension_crosses_mismatch_only_with_enough_x_drop() {
    let matrix = ScoringMatrix::nucleotide(2, -3);
    let q = nt("q", b"ACGTTGCAAGGCTTACCG");
    let s = nt("s", b"ACGTTGCAAGGATTACCG");
    let wide = ungapped_extend(q.residues(), s.residues(), 0, 0, &matrix, 10);
    assert_eq!((wide.length, wide.score), (18, 31));
    let narrow = ungapped_extend(q.residues(), s.residues(), 0, 0, &matrix, 3);
    assert_eq!((narrow.length, narrow.score), (11, 22));
}

#[test]
fn test_extension_walks_left_of_the_word() {
    let matrix = ScoringMatrix::nucleotide(2, -3);
    let q = nt("q", b"TTTTACGTTGCAAGG");
    let s = nt("s", b"GTTTTACGTTGCAAGG");
    let data = ungapped_extend(q.residues(), s.residues(), 4, 5, &matrix, 20);
    assert_eq!((data.q_start, data.s_start), (0, 1));
    assert_eq!(data.length, 15);
    assert_eq!(data.score, 30);
}

fn dna_pair() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    prop::collection::vec((0u8..4, 0u8..10), 20..80).prop_map(|cols| {
        let q: Vec<u8> = cols.iter().map(|&(b, _)| b"ACGT"[b as usize]).collect();
        // about one column in ten is mutated
        let s: Vec<u8> = cols
            .iter()
            .map(|&(b, m)| b"ACGT"[((b + u8::from(m == 0)) % 4) as usize])
            .collect();
        (q, s)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_ungapped_score_monotone_in_x_drop(
        (q, s) in dna_pair(),
        seed in 0usize..1000,
        x_low in 1i32..30,
        x_gap in 0i32..30,
    ) {
        let matrix = ScoringMatrix::nucleotide(2, -3);
        let q = nt("q", &q);
        let s = nt("s", &s);
        let off = seed % q.len();
        let low = ungapped_extend(q.residues(), s.residues(), off, off, &matrix, x_low);
        let high = ungapped_extend(q.residues(), s.residues(), off, off, &matrix, x_low + x_gap);
        prop_assert!(high.score >= low.score);
        // a seed kept at the lower x-drop is kept at the higher one too
        for cutoff in [10, 20, 30] {
            prop_assert!(!(low.score >= cutoff && high.score < cutoff));
        }
    }
}
