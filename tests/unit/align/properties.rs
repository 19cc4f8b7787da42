//! Property tests: score symmetry, transcript replay, banding

use blastcore::align::{EndSpaceFree, MatrixType, NwAligner};
use proptest::prelude::*;

fn dna(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), 1..max_len)
}

fn protein(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ARNDCQEGHILKMFPSTWYV".to_vec()), 1..max_len)
}

fn esf() -> impl Strategy<Value = EndSpaceFree> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(left1, right1, left2, right2)| EndSpaceFree {
            left1,
            right1,
            left2,
            right2,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_score_is_symmetric(a in dna(60), b in dna(60), flags in esf()) {
        let mut ab = NwAligner::new(&a, &b, MatrixType::Nucleotide).unwrap();
        ab.set_end_space_free_flags(flags);
        let mut ba = NwAligner::new(&b, &a, MatrixType::Nucleotide).unwrap();
        ba.set_end_space_free_flags(flags.swapped());
        prop_assert_eq!(ab.run().unwrap(), ba.run().unwrap());
    }

    #[test]
    fn prop_protein_score_is_symmetric(a in protein(40), b in protein(40)) {
        let mut ab = NwAligner::new(&a, &b, MatrixType::Blosum62).unwrap();
        let mut ba = NwAligner::new(&b, &a, MatrixType::Blosum62).unwrap();
        prop_assert_eq!(ab.run().unwrap(), ba.run().unwrap());
    }

    #[test]
    fn prop_transcript_replays_to_score(a in dna(60), b in dna(60), flags in esf()) {
        let mut aligner = NwAligner::new(&a, &b, MatrixType::Nucleotide).unwrap();
        aligner.set_end_space_free_flags(flags);
        let score = aligner.run().unwrap();
        let t = aligner.transcript();
        prop_assert_eq!(t.first_len(), a.len());
        prop_assert_eq!(t.second_len(), b.len());
        prop_assert_eq!(aligner.score_by_transcript().unwrap(), score);
    }

    #[test]
    fn prop_wide_band_matches_full_matrix(a in dna(50), b in dna(50)) {
        let mut full = NwAligner::new(&a, &b, MatrixType::Nucleotide).unwrap();
        let mut banded = NwAligner::new(&a, &b, MatrixType::Nucleotide).unwrap();
        banded.set_band(Some(a.len().max(b.len()))).unwrap();
        prop_assert_eq!(full.run().unwrap(), banded.run().unwrap());
    }

    #[test]
    fn prop_band_never_beats_full_matrix(a in dna(50), b in dna(50), extra in 0usize..4) {
        let mut full = NwAligner::new(&a, &b, MatrixType::Nucleotide).unwrap();
        let mut banded = NwAligner::new(&a, &b, MatrixType::Nucleotide).unwrap();
        banded.set_band(Some(a.len().abs_diff(b.len()) + extra)).unwrap();
        let banded_score = banded.run().unwrap();
        prop_assert!(banded_score <= full.run().unwrap());
        prop_assert_eq!(banded.score_by_transcript().unwrap(), banded_score);
    }
}
