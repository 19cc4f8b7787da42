//! Construction guards and end-space-free behavior

use blastcore::align::{MatrixType, NwAligner, TextFormat};
use blastcore::error::{BlastError, ErrorKind};

#[test]
fn test_memory_limit_rejects_huge_matrix() {
    let seq = vec![b'A'; 100_000];
    match NwAligner::new(&seq, &seq, MatrixType::Nucleotide) {
        Err(BlastError::MemoryLimit { rows, cols, .. }) => {
            assert_eq!((rows, cols), (100_001, 100_001));
        }
        Err(e) => panic!("expected a memory limit error, got {e}"),
        Ok(_) => panic!("a 100000 x 100000 matrix must be rejected"),
    }
}

#[test]
fn test_lowered_cell_limit() {
    let mut aligner = NwAligner::new(b"ACGTACGT", b"ACGT", MatrixType::Nucleotide).unwrap();
    let err = aligner.set_max_cells(20).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(aligner.set_max_cells(1000).is_ok());
}

#[test]
fn test_invalid_character_reports_position() {
    match NwAligner::new(b"ACGZT", b"ACGT", MatrixType::Nucleotide) {
        Err(BlastError::InvalidCharacter {
            sequence,
            symbol,
            position,
        }) => {
            assert_eq!(sequence, "seq1");
            assert_eq!(symbol, 'Z');
            assert_eq!(position, 3);
        }
        Err(e) => panic!("expected an invalid character error, got {e}"),
        Ok(_) => panic!("'Z' is not a nucleotide"),
    }
}

#[test]
fn test_empty_sequence_is_bad_parameter() {
    assert!(matches!(
        NwAligner::new(b"", b"ACGT", MatrixType::Nucleotide),
        Err(BlastError::BadParameter(_))
    ));
}

#[test]
fn test_end_space_free_idempotence() {
    let mut free = NwAligner::new(b"AAAAGCT", b"GCT", MatrixType::Nucleotide).unwrap();
    free.set_end_space_free(true, true, true, true);
    let free_score = free.run().unwrap();

    let mut exact = NwAligner::new(b"GCT", b"GCT", MatrixType::Nucleotide).unwrap();
    let exact_score = exact.run().unwrap();

    assert_eq!(exact_score, 3);
    assert_eq!(free_score, exact_score);
    assert_eq!(free.transcript_string(), "DDDDMMM");
}

#[test]
fn test_leading_gap_is_charged_without_free_ends() {
    let mut aligner = NwAligner::new(b"AAAAGCT", b"GCT", MatrixType::Nucleotide).unwrap();
    // 3 matches, one gap of 4: 3 - (5 + 4*2)
    assert_eq!(aligner.run().unwrap(), -10);
}

#[test]
fn test_band_narrower_than_length_difference() {
    let mut aligner = NwAligner::new(b"ACGTACGTAC", b"ACG", MatrixType::Nucleotide).unwrap();
    assert!(aligner.set_band(Some(6)).is_err());
    assert!(aligner.set_band(Some(7)).is_ok());
}

#[test]
fn test_text_formats() {
    let mut aligner = NwAligner::new(b"ACGTT", b"ACCTT", MatrixType::Nucleotide).unwrap();
    aligner.run().unwrap();
    let fasta = aligner.format_as_text(TextFormat::FastA, 60).unwrap();
    assert!(fasta.contains("ACGTT"));
    assert!(fasta.contains("ACCTT"));
    let segments = aligner.format_as_segments();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].len, 5);
}
