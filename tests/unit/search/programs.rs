//! Protein and translated searches

use blastcore::common::hits_from_results;
use blastcore::core::{Program, SearchEngine, SearchOptions};
use blastcore::sequence::InMemorySource;
use blastcore::utils::ScoringMatrix;

use super::super::helpers::{aa, back_translate, nt, random_dna, random_protein};

#[test]
fn test_blastp_finds_embedded_protein() {
    let query = random_protein(101, 50);
    let mut subject = random_protein(102, 40);
    subject.extend_from_slice(&query);
    subject.extend_from_slice(&random_protein(103, 40));

    let engine = SearchEngine::new(SearchOptions::blastp(), &[aa("q", &query)]).unwrap();
    let outcome = engine
        .search(&InMemorySource::new(vec![aa("s", &subject)]))
        .unwrap();
    let (_, list, best) = outcome.results.hsps().next().unwrap();
    assert_eq!(list.oid, 0);
    assert_eq!((best.q_start, best.q_end), (0, 50));
    assert_eq!((best.s_start, best.s_end), (40, 90));
    assert_eq!(best.transcript.as_ref().unwrap().stats().matches, 50);
    assert!(best.evalue < 1e-10);
}

#[test]
fn test_tblastn_reports_nucleotide_coordinates() {
    let protein = random_protein(111, 40);
    let mut subject = random_dna(112, 30);
    subject.extend_from_slice(&back_translate(&protein));
    subject.extend_from_slice(&random_dna(113, 30));

    let engine = SearchEngine::new(SearchOptions::tblastn(), &[aa("q", &protein)]).unwrap();
    let source = InMemorySource::new(vec![nt("s", &subject)]);
    let outcome = engine.search(&source).unwrap();
    let (_, _, best) = outcome.results.hsps().next().unwrap();
    assert_eq!(best.subject_frame, 1);
    assert_eq!((best.s_start, best.s_end), (10, 50));

    let hits = hits_from_results(Program::Tblastn, &outcome.results, &[40], |_| ("s".to_string(), subject.len()));
    assert_eq!((hits[0].q_start, hits[0].q_end), (1, 40));
    assert_eq!((hits[0].s_start, hits[0].s_end), (31, 150));
}

#[test]
fn test_tblastn_out_of_frame_keeps_strand_coordinates() {
    let protein = random_protein(121, 40);
    let mut subject = random_dna(122, 30);
    subject.extend_from_slice(&back_translate(&protein));
    subject.extend_from_slice(&random_dna(123, 30));

    let mut options = SearchOptions::tblastn();
    options.out_of_frame = true;
    options.frame_shift_penalty = 15;
    let engine = SearchEngine::new(options, &[aa("q", &protein)]).unwrap();
    let outcome = engine
        .search(&InMemorySource::new(vec![nt("s", &subject)]))
        .unwrap();
    let (_, _, best) = outcome.results.hsps().next().unwrap();
    assert!(best.out_of_frame);
    assert_eq!(best.subject_frame, 1);
    assert_eq!((best.q_start, best.q_end), (0, 40));
    assert_eq!((best.s_start, best.s_end), (30, 150));

    let hits = hits_from_results(Program::Tblastn, &outcome.results, &[40], |_| ("s".to_string(), subject.len()));
    assert_eq!((hits[0].s_start, hits[0].s_end), (31, 150));
}

#[test]
fn test_tblastn_frameshift_stays_one_hsp() {
    let protein = random_protein(124, 80);
    let coding = back_translate(&protein);
    let mut subject = random_dna(125, 30);
    subject.extend_from_slice(&coding[..120]);
    subject.push(b'A');
    subject.extend_from_slice(&coding[120..]);
    subject.extend_from_slice(&random_dna(126, 30));

    let mut options = SearchOptions::tblastn();
    options.out_of_frame = true;
    options.frame_shift_penalty = 15;
    let query = aa("q", &protein);
    let engine = SearchEngine::new(options, &[query.clone()]).unwrap();
    let outcome = engine
        .search(&InMemorySource::new(vec![nt("s", &subject)]))
        .unwrap();

    let m = ScoringMatrix::blosum62();
    let in_frame: i32 = query.residues().iter().map(|&r| m.score(r, r)).sum();
    // chance hits against the other frames score far below either half
    let strong: Vec<_> = outcome
        .results
        .hsps()
        .map(|(_, _, h)| h)
        .filter(|h| h.score > in_frame / 4)
        .collect();
    assert_eq!(strong.len(), 1);
    let hsp = strong[0];
    assert!(hsp.out_of_frame);
    assert_eq!(hsp.subject_frame, 1);
    assert_eq!((hsp.q_start, hsp.q_end), (0, 80));
    assert_eq!((hsp.s_start, hsp.s_end), (30, 271));
    assert_eq!(hsp.score, in_frame - 15);
    let stats = hsp.transcript.as_ref().unwrap().stats();
    assert_eq!((stats.matches, stats.gaps, stats.frame_shifts), (80, 0, 1));
}

#[test]
fn test_blastx_reports_query_frame() {
    let protein = random_protein(131, 40);
    let mut query = random_dna(132, 31);
    query.extend_from_slice(&back_translate(&protein));
    query.extend_from_slice(&random_dna(133, 30));

    let engine = SearchEngine::new(SearchOptions::blastx(), &[nt("q", &query)]).unwrap();
    let outcome = engine
        .search(&InMemorySource::new(vec![aa("s", &protein)]))
        .unwrap();
    let (_, _, best) = outcome.results.hsps().next().unwrap();
    // 31 nt of flank puts the coding run in frame 2
    assert_eq!(best.query_frame, 2);
    assert_eq!((best.s_start, best.s_end), (0, 40));

    let hits = hits_from_results(Program::Blastx, &outcome.results, &[query.len()], |_| ("s".to_string(), 40));
    assert_eq!((hits[0].q_start, hits[0].q_end), (32, 151));
    assert_eq!((hits[0].s_start, hits[0].s_end), (1, 40));
}

#[test]
fn test_tblastx_is_ungapped() {
    let protein = random_protein(141, 40);
    let coding = back_translate(&protein);
    let engine = SearchEngine::new(SearchOptions::tblastx(), &[nt("q", &coding)]).unwrap();
    let outcome = engine
        .search(&InMemorySource::new(vec![nt("s", &coding)]))
        .unwrap();
    assert!(!outcome.results.is_empty());
    assert_eq!(outcome.stats.gapped_extensions, 0);
    let frames: Vec<(i8, i8)> = outcome
        .results
        .hsps()
        .map(|(_, _, h)| (h.query_frame, h.subject_frame))
        .collect();
    assert!(frames.contains(&(1, 1)));
}

#[test]
fn test_alphabet_mismatch_is_a_configuration_error() {
    let err = SearchEngine::new(SearchOptions::blastp(), &[nt("q", b"ACGTACGTACGT")]).unwrap_err();
    assert_eq!(err.kind(), blastcore::ErrorKind::Validation);
}

#[test]
fn test_seg_hides_low_complexity_protein_query() {
    let query = vec![b'Q'; 30];
    let mut subject = random_protein(131, 40);
    subject.extend_from_slice(&query);
    subject.extend_from_slice(&random_protein(132, 40));
    let source = InMemorySource::new(vec![aa("s", &subject)]);

    let mut options = SearchOptions::blastp();
    let unmasked = SearchEngine::new(options.clone(), &[aa("q", &query)]).unwrap();
    assert!(unmasked.search(&source).unwrap().stats.db_hits > 0);

    options.mask_low_complexity = true;
    let masked = SearchEngine::new(options, &[aa("q", &query)]).unwrap();
    assert_eq!(masked.query().masked_count(), 30);
    let outcome = masked.search(&source).unwrap();
    assert_eq!(outcome.stats.db_hits, 0);
    assert!(outcome.results.is_empty());
}
