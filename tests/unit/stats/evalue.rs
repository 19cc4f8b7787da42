//! E-values and bit scores

use blastcore::core::blast_parameters::ScoreBlock;
use blastcore::core::{SearchEngine, SearchOptions};
use blastcore::sequence::InMemorySource;
use blastcore::stats::tables::{nucleotide_gapped, protein_gapped};
use blastcore::stats::{bit_score, evalue, raw_score_from_evalue};

use super::super::helpers::{assert_evalue_close, nt, random_dna};

#[test]
fn test_bit_score_formula() {
    let params = protein_gapped("BLOSUM62", 11, 1).unwrap();
    let expected = (params.lambda * 100.0 - params.k.ln()) / 2.0_f64.ln();
    assert!((bit_score(100, &params) - expected).abs() < 1e-9);
}

#[test]
fn test_evalue_scales_with_search_space() {
    let params = nucleotide_gapped(2, -3, 5, 2).unwrap();
    let small = evalue(40, &params, 1e6);
    let large = evalue(40, &params, 1e7);
    assert_evalue_close(large, 10.0 * small, 1e-9);
}

#[test]
fn test_raw_score_threshold_round_trip() {
    let params = nucleotide_gapped(2, -3, 5, 2).unwrap();
    for threshold in [1e-20, 1e-5, 0.1, 10.0] {
        let s = raw_score_from_evalue(threshold, &params, 5e6);
        assert!(evalue(s, &params, 5e6) <= threshold);
        assert!(evalue(s - 1, &params, 5e6) > threshold);
    }
}

#[test]
fn test_unsupported_scoring_system() {
    assert!(nucleotide_gapped(2, -3, 7, 7).is_err());
    assert!(protein_gapped("PAM30", 9, 1).is_err());
}

#[test]
fn test_reported_evalue_uses_context_search_space() {
    let query = random_dna(501, 60);
    let mut subject = random_dna(502, 150);
    subject.extend_from_slice(&query);
    subject.extend_from_slice(&random_dna(503, 150));

    let options = SearchOptions::blastn();
    let kbp = *ScoreBlock::new(&options).unwrap().kbp();
    let engine = SearchEngine::new(options, &[nt("q", &query)]).unwrap();
    let outcome = engine
        .search(&InMemorySource::new(vec![nt("s", &subject)]))
        .unwrap();

    let (_, _, best) = outcome.results.hsps().next().unwrap();
    let mut block = engine.query().clone();
    blastcore::core::blast_parameters::calc_effective_lengths(
        &mut block,
        engine.options(),
        &ScoreBlock::new(engine.options()).unwrap(),
        subject.len() as u64,
        1,
    );
    let space = block.context(best.context).eff_searchsp;
    assert_evalue_close(best.evalue, evalue(best.score, &kbp, space), 1e-12);
    assert!((best.bit_score - bit_score(best.score, &kbp)).abs() < 1e-9);
}
