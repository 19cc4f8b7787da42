//! Effective lengths per query context

use blastcore::core::blast_parameters::{calc_effective_lengths, ScoreBlock};
use blastcore::core::query_info::QueryBlock;
use blastcore::core::{Program, SearchOptions};
use blastcore::stats::tables::protein_gapped;
use blastcore::stats::SearchSpace;

use super::super::helpers::{aa, nt, random_dna, random_protein};

#[test]
fn test_length_adjustment_shrinks_space() {
    let params = protein_gapped("BLOSUM62", 11, 1).unwrap();
    let s = SearchSpace::with_length_adjustment(300, 1_000_000, 1000, &params, true);
    assert!(s.length_adjustment > 0);
    assert!(s.effective_space < 300.0 * 1_000_000.0);
    assert_eq!(s.effective_query_len, 300.0 - s.length_adjustment as f64);
}

#[test]
fn test_larger_database_larger_space() {
    let params = protein_gapped("BLOSUM62", 11, 1).unwrap();
    let small = SearchSpace::with_length_adjustment(300, 100_000, 100, &params, true);
    let large = SearchSpace::with_length_adjustment(300, 10_000_000, 100, &params, true);
    assert!(large.effective_space > small.effective_space);
}

#[test]
fn test_every_context_gets_a_space() {
    let options = SearchOptions::blastn();
    let sbp = ScoreBlock::new(&options).unwrap();
    let mut block = QueryBlock::new(Program::Blastn, &[nt("q", &random_dna(601, 200))]).unwrap();
    calc_effective_lengths(&mut block, &options, &sbp, 50_000, 10);
    assert_eq!(block.contexts().len(), 2);
    for ctx in block.contexts() {
        assert!(ctx.eff_searchsp > 0.0);
        assert!(ctx.length_adjustment >= 0);
    }
    assert_eq!(block.context(0).eff_searchsp, block.context(1).eff_searchsp);
}

#[test]
fn test_translated_subject_counts_codons() {
    let options = SearchOptions::tblastn();
    let sbp = ScoreBlock::new(&options).unwrap();
    let query = aa("q", &random_protein(602, 120));

    let mut translated = QueryBlock::new(Program::Tblastn, &[query.clone()]).unwrap();
    calc_effective_lengths(&mut translated, &options, &sbp, 300_000, 10);

    let blastp = SearchOptions::blastp();
    let mut direct = QueryBlock::new(Program::Blastp, &[query]).unwrap();
    calc_effective_lengths(&mut direct, &blastp, &sbp, 100_000, 10);

    assert_eq!(translated.context(0).eff_searchsp, direct.context(0).eff_searchsp);
}
