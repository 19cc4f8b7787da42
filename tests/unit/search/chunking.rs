//! Splitting long subjects into overlapping chunks

use blastcore::core::{SearchEngine, SearchOptions};
use blastcore::sequence::InMemorySource;

use super::super::helpers::{nt, random_dna, summarize, HspSummary};

fn run(query: &[u8], subject: &[u8], chunk: Option<(usize, usize)>) -> Vec<HspSummary> {
    let mut options = SearchOptions::blastn();
    if let Some((max_chunk_length, chunk_overlap)) = chunk {
        options.max_chunk_length = max_chunk_length;
        options.chunk_overlap = chunk_overlap;
    }
    let engine = SearchEngine::new(options, &[nt("q", query)]).unwrap();
    let outcome = engine
        .search(&InMemorySource::new(vec![nt("s", subject)]))
        .unwrap();
    summarize(&outcome.results)
}

fn subject_with(query: &[u8], at: usize, len: usize, seed: u64) -> Vec<u8> {
    let mut subject = random_dna(seed, at);
    subject.extend_from_slice(query);
    subject.extend_from_slice(&random_dna(seed + 1, len - at - query.len()));
    subject
}

#[test]
fn test_hsp_inside_both_chunks_is_kept_once() {
    let query = random_dna(51, 60);
    let subject = subject_with(&query, 130, 320, 52);
    let whole = run(&query, &subject, None);
    let chunked = run(&query, &subject, Some((200, 80)));
    assert!(!whole.is_empty());
    assert_eq!(whole[0].4, 130);
    assert_eq!(chunked, whole);
}

#[test]
fn test_hsp_across_chunk_boundary_is_recovered() {
    let query = random_dna(61, 60);
    let subject = subject_with(&query, 170, 400, 62);
    let whole = run(&query, &subject, None);
    let chunked = run(&query, &subject, Some((200, 80)));
    assert_eq!((whole[0].4, whole[0].5), (170, 230));
    assert_eq!(chunked, whole);
}

#[test]
fn test_many_small_chunks() {
    let query = random_dna(71, 50);
    let subject = subject_with(&query, 700, 1500, 72);
    let whole = run(&query, &subject, None);
    let chunked = run(&query, &subject, Some((120, 60)));
    assert_eq!(chunked, whole);
}

#[test]
fn test_overlap_must_be_shorter_than_chunk() {
    let mut options = SearchOptions::blastn();
    options.max_chunk_length = 100;
    options.chunk_overlap = 100;
    assert!(SearchEngine::new(options, &[nt("q", &random_dna(81, 40))]).is_err());
}
