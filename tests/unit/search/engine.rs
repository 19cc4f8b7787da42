//! Search engine behavior on nucleotide searches

use blastcore::common::hits_from_results;
use blastcore::core::{Program, SearchEngine, SearchOptions};
use blastcore::sequence::{InMemorySource, Sequence};

use super::super::helpers::{nt, random_dna, summarize};

/// A 60-mer query and a subject carrying it at offset 100.
fn embedded(seed: u64) -> (Vec<u8>, Vec<u8>) {
    let query = random_dna(seed, 60);
    let mut subject = random_dna(seed + 1, 100);
    subject.extend_from_slice(&query);
    subject.extend_from_slice(&random_dna(seed + 2, 100));
    (query, subject)
}

fn reverse_complement(text: &[u8]) -> Vec<u8> {
    text.iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            _ => b'A',
        })
        .collect()
}

fn subject_info(subjects: &[Sequence]) -> impl Fn(usize) -> (String, usize) + '_ {
    move |oid| (subjects[oid].id().to_string(), subjects[oid].len())
}

#[test]
fn test_finds_embedded_query() {
    let (query, subject) = embedded(7);
    let engine = SearchEngine::new(SearchOptions::blastn(), &[nt("q", &query)]).unwrap();
    let source = InMemorySource::new(vec![nt("s", &subject)]);
    let outcome = engine.search(&source).unwrap();

    let hits = hits_from_results(Program::Blastn, &outcome.results, &[60], subject_info(source.sequences()));
    let best = &hits[0];
    assert_eq!((best.query_id.as_str(), best.subject_id.as_str()), ("q", "s"));
    assert_eq!((best.q_start, best.q_end), (1, 60));
    assert_eq!((best.s_start, best.s_end), (101, 160));
    assert_eq!(best.length, 60);
    assert_eq!((best.mismatch, best.gapopen), (0, 0));
    assert_eq!(best.identity, 100.0);
    assert_eq!(best.raw_score, 120);
    assert!(best.e_value < 1e-10);
}

#[test]
fn test_minus_strand_hit() {
    let (query, _) = embedded(11);
    let mut subject = random_dna(40, 100);
    subject.extend_from_slice(&reverse_complement(&query));
    subject.extend_from_slice(&random_dna(41, 100));

    let engine = SearchEngine::new(SearchOptions::blastn(), &[nt("q", &query)]).unwrap();
    let source = InMemorySource::new(vec![nt("s", &subject)]);
    let outcome = engine.search(&source).unwrap();

    let (_, _, best) = outcome.results.hsps().next().unwrap();
    assert_eq!(best.context, 1);
    assert_eq!(best.query_frame, -1);

    let hits = hits_from_results(Program::Blastn, &outcome.results, &[60], subject_info(source.sequences()));
    assert_eq!((hits[0].q_start, hits[0].q_end), (60, 1));
    assert_eq!((hits[0].s_start, hits[0].s_end), (101, 160));
}

#[test]
fn test_evalue_threshold_filters_everything() {
    let (query, subject) = embedded(3);
    let mut options = SearchOptions::blastn();
    options.evalue_threshold = 1e-300;
    let engine = SearchEngine::new(options, &[nt("q", &query)]).unwrap();
    let outcome = engine.search(&InMemorySource::new(vec![nt("s", &subject)])).unwrap();
    assert!(outcome.results.is_empty());
}

#[test]
fn test_explicit_cutoff_removes_weaker_hsp() {
    // the query's first 60 bases and its last 30 lie 100 bases apart in
    // the subject: two HSPs scoring about 120 and 60
    let query = random_dna(51, 90);
    let mut subject = random_dna(52, 100);
    subject.extend_from_slice(&query[..60]);
    subject.extend_from_slice(&random_dna(53, 100));
    subject.extend_from_slice(&query[60..]);
    subject.extend_from_slice(&random_dna(54, 100));
    let source = InMemorySource::new(vec![nt("s", &subject)]);

    let run = |cutoff_score: Option<i32>| {
        let mut options = SearchOptions::blastn();
        options.cutoff_score = cutoff_score;
        let engine = SearchEngine::new(options, &[nt("q", &query)]).unwrap();
        let outcome = engine.search(&source).unwrap();
        outcome
            .results
            .hsps()
            .filter(|(_, _, h)| h.context == 0)
            .map(|(_, _, h)| (h.q_start, h.score))
            .collect::<Vec<_>>()
    };

    let open = run(None);
    assert!(open.iter().any(|&(q, score)| q < 60 && score >= 120));
    assert!(open.iter().any(|&(q, score)| q >= 60 && (60..100).contains(&score)));

    let strict = run(Some(100));
    assert_eq!(strict.len(), 1);
    assert!(strict[0].0 < 60 && strict[0].1 >= 120);
}

#[test]
fn test_reported_evalues_respect_threshold() {
    let (query, subject) = embedded(5);
    let mut options = SearchOptions::blastn();
    options.evalue_threshold = 1e-5;
    let engine = SearchEngine::new(options, &[nt("q", &query)]).unwrap();
    let subjects: Vec<Sequence> = (0..5)
        .map(|i| nt(&format!("r{i}"), &random_dna(100 + i, 400)))
        .chain(std::iter::once(nt("s", &subject)))
        .collect();
    let outcome = engine.search(&InMemorySource::new(subjects)).unwrap();
    assert!(!outcome.results.is_empty());
    for (_, _, hsp) in outcome.results.hsps() {
        assert!(hsp.evalue <= 1e-5);
    }
}

#[test]
fn test_two_sequences_matches_single_subject_source() {
    let (query, subject) = embedded(13);
    let engine = SearchEngine::new(SearchOptions::blastn(), &[nt("q", &query)]).unwrap();
    let subject = nt("s", &subject);

    let pair = engine.search_two_sequences(&subject).unwrap();
    let single = engine.search(&InMemorySource::new(vec![subject.clone()])).unwrap();
    assert_eq!(summarize(&pair.results), summarize(&single.results));

    // a larger database inflates the e-value of the same alignment
    let mut sequences: Vec<Sequence> = (0..20)
        .map(|i| nt(&format!("r{i}"), &random_dna(200 + i, 1000)))
        .collect();
    sequences.push(subject);
    let db = engine.search(&InMemorySource::new(sequences)).unwrap();
    let pair_best = pair.results.hsps().next().unwrap().2;
    let db_best = db.results.hsps().next().unwrap().2;
    assert_eq!(pair_best.score, db_best.score);
    assert!(db_best.evalue > pair_best.evalue);
}

#[test]
fn test_empty_source() {
    let (query, _) = embedded(17);
    let engine = SearchEngine::new(SearchOptions::blastn(), &[nt("q", &query)]).unwrap();
    let outcome = engine.search(&InMemorySource::default()).unwrap();
    assert!(outcome.results.is_empty());
    assert_eq!(outcome.stats.subjects_searched, 0);
    assert_eq!(outcome.results.queries().len(), 1);
}

#[test]
fn test_ungapped_search_builds_transcripts() {
    let (query, subject) = embedded(19);
    let mut options = SearchOptions::blastn();
    options.gapped = false;
    let engine = SearchEngine::new(options, &[nt("q", &query)]).unwrap();
    let outcome = engine.search(&InMemorySource::new(vec![nt("s", &subject)])).unwrap();
    let (_, _, best) = outcome.results.hsps().next().unwrap();
    assert_eq!(best.score, 120);
    assert_eq!((best.s_start, best.s_end), (100, 160));
    let t = best.transcript.as_ref().unwrap();
    assert_eq!(t.stats().matches, 60);
    assert_eq!(outcome.stats.gapped_extensions, 0);
}

#[test]
fn test_hitlist_size_keeps_best_subjects() {
    let (query, subject) = embedded(23);
    let mut options = SearchOptions::blastn();
    options.hitlist_size = 2;
    let engine = SearchEngine::new(options, &[nt("q", &query)]).unwrap();
    let subjects: Vec<Sequence> = (0..6).map(|i| nt(&format!("s{i}"), &subject)).collect();
    let outcome = engine.search(&InMemorySource::new(subjects)).unwrap();
    let oids: Vec<usize> = outcome.results.queries()[0].lists.iter().map(|l| l.oid).collect();
    assert_eq!(oids, vec![0, 1]);
}

#[test]
fn test_results_do_not_depend_on_thread_count() {
    let (query, subject) = embedded(29);
    let subjects: Vec<Sequence> = (0..8)
        .map(|i| {
            if i % 3 == 0 {
                nt(&format!("s{i}"), &subject)
            } else {
                nt(&format!("r{i}"), &random_dna(300 + i, 500))
            }
        })
        .collect();
    let source = InMemorySource::new(subjects);

    let serial = SearchEngine::new(SearchOptions::blastn(), &[nt("q", &query)]).unwrap();
    let mut options = SearchOptions::blastn();
    options.num_threads = 4;
    options.db_chunk_size = 1;
    let parallel = SearchEngine::new(options, &[nt("q", &query)]).unwrap();

    let a = serial.search(&source).unwrap();
    let b = parallel.search(&source).unwrap();
    assert_eq!(summarize(&a.results), summarize(&b.results));
    assert_eq!(a.stats.subjects_searched, 8);
    assert_eq!(b.stats.subjects_searched, 8);
}

#[test]
fn test_multiple_queries_are_reported_separately() {
    let (q1, s1) = embedded(31);
    let (q2, s2) = embedded(37);
    let engine = SearchEngine::new(SearchOptions::blastn(), &[nt("a", &q1), nt("b", &q2)]).unwrap();
    let outcome = engine
        .search(&InMemorySource::new(vec![nt("s1", &s1), nt("s2", &s2)]))
        .unwrap();
    let queries = outcome.results.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].query_id, "a");
    assert_eq!(queries[0].lists[0].oid, 0);
    assert_eq!(queries[1].query_id, "b");
    assert_eq!(queries[1].lists[0].oid, 1);
}

#[test]
fn test_progress_reports_every_subject() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let (query, subject) = embedded(41);
    let engine = SearchEngine::new(SearchOptions::blastn(), &[nt("q", &query)]).unwrap();
    let subjects: Vec<Sequence> = (0..5).map(|i| nt(&format!("s{i}"), &subject)).collect();
    let done = AtomicUsize::new(0);
    engine
        .search_with_progress(&InMemorySource::new(subjects), &|n| {
            done.fetch_add(n, Ordering::Relaxed);
        })
        .unwrap();
    assert_eq!(done.load(Ordering::Relaxed), 5);
}

#[test]
fn test_low_complexity_query_gives_no_seeds() {
    let query = b"CAG".repeat(20);
    let mut subject = random_dna(60, 100);
    subject.extend_from_slice(&query);
    subject.extend_from_slice(&random_dna(61, 100));
    let source = InMemorySource::new(vec![nt("s", &subject)]);

    let masked = SearchEngine::new(SearchOptions::blastn(), &[nt("q", &query)]).unwrap();
    assert_eq!(masked.query().masked_count(), 120);
    assert_eq!(masked.lookup().num_entries(), 0);
    let outcome = masked.search(&source).unwrap();
    assert_eq!(outcome.stats.db_hits, 0);
    assert!(outcome.results.is_empty());

    let mut options = SearchOptions::blastn();
    options.mask_low_complexity = false;
    let unmasked = SearchEngine::new(options, &[nt("q", &query)]).unwrap();
    let outcome = unmasked.search(&source).unwrap();
    assert!(outcome.stats.db_hits > 0);
    assert!(!outcome.results.is_empty());
}
