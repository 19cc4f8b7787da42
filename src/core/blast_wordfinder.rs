//! Word finder
//!
//! Scans one subject (or subject chunk) against the lookup table in
//! batches of offset pairs, filters hits through the diagonal table and
//! runs ungapped x-drop extension on the survivors. Extensions reaching
//! the word cutoff become initial HSPs for the gapped stage.
//!
//! A batch holds at most `max_pairs` pairs; a lookup chain longer than
//! the free space is left for the next batch, and the scratch is sized
//! so that the longest chain always fits on its own.

use crate::core::blast_extend::{ungapped_extend, DiagTable, HitAction, UngappedData};
use crate::core::blast_lookup::{LookupKind, LookupTable, OffsetPair};
use crate::core::blast_nalookup::exact_match_extend;
use crate::core::blast_parameters::WordParams;
use crate::core::query_info::QueryBlock;
use crate::error::{try_filled_vec, BlastResult};
use crate::utils::ScoringMatrix;

/// Offset pairs gathered per scan batch (grown to the longest chain).
pub const OFFSET_ARRAY_SIZE: usize = 4096;

/// A seed that survived ungapped extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialHsp {
    pub context: usize,
    /// Word hit, concatenated query offset.
    pub q_off: usize,
    pub s_off: usize,
    /// Ungapped extension; `q_start` is a concatenated query offset.
    pub ungapped: UngappedData,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordFinderStats {
    pub db_hits: u64,
    pub init_extends: u64,
    pub good_init_extends: u64,
}

impl WordFinderStats {
    pub fn add(&mut self, other: &WordFinderStats) {
        self.db_hits += other.db_hits;
        self.init_extends += other.init_extends;
        self.good_init_extends += other.good_init_extends;
    }
}

/// Per-worker buffers reused across subjects and chunks.
#[derive(Debug, Clone)]
pub struct WordFinderScratch {
    pub diag: DiagTable,
    pairs: Vec<OffsetPair>,
    max_pairs: usize,
}

impl WordFinderScratch {
    pub fn new(query: &QueryBlock, lookup: &LookupTable, window_size: usize) -> BlastResult<Self> {
        let max_pairs = OFFSET_ARRAY_SIZE.max(lookup.longest_chain());
        let mut pairs = try_filled_vec(max_pairs, OffsetPair { q_off: 0, s_off: 0 }, "offset pairs")?;
        pairs.clear();
        Ok(Self {
            diag: DiagTable::new(query.total_length(), window_size)?,
            pairs,
            max_pairs,
        })
    }
}

/// Find, filter and extend the seeds of `subject`. `hits` is cleared and
/// refilled.
///
/// For every word hit, in subject order:
///
/// 1. Megablast hits are first widened to a full `word_size` exact match
///    around the indexed word; hits that cannot be widened are dropped.
/// 2. The diagonal table decides whether the hit triggers an extension:
///    one-hit seeding extends every hit not already covered by an
///    earlier extension on its diagonal, two-hit seeding needs a second
///    non-overlapping hit within `window_size`.
/// 3. The hit is extended without gaps in its query context with
///    `params.x_dropoff`. Extensions reaching `params.cutoff_score` are
///    pushed to `hits`, with `ungapped.q_start` moved to a concatenated
///    offset.
///
/// The diagonal table is advanced past `subject` before returning, so the
/// same scratch can serve the next subject or chunk. `subject` is in the
/// search alphabet: translated subjects are passed one frame at a time.
pub fn word_finder(
    subject: &[u8],
    query: &QueryBlock,
    lookup: &LookupTable,
    matrix: &ScoringMatrix,
    params: &WordParams,
    scratch: &mut WordFinderScratch,
    hits: &mut Vec<InitialHsp>,
) -> WordFinderStats {
    hits.clear();
    let mut stats = WordFinderStats::default();
    let word_size = lookup.word_size();
    let lut_word = lookup.lut_word_length();
    let megablast = lookup.kind() == LookupKind::Megablast;

    let mut start = 0;
    while start < subject.len() {
        scratch.pairs.clear();
        start = lookup.scan_subject(subject, start, &mut scratch.pairs, scratch.max_pairs);
        stats.db_hits += scratch.pairs.len() as u64;

        for pair in &scratch.pairs {
            let mut q_off = pair.q_off as usize;
            let mut s_off = pair.s_off as usize;
            let context = query.context_of(q_off);
            let ctx = query.context(context);
            let q_ctx = query.context_slice(context);

            if megablast {
                match exact_match_extend(q_ctx, subject, q_off - ctx.offset, s_off, lut_word, word_size) {
                    Some((q, s)) => {
                        q_off = ctx.offset + q;
                        s_off = s;
                    }
                    None => continue,
                }
            }

            if scratch.diag.register_hit(q_off, s_off, s_off + word_size, word_size) == HitAction::Skip {
                continue;
            }

            stats.init_extends += 1;
            let mut data = ungapped_extend(
                q_ctx,
                subject,
                q_off - ctx.offset,
                s_off,
                matrix,
                params.x_dropoff,
            );
            let saved = data.score >= params.cutoff_score;
            scratch
                .diag
                .record_extension(q_off, s_off, data.s_end(), saved);
            if saved {
                stats.good_init_extends += 1;
                data.q_start += ctx.offset;
                hits.push(InitialHsp {
                    context,
                    q_off,
                    s_off,
                    ungapped: data,
                });
            }
        }
    }

    scratch.diag.advance(subject.len());
    stats
}
