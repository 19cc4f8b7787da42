//! Search engine
//!
//! Drives the per-subject pipeline over a sequence source: for each
//! subject, each reading frame and each length-bounded chunk it runs the
//! word finder, the gapped (or ungapped) stage and the e-value filter,
//! then folds chunk results back into one HSP list per subject. Subjects
//! are spread over a rayon pool through a shared work queue. Once every
//! subject is done the result set is sorted and, for gapped searches,
//! traced back.

use std::borrow::Cow;
use std::sync::Mutex;

use log::{debug, info, warn};
use rayon::ThreadPoolBuilder;

use crate::core::blast_diagnostics::{
    diagnostics_enabled, ReturnStats, SearchDiagnostics, XDropValues,
};
use crate::core::blast_filter::mask_query;
use crate::core::blast_frames::SubjectMixedFrames;
use crate::core::blast_gapalign::{gapped_extend_hits, GapAlignScratch, GappedStats, SubjectChunk};
use crate::core::blast_hits::{Hsp, HspList, ResultSet};
use crate::core::blast_lookup::LookupTable;
use crate::core::blast_options::SearchOptions;
use crate::core::blast_parameters::{calc_effective_lengths, ScoreBlock, SearchParameters};
use crate::core::blast_traceback::{run_traceback, ungapped_transcript};
use crate::core::blast_wordfinder::{word_finder, InitialHsp, WordFinderScratch};
use crate::core::query_info::QueryBlock;
use crate::core::work_queue::WorkQueue;
use crate::error::{BlastError, BlastResult};
use crate::sequence::translation::six_frames;
use crate::sequence::{database_totals, Sequence, SequenceSource};

/// What a search hands back.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: ResultSet,
    pub stats: ReturnStats,
    /// HSPs dropped because their traceback failed.
    pub warnings: u64,
}

/// Per-worker buffers.
struct WorkerScratch {
    word_finder: WordFinderScratch,
    gap_align: GapAlignScratch,
    hits: Vec<InitialHsp>,
}

/// Everything one search shares between its workers.
struct SearchContext<'a, S: ?Sized> {
    query: &'a QueryBlock,
    params: &'a SearchParameters,
    source: &'a S,
    queue: &'a WorkQueue,
    results: &'a Mutex<ResultSet>,
    diagnostics: &'a SearchDiagnostics,
    progress: &'a (dyn Fn(usize) + Sync),
}

/// One subject served as a source of its own.
struct SingleSubject<'a>(&'a Sequence);

impl SequenceSource for SingleSubject<'_> {
    fn get_sequence(&self, oid: usize) -> Option<Cow<'_, Sequence>> {
        (oid == 0).then_some(Cow::Borrowed(self.0))
    }

    fn sequence_count(&self) -> usize {
        1
    }

    fn max_sequence_length(&self) -> usize {
        self.0.len()
    }
}

/// A query block indexed and ready to be searched against any number of
/// sources.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    options: SearchOptions,
    query: QueryBlock,
    sbp: ScoreBlock,
    lookup: LookupTable,
}

impl SearchEngine {
    pub fn new(options: SearchOptions, queries: &[Sequence]) -> BlastResult<Self> {
        options.validate()?;
        let mut query = QueryBlock::new(options.program, queries)?;
        mask_query(&mut query, &options);
        let sbp = ScoreBlock::new(&options)?;
        let lookup = LookupTable::new(&query, &options, &sbp.matrix)?;
        debug!(
            "{}: {} queries, {} contexts, {} lookup entries (longest chain {})",
            options.program,
            query.num_queries(),
            query.contexts().len(),
            lookup.num_entries(),
            lookup.longest_chain()
        );
        Ok(Self {
            options,
            query,
            sbp,
            lookup,
        })
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn query(&self) -> &QueryBlock {
        &self.query
    }

    pub fn lookup(&self) -> &LookupTable {
        &self.lookup
    }

    /// Search every sequence of `source`.
    pub fn search<S: SequenceSource + ?Sized>(&self, source: &S) -> BlastResult<SearchOutcome> {
        self.search_with_progress(source, &|_| {})
    }

    /// Search every sequence of `source`, reporting the number of
    /// subjects finished after each claimed range.
    pub fn search_with_progress<S: SequenceSource + ?Sized>(
        &self,
        source: &S,
        progress: &(dyn Fn(usize) + Sync),
    ) -> BlastResult<SearchOutcome> {
        let (db_length, db_num_seqs) = database_totals(source);
        let mut query = self.query.clone();
        calc_effective_lengths(&mut query, &self.options, &self.sbp, db_length, db_num_seqs);
        let params = SearchParameters::new(&self.options, &query, self.sbp.clone());

        info!(
            "{} search: {} subjects, {} residues, {} threads",
            self.options.program,
            db_num_seqs,
            db_length,
            self.options.num_threads
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.options.num_threads)
            .build()
            .map_err(|e| BlastError::Resource(format!("thread pool: {e}")))?;

        let diagnostics = SearchDiagnostics::new();
        let results = Mutex::new(ResultSet::new(&query, params.hit.hitlist_size));
        let queue = WorkQueue::new(source.sequence_count(), self.options.db_chunk_size);
        let first_error: Mutex<Option<BlastError>> = Mutex::new(None);

        let ctx = SearchContext {
            query: &query,
            params: &params,
            source,
            queue: &queue,
            results: &results,
            diagnostics: &diagnostics,
            progress,
        };

        pool.install(|| {
            rayon::scope(|s| {
                for _ in 0..self.options.num_threads {
                    s.spawn(|_| {
                        if let Err(e) = self.worker(&ctx) {
                            queue.abort();
                            if let Ok(mut slot) = first_error.lock() {
                                slot.get_or_insert(e);
                            }
                        }
                    });
                }
            });
        });

        let first_error = first_error
            .into_inner()
            .map_err(|_| BlastError::Internal("error slot poisoned".to_string()))?;
        if let Some(e) = first_error {
            return Err(e);
        }

        let mut results = results
            .into_inner()
            .map_err(|_| BlastError::Internal("result set poisoned".to_string()))?;
        results.sort_results();

        let mut warnings = 0;
        if self.options.gapped {
            let stats = pool.install(|| run_traceback(&mut results, &query, source, &params));
            if stats.failures > 0 {
                warn!("{} HSPs dropped during traceback", stats.failures);
            }
            diagnostics.add_traceback(&stats);
            warnings = stats.failures;
        }

        let stats = diagnostics.snapshot(XDropValues {
            ungapped: params.word.x_dropoff,
            gapped: params.ext.gap_x_dropoff,
            gapped_final: params.ext.gap_x_dropoff_final,
        });
        if diagnostics_enabled() {
            stats.log_summary(self.options.program.name());
        }
        info!(
            "{} search done: {} HSPs from {} subjects",
            self.options.program,
            results.num_hsps(),
            stats.subjects_searched
        );

        Ok(SearchOutcome {
            results,
            stats,
            warnings,
        })
    }

    /// Run the same pipeline against one subject. Effective lengths are
    /// computed from that subject alone.
    pub fn search_two_sequences(&self, subject: &Sequence) -> BlastResult<SearchOutcome> {
        self.search(&SingleSubject(subject))
    }

    fn worker<S: SequenceSource + ?Sized>(&self, ctx: &SearchContext<'_, S>) -> BlastResult<()> {
        let mut scratch = WorkerScratch {
            word_finder: WordFinderScratch::new(ctx.query, &self.lookup, ctx.params.word.window_size)?,
            gap_align: GapAlignScratch::new(),
            hits: Vec::new(),
        };
        let subject_alphabet = self.options.program.subject_alphabet();

        while let Some(range) = ctx.queue.next_range() {
            let claimed = range.len();
            for oid in range {
                if ctx.queue.is_aborted() {
                    return Ok(());
                }
                let Some(subject) = ctx.source.get_sequence(oid) else {
                    warn!("subject {oid} is unavailable, skipped");
                    ctx.diagnostics.subject_skipped();
                    continue;
                };
                if subject.alphabet() != subject_alphabet {
                    warn!(
                        "subject {} is {:?}, {} needs {:?}; skipped",
                        subject.id(),
                        subject.alphabet(),
                        self.options.program,
                        subject_alphabet
                    );
                    ctx.diagnostics.subject_skipped();
                    continue;
                }

                let list = self.search_subject(oid, &subject, ctx, &mut scratch)?;
                ctx.diagnostics.subject_searched();
                debug!("subject {} ({oid}): {} HSPs", subject.id(), list.len());
                if !list.is_empty() {
                    ctx.results
                        .lock()
                        .map_err(|_| BlastError::Internal("result set poisoned".to_string()))?
                        .save_hitlist(list);
                }
            }
            (ctx.progress)(claimed);
        }
        Ok(())
    }

    /// All frames and chunks of one subject, merged into one list.
    fn search_subject<S: SequenceSource + ?Sized>(
        &self,
        oid: usize,
        subject: &Sequence,
        ctx: &SearchContext<'_, S>,
        scratch: &mut WorkerScratch,
    ) -> BlastResult<HspList> {
        let mut combined = HspList::new(oid);
        if self.options.program.translates_subject() {
            let mixed = self
                .options
                .out_of_frame
                .then(|| SubjectMixedFrames::new(subject.residues()));
            for frame in six_frames(subject.residues()) {
                if frame.residues.is_empty() {
                    continue;
                }
                let strand = mixed.as_ref().map(|m| m.strand(frame.frame));
                let list = self.search_frame(&frame.residues, frame.frame, strand, ctx, scratch)?;
                combined.append(list);
            }
        } else {
            combined.append(self.search_frame(subject.residues(), 0, None, ctx, scratch)?);
        }
        combined.oid = oid;
        combined.sort_by_score();
        Ok(combined)
    }

    /// Split one frame into overlapping chunks and merge their HSPs.
    fn search_frame<S: SequenceSource + ?Sized>(
        &self,
        residues: &[u8],
        frame: i8,
        mixed: Option<&[u8]>,
        ctx: &SearchContext<'_, S>,
        scratch: &mut WorkerScratch,
    ) -> BlastResult<HspList> {
        let max_chunk = self.options.max_chunk_length;
        let overlap = self.options.chunk_overlap;

        let mut combined = HspList::default();
        let mut start = 0;
        loop {
            let end = (start + max_chunk).min(residues.len());
            let chunk = SubjectChunk {
                residues: &residues[start..end],
                frame,
                offset: start,
                mixed,
            };
            let mut list = self.search_chunk(&chunk, ctx, scratch);
            list.adjust_offsets(start);
            if start == 0 {
                combined = list;
            } else {
                combined.merge_chunk(list, start, start + overlap);
            }

            if end >= residues.len() {
                break;
            }
            start = end - overlap;
        }
        Ok(combined)
    }

    fn search_chunk<S: SequenceSource + ?Sized>(
        &self,
        chunk: &SubjectChunk,
        ctx: &SearchContext<'_, S>,
        scratch: &mut WorkerScratch,
    ) -> HspList {
        let params = ctx.params;
        let stats = word_finder(
            chunk.residues,
            ctx.query,
            &self.lookup,
            &params.sbp.matrix,
            &params.word,
            &mut scratch.word_finder,
            &mut scratch.hits,
        );
        ctx.diagnostics.add_word_finder(&stats);

        let mut list = if self.options.gapped {
            let mut gapped = GappedStats::default();
            let list = gapped_extend_hits(
                ctx.query,
                chunk,
                &mut scratch.hits,
                params,
                self.options.extension_method,
                self.options.out_of_frame,
                &mut scratch.gap_align,
                &mut gapped,
            );
            ctx.diagnostics.add_gapped(&gapped);
            list
        } else {
            ungapped_hsps(ctx.query, chunk, &scratch.hits)
        };

        list.calculate_evalues(ctx.query, params.sbp.kbp());
        ctx.diagnostics
            .add_reaped(list.reap(params.hit.cutoff_score, params.evalue_threshold));
        list
    }
}

/// HSPs of an ungapped search, one per seed extension.
fn ungapped_hsps(query: &QueryBlock, chunk: &SubjectChunk, hits: &[InitialHsp]) -> HspList {
    let mut list = HspList::default();
    for hit in hits {
        let ctx = query.context(hit.context);
        let seg = &hit.ungapped;
        let q_start = seg.q_start - ctx.offset;
        let q_end = q_start + seg.length;
        let q = &query.context_slice(hit.context)[q_start..q_end];
        let s = &chunk.residues[seg.s_start..seg.s_end()];
        list.hsps.push(Hsp {
            context: hit.context,
            query_index: ctx.query_index,
            query_frame: ctx.frame,
            subject_frame: chunk.frame,
            q_start,
            q_end,
            s_start: seg.s_start,
            s_end: seg.s_end(),
            q_gapped_start: q_start,
            s_gapped_start: seg.s_start,
            score: seg.score,
            bit_score: 0.0,
            evalue: f64::INFINITY,
            out_of_frame: false,
            transcript: Some(ungapped_transcript(q, s)),
        });
    }
    list.purge_common_endpoints();
    list
}
