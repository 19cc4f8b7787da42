//! Query contexts
//!
//! All queries of a search are concatenated into one buffer of
//! *contexts*: one per query for protein queries, two strands per query
//! for blastn and six reading frames per query for translated queries.
//! Seeds carry offsets into this buffer and are mapped back to a context
//! by binary search over the context starts.

use crate::core::blast_options::Program;
use crate::error::{BlastError, BlastResult};
use crate::sequence::translation::{mixed_frame, reverse_complement, six_frames};
use crate::sequence::{Alphabet, Sequence};
use crate::stats::SearchSpace;

#[derive(Debug, Clone, PartialEq)]
pub struct ContextInfo {
    pub query_index: usize,
    /// 0 for protein queries, +1/-1 for nucleotide strands, +-1..3 for
    /// translated frames.
    pub frame: i8,
    /// Start of the context in the concatenated buffer.
    pub offset: usize,
    pub length: usize,
    pub eff_searchsp: f64,
    pub length_adjustment: i64,
}

impl ContextInfo {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Mixed-frame buffers of translated queries, one per query strand, for
/// out-of-frame extension.
#[derive(Debug, Clone, Default)]
pub struct MixedFrameQuery {
    sequence: Vec<u8>,
    /// (offset, length) of strand `2 * query + (frame < 0)`.
    strands: Vec<(usize, usize)>,
}

impl MixedFrameQuery {
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn strand(&self, query_index: usize, frame: i8) -> (usize, usize) {
        self.strands[2 * query_index + usize::from(frame < 0)]
    }

    /// Mixed-frame offset of amino acid `aa` of a frame.
    #[inline]
    pub fn mixed_offset(&self, query_index: usize, frame: i8, aa: usize) -> usize {
        let (base, _) = self.strand(query_index, frame);
        base + aa * 3 + (frame.unsigned_abs() as usize - 1)
    }
}

#[derive(Debug, Clone)]
pub struct QueryBlock {
    program: Program,
    sequence: Vec<u8>,
    contexts: Vec<ContextInfo>,
    ids: Vec<String>,
    /// Lengths of the queries as supplied (nucleotides for translated
    /// queries).
    lengths: Vec<usize>,
    mixed: Option<MixedFrameQuery>,
    /// Positions hidden from the lookup table; empty when unmasked.
    masked: Vec<bool>,
}

impl QueryBlock {
    pub fn new(program: Program, queries: &[Sequence]) -> BlastResult<Self> {
        if queries.is_empty() {
            return Err(BlastError::BadParameter("no query sequences".to_string()));
        }

        let mut block = Self {
            program,
            sequence: Vec::new(),
            contexts: Vec::with_capacity(queries.len() * program.contexts_per_query()),
            ids: Vec::with_capacity(queries.len()),
            lengths: Vec::with_capacity(queries.len()),
            mixed: None,
            masked: Vec::new(),
        };
        let mut mixed = MixedFrameQuery::default();

        for (index, query) in queries.iter().enumerate() {
            if query.alphabet() != program.query_alphabet() {
                return Err(BlastError::Configuration(format!(
                    "query {} is {:?} but {} expects {:?} queries",
                    query.id(),
                    query.alphabet(),
                    program,
                    program.query_alphabet()
                )));
            }
            if query.is_empty() {
                return Err(BlastError::BadParameter(format!(
                    "query {} is empty",
                    query.id()
                )));
            }
            block.ids.push(query.id().to_string());
            block.lengths.push(query.len());

            match program {
                Program::Blastp | Program::Tblastn => {
                    block.push_context(index, 0, query.residues());
                }
                Program::Blastn => {
                    block.push_context(index, 1, query.residues());
                    block.push_context(index, -1, &reverse_complement(query.residues()));
                }
                Program::Blastx | Program::Tblastx => {
                    for frame in six_frames(query.residues()) {
                        block.push_context(index, frame.frame, &frame.residues);
                    }
                    let plus = query.residues();
                    let minus = reverse_complement(plus);
                    for strand in [plus, &minus[..]] {
                        let buf = mixed_frame(strand);
                        mixed.strands.push((mixed.sequence.len(), buf.len()));
                        mixed.sequence.extend_from_slice(&buf);
                    }
                }
            }
        }

        if program.translates_query() {
            block.mixed = Some(mixed);
        }
        Ok(block)
    }

    fn push_context(&mut self, query_index: usize, frame: i8, residues: &[u8]) {
        self.contexts.push(ContextInfo {
            query_index,
            frame,
            offset: self.sequence.len(),
            length: residues.len(),
            eff_searchsp: 0.0,
            length_adjustment: 0,
        });
        self.sequence.extend_from_slice(residues);
    }

    pub fn program(&self) -> Program {
        self.program
    }

    /// Alphabet of the concatenated buffer.
    pub fn alphabet(&self) -> Alphabet {
        self.program.search_alphabet()
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn contexts(&self) -> &[ContextInfo] {
        &self.contexts
    }

    pub fn context(&self, index: usize) -> &ContextInfo {
        &self.contexts[index]
    }

    pub fn context_slice(&self, index: usize) -> &[u8] {
        let ctx = &self.contexts[index];
        &self.sequence[ctx.offset..ctx.end()]
    }

    /// Context containing concatenated offset `offset`.
    pub fn context_of(&self, offset: usize) -> usize {
        self.contexts
            .partition_point(|c| c.offset <= offset)
            .saturating_sub(1)
    }

    pub fn num_queries(&self) -> usize {
        self.ids.len()
    }

    pub fn query_id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    pub fn query_length(&self, index: usize) -> usize {
        self.lengths[index]
    }

    pub fn total_length(&self) -> usize {
        self.sequence.len()
    }

    pub fn max_context_length(&self) -> usize {
        self.contexts.iter().map(|c| c.length).max().unwrap_or(0)
    }

    pub fn mixed_frame(&self) -> Option<&MixedFrameQuery> {
        self.mixed.as_ref()
    }

    /// Hide `[start, end)` of context `index` from seeding. Extension
    /// still sees the residues.
    pub fn mask_range(&mut self, index: usize, start: usize, end: usize) {
        let ctx = &self.contexts[index];
        let (from, to) = (ctx.offset + start, ctx.offset + end.min(ctx.length));
        if from >= to {
            return;
        }
        if self.masked.is_empty() {
            self.masked = vec![false; self.sequence.len()];
        }
        self.masked[from..to].fill(true);
    }

    #[inline]
    pub fn is_masked(&self, offset: usize) -> bool {
        self.masked.get(offset).copied().unwrap_or(false)
    }

    pub fn masked_count(&self) -> usize {
        self.masked.iter().filter(|&&m| m).count()
    }

    pub fn set_search_space(&mut self, index: usize, space: &SearchSpace) {
        let ctx = &mut self.contexts[index];
        ctx.eff_searchsp = space.effective_space;
        ctx.length_adjustment = space.length_adjustment;
    }

    /// Largest effective search space over all contexts.
    pub fn max_search_space(&self) -> f64 {
        self.contexts
            .iter()
            .map(|c| c.eff_searchsp)
            .fold(0.0, f64::max)
    }
}
