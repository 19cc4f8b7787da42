//! Traceback pass
//!
//! Runs once over the HSPs that survived the preliminary search. Each HSP
//! is re-extended from its gapped start with the final x-drop, and the
//! window the extension covers is aligned exactly with the banded
//! Needleman-Wunsch aligner to obtain the transcript and final score.
//! Out-of-frame HSPs are aligned over the whole strand instead, with
//! codon steps of 2 and 4 nucleotides allowed at the frameshift penalty,
//! so one HSP may cross reading frames.
//! A failure on one HSP drops that HSP only.

use log::warn;
use rayon::prelude::*;

use crate::align::{NwAligner, Transcript, TranscriptOp};
use crate::core::blast_frames::{SubjectMixedFrames, CODON_LENGTH};
use crate::core::blast_gapalign::{
    dynprog_extend, oof_extend, GapAlignScratch, GappedExtension, MININT,
};
use crate::core::blast_hits::{Hsp, HspList, ResultSet};
use crate::core::blast_options::Program;
use crate::core::blast_parameters::{ExtensionParams, SearchParameters};
use crate::core::query_info::QueryBlock;
use crate::error::{try_filled_vec, BlastError, BlastResult};
use crate::sequence::translation::{frame_to_context, translate_frame};
use crate::sequence::SequenceSource;
use crate::utils::ScoringMatrix;

/// Band around the main diagonal of a window, on top of the length
/// difference of its two sides.
pub const TRACEBACK_BAND_SLACK: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracebackStats {
    pub failures: u64,
    pub reaped: u64,
}

impl TracebackStats {
    fn add(mut self, other: TracebackStats) -> Self {
        self.failures += other.failures;
        self.reaped += other.reaped;
        self
    }
}

/// Transcript of an ungapped segment.
pub fn ungapped_transcript(query: &[u8], subject: &[u8]) -> Transcript {
    query
        .iter()
        .zip(subject)
        .map(|(q, s)| {
            if q == s {
                TranscriptOp::Match
            } else {
                TranscriptOp::Replace
            }
        })
        .collect()
}

/// Exact global alignment of a window. Gap costs are positive.
pub fn align_window(
    a: &[u8],
    b: &[u8],
    matrix: &ScoringMatrix,
    ext: &ExtensionParams,
) -> BlastResult<(i32, Transcript)> {
    let mut nw = NwAligner::with_matrix(a, b, matrix)?;
    nw.set_scores(0, 0, -ext.gap_open, -ext.gap_extend);
    nw.set_band(Some(a.len().abs_diff(b.len()) + TRACEBACK_BAND_SLACK))?;
    let score = nw.run()?;
    Ok((score, nw.transcript().clone()))
}

// Backtrace byte of the out-of-frame window: bits 0-2 hold the move into
// the cell, bits 3 and 4 whether its gap states continued a gap.
const TB_CODON: u8 = 0;
const TB_SHIFT_BACK: u8 = 1;
const TB_SHIFT_FORWARD: u8 = 2;
const TB_UP: u8 = 3;
const TB_LEFT: u8 = 4;
const TB_MOVE: u8 = 0b111;
const TB_UP_EXTENDED: u8 = 1 << 3;
const TB_LEFT_EXTENDED: u8 = 1 << 4;

/// Diagonal moves: nucleotides consumed, backtrace code, pays the
/// frameshift penalty. Listed in tie-break order.
const CODON_STEPS: [(usize, u8, bool); 3] = [
    (CODON_LENGTH, TB_CODON, false),
    (CODON_LENGTH - 1, TB_SHIFT_BACK, true),
    (CODON_LENGTH + 1, TB_SHIFT_FORWARD, true),
];

/// Exact global alignment of `protein` against strand nucleotides
/// `b_start..b_end`, read through the mixed-frame buffer `mixed` of the
/// strand. Ops are given with the protein as the first sequence: `Delete`
/// is a residue against nothing, `Insert` a codon against nothing.
pub fn oof_align_window(
    protein: &[u8],
    mixed: &[u8],
    b_start: usize,
    b_end: usize,
    matrix: &ScoringMatrix,
    ext: &ExtensionParams,
) -> BlastResult<(i32, Transcript)> {
    let (rows, cols) = (protein.len() + 1, b_end.saturating_sub(b_start) + 1);
    let cells = rows.checked_mul(cols).ok_or_else(|| {
        BlastError::Resource(format!("out-of-frame window of {rows} x {cols} cells"))
    })?;
    let mut tb = try_filled_vec(cells, 0u8, "out-of-frame traceback")?;
    let goe = ext.gap_open + ext.gap_extend;

    let mut v_prev = try_filled_vec(cols, MININT, "out-of-frame row")?;
    let mut up_prev = v_prev.clone();
    let mut v_cur = v_prev.clone();
    let mut up_cur = v_prev.clone();
    let mut left_cur = v_prev.clone();

    // row 0: codons against nothing
    for p in (0..cols).step_by(CODON_LENGTH) {
        v_cur[p] = if p == 0 {
            0
        } else {
            -(ext.gap_open + ext.gap_extend * (p / CODON_LENGTH) as i32)
        };
        left_cur[p] = v_cur[p];
        if p > CODON_LENGTH {
            tb[p] = TB_LEFT | TB_LEFT_EXTENDED;
        } else if p > 0 {
            tb[p] = TB_LEFT;
        }
    }

    for i in 1..rows {
        std::mem::swap(&mut v_prev, &mut v_cur);
        std::mem::swap(&mut up_prev, &mut up_cur);
        let residue = protein[i - 1];
        let row = i * cols;

        for p in 0..cols {
            let mut code = 0u8;

            let up_open = v_prev[p] - goe;
            let up_ext = up_prev[p] - ext.gap_extend;
            if up_ext > up_open {
                code |= TB_UP_EXTENDED;
            }
            let up = up_open.max(up_ext).max(MININT);

            let mut left = MININT;
            if p >= CODON_LENGTH {
                let open = v_cur[p - CODON_LENGTH] - goe;
                let extend = left_cur[p - CODON_LENGTH] - ext.gap_extend;
                if extend > open {
                    code |= TB_LEFT_EXTENDED;
                }
                left = open.max(extend).max(MININT);
            }

            let mut best = MININT;
            let mut from = TB_UP;
            for (step, tb_code, shifted) in CODON_STEPS {
                if p < step || v_prev[p - step] == MININT {
                    continue;
                }
                let Some(&codon) = mixed.get(b_start + p - step) else {
                    continue;
                };
                let penalty = if shifted { ext.frame_shift_penalty } else { 0 };
                let score = v_prev[p - step] + matrix.score(residue, codon) - penalty;
                if score > best {
                    best = score;
                    from = tb_code;
                }
            }
            if up > best {
                best = up;
                from = TB_UP;
            }
            if left > best {
                best = left;
                from = TB_LEFT;
            }

            v_cur[p] = best;
            up_cur[p] = up;
            left_cur[p] = left;
            tb[row + p] = code | from;
        }
    }

    let score = v_cur[cols - 1];
    if score == MININT {
        return Err(BlastError::Internal(
            "no codon path through the out-of-frame window".to_string(),
        ));
    }

    enum State {
        Diag,
        Up,
        Left,
    }
    let mut ops = Vec::with_capacity(rows + cols / CODON_LENGTH);
    let (mut i, mut p) = (rows - 1, cols - 1);
    let mut state = State::Diag;
    while i > 0 || p > 0 {
        let code = tb[i * cols + p];
        match state {
            State::Diag => match code & TB_MOVE {
                TB_UP => state = State::Up,
                TB_LEFT => state = State::Left,
                tb_code => {
                    let (step, shift) = match tb_code {
                        TB_SHIFT_BACK => (CODON_LENGTH - 1, Some(TranscriptOp::FrameShiftBack)),
                        TB_SHIFT_FORWARD => {
                            (CODON_LENGTH + 1, Some(TranscriptOp::FrameShiftForward))
                        }
                        _ => (CODON_LENGTH, None),
                    };
                    if i == 0 || p < step {
                        break;
                    }
                    ops.extend(shift);
                    ops.push(if mixed.get(b_start + p - step) == Some(&protein[i - 1]) {
                        TranscriptOp::Match
                    } else {
                        TranscriptOp::Replace
                    });
                    i -= 1;
                    p -= step;
                }
            },
            State::Up => {
                if i == 0 {
                    break;
                }
                ops.push(TranscriptOp::Delete);
                if code & TB_UP_EXTENDED == 0 {
                    state = State::Diag;
                }
                i -= 1;
            }
            State::Left => {
                if p < CODON_LENGTH {
                    break;
                }
                ops.push(TranscriptOp::Insert);
                if code & TB_LEFT_EXTENDED == 0 {
                    state = State::Diag;
                }
                p -= CODON_LENGTH;
            }
        }
    }
    if i > 0 || p > 0 {
        return Err(BlastError::Internal(format!(
            "out-of-frame backtrace stopped at ({i}, {p})"
        )));
    }
    ops.reverse();
    Ok((score, Transcript::new(ops)))
}

/// Subject frames translated on first use.
struct SubjectFrames<'a> {
    nucleotides: &'a [u8],
    translated: [Option<Vec<u8>>; 6],
    mixed: Option<SubjectMixedFrames>,
}

impl<'a> SubjectFrames<'a> {
    fn new(nucleotides: &'a [u8]) -> Self {
        Self {
            nucleotides,
            translated: Default::default(),
            mixed: None,
        }
    }

    fn frame(&mut self, frame: i8) -> &[u8] {
        let nucleotides = self.nucleotides;
        self.translated[frame_to_context(frame)]
            .get_or_insert_with(|| translate_frame(nucleotides, frame))
    }

    fn mixed_strand(&mut self, frame: i8) -> &[u8] {
        let nucleotides = self.nucleotides;
        self.mixed
            .get_or_insert_with(|| SubjectMixedFrames::new(nucleotides))
            .strand(frame)
    }
}

fn extend_window(
    q: &[u8],
    s: &[u8],
    q_gs: usize,
    s_gs: usize,
    params: &SearchParameters,
    scratch: &mut GapAlignScratch,
) -> BlastResult<(GappedExtension, i32, Transcript)> {
    if q_gs >= q.len() || s_gs >= s.len() {
        return Err(BlastError::Internal(format!(
            "gapped start ({q_gs}, {s_gs}) outside sequences of length {} and {}",
            q.len(),
            s.len()
        )));
    }
    let e = dynprog_extend(
        q,
        s,
        q_gs,
        s_gs,
        &params.sbp.matrix,
        &params.ext,
        params.ext.gap_x_dropoff_final,
        scratch,
    );
    if e.q_start == e.q_end || e.s_start == e.s_end {
        return Err(BlastError::Internal("empty traceback window".to_string()));
    }
    let (score, transcript) = align_window(
        &q[e.q_start..e.q_end],
        &s[e.s_start..e.s_end],
        &params.sbp.matrix,
        &params.ext,
    )?;
    Ok((e, score, transcript))
}

fn traceback_in_frame(
    hsp: &mut Hsp,
    query: &QueryBlock,
    frames: &mut Option<SubjectFrames>,
    subject: &[u8],
    params: &SearchParameters,
    scratch: &mut GapAlignScratch,
) -> BlastResult<()> {
    let q = query.context_slice(hsp.context);
    let s = match frames {
        Some(f) => f.frame(hsp.subject_frame),
        None => subject,
    };
    let (e, score, transcript) =
        extend_window(q, s, hsp.q_gapped_start, hsp.s_gapped_start, params, scratch)?;
    hsp.q_start = e.q_start;
    hsp.q_end = e.q_end;
    hsp.s_start = e.s_start;
    hsp.s_end = e.s_end;
    hsp.score = score;
    hsp.transcript = Some(transcript);
    Ok(())
}

/// Re-extend from the stored gapped start over the mixed-frame strand,
/// then align the window. In the result `q_*` are protein offsets and
/// `s_*` strand nucleotide offsets.
fn oof_window(
    protein: &[u8],
    strand: &[u8],
    a0: usize,
    b0: usize,
    params: &SearchParameters,
    scratch: &mut GapAlignScratch,
) -> BlastResult<(GappedExtension, i32, Transcript)> {
    if a0 >= protein.len() || b0 >= strand.len() {
        return Err(BlastError::Internal(format!(
            "gapped start ({a0}, {b0}) outside protein of length {} and strand of {} codons",
            protein.len(),
            strand.len()
        )));
    }
    let e = oof_extend(
        protein,
        strand,
        a0,
        b0,
        &params.sbp.matrix,
        &params.ext,
        params.ext.gap_x_dropoff_final,
        scratch,
    );
    if e.q_start == e.q_end || e.s_start == e.s_end {
        return Err(BlastError::Internal("empty traceback window".to_string()));
    }
    let (score, transcript) = oof_align_window(
        &protein[e.q_start..e.q_end],
        strand,
        e.s_start,
        e.s_end,
        &params.sbp.matrix,
        &params.ext,
    )?;
    Ok((e, score, transcript))
}

/// Frame of a strand offset, signed like `strand_frame`.
fn frame_at(strand_frame: i8, offset: usize) -> i8 {
    strand_frame.signum() * ((offset % CODON_LENGTH) as i8 + 1)
}

/// Out-of-frame HSPs keep nucleotide coordinates on the translated side
/// and take the frame their first codon lies in.
fn traceback_out_of_frame(
    hsp: &mut Hsp,
    query: &QueryBlock,
    frames: &mut Option<SubjectFrames>,
    subject: &[u8],
    params: &SearchParameters,
    scratch: &mut GapAlignScratch,
) -> BlastResult<()> {
    match query.program() {
        Program::Blastx => {
            let ctx = query.context(hsp.context);
            let mixed = query
                .mixed_frame()
                .ok_or_else(|| BlastError::Internal("query has no mixed frames".to_string()))?;
            let (base, len) = mixed.strand(ctx.query_index, ctx.frame);
            let strand = &mixed.sequence()[base..base + len];
            let (e, score, transcript) =
                oof_window(subject, strand, hsp.s_gapped_start, hsp.q_gapped_start, params, scratch)?;
            // the protein is the subject here
            let transcript = transcript
                .ops()
                .iter()
                .map(|&op| match op {
                    TranscriptOp::Insert => TranscriptOp::Delete,
                    TranscriptOp::Delete => TranscriptOp::Insert,
                    op => op,
                })
                .collect();
            let frame = frame_at(ctx.frame, e.s_start);
            hsp.context = ctx.query_index * 6 + frame_to_context(frame);
            hsp.query_frame = frame;
            hsp.q_start = e.s_start;
            hsp.q_end = e.s_end;
            hsp.s_start = e.q_start;
            hsp.s_end = e.q_end;
            hsp.score = score;
            hsp.transcript = Some(transcript);
            Ok(())
        }
        Program::Tblastn => {
            let frames = frames
                .as_mut()
                .ok_or_else(|| BlastError::Internal("untranslated subject".to_string()))?;
            let strand = frames.mixed_strand(hsp.subject_frame);
            let q = query.context_slice(hsp.context);
            let (e, score, transcript) =
                oof_window(q, strand, hsp.q_gapped_start, hsp.s_gapped_start, params, scratch)?;
            hsp.subject_frame = frame_at(hsp.subject_frame, e.s_start);
            hsp.q_start = e.q_start;
            hsp.q_end = e.q_end;
            hsp.s_start = e.s_start;
            hsp.s_end = e.s_end;
            hsp.score = score;
            hsp.transcript = Some(transcript);
            Ok(())
        }
        program => Err(BlastError::Internal(format!(
            "out-of-frame HSP in a {program} search"
        ))),
    }
}

/// Trace back every HSP of one subject. `subject` holds the residues as
/// stored (nucleotides for translated subjects). Failed HSPs are
/// dropped; the list is then re-scored, reaped and purged.
pub fn traceback_hsp_list(
    list: &mut HspList,
    query: &QueryBlock,
    subject: &[u8],
    params: &SearchParameters,
    scratch: &mut GapAlignScratch,
) -> TracebackStats {
    let mut stats = TracebackStats::default();
    let mut frames = query
        .program()
        .translates_subject()
        .then(|| SubjectFrames::new(subject));

    let oid = list.oid;
    list.hsps.retain_mut(|hsp| {
        let result = if hsp.out_of_frame {
            traceback_out_of_frame(hsp, query, &mut frames, subject, params, scratch)
        } else {
            traceback_in_frame(hsp, query, &mut frames, subject, params, scratch)
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("dropping HSP of subject {oid} at query {}..{}: {e}", hsp.q_start, hsp.q_end);
                stats.failures += 1;
                false
            }
        }
    });

    list.calculate_evalues(query, params.sbp.kbp());
    stats.reaped += list.reap(params.hit.cutoff_score, params.evalue_threshold) as u64;
    list.purge_common_endpoints();
    list.sort_by_score();
    stats
}

/// Traceback over all saved HSP lists, in parallel over lists.
pub fn run_traceback<S: SequenceSource + ?Sized>(
    results: &mut ResultSet,
    query: &QueryBlock,
    source: &S,
    params: &SearchParameters,
) -> TracebackStats {
    let stats = results
        .queries_mut()
        .par_iter_mut()
        .flat_map(|q| q.lists.par_iter_mut())
        .map_init(GapAlignScratch::new, |scratch, list| {
            match source.get_sequence(list.oid) {
                Some(subject) => traceback_hsp_list(list, query, subject.residues(), params, scratch),
                None => {
                    warn!("subject {} disappeared before traceback", list.oid);
                    let failures = list.len() as u64;
                    list.hsps.clear();
                    TracebackStats {
                        failures,
                        reaped: 0,
                    }
                }
            }
        })
        .reduce(TracebackStats::default, TracebackStats::add);
    results.sort_results();
    stats
}
