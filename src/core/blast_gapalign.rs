//! Gapped extension
//!
//! Seeds that survived ungapped extension are extended with a score-only
//! x-drop dynamic program in both directions from a start point inside
//! the ungapped segment. Rows run over the query and only the band of
//! columns still within `x_dropoff` of the best score is computed, so the
//! cost follows the alignment rather than the sequence lengths.
//!
//! Three backends share the DP:
//! - `DynProg` extends both ways from the middle of the best window of
//!   the ungapped segment;
//! - `Greedy` keeps the ungapped segment as an anchor and extends from its
//!   two ends;
//! - out-of-frame extension aligns a protein against the mixed-frame
//!   buffer of a strand and admits frameshifts.

use std::cmp::Reverse;

use crate::core::blast_extend::{ungapped_score, UngappedData};
use crate::core::blast_frames::{aa_to_mixed, translate_hsps_to_dnap_coord, DnapSeed};
use crate::core::blast_hits::{Hsp, HspList};
use crate::core::blast_options::{ExtensionMethod, Program};
use crate::core::blast_parameters::{ExtensionParams, SearchParameters};
use crate::core::blast_wordfinder::InitialHsp;
use crate::core::query_info::QueryBlock;
use crate::utils::ScoringMatrix;

/// Score of a dead cell. Half of `i32::MIN` so that subtracting gap
/// costs cannot wrap.
pub const MININT: i32 = i32::MIN / 2;

/// Window used to pick the gapped start point inside an ungapped segment.
pub const HSP_MAX_WINDOW: usize = 11;

/// Best cell of an x-drop extension: its score and how many residues of
/// each sequence it consumed (nucleotides on a mixed-frame side).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XdropResult {
    pub score: i32,
    pub a_len: usize,
    pub b_len: usize,
}

/// One DP row restricted to the columns that were computed.
#[derive(Debug, Clone, Default)]
struct BandRow {
    base: usize,
    live: bool,
    live_first: usize,
    live_last: usize,
    v: Vec<i32>,
    up: Vec<i32>,
    left: Vec<i32>,
}

impl BandRow {
    fn reset(&mut self, base: usize) {
        self.base = base;
        self.live = false;
        self.v.clear();
        self.up.clear();
        self.left.clear();
    }

    #[inline]
    fn at(&self, values: &[i32], j: usize) -> i32 {
        if j < self.base {
            return MININT;
        }
        values.get(j - self.base).copied().unwrap_or(MININT)
    }

    #[inline]
    fn v(&self, j: usize) -> i32 {
        self.at(&self.v, j)
    }

    #[inline]
    fn up(&self, j: usize) -> i32 {
        self.at(&self.up, j)
    }

    #[inline]
    fn left(&self, j: usize) -> i32 {
        self.at(&self.left, j)
    }

    #[inline]
    fn push(&mut self, j: usize, v: i32, up: i32, left: i32) {
        if v > MININT {
            if !self.live {
                self.live = true;
                self.live_first = j;
            }
            self.live_last = j;
        }
        self.v.push(v);
        self.up.push(up);
        self.left.push(left);
    }
}

/// DP rows reused across extensions by one worker.
#[derive(Debug, Clone, Default)]
pub struct GapAlignScratch {
    prev: BandRow,
    cur: BandRow,
}

impl GapAlignScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Score-only x-drop alignment of two sequences from their starts.
/// `sub(i, j)` scores residue `i` of A against residue `j` of B. Gap
/// costs are positive; a gap of length `k` costs `gap_open + k * gap_extend`.
pub fn xdrop_align(
    a_len: usize,
    b_len: usize,
    sub: impl Fn(usize, usize) -> i32,
    gap_open: i32,
    gap_extend: i32,
    x_dropoff: i32,
    scratch: &mut GapAlignScratch,
) -> XdropResult {
    let goe = gap_open + gap_extend;
    let mut best = XdropResult::default();
    let GapAlignScratch { prev, cur } = scratch;

    cur.reset(0);
    for j in 0..=b_len {
        let v = if j == 0 { 0 } else { -(gap_open + gap_extend * j as i32) };
        if v < -x_dropoff {
            break;
        }
        cur.push(j, v, MININT, v);
    }

    for i in 1..=a_len {
        std::mem::swap(prev, cur);
        if !prev.live {
            break;
        }
        let start = prev.live_first;
        cur.reset(start);

        let mut left = MININT;
        let mut v_left = MININT;
        for j in start..=b_len {
            let mut up = (prev.v(j) - goe).max(prev.up(j) - gap_extend);
            left = (v_left - goe).max(left - gap_extend);
            let diag = if j > 0 {
                prev.v(j - 1) + sub(i - 1, j - 1)
            } else {
                MININT
            };
            let mut v = diag.max(up).max(left);

            if v < best.score - x_dropoff {
                v = MININT;
                up = MININT;
                left = MININT;
            } else if v > best.score {
                best = XdropResult {
                    score: v,
                    a_len: i,
                    b_len: j,
                };
            }
            cur.push(j, v, up, left);
            v_left = v;

            if j > prev.live_last && v == MININT {
                break;
            }
        }
    }

    best
}

/// Score-only x-drop alignment of a protein A against the codons of a
/// strand, starting from both sequence starts.
///
/// Row `i` counts protein residues consumed and column `p` counts strand
/// nucleotides, so the reading frame of a cell is `p % 3`. A cell is
/// reached by one of:
///
/// - a codon step from `(i-1, p-3)`, which stays in frame;
/// - a frameshift step from `(i-1, p-2)` or `(i-1, p-4)`, which aligns a
///   residue to a codon one nucleotide short of or past the frame and
///   costs `frame_shift` on top of the substitution score;
/// - a gap in the strand from `(i-1, p)`;
/// - a gap in the protein from `(i, p-3)`. A gap spans whole codons and
///   never changes the frame.
///
/// Gaps cost `gap_open + k * gap_extend` for `k` residues or codons.
/// Row 0 therefore only holds the codon-gap cells at multiples of 3.
/// `sub(i, p, q)` scores protein residue `i` against the codon taken when
/// moving from column `p` to column `q`, or returns `None` past the end
/// of the strand. Cells more than `x_dropoff` below the best score are
/// dead. A row ends at three consecutive dead cells past the live range
/// of the row above, and the DP stops at the first row with no live
/// cell. The returned `b_len` is in nucleotides.
#[allow(clippy::too_many_arguments)]
pub fn oof_xdrop_align(
    a_len: usize,
    p_max: usize,
    sub: impl Fn(usize, usize, usize) -> Option<i32>,
    gap_open: i32,
    gap_extend: i32,
    frame_shift: i32,
    x_dropoff: i32,
    scratch: &mut GapAlignScratch,
) -> XdropResult {
    const STEPS: [(usize, bool); 3] = [(3, false), (2, true), (4, true)];
    let goe = gap_open + gap_extend;
    let mut best = XdropResult::default();
    let GapAlignScratch { prev, cur } = scratch;

    cur.reset(0);
    for p in 0..=p_max {
        let v = match p {
            0 => 0,
            _ if p % 3 == 0 => -(gap_open + gap_extend * (p / 3) as i32),
            _ => MININT,
        };
        if p % 3 == 0 && v < -x_dropoff {
            break;
        }
        cur.push(p, v, MININT, if p > 0 { v } else { MININT });
    }

    for i in 1..=a_len {
        std::mem::swap(prev, cur);
        if !prev.live {
            break;
        }
        let start = prev.live_first;
        cur.reset(start);

        for p in start..=p_max {
            let mut up = (prev.v(p) - goe).max(prev.up(p) - gap_extend);
            let mut left = if p >= start + 3 {
                (cur.v(p - 3) - goe).max(cur.left(p - 3) - gap_extend)
            } else {
                MININT
            };
            let mut diag = MININT;
            for (step, shifted) in STEPS {
                if p < step {
                    continue;
                }
                let from = prev.v(p - step);
                if from == MININT {
                    continue;
                }
                if let Some(s) = sub(i - 1, p - step, p) {
                    let penalty = if shifted { frame_shift } else { 0 };
                    diag = diag.max(from + s - penalty);
                }
            }
            let mut v = diag.max(up).max(left);

            if v < best.score - x_dropoff {
                v = MININT;
                up = MININT;
                left = MININT;
            } else if v > best.score {
                best = XdropResult {
                    score: v,
                    a_len: i,
                    b_len: p,
                };
            }
            cur.push(p, v, up, left);

            if p > prev.live_last + 4
                && v == MININT
                && cur.v(p - 1) == MININT
                && cur.v(p - 2) == MININT
            {
                break;
            }
        }
    }

    best
}

/// Start point of the gapped extension inside an ungapped segment: the
/// middle of its best-scoring window of `HSP_MAX_WINDOW` residues, or the
/// middle of the segment if it is short or no window scores positively.
/// Offsets are local to `query` and `subject`.
pub fn gapped_start_point(
    query: &[u8],
    subject: &[u8],
    seg: &UngappedData,
    matrix: &ScoringMatrix,
) -> (usize, usize) {
    let middle = (seg.q_start + seg.length / 2, seg.s_start + seg.length / 2);
    if seg.length <= HSP_MAX_WINDOW {
        return middle;
    }

    let w = HSP_MAX_WINDOW;
    let mut score = ungapped_score(query, subject, seg.q_start, seg.s_start, w, matrix);
    let (mut best, mut best_off) = (score, 0);
    for k in 1..=seg.length - w {
        let (q, s) = (seg.q_start + k, seg.s_start + k);
        score += matrix.score(query[q + w - 1], subject[s + w - 1]);
        score -= matrix.score(query[q - 1], subject[s - 1]);
        if score > best {
            best = score;
            best_off = k;
        }
    }
    if best <= 0 {
        return middle;
    }
    (
        seg.q_start + best_off + w / 2,
        seg.s_start + best_off + w / 2,
    )
}

/// A finished gapped extension, in the coordinates it was run in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GappedExtension {
    pub q_start: usize,
    pub q_end: usize,
    pub s_start: usize,
    pub s_end: usize,
    pub score: i32,
    pub q_gapped_start: usize,
    pub s_gapped_start: usize,
}

/// Extend left and right from (`q_gs`, `s_gs`). The residue pair at the
/// start point belongs to the right half.
pub fn dynprog_extend(
    query: &[u8],
    subject: &[u8],
    q_gs: usize,
    s_gs: usize,
    matrix: &ScoringMatrix,
    ext: &ExtensionParams,
    x_dropoff: i32,
    scratch: &mut GapAlignScratch,
) -> GappedExtension {
    let left = xdrop_align(
        q_gs,
        s_gs,
        |i, j| matrix.score(query[q_gs - 1 - i], subject[s_gs - 1 - j]),
        ext.gap_open,
        ext.gap_extend,
        x_dropoff,
        scratch,
    );
    let right = xdrop_align(
        query.len() - q_gs,
        subject.len() - s_gs,
        |i, j| matrix.score(query[q_gs + i], subject[s_gs + j]),
        ext.gap_open,
        ext.gap_extend,
        x_dropoff,
        scratch,
    );
    GappedExtension {
        q_start: q_gs - left.a_len,
        q_end: q_gs + right.a_len,
        s_start: s_gs - left.b_len,
        s_end: s_gs + right.b_len,
        score: left.score + right.score,
        q_gapped_start: q_gs,
        s_gapped_start: s_gs,
    }
}

/// Keep the ungapped segment as it is and extend outward from its ends.
pub fn anchored_extend(
    query: &[u8],
    subject: &[u8],
    seg: &UngappedData,
    matrix: &ScoringMatrix,
    ext: &ExtensionParams,
    x_dropoff: i32,
    scratch: &mut GapAlignScratch,
) -> GappedExtension {
    let (qs, ss) = (seg.q_start, seg.s_start);
    let (qe, se) = (seg.q_end(), seg.s_end());
    let left = xdrop_align(
        qs,
        ss,
        |i, j| matrix.score(query[qs - 1 - i], subject[ss - 1 - j]),
        ext.gap_open,
        ext.gap_extend,
        x_dropoff,
        scratch,
    );
    let right = xdrop_align(
        query.len() - qe,
        subject.len() - se,
        |i, j| matrix.score(query[qe + i], subject[se + j]),
        ext.gap_open,
        ext.gap_extend,
        x_dropoff,
        scratch,
    );
    GappedExtension {
        q_start: qs - left.a_len,
        q_end: qe + right.a_len,
        s_start: ss - left.b_len,
        s_end: se + right.b_len,
        score: left.score + seg.score + right.score,
        q_gapped_start: qs,
        s_gapped_start: ss,
    }
}

/// Out-of-frame extension of `protein` against the mixed-frame buffer
/// `mixed` of a strand from (`a0`, `b0`). In the result the `q_*` fields
/// are protein offsets and the `s_*` fields strand nucleotide offsets.
#[allow(clippy::too_many_arguments)]
pub fn oof_extend(
    protein: &[u8],
    mixed: &[u8],
    a0: usize,
    b0: usize,
    matrix: &ScoringMatrix,
    ext: &ExtensionParams,
    x_dropoff: i32,
    scratch: &mut GapAlignScratch,
) -> GappedExtension {
    // the strand holds two more nucleotides than it has codon starts
    let strand_len = mixed.len() + 2;
    let left = oof_xdrop_align(
        a0,
        b0,
        |i, _, q| (q <= b0).then(|| matrix.score(protein[a0 - 1 - i], mixed[b0 - q])),
        ext.gap_open,
        ext.gap_extend,
        ext.frame_shift_penalty,
        x_dropoff,
        scratch,
    );
    let p_max = strand_len.saturating_sub(b0);
    let right = oof_xdrop_align(
        protein.len() - a0,
        p_max,
        |i, p, q| {
            (b0 + p < mixed.len() && q <= p_max).then(|| matrix.score(protein[a0 + i], mixed[b0 + p]))
        },
        ext.gap_open,
        ext.gap_extend,
        ext.frame_shift_penalty,
        x_dropoff,
        scratch,
    );
    GappedExtension {
        q_start: a0 - left.a_len,
        q_end: a0 + right.a_len,
        s_start: b0 - left.b_len,
        s_end: b0 + right.b_len,
        score: left.score + right.score,
        q_gapped_start: a0,
        s_gapped_start: b0,
    }
}

/// The subject stretch the gapped stage runs on.
#[derive(Debug, Clone, Copy)]
pub struct SubjectChunk<'a> {
    /// Residues of the chunk, translated for translated subjects.
    pub residues: &'a [u8],
    /// Reading frame of a translated subject, 0 otherwise.
    pub frame: i8,
    /// Offset of the chunk within its frame.
    pub offset: usize,
    /// Mixed-frame buffer of the whole strand, for out-of-frame
    /// extension against a translated subject.
    pub mixed: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GappedStats {
    pub extensions: u64,
    pub prelim_passed: u64,
    pub contained_skipped: u64,
}

impl GappedStats {
    pub fn add(&mut self, other: &GappedStats) {
        self.extensions += other.extensions;
        self.prelim_passed += other.prelim_passed;
        self.contained_skipped += other.contained_skipped;
    }
}

/// HSP covering the ungapped segment of a seed, in the coordinates the
/// gapped stage will report in. Used to skip seeds already covered.
fn seed_cover(query: &QueryBlock, chunk: &SubjectChunk, seed: &InitialHsp, out_of_frame: bool) -> Hsp {
    let ctx = query.context(seed.context);
    let seg = &seed.ungapped;
    let (mut q_start, mut q_end) = (seg.q_start - ctx.offset, seg.q_end() - ctx.offset);
    let (mut s_start, mut s_end) = (seg.s_start, seg.s_end());
    if out_of_frame {
        match query.program() {
            Program::Blastx => {
                q_start = aa_to_mixed(ctx.frame, q_start);
                q_end = aa_to_mixed(ctx.frame, q_end);
            }
            Program::Tblastn => {
                s_start = aa_to_mixed(chunk.frame, s_start + chunk.offset);
                s_end = aa_to_mixed(chunk.frame, s_end + chunk.offset);
            }
            _ => {}
        }
    }
    Hsp {
        context: seed.context,
        query_index: ctx.query_index,
        query_frame: ctx.frame,
        subject_frame: chunk.frame,
        q_start,
        q_end,
        s_start,
        s_end,
        q_gapped_start: q_start,
        s_gapped_start: s_start,
        score: seg.score,
        bit_score: 0.0,
        evalue: f64::INFINITY,
        out_of_frame,
        transcript: None,
    }
}

/// Out-of-frame extension of one seed, mapped back to query/subject order.
fn extend_out_of_frame(
    query: &QueryBlock,
    chunk: &SubjectChunk,
    seed: DnapSeed,
    params: &SearchParameters,
    scratch: &mut GapAlignScratch,
) -> Option<GappedExtension> {
    let matrix = &params.sbp.matrix;
    let x_drop = params.ext.gap_x_dropoff;
    match query.program() {
        Program::Blastx => {
            let ctx = query.context(seed.context);
            let mixed = query.mixed_frame()?;
            let (base, len) = mixed.strand(ctx.query_index, ctx.frame);
            let strand = &mixed.sequence()[base..base + len];
            if seed.mixed_off >= strand.len() {
                return None;
            }
            let e = oof_extend(
                chunk.residues,
                strand,
                seed.protein_off,
                seed.mixed_off,
                matrix,
                &params.ext,
                x_drop,
                scratch,
            );
            Some(GappedExtension {
                q_start: e.s_start,
                q_end: e.s_end,
                s_start: e.q_start,
                s_end: e.q_end,
                score: e.score,
                q_gapped_start: e.s_gapped_start,
                s_gapped_start: e.q_gapped_start,
            })
        }
        Program::Tblastn => {
            let strand = chunk.mixed?;
            if seed.mixed_off >= strand.len() {
                return None;
            }
            Some(oof_extend(
                query.context_slice(seed.context),
                strand,
                seed.protein_off,
                seed.mixed_off,
                matrix,
                &params.ext,
                x_drop,
                scratch,
            ))
        }
        _ => None,
    }
}

/// Run the preliminary gapped stage over the seeds of one subject chunk.
/// Seeds are taken best first (ungapped score, then subject and query
/// offset); a seed whose ungapped segment already lies inside a saved
/// HSP is skipped. HSPs reaching the hit cutoff are returned with HSPs
/// sharing an endpoint purged.
///
/// Coordinates of the returned HSPs are context-local. With
/// `out_of_frame` the translated side is in strand nucleotides, so a
/// seed found in one frame counts as covered by an HSP that drifted into
/// another frame of the same strand.
#[allow(clippy::too_many_arguments)]
pub fn gapped_extend_hits(
    query: &QueryBlock,
    chunk: &SubjectChunk,
    seeds: &mut [InitialHsp],
    params: &SearchParameters,
    method: ExtensionMethod,
    out_of_frame: bool,
    scratch: &mut GapAlignScratch,
    stats: &mut GappedStats,
) -> HspList {
    let matrix = &params.sbp.matrix;
    let mut list = HspList::new(0);

    seeds.sort_by_key(|h| (Reverse(h.ungapped.score), h.s_off, h.q_off));

    for seed in seeds.iter() {
        let cover = seed_cover(query, chunk, seed, out_of_frame);
        if list.hsps.iter().any(|h| cover.contained_in(h)) {
            stats.contained_skipped += 1;
            continue;
        }

        let ctx = query.context(seed.context);
        let q_ctx = query.context_slice(seed.context);
        let local = UngappedData {
            q_start: seed.ungapped.q_start - ctx.offset,
            ..seed.ungapped
        };

        stats.extensions += 1;
        let extension = if out_of_frame {
            let (q_gs, s_gs) = gapped_start_point(q_ctx, chunk.residues, &local, matrix);
            translate_hsps_to_dnap_coord(query, seed.context, q_gs, s_gs, chunk.frame, chunk.offset)
                .and_then(|dnap| extend_out_of_frame(query, chunk, dnap, params, scratch))
        } else {
            Some(match method {
                ExtensionMethod::DynProg => {
                    let (q_gs, s_gs) = gapped_start_point(q_ctx, chunk.residues, &local, matrix);
                    dynprog_extend(
                        q_ctx,
                        chunk.residues,
                        q_gs,
                        s_gs,
                        matrix,
                        &params.ext,
                        params.ext.gap_x_dropoff,
                        scratch,
                    )
                }
                ExtensionMethod::Greedy => anchored_extend(
                    q_ctx,
                    chunk.residues,
                    &local,
                    matrix,
                    &params.ext,
                    params.ext.gap_x_dropoff,
                    scratch,
                ),
            })
        };

        let Some(e) = extension else {
            continue;
        };
        if e.score < params.hit.cutoff_score {
            continue;
        }
        stats.prelim_passed += 1;
        list.hsps.push(Hsp {
            q_start: e.q_start,
            q_end: e.q_end,
            s_start: e.s_start,
            s_end: e.s_end,
            q_gapped_start: e.q_gapped_start,
            s_gapped_start: e.s_gapped_start,
            score: e.score,
            ..cover
        });
    }

    list.purge_common_endpoints();
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{Alphabet, Sequence};

    fn nt(text: &[u8]) -> Vec<u8> {
        Sequence::new("s", text, Alphabet::Nucleotide)
            .unwrap()
            .residues()
            .to_vec()
    }

    fn aa(text: &[u8]) -> Vec<u8> {
        Sequence::new("p", text, Alphabet::Protein)
            .unwrap()
            .residues()
            .to_vec()
    }

    fn ext(open: i32, extend: i32) -> ExtensionParams {
        ExtensionParams {
            gap_open: open,
            gap_extend: extend,
            frame_shift_penalty: 30,
            gap_x_dropoff: 30,
            gap_x_dropoff_final: 50,
        }
    }

    #[test]
    fn test_xdrop_identical() {
        let m = ScoringMatrix::nucleotide(1, -3);
        let a = nt(b"ACGTACGTTTGCA");
        let mut scratch = GapAlignScratch::new();
        let r = xdrop_align(a.len(), a.len(), |i, j| m.score(a[i], a[j]), 5, 2, 10, &mut scratch);
        assert_eq!(r, XdropResult { score: 13, a_len: 13, b_len: 13 });
    }

    #[test]
    fn test_xdrop_bridges_a_gap() {
        let m = ScoringMatrix::nucleotide(2, -3);
        // B lacks the T at A[10]
        let a = nt(b"ACGTACGTACTGGCATGCAAC");
        let b = nt(b"ACGTACGTACGGCATGCAAC");
        let mut scratch = GapAlignScratch::new();
        let r = xdrop_align(a.len(), b.len(), |i, j| m.score(a[i], b[j]), 5, 2, 30, &mut scratch);
        // 20 matches and one gap of length 1
        assert_eq!(r.score, 40 - 7);
        assert_eq!((r.a_len, r.b_len), (21, 20));
    }

    #[test]
    fn test_xdrop_stops_on_unrelated_tail() {
        let m = ScoringMatrix::nucleotide(1, -3);
        let a = nt(b"ACGTACGTAAAAAAAAAAAA");
        let b = nt(b"ACGTACGTCCCCCCCCCCCC");
        let mut scratch = GapAlignScratch::new();
        let r = xdrop_align(a.len(), b.len(), |i, j| m.score(a[i], b[j]), 5, 2, 10, &mut scratch);
        assert_eq!(r, XdropResult { score: 8, a_len: 8, b_len: 8 });
    }

    #[test]
    fn test_xdrop_empty_side() {
        let m = ScoringMatrix::nucleotide(1, -3);
        let a = nt(b"ACGT");
        let mut scratch = GapAlignScratch::new();
        let r = xdrop_align(a.len(), 0, |i, j| m.score(a[i], a[j]), 5, 2, 10, &mut scratch);
        assert_eq!(r, XdropResult::default());
    }

    #[test]
    fn test_gapped_start_point_picks_best_window() {
        let m = ScoringMatrix::nucleotide(1, -3);
        let q = nt(b"AAAAAAAAAAAAACGTACGTACGTAC");
        let s = nt(b"CCCCCCCCCCCCACGTACGTACGTAC");
        let seg = UngappedData {
            q_start: 0,
            s_start: 0,
            length: q.len(),
            score: 0,
        };
        let (qs, ss) = gapped_start_point(&q, &s, &seg, &m);
        assert_eq!((qs, ss), (17, 17));

        let short = UngappedData {
            q_start: 4,
            s_start: 6,
            length: 9,
            score: 9,
        };
        assert_eq!(gapped_start_point(&q, &s, &short, &m), (8, 10));
    }

    #[test]
    fn test_dynprog_and_anchored_agree_on_clean_hit() {
        let m = ScoringMatrix::nucleotide(1, -3);
        let q = nt(b"TTTTACGTACGGATCCATGCAGTTTT");
        let s = nt(b"GGACGTACGGATCCATGCAGGG");
        let mut scratch = GapAlignScratch::new();
        let seg = UngappedData {
            q_start: 4,
            s_start: 2,
            length: 18,
            score: 18,
        };
        let (q_gs, s_gs) = gapped_start_point(&q, &s, &seg, &m);
        let dp = dynprog_extend(&q, &s, q_gs, s_gs, &m, &ext(5, 2), 10, &mut scratch);
        let anchored = anchored_extend(&q, &s, &seg, &m, &ext(5, 2), 10, &mut scratch);
        for e in [dp, anchored] {
            assert_eq!(e.score, 18);
            assert_eq!((e.q_start, e.q_end), (4, 22));
            assert_eq!((e.s_start, e.s_end), (2, 20));
        }
    }

    #[test]
    fn test_oof_extend_crosses_a_frameshift() {
        let m = ScoringMatrix::blosum62();
        // codons of MKWHEAW, one extra base, codons of CFYWMKW
        let protein = aa(b"MKWHEAWCFYWMKW");
        let strand = nt(b"ATGAAATGGCATGAAGCGTGGTGTTTTTATTGGATGAAATGG");
        let mut with_shift = strand[..21].to_vec();
        with_shift.push(nt(b"A")[0]);
        with_shift.extend_from_slice(&strand[21..]);

        let mixed = crate::sequence::translation::mixed_frame(&with_shift);
        let mut scratch = GapAlignScratch::new();
        let e = oof_extend(&protein, &mixed, 0, 0, &m, &ext(11, 1), 100, &mut scratch);
        assert_eq!((e.q_start, e.q_end), (0, protein.len()));
        assert_eq!((e.s_start, e.s_end), (0, with_shift.len()));
        let in_frame: i32 = protein.iter().map(|&r| m.score(r, r)).sum();
        assert_eq!(e.score, in_frame - 30);
    }
}
