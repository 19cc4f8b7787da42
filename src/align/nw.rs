//! Needleman-Wunsch global aligner with affine gaps, end-space-free
//! options and an optional diagonal band.
//!
//! Scores are rewards: match is positive, mismatch and both gap weights
//! are typically negative. A gap of length `k` costs
//! `gap_open + k * gap_extend`.
//!
//! The fill keeps two rolling rows (best score and vertical-gap score) and
//! one full byte-per-cell backtrace matrix. Tie-breaking:
//! - continuing a gap needs a strictly better score than opening one, so
//!   opening wins ties;
//! - among the three moves, diagonal wins ties, then horizontal, then
//!   vertical.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use log::debug;

use super::format::{self, Segment, TextFormat};
use super::result::{Transcript, TranscriptOp};
use super::traceback::{BacktraceMatrix, TraceCell, TraceDir};
use crate::error::{try_filled_vec, BlastError, BlastResult};
use crate::sequence::{encode_residues, Alphabet};
use crate::utils::matrix::ScoringMatrix;

pub const DEFAULT_MATCH: i32 = 1;
pub const DEFAULT_MISMATCH: i32 = -2;
pub const DEFAULT_GAP_OPEN: i32 = -5;
pub const DEFAULT_GAP_EXTEND: i32 = -2;

/// Largest backtrace cell count accepted by default.
pub const DEFAULT_MAX_CELLS: u64 = u32::MAX as u64;

const NEG_INF: i32 = i32::MIN / 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixType {
    Nucleotide,
    Blosum62,
}

impl MatrixType {
    pub fn alphabet(self) -> Alphabet {
        match self {
            MatrixType::Nucleotide => Alphabet::Nucleotide,
            MatrixType::Blosum62 => Alphabet::Protein,
        }
    }
}

/// Which terminal gaps are free of charge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndSpaceFree {
    pub left1: bool,
    pub right1: bool,
    pub left2: bool,
    pub right2: bool,
}

impl EndSpaceFree {
    pub const NONE: Self = Self {
        left1: false,
        right1: false,
        left2: false,
        right2: false,
    };

    pub const ALL: Self = Self {
        left1: true,
        right1: true,
        left2: true,
        right2: true,
    };

    /// Flags for the same alignment with the two sequences exchanged.
    pub fn swapped(self) -> Self {
        Self {
            left1: self.left2,
            right1: self.right2,
            left2: self.left1,
            right2: self.right1,
        }
    }
}

/// Progress report passed to the callback at row boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub rows_done: usize,
    pub rows_total: usize,
    pub cells_done: u64,
    pub cells_total: u64,
}

/// Callback invoked at row boundaries; returning `true` stops the run.
pub type ProgressCallback<'a> = Box<dyn FnMut(&Progress) -> bool + Send + 'a>;

struct Fill {
    score: i32,
    backtrace: BacktraceMatrix,
    completed: bool,
}

pub struct NwAligner<'a> {
    seq1: Cow<'a, [u8]>,
    seq2: Cow<'a, [u8]>,
    matrix: Cow<'a, ScoringMatrix>,
    matrix_type: Option<MatrixType>,
    wm: i32,
    wms: i32,
    wg: i32,
    ws: i32,
    esf: EndSpaceFree,
    band: Option<usize>,
    max_cells: u64,
    progress: Option<ProgressCallback<'a>>,
    score: Option<i32>,
    interrupted: bool,
    transcript: Transcript,
}

fn check_lengths(len1: usize, len2: usize) -> BlastResult<()> {
    if len1 == 0 || len2 == 0 {
        return Err(BlastError::BadParameter(format!(
            "sequences must be non-empty (lengths {len1} and {len2})"
        )));
    }
    Ok(())
}

fn check_cells(len1: usize, len2: usize, limit: u64) -> BlastResult<()> {
    let cells = (len1 as u128 + 1) * (len2 as u128 + 1);
    if cells >= limit as u128 {
        return Err(BlastError::MemoryLimit {
            rows: len1 + 1,
            cols: len2 + 1,
            limit,
        });
    }
    Ok(())
}

impl<'a> NwAligner<'a> {
    /// Build an aligner over text sequences. Fails on empty input, on a
    /// matrix exceeding the cell limit (checked before anything is
    /// allocated) and on symbols outside the matrix alphabet.
    pub fn new(seq1: &[u8], seq2: &[u8], matrix_type: MatrixType) -> BlastResult<Self> {
        check_lengths(seq1.len(), seq2.len())?;
        check_cells(seq1.len(), seq2.len(), DEFAULT_MAX_CELLS)?;

        let alphabet = matrix_type.alphabet();
        let codes1 = encode_residues(seq1, alphabet, "seq1")?;
        let codes2 = encode_residues(seq2, alphabet, "seq2")?;
        let matrix = match matrix_type {
            MatrixType::Nucleotide => ScoringMatrix::nucleotide(DEFAULT_MATCH, DEFAULT_MISMATCH),
            MatrixType::Blosum62 => ScoringMatrix::blosum62(),
        };

        Ok(Self::assemble(
            Cow::Owned(codes1),
            Cow::Owned(codes2),
            Cow::Owned(matrix),
            Some(matrix_type),
        ))
    }

    /// Build an aligner over residues already encoded for `matrix`. The
    /// aligner borrows both sequences and the matrix.
    pub fn with_matrix(
        seq1: &'a [u8],
        seq2: &'a [u8],
        matrix: &'a ScoringMatrix,
    ) -> BlastResult<Self> {
        check_lengths(seq1.len(), seq2.len())?;
        check_cells(seq1.len(), seq2.len(), DEFAULT_MAX_CELLS)?;

        for (name, seq) in [("seq1", seq1), ("seq2", seq2)] {
            if let Some(position) = seq.iter().position(|&c| c as usize >= matrix.size()) {
                return Err(BlastError::InvalidCharacter {
                    sequence: name.to_string(),
                    symbol: matrix.alphabet().decode(seq[position]) as char,
                    position,
                });
            }
        }

        Ok(Self::assemble(
            Cow::Borrowed(seq1),
            Cow::Borrowed(seq2),
            Cow::Borrowed(matrix),
            None,
        ))
    }

    fn assemble(
        seq1: Cow<'a, [u8]>,
        seq2: Cow<'a, [u8]>,
        matrix: Cow<'a, ScoringMatrix>,
        matrix_type: Option<MatrixType>,
    ) -> Self {
        Self {
            seq1,
            seq2,
            matrix,
            matrix_type,
            wm: DEFAULT_MATCH,
            wms: DEFAULT_MISMATCH,
            wg: DEFAULT_GAP_OPEN,
            ws: DEFAULT_GAP_EXTEND,
            esf: EndSpaceFree::NONE,
            band: None,
            max_cells: DEFAULT_MAX_CELLS,
            progress: None,
            score: None,
            interrupted: false,
            transcript: Transcript::default(),
        }
    }

    pub fn set_end_space_free(&mut self, left1: bool, right1: bool, left2: bool, right2: bool) {
        self.esf = EndSpaceFree {
            left1,
            right1,
            left2,
            right2,
        };
    }

    pub fn set_end_space_free_flags(&mut self, esf: EndSpaceFree) {
        self.esf = esf;
    }

    pub fn end_space_free(&self) -> EndSpaceFree {
        self.esf
    }

    /// Override the scores. Match and mismatch only apply to the built-in
    /// nucleotide matrix; protein and borrowed matrices keep their table.
    pub fn set_scores(&mut self, wm: i32, wms: i32, wg: i32, ws: i32) {
        self.wm = wm;
        self.wms = wms;
        self.wg = wg;
        self.ws = ws;
        if self.matrix_type == Some(MatrixType::Nucleotide) {
            self.matrix = Cow::Owned(ScoringMatrix::nucleotide(wm, wms));
        }
    }

    pub fn match_score(&self) -> i32 {
        self.wm
    }

    pub fn mismatch_score(&self) -> i32 {
        self.wms
    }

    pub fn gap_open(&self) -> i32 {
        self.wg
    }

    pub fn gap_extend(&self) -> i32 {
        self.ws
    }

    /// Restrict the fill to cells with `|i - j| <= width`. The band must
    /// contain the bottom-right cell.
    pub fn set_band(&mut self, width: Option<usize>) -> BlastResult<()> {
        if let Some(w) = width {
            let diff = self.seq1.len().abs_diff(self.seq2.len());
            if w < diff {
                return Err(BlastError::BadParameter(format!(
                    "band width {w} is narrower than the length difference {diff}"
                )));
            }
        }
        self.band = width;
        Ok(())
    }

    /// Lower (or raise) the backtrace cell limit.
    pub fn set_max_cells(&mut self, limit: u64) -> BlastResult<()> {
        check_cells(self.seq1.len(), self.seq2.len(), limit)?;
        self.max_cells = limit;
        Ok(())
    }

    pub fn set_progress_callback(&mut self, callback: Option<ProgressCallback<'a>>) {
        self.progress = callback;
    }

    /// Run the dynamic program and backtrace. Returns the optimal score,
    /// or the best-effort partial score if the progress callback asked to
    /// stop (see `is_interrupted`).
    pub fn run(&mut self) -> BlastResult<i32> {
        self.transcript.clear();
        self.score = None;
        self.interrupted = false;

        let mut callback = self.progress.take();
        let fill = self.fill(&mut |p| callback.as_mut().is_some_and(|f| f(p)));
        self.progress = callback;
        let fill = fill?;

        self.score = Some(fill.score);
        if !fill.completed {
            debug!("alignment stopped by progress callback");
            self.interrupted = true;
            return Ok(fill.score);
        }

        let (s1, s2) = (&self.seq1, &self.seq2);
        self.transcript = fill.backtrace.walk(|i, j| s1[i] == s2[j])?;
        Ok(fill.score)
    }

    pub fn score(&self) -> Option<i32> {
        self.score
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_string(&self) -> String {
        self.transcript.to_string()
    }

    fn in_band(&self, i: usize, j: usize) -> bool {
        self.band.map_or(true, |w| i.abs_diff(j) <= w)
    }

    fn fill(&self, stop: &mut dyn FnMut(&Progress) -> bool) -> BlastResult<Fill> {
        let (len1, len2) = (self.seq1.len(), self.seq2.len());
        check_cells(len1, len2, self.max_cells)?;
        let (n1, n2) = (len1 + 1, len2 + 1);

        let mut backtrace = BacktraceMatrix::try_new(n1, n2)?;
        let mut row_v = try_filled_vec(n2, NEG_INF, "score row")?;
        let mut row_f = try_filled_vec(n2, NEG_INF, "gap row")?;

        let esf = self.esf;
        let (wg, ws) = (self.wg, self.ws);
        let (wg_left1, ws_left1) = if esf.left1 { (0, 0) } else { (wg, ws) };
        let (wg_left2, ws_left2) = if esf.left2 { (0, 0) } else { (wg, ws) };
        let width = self.band.unwrap_or(len1.max(len2));

        let mut progress = Progress {
            rows_done: 0,
            rows_total: n1,
            cells_done: 0,
            cells_total: n1 as u64 * n2 as u64,
        };
        if stop(&progress) {
            return Ok(Fill {
                score: 0,
                backtrace,
                completed: false,
            });
        }

        // first row: spaces in sequence 1 only
        row_v[0] = 0;
        backtrace.set(0, 0, TraceCell::new(TraceDir::Horizontal, true, false));
        for j in 1..n2.min(width + 1) {
            row_v[j] = wg_left1 + j as i32 * ws_left1;
            backtrace.set(0, j, TraceCell::new(TraceDir::Horizontal, true, false));
        }
        progress.rows_done = 1;
        progress.cells_done = n2 as u64;
        if stop(&progress) {
            return Ok(Fill {
                score: row_v[len2],
                backtrace,
                completed: false,
            });
        }

        let mut v_col0 = wg_left2;
        for i in 1..n1 {
            let (wg1, ws1) = if i == len1 && esf.right1 { (0, 0) } else { (wg, ws) };
            let c1 = self.seq1[i - 1];
            let score_row = self.matrix.row(c1);

            v_col0 += ws_left2;
            let prev_col0 = row_v[0];
            let mut v_left = if i <= width { v_col0 } else { NEG_INF };
            row_v[0] = v_left;
            backtrace.set(i, 0, TraceCell::new(TraceDir::Vertical, false, true));

            let j_lo = if i > width { i - width } else { 1 };
            let j_hi = len2.min(i + width);
            let mut diag = if j_lo == 1 { prev_col0 } else { row_v[j_lo - 1] };
            let mut e = NEG_INF;

            for j in j_lo..=j_hi {
                let g = diag + score_row[self.seq2[j - 1] as usize];
                diag = row_v[j];

                let n0 = v_left + wg1;
                let h_ext = e > n0;
                e = if h_ext { e + ws1 } else { n0 + ws1 };

                let (wg2, ws2) = if j == len2 && esf.right2 { (0, 0) } else { (wg, ws) };
                let n0 = row_v[j] + wg2;
                let v_ext = row_f[j] > n0;
                row_f[j] = if v_ext { row_f[j] + ws2 } else { n0 + ws2 };
                let f = row_f[j];

                let (dir, v) = if g >= e && g >= f {
                    (TraceDir::Diagonal, g)
                } else if e >= f {
                    (TraceDir::Horizontal, e)
                } else {
                    (TraceDir::Vertical, f)
                };
                row_v[j] = v;
                v_left = v;
                backtrace.set(i, j, TraceCell::new(dir, h_ext, v_ext));
            }
            if j_lo > 1 {
                row_v[j_lo - 1] = NEG_INF;
                row_f[j_lo - 1] = NEG_INF;
            }

            progress.rows_done = i + 1;
            progress.cells_done += n2 as u64;
            if i < len1 && stop(&progress) {
                return Ok(Fill {
                    score: row_v[len2],
                    backtrace,
                    completed: false,
                });
            }
        }

        debug_assert!(self.in_band(len1, len2));
        Ok(Fill {
            score: row_v[len2],
            backtrace,
            completed: true,
        })
    }

    /// Recompute the score from the transcript alone, without the matrix
    /// fill. Gap runs cost `gap_open + len * gap_extend`; terminal runs are
    /// free where the end-space-free flags say so.
    pub fn score_by_transcript(&self) -> BlastResult<i32> {
        if self.transcript.is_empty() {
            return Err(BlastError::BadParameter(
                "no transcript; run the aligner first".to_string(),
            ));
        }
        let ops = self.transcript.ops();
        let (mut i1, mut i2) = (0usize, 0usize);
        let mut score = 0i32;
        let mut prev: Option<TranscriptOp> = None;

        for &op in ops {
            match op {
                TranscriptOp::Match | TranscriptOp::Replace => {
                    let (a, b) = self.residue_pair(i1, i2)?;
                    score += self.matrix.score(a, b);
                    i1 += 1;
                    i2 += 1;
                }
                TranscriptOp::Insert => {
                    if prev != Some(op) {
                        score += self.wg;
                    }
                    score += self.ws;
                    i2 += 1;
                }
                TranscriptOp::Delete => {
                    if prev != Some(op) {
                        score += self.wg;
                    }
                    score += self.ws;
                    i1 += 1;
                }
                TranscriptOp::Intron => {
                    return Err(BlastError::Internal(
                        "intron in an unspliced transcript".to_string(),
                    ))
                }
                TranscriptOp::FrameShiftBack | TranscriptOp::FrameShiftForward => {
                    return Err(BlastError::Internal(
                        "frameshift in a single-frame transcript".to_string(),
                    ))
                }
            }
            prev = Some(op);
        }

        let gap_cost = |len: usize| self.wg + len as i32 * self.ws;
        let leading = |target: TranscriptOp| ops.iter().take_while(|&&op| op == target).count();
        let trailing =
            |target: TranscriptOp| ops.iter().rev().take_while(|&&op| op == target).count();

        if self.esf.left1 {
            let g = leading(TranscriptOp::Insert);
            if g > 0 {
                score -= gap_cost(g);
            }
        }
        if self.esf.left2 {
            let g = leading(TranscriptOp::Delete);
            if g > 0 {
                score -= gap_cost(g);
            }
        }
        if self.esf.right1 {
            let g = trailing(TranscriptOp::Insert);
            if g > 0 && g < ops.len() {
                score -= gap_cost(g);
            }
        }
        if self.esf.right2 {
            let g = trailing(TranscriptOp::Delete);
            if g > 0 && g < ops.len() {
                score -= gap_cost(g);
            }
        }
        Ok(score)
    }

    fn residue_pair(&self, i1: usize, i2: usize) -> BlastResult<(u8, u8)> {
        match (self.seq1.get(i1), self.seq2.get(i2)) {
            (Some(&a), Some(&b)) => Ok((a, b)),
            _ => Err(BlastError::Internal(format!(
                "transcript runs past the sequences at ({i1}, {i2})"
            ))),
        }
    }

    fn text(&self, codes: &[u8]) -> Vec<u8> {
        let alphabet = self.matrix.alphabet();
        codes.iter().map(|&c| alphabet.decode(c)).collect()
    }

    pub fn format_as_text(&self, kind: TextFormat, line_width: usize) -> BlastResult<String> {
        if self.transcript.is_empty() {
            return Err(BlastError::BadParameter(
                "no transcript; run the aligner first".to_string(),
            ));
        }
        format::format_text(
            &self.text(&self.seq1),
            &self.text(&self.seq2),
            &self.transcript,
            kind,
            line_width,
        )
    }

    pub fn format_as_segments(&self) -> Vec<Segment> {
        format::segments(&self.transcript)
    }

    /// Estimate the wall-clock time of a full run. The fill is executed
    /// until `budget` is spent and the elapsed time extrapolated over the
    /// remaining cells; a run that finishes within the budget reports its
    /// actual time.
    pub fn estimate_running_time(&self, budget: Duration) -> BlastResult<Duration> {
        let start = Instant::now();
        let mut cells_done = 0u64;
        let mut cells_total = 0u64;
        let fill = self.fill(&mut |p| {
            cells_done = p.cells_done;
            cells_total = p.cells_total;
            start.elapsed() > budget
        })?;
        let elapsed = start.elapsed();
        if fill.completed {
            return Ok(elapsed);
        }
        Ok(extrapolate_running_time(elapsed, cells_done, cells_total))
    }
}

/// Scale the time spent on `cells_done` cells up to `cells_total`.
fn extrapolate_running_time(elapsed: Duration, cells_done: u64, cells_total: u64) -> Duration {
    if cells_done == 0 || cells_done >= cells_total {
        return elapsed;
    }
    elapsed.mul_f64(cells_total as f64 / cells_done as f64)
}
