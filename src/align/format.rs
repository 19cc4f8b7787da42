//! Text and segment renderings of a transcript.

use super::result::{Transcript, TranscriptOp};
use crate::error::{BlastError, BlastResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Sequence rows followed by a marker row with `^` under mismatches.
    Type1,
    /// Sequence rows around a marker row with `|` at identities.
    Type2,
    /// Two gapped FASTA records.
    FastA,
}

/// An ungapped block of a dense alignment. A `None` start means the
/// sequence has a gap over the whole block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start1: Option<usize>,
    pub start2: Option<usize>,
    pub len: usize,
}

/// Replay the transcript against both sequences and return two gapped
/// rows of equal length.
pub fn padded_rows(
    seq1: &[u8],
    seq2: &[u8],
    transcript: &Transcript,
) -> BlastResult<(Vec<u8>, Vec<u8>)> {
    let mut row1 = Vec::with_capacity(transcript.len());
    let mut row2 = Vec::with_capacity(transcript.len());
    let (mut i1, mut i2) = (0usize, 0usize);

    let take = |seq: &[u8], i: usize| {
        seq.get(i).copied().ok_or_else(|| {
            BlastError::Internal(format!("transcript runs past a sequence at {i}"))
        })
    };

    for &op in transcript.ops() {
        match op {
            TranscriptOp::Match | TranscriptOp::Replace => {
                row1.push(take(seq1, i1)?);
                row2.push(take(seq2, i2)?);
                i1 += 1;
                i2 += 1;
            }
            TranscriptOp::Insert => {
                row1.push(b'-');
                row2.push(take(seq2, i2)?);
                i2 += 1;
            }
            TranscriptOp::Intron => {
                row1.push(b'+');
                row2.push(take(seq2, i2)?);
                i2 += 1;
            }
            TranscriptOp::Delete => {
                row1.push(take(seq1, i1)?);
                row2.push(b'-');
                i1 += 1;
            }
            TranscriptOp::FrameShiftBack | TranscriptOp::FrameShiftForward => {}
        }
    }
    Ok((row1, row2))
}

pub fn format_text(
    seq1: &[u8],
    seq2: &[u8],
    transcript: &Transcript,
    kind: TextFormat,
    line_width: usize,
) -> BlastResult<String> {
    if line_width == 0 {
        return Err(BlastError::BadParameter("line width must be positive".to_string()));
    }
    let (row1, row2) = padded_rows(seq1, seq2, transcript)?;
    let mut out = String::new();

    if kind == TextFormat::FastA {
        for (name, row) in [("seq1", &row1), ("seq2", &row2)] {
            out.push('>');
            out.push_str(name);
            out.push('\n');
            for chunk in row.chunks(line_width) {
                out.push_str(&String::from_utf8_lossy(chunk));
                out.push('\n');
            }
        }
        return Ok(out);
    }

    let markers: Vec<u8> = transcript
        .ops()
        .iter()
        .filter(|op| !op.is_frame_shift())
        .map(|op| match (kind, op) {
            (TextFormat::Type1, TranscriptOp::Replace) => b'^',
            (TextFormat::Type2, TranscriptOp::Match) => b'|',
            _ => b' ',
        })
        .collect();

    for start in (0..row1.len()).step_by(line_width) {
        let end = (start + line_width).min(row1.len());
        let lines: [&[u8]; 3] = match kind {
            TextFormat::Type1 => [&row1[start..end], &row2[start..end], &markers[start..end]],
            _ => [&row1[start..end], &markers[start..end], &row2[start..end]],
        };
        for line in lines {
            out.push_str(String::from_utf8_lossy(line).trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
    Ok(out)
}

/// Dense segments: consecutive aligned columns form one segment, as does
/// each gap run.
pub fn segments(transcript: &Transcript) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    let (mut i1, mut i2) = (0usize, 0usize);
    let mut last_kind = None;

    for &op in transcript.ops() {
        let kind = match op {
            TranscriptOp::Match | TranscriptOp::Replace => 0u8,
            TranscriptOp::Insert | TranscriptOp::Intron => 1,
            TranscriptOp::Delete => 2,
            TranscriptOp::FrameShiftBack | TranscriptOp::FrameShiftForward => continue,
        };
        match out.last_mut() {
            Some(seg) if last_kind == Some(kind) => seg.len += 1,
            _ => out.push(Segment {
                start1: op.consumes_first().then_some(i1),
                start2: op.consumes_second().then_some(i2),
                len: 1,
            }),
        }
        last_kind = Some(kind);
        if op.consumes_first() {
            i1 += 1;
        }
        if op.consumes_second() {
            i2 += 1;
        }
    }
    out
}
