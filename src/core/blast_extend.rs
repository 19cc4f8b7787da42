//! Diagonal bookkeeping and ungapped extension
//!
//! Each word hit lies on a diagonal `s_off - q_off`. The diagonal table
//! remembers, per diagonal, how far into the subject the last hit or
//! extension reached, so a hit inside an already explored stretch is not
//! extended again. In two-hit mode a hit is only extended when a second,
//! non-overlapping hit on the same diagonal follows within the window.
//!
//! Positions stored in the table are biased by `offset`, which grows by
//! the subject length (plus the window) after each subject, so the table
//! never needs clearing between subjects until the offset nears overflow.

use crate::error::{try_filled_vec, BlastResult};
use crate::utils::ScoringMatrix;

/// Offset beyond which the table is cleared instead of advanced.
const OFFSET_LIMIT: i32 = i32::MAX / 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct DiagStruct {
    /// Biased subject position the diagonal has been explored to.
    pub last_hit: i32,
    /// Set when the last extension on this diagonal was saved.
    pub flag: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitAction {
    Skip,
    Extend,
}

#[derive(Debug, Clone)]
pub struct DiagTable {
    hit_level: Vec<DiagStruct>,
    mask: usize,
    window: i32,
    offset: i32,
}

impl DiagTable {
    /// Table for a concatenated query of `query_length` residues.
    pub fn new(query_length: usize, window: usize) -> BlastResult<Self> {
        let len = (query_length + window).max(1).next_power_of_two();
        Ok(Self {
            hit_level: try_filled_vec(len, DiagStruct::default(), "diagonal table")?,
            mask: len - 1,
            window: window as i32,
            offset: window as i32,
        })
    }

    pub fn len(&self) -> usize {
        self.hit_level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hit_level.is_empty()
    }

    #[inline]
    fn index(&self, q_off: usize, s_off: usize) -> usize {
        (s_off + self.hit_level.len() - (q_off & self.mask)) & self.mask
    }

    /// Decide whether the word hit `[s_off, s_end)` against `q_off` should
    /// be extended. Hits that are not extended update the diagonal here;
    /// extended hits must be reported back with [`Self::record_extension`].
    pub fn register_hit(
        &mut self,
        q_off: usize,
        s_off: usize,
        s_end: usize,
        word_length: usize,
    ) -> HitAction {
        let index = self.index(q_off, s_off);
        let entry = self.hit_level[index];
        let s_pos = s_end as i32 + self.offset;
        let step = s_pos - entry.last_hit;

        if step <= 0 {
            return HitAction::Skip;
        }

        let (new_hit, second_hit) = if self.window == 0 || entry.flag {
            (true, false)
        } else {
            (
                step > self.window,
                step >= word_length as i32 && step < self.window,
            )
        };

        if (self.window == 0 && new_hit) || second_hit {
            return HitAction::Extend;
        }

        let slot = &mut self.hit_level[index];
        if step > self.window {
            slot.last_hit = s_pos;
        }
        if new_hit {
            slot.flag = false;
        }
        HitAction::Skip
    }

    /// Record that the extension of a hit on this diagonal reached subject
    /// position `s_ext_end`.
    pub fn record_extension(&mut self, q_off: usize, s_off: usize, s_ext_end: usize, saved: bool) {
        let index = self.index(q_off, s_off);
        let slot = &mut self.hit_level[index];
        slot.last_hit = s_ext_end as i32 + self.offset;
        slot.flag = saved;
    }

    /// Move past a finished subject of `subject_length` residues.
    pub fn advance(&mut self, subject_length: usize) {
        let step = (subject_length as i64 + self.window as i64).min(OFFSET_LIMIT as i64) as i32;
        if self.offset >= OFFSET_LIMIT - step {
            self.clear();
        } else {
            self.offset += step;
        }
    }

    pub fn clear(&mut self) {
        self.hit_level.fill(DiagStruct::default());
        self.offset = self.window;
    }
}

/// Result of an ungapped extension. Offsets are in the coordinates of
/// the sequences the extension ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UngappedData {
    pub q_start: usize,
    pub s_start: usize,
    pub length: usize,
    pub score: i32,
}

impl UngappedData {
    #[inline]
    pub fn q_end(&self) -> usize {
        self.q_start + self.length
    }

    #[inline]
    pub fn s_end(&self) -> usize {
        self.s_start + self.length
    }
}

/// Ungapped x-drop extension of the word hit at (`q_off`, `s_off`).
///
/// The left walk starts just before the word and keeps the best prefix;
/// the right walk starts at the word with the left score carried in and
/// also stops as soon as the running score falls to zero.
pub fn ungapped_extend(
    query: &[u8],
    subject: &[u8],
    q_off: usize,
    s_off: usize,
    matrix: &ScoringMatrix,
    x_dropoff: i32,
) -> UngappedData {
    let mut score = 0;
    let mut best = 0;
    let mut left = 0;
    for i in 1..=q_off.min(s_off) {
        score += matrix.score(query[q_off - i], subject[s_off - i]);
        if score > best {
            best = score;
            left = i;
        } else if best - score >= x_dropoff {
            break;
        }
    }

    score = best;
    let mut right = 0;
    let n = (query.len() - q_off).min(subject.len() - s_off);
    for i in 0..n {
        score += matrix.score(query[q_off + i], subject[s_off + i]);
        if score > best {
            best = score;
            right = i + 1;
        } else if score <= 0 || best - score >= x_dropoff {
            break;
        }
    }

    UngappedData {
        q_start: q_off - left,
        s_start: s_off - left,
        length: left + right,
        score: best,
    }
}

/// Score of the ungapped segment starting at (`q_start`, `s_start`).
pub fn ungapped_score(
    query: &[u8],
    subject: &[u8],
    q_start: usize,
    s_start: usize,
    length: usize,
    matrix: &ScoringMatrix,
) -> i32 {
    query[q_start..q_start + length]
        .iter()
        .zip(&subject[s_start..s_start + length])
        .map(|(&q, &s)| matrix.score(q, s))
        .sum()
}
