//! Symmetric DUST masking of low-complexity nucleotide stretches.
//!
//! A stretch is low-complexity when the number of repeated triplet pairs
//! it holds exceeds `level / 10` per triplet. Windows of up to `window`
//! bases are examined; masked stretches closer than `linker` bases are
//! joined. Input is encoded (ACGT = 0..3); any other code splits the
//! sequence and is never masked on its own.

use std::collections::VecDeque;

use super::MaskedInterval;
use crate::sequence::NUM_BASES;

pub const DUST_LEVEL: u32 = 20;
pub const DUST_WINDOW: usize = 64;
pub const DUST_LINKER: usize = 1;

/// DUST parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DustParams {
    /// Score threshold, 2..=64.
    pub level: u32,
    /// Window length in bases, 8..=64.
    pub window: usize,
    /// Largest distance at which masked stretches are joined, 1..=32.
    pub linker: usize,
}

impl Default for DustParams {
    fn default() -> Self {
        Self {
            level: DUST_LEVEL,
            window: DUST_WINDOW,
            linker: DUST_LINKER,
        }
    }
}

impl DustParams {
    /// Out-of-range values fall back to their defaults.
    pub fn new(level: u32, window: usize, linker: usize) -> Self {
        Self {
            level: if (2..=64).contains(&level) { level } else { DUST_LEVEL },
            window: if (8..=64).contains(&window) { window } else { DUST_WINDOW },
            linker: if (1..=32).contains(&linker) { linker } else { DUST_LINKER },
        }
    }
}

/// Candidate stretch of the current run; `end` is its last base.
#[derive(Debug, Clone, Copy)]
struct Perfect {
    start: usize,
    end: usize,
    score: u32,
    len: usize,
}

#[derive(Debug, Clone)]
pub struct DustMasker {
    linker: usize,
    window: usize,
    /// Highest triplet count a suffix may hold without scoring above the
    /// threshold.
    low_k: u8,
    thresholds: Vec<u32>,
}

impl Default for DustMasker {
    fn default() -> Self {
        Self::new(DustParams::default())
    }
}

impl DustMasker {
    pub fn new(params: DustParams) -> Self {
        let mut thresholds = Vec::with_capacity(params.window - 2);
        thresholds.push(1);
        thresholds.extend((1..params.window - 2).map(|i| i as u32 * params.level));
        Self {
            linker: params.linker,
            window: params.window,
            low_k: (params.level / 5) as u8,
            thresholds,
        }
    }

    /// Masked stretches of `seq`, sorted and non-overlapping.
    pub fn mask(&self, seq: &[u8]) -> Vec<MaskedInterval> {
        let mut out = Vec::new();
        let mut run_start = 0;
        for (i, &base) in seq.iter().enumerate() {
            if base >= NUM_BASES {
                self.mask_run(&seq[run_start..i], run_start, &mut out);
                run_start = i + 1;
            }
        }
        self.mask_run(&seq[run_start..], run_start, &mut out);
        out
    }

    /// Mask one stretch of unambiguous bases starting at `offset`.
    fn mask_run(&self, run: &[u8], offset: usize, out: &mut Vec<MaskedInterval>) {
        let stop = run.len();
        let mut start = 0;

        while stop > start + 2 {
            let mut perfect: VecDeque<Perfect> = VecDeque::new();
            let mut window = TripletWindow::new(self.window, self.low_k, &self.thresholds);
            let mut triplet = (run[start] << 2) | run[start + 1];
            let mut pos = start + 2;
            let mut done = false;

            while !done && pos < stop {
                self.save(out, window.start, start + offset, &mut perfect);
                triplet = ((triplet << 2) & 0x3F) | run[pos];
                pos += 1;

                if window.shift(triplet, &mut perfect) {
                    if window.needs_processing() {
                        window.find_perfect(&mut perfect);
                    }
                    continue;
                }
                // one triplet value fills the window
                while pos < stop {
                    self.save(out, window.start, start + offset, &mut perfect);
                    triplet = ((triplet << 2) & 0x3F) | run[pos];
                    if window.shift(triplet, &mut perfect) {
                        done = true;
                        break;
                    }
                    pos += 1;
                }
            }

            let mut wstart = window.start;
            while !perfect.is_empty() {
                self.save(out, wstart, start + offset, &mut perfect);
                wstart += 1;
            }

            if window.start == 0 {
                break;
            }
            start += window.start;
        }
    }

    /// Emit the oldest candidate once the window has moved past its start,
    /// joining it to the previous stretch when they are within `linker`.
    fn save(
        &self,
        out: &mut Vec<MaskedInterval>,
        wstart: usize,
        offset: usize,
        perfect: &mut VecDeque<Perfect>,
    ) {
        let Some(oldest) = perfect.back().copied() else {
            return;
        };
        if oldest.start >= wstart {
            return;
        }
        let (start, end) = (oldest.start + offset, oldest.end + offset + 1);
        match out.last_mut() {
            Some(last) if last.end + self.linker >= start => last.end = last.end.max(end),
            _ => out.push(MaskedInterval::new(start, end)),
        }
        while perfect.back().is_some_and(|p| p.start < wstart) {
            perfect.pop_back();
        }
    }
}

/// Sliding window of triplets. The newest triplet is at the front.
/// `suffix` is the start of the longest suffix whose triplet counts stay
/// at or below `low_k`.
struct TripletWindow<'a> {
    triplets: VecDeque<u8>,
    start: usize,
    stop: usize,
    suffix: usize,
    max_len: usize,
    low_k: u8,
    window_counts: [u8; 64],
    suffix_counts: [u8; 64],
    window_score: u32,
    suffix_score: u32,
    distinct: u32,
    thresholds: &'a [u32],
}

impl<'a> TripletWindow<'a> {
    fn new(window: usize, low_k: u8, thresholds: &'a [u32]) -> Self {
        Self {
            triplets: VecDeque::with_capacity(window),
            start: 0,
            stop: 0,
            suffix: 0,
            max_len: window - 2,
            low_k,
            window_counts: [0; 64],
            suffix_counts: [0; 64],
            window_score: 0,
            suffix_score: 0,
            distinct: 0,
            thresholds,
        }
    }

    #[inline]
    fn add(score: &mut u32, counts: &mut [u8; 64], t: u8) {
        *score += counts[t as usize] as u32;
        counts[t as usize] += 1;
    }

    #[inline]
    fn remove(score: &mut u32, counts: &mut [u8; 64], t: u8) {
        counts[t as usize] -= 1;
        *score -= counts[t as usize] as u32;
    }

    fn needs_processing(&self) -> bool {
        let count = self.stop - self.suffix;
        count < self.triplets.len()
            && count < self.thresholds.len()
            && 10 * self.window_score > self.thresholds[count]
    }

    fn drop_oldest(&mut self) -> Option<u8> {
        let old = self.triplets.pop_back()?;
        Self::remove(&mut self.window_score, &mut self.window_counts, old);
        if self.window_counts[old as usize] == 0 {
            self.distinct -= 1;
        }
        self.start += 1;
        Some(old)
    }

    fn push_newest(&mut self, t: u8) {
        self.triplets.push_front(t);
        if self.window_counts[t as usize] == 0 {
            self.distinct += 1;
        }
        Self::add(&mut self.window_score, &mut self.window_counts, t);
    }

    /// Add a triplet. Returns false when the full window holds a single
    /// triplet value; it is then one candidate by itself.
    fn shift(&mut self, t: u8, perfect: &mut VecDeque<Perfect>) -> bool {
        if self.triplets.len() >= self.max_len {
            if self.distinct <= 1 {
                return self.shift_uniform(t, perfect);
            }
            let suffix_at_start = self.suffix == self.start;
            if let Some(old) = self.drop_oldest() {
                if suffix_at_start {
                    self.suffix += 1;
                    Self::remove(&mut self.suffix_score, &mut self.suffix_counts, old);
                }
            }
        }

        self.push_newest(t);
        Self::add(&mut self.suffix_score, &mut self.suffix_counts, t);

        if self.suffix_counts[t as usize] > self.low_k {
            // shrink the suffix past the previous copy of `t`
            let mut off = self.triplets.len() - (self.suffix - self.start) - 1;
            loop {
                let old = self.triplets[off];
                Self::remove(&mut self.suffix_score, &mut self.suffix_counts, old);
                self.suffix += 1;
                if old == t || off == 0 {
                    break;
                }
                off -= 1;
            }
        }

        self.stop += 1;

        if self.triplets.len() >= self.max_len && self.distinct <= 1 {
            perfect.clear();
            perfect.push_front(Perfect {
                start: self.start,
                end: self.stop + 1,
                score: 0,
                len: 0,
            });
            return false;
        }
        true
    }

    fn shift_uniform(&mut self, t: u8, perfect: &mut VecDeque<Perfect>) -> bool {
        self.drop_oldest();
        self.push_newest(t);
        self.stop += 1;
        if self.distinct <= 1 {
            perfect.push_front(Perfect {
                start: self.start,
                end: self.stop + 1,
                score: 0,
                len: 0,
            });
            return false;
        }
        true
    }

    /// Record every window suffix longer than the clean suffix that scores
    /// above the threshold and beats the candidates it contains.
    fn find_perfect(&self, perfect: &mut VecDeque<Perfect>) {
        let suffix_len = self.stop - self.suffix;
        if suffix_len >= self.triplets.len() {
            return;
        }

        let mut counts = self.suffix_counts;
        let mut score = self.suffix_score;
        let (mut max_score, mut max_len) = (0u32, 0usize);
        let mut pos = self.suffix.saturating_sub(1);
        let mut idx = 0usize;

        for (count, &t) in (suffix_len..).zip(self.triplets.iter().skip(suffix_len)) {
            let seen = counts[t as usize];
            Self::add(&mut score, &mut counts, t);

            if seen > 0 && count < self.thresholds.len() && score * 10 > self.thresholds[count] {
                while idx < perfect.len() && pos <= perfect[idx].start {
                    let p = perfect[idx];
                    if max_score == 0 || max_len * p.score as usize > max_score as usize * p.len {
                        max_score = p.score;
                        max_len = p.len;
                    }
                    idx += 1;
                }
                if max_score == 0 || score as usize * max_len >= max_score as usize * count {
                    max_score = score;
                    max_len = count;
                    perfect.insert(
                        idx,
                        Perfect {
                            start: pos,
                            end: self.stop + 1,
                            score,
                            len: count,
                        },
                    );
                }
            }
            pos = pos.saturating_sub(1);
        }
    }
}
