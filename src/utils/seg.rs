//! SEG masking of low-complexity protein stretches.
//!
//! Every window of `window` residues gets the Shannon entropy of its
//! composition. Windows at or below `locut` trigger a segment, which is
//! widened over neighbouring windows up to `hicut` and then trimmed to
//! the sub-range whose composition is least probable by chance
//! (Wootton & Federhen). Only the 20 standard residues (codes below 20)
//! take part; anything else counts against `maxbogus`.

use super::MaskedInterval;

const ALPHABET_SIZE: usize = 20;
const LN_ALPHABET: f64 = 2.995_732_273_553_991;
const LN_FACT_TABLE: usize = 256;

pub const SEG_WINDOW: usize = 12;
pub const SEG_LOCUT: f64 = 2.2;
pub const SEG_HICUT: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegParams {
    pub window: usize,
    /// Entropy, in bits, at or below which a window triggers a segment.
    pub locut: f64,
    /// Entropy up to which a segment is extended.
    pub hicut: f64,
    /// Non-standard residues tolerated in one window.
    pub maxbogus: usize,
    /// Largest total trim applied to a segment.
    pub maxtrim: usize,
}

impl Default for SegParams {
    fn default() -> Self {
        Self {
            window: SEG_WINDOW,
            locut: SEG_LOCUT,
            hicut: SEG_HICUT,
            maxbogus: 2,
            maxtrim: 50,
        }
    }
}

impl SegParams {
    /// A zero window falls back to the default, negative cut-offs to zero,
    /// and `hicut` is raised to `locut` when below it.
    pub fn new(window: usize, locut: f64, hicut: f64) -> Self {
        let window = if window > 0 { window } else { SEG_WINDOW };
        let locut = locut.max(0.0);
        let hicut = hicut.max(0.0).max(locut);
        Self {
            window,
            locut,
            hicut,
            maxbogus: 2.min(window),
            ..Self::default()
        }
    }
}

#[inline]
fn residue_index(code: u8) -> Option<usize> {
    ((code as usize) < ALPHABET_SIZE).then_some(code as usize)
}

/// Entropy in bits of a composition.
fn entropy(counts: &[u32; ALPHABET_SIZE]) -> f64 {
    let total: u32 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    -counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            p * p.log2()
        })
        .sum::<f64>()
}

#[derive(Debug, Clone)]
pub struct SegMasker {
    params: SegParams,
    downset: usize,
    upset: usize,
    ln_fact: Vec<f64>,
}

impl Default for SegMasker {
    fn default() -> Self {
        Self::new(SegParams::default())
    }
}

impl SegMasker {
    pub fn new(params: SegParams) -> Self {
        let downset = (params.window + 1) / 2 - 1;
        let mut ln_fact = Vec::with_capacity(LN_FACT_TABLE);
        ln_fact.push(0.0);
        for n in 1..LN_FACT_TABLE {
            ln_fact.push(ln_fact[n - 1] + (n as f64).ln());
        }
        Self {
            params,
            downset,
            upset: params.window - downset,
            ln_fact,
        }
    }

    /// Masked stretches of `seq`, sorted and non-overlapping.
    pub fn mask(&self, seq: &[u8]) -> Vec<MaskedInterval> {
        let mut segments = Vec::new();
        self.segment(seq, 0, &mut segments);
        segments.sort_unstable();

        let mut out: Vec<MaskedInterval> = Vec::with_capacity(segments.len());
        for (start, last) in segments {
            match out.last_mut() {
                Some(prev) if start < prev.end => prev.end = prev.end.max(last + 1),
                _ => out.push(MaskedInterval::new(start, last + 1)),
            }
        }
        out
    }

    /// Collect inclusive segments of `seq`, shifted by `offset`.
    fn segment(&self, seq: &[u8], offset: usize, out: &mut Vec<(usize, usize)>) {
        if seq.len() < self.params.window {
            return;
        }
        let h = self.entropies(seq);
        let last = seq.len() - self.upset;
        let mut lowlim = self.downset;
        let mut i = self.downset;

        while i <= last {
            if h[i].is_some_and(|e| e <= self.params.locut) {
                let loi = self.find_low(i, lowlim, &h);
                let hii = self.find_high(i, last, &h);
                let widened = loi - self.downset;
                let (left, right) = self.trim(seq, widened, hii + self.upset - 1);

                // the trigger window was trimmed away; rescan what lies left of it
                if i + self.upset - 1 < left && widened < left {
                    self.segment(&seq[widened..left], offset + widened, out);
                }
                out.push((left + offset, right + offset));

                i = hii.min(right + self.downset);
                lowlim = i + 1;
            }
            i += 1;
        }
    }

    /// Entropy of the window centred on each position; `None` where the
    /// window does not fit or holds too many non-standard residues.
    fn entropies(&self, seq: &[u8]) -> Vec<Option<f64>> {
        let window = self.params.window;
        let mut h = vec![None; seq.len()];
        for (i, slot) in h
            .iter_mut()
            .enumerate()
            .take(seq.len() - self.upset + 1)
            .skip(self.downset)
        {
            let mut counts = [0u32; ALPHABET_SIZE];
            let mut bogus = 0usize;
            let start = i - self.downset;
            for &code in &seq[start..start + window] {
                match residue_index(code) {
                    Some(r) => counts[r] += 1,
                    None => bogus += 1,
                }
            }
            if bogus <= self.params.maxbogus {
                *slot = Some(entropy(&counts));
            }
        }
        h
    }

    #[inline]
    fn below_hicut(&self, h: Option<f64>) -> bool {
        h.is_some_and(|e| e <= self.params.hicut)
    }

    /// Leftmost position reachable from `i` without crossing `limit` or a
    /// window above `hicut`.
    fn find_low(&self, i: usize, limit: usize, h: &[Option<f64>]) -> usize {
        let mut j = i + 1;
        while j > limit && self.below_hicut(h[j - 1]) {
            j -= 1;
        }
        j
    }

    fn find_high(&self, i: usize, limit: usize, h: &[Option<f64>]) -> usize {
        let mut j = i;
        while j <= limit && self.below_hicut(h[j]) {
            j += 1;
        }
        j - 1
    }

    fn lnfact(&self, n: usize) -> f64 {
        match self.ln_fact.get(n) {
            Some(&v) => v,
            None => {
                let n = n as f64;
                (n + 0.5) * n.ln() - n + 0.918_938_533_2
            }
        }
    }

    /// Log probability of drawing a composition this uneven from
    /// `len` uniformly random residues.
    fn ln_prob(&self, counts: &[u32; ALPHABET_SIZE], len: usize) -> f64 {
        let mut sorted: Vec<u32> = counts.iter().copied().filter(|&c| c > 0).collect();
        sorted.sort_unstable_by(|a, b| b.cmp(a));

        // arrangements of the counts over the alphabet
        let mut ln_ass = self.lnfact(ALPHABET_SIZE) - self.lnfact(ALPHABET_SIZE - sorted.len());
        for run in sorted.chunk_by(|a, b| a == b) {
            ln_ass -= self.lnfact(run.len());
        }
        // orderings of the residues
        let mut ln_perm = self.lnfact(len);
        for &c in &sorted {
            ln_perm -= self.lnfact(c as usize);
        }
        ln_ass + ln_perm - len as f64 * LN_ALPHABET
    }

    /// Narrow the inclusive range `[left, right]` to its least probable
    /// sub-range, dropping at most `maxtrim` residues.
    fn trim(&self, seq: &[u8], left: usize, right: usize) -> (usize, usize) {
        let seg_len = right - left + 1;
        let minlen = seg_len.saturating_sub(self.params.maxtrim).max(1);
        let mut best = (left, right);
        let mut min_prob = 1.0;

        for len in (minlen + 1..=seg_len).rev() {
            let mut counts = [0u32; ALPHABET_SIZE];
            for &code in &seq[left..left + len] {
                if let Some(r) = residue_index(code) {
                    counts[r] += 1;
                }
            }
            let mut shift = 0;
            loop {
                let prob = self.ln_prob(&counts, len);
                if prob < min_prob {
                    min_prob = prob;
                    best = (left + shift, left + shift + len - 1);
                }
                if shift + len >= seg_len {
                    break;
                }
                if let Some(r) = residue_index(seq[left + shift]) {
                    counts[r] -= 1;
                }
                if let Some(r) = residue_index(seq[left + shift + len]) {
                    counts[r] += 1;
                }
                shift += 1;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{Alphabet, Sequence};

    fn encode(text: &[u8]) -> Vec<u8> {
        Sequence::new("p", text, Alphabet::Protein)
            .unwrap()
            .residues()
            .to_vec()
    }

    #[test]
    fn test_params_normalise() {
        let p = SegParams::new(0, -1.0, 1.0);
        assert_eq!(p.window, SEG_WINDOW);
        assert_eq!((p.locut, p.hicut), (0.0, 1.0));
        let p = SegParams::new(10, 3.0, 2.0);
        assert_eq!(p.hicut, 3.0);
    }

    #[test]
    fn test_entropy_range() {
        let mut counts = [0u32; ALPHABET_SIZE];
        counts[0] = 12;
        assert_eq!(entropy(&counts), 0.0);
        let even = [1u32; ALPHABET_SIZE];
        assert!((entropy(&even) - (20f64).log2()).abs() < 1e-12);
    }

    #[test]
    fn test_poly_alanine_is_masked() {
        let masked = SegMasker::default().mask(&encode(&[b'A'; 40]));
        assert_eq!(masked, vec![MaskedInterval::new(0, 40)]);
    }

    #[test]
    fn test_short_sequence_is_left_alone() {
        assert!(SegMasker::default().mask(&encode(b"AAAAA")).is_empty());
    }

    #[test]
    fn test_low_complexity_run_inside_complex_protein() {
        let flank = b"MKWHEAWCFYRDNIPGTVLS";
        let mut text = flank.to_vec();
        text.extend_from_slice(&[b'Q'; 20]);
        text.extend_from_slice(b"HCMYPWFKDIGRELNTSVWA");
        let masked = SegMasker::default().mask(&encode(&text));
        assert_eq!(masked, vec![MaskedInterval::new(flank.len(), flank.len() + 20)]);
    }

    #[test]
    fn test_complex_sequence_is_not_masked() {
        let seq: Vec<u8> = (0..100).map(|i| (i % 20) as u8).collect();
        assert!(SegMasker::default().mask(&seq).is_empty());
    }
}
