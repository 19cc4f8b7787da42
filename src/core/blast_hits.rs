//! HSPs, per-subject HSP lists and the per-query result set
//!
//! Coordinates are half-open and local to the query context and the
//! subject frame. Out-of-frame HSPs keep the translated side in
//! nucleotide offsets on the strand of the frame.

use crate::align::Transcript;
use crate::common::{compare_hsp_lists, score_compare_hsps};
use crate::core::query_info::QueryBlock;
use crate::stats::{bit_score, evalue, KarlinParams};

#[derive(Debug, Clone, PartialEq)]
pub struct Hsp {
    pub context: usize,
    pub query_index: usize,
    pub query_frame: i8,
    pub subject_frame: i8,
    pub q_start: usize,
    pub q_end: usize,
    pub s_start: usize,
    pub s_end: usize,
    /// Point the gapped extension started from.
    pub q_gapped_start: usize,
    pub s_gapped_start: usize,
    pub score: i32,
    pub bit_score: f64,
    pub evalue: f64,
    pub out_of_frame: bool,
    pub transcript: Option<Transcript>,
}

impl Hsp {
    pub fn q_len(&self) -> usize {
        self.q_end - self.q_start
    }

    pub fn s_len(&self) -> usize {
        self.s_end - self.s_start
    }

    /// Identity of the strands the HSP lies on. Out-of-frame HSPs are
    /// compared across all frames of a strand.
    #[inline]
    pub fn strand_key(&self) -> (usize, i8, i8) {
        if self.out_of_frame {
            (
                self.query_index,
                self.query_frame.signum(),
                self.subject_frame.signum(),
            )
        } else {
            (self.context, self.query_frame, self.subject_frame)
        }
    }

    #[inline]
    pub fn same_strands(&self, other: &Hsp) -> bool {
        self.strand_key() == other.strand_key()
    }

    /// Subject offsets are whole-strand nucleotides rather than chunk
    /// residues.
    #[inline]
    pub fn subject_in_nucleotides(&self) -> bool {
        self.out_of_frame && self.subject_frame != 0
    }

    /// Query and subject ranges both intersect those of `other`.
    pub fn intersects(&self, other: &Hsp) -> bool {
        self.same_strands(other)
            && self.q_start < other.q_end
            && other.q_start < self.q_end
            && self.s_start < other.s_end
            && other.s_start < self.s_end
    }

    /// Both ranges lie within those of `other`.
    pub fn contained_in(&self, other: &Hsp) -> bool {
        self.same_strands(other)
            && other.q_start <= self.q_start
            && self.q_end <= other.q_end
            && other.s_start <= self.s_start
            && self.s_end <= other.s_end
    }

    /// Duplicate resolution: higher score, then earlier subject start,
    /// then the longer HSP.
    fn preferred_over(&self, other: &Hsp) -> bool {
        (self.score, std::cmp::Reverse(self.s_start), self.s_len() + self.q_len())
            > (other.score, std::cmp::Reverse(other.s_start), other.s_len() + other.q_len())
    }

    pub fn shift_subject(&mut self, offset: usize) {
        self.s_start += offset;
        self.s_end += offset;
        self.s_gapped_start += offset;
    }
}

/// HSPs of one subject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HspList {
    pub oid: usize,
    pub hsps: Vec<Hsp>,
}

impl HspList {
    pub fn new(oid: usize) -> Self {
        Self {
            oid,
            hsps: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.hsps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hsps.is_empty()
    }

    pub fn best_evalue(&self) -> f64 {
        self.hsps
            .iter()
            .map(|h| h.evalue)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn best_score(&self) -> i32 {
        self.hsps.iter().map(|h| h.score).max().unwrap_or(i32::MIN)
    }

    pub fn sort_by_score(&mut self) {
        self.hsps.sort_by(score_compare_hsps);
    }

    pub fn calculate_evalues(&mut self, query: &QueryBlock, kbp: &KarlinParams) {
        for hsp in &mut self.hsps {
            let space = query.context(hsp.context).eff_searchsp;
            hsp.evalue = evalue(hsp.score, kbp, space);
            hsp.bit_score = bit_score(hsp.score, kbp);
        }
    }

    /// Drop HSPs below the score cutoff or above the e-value threshold.
    /// Returns the number removed.
    pub fn reap(&mut self, cutoff_score: i32, evalue_threshold: f64) -> usize {
        let before = self.hsps.len();
        self.hsps.retain(|h| {
            h.score >= cutoff_score && h.evalue <= evalue_threshold && h.q_len() > 0 && h.s_len() > 0
        });
        before - self.hsps.len()
    }

    /// Shift subject coordinates of a chunk back to the whole subject.
    pub fn adjust_offsets(&mut self, chunk_offset: usize) {
        if chunk_offset == 0 {
            return;
        }
        for hsp in &mut self.hsps {
            if !hsp.subject_in_nucleotides() {
                hsp.shift_subject(chunk_offset);
            }
        }
    }

    /// Remove HSPs sharing a start point or an end point with a better
    /// HSP on the same strands. Returns the number removed.
    pub fn purge_common_endpoints(&mut self) -> usize {
        let before = self.hsps.len();
        if before < 2 {
            return 0;
        }

        let key = Hsp::strand_key;
        self.hsps.sort_by(|a, b| {
            key(a)
                .cmp(&key(b))
                .then(a.q_start.cmp(&b.q_start))
                .then(a.s_start.cmp(&b.s_start))
                .then(b.score.cmp(&a.score))
        });
        self.hsps.dedup_by(|later, kept| {
            key(later) == key(kept) && later.q_start == kept.q_start && later.s_start == kept.s_start
        });

        self.hsps.sort_by(|a, b| {
            key(a)
                .cmp(&key(b))
                .then(a.q_end.cmp(&b.q_end))
                .then(a.s_end.cmp(&b.s_end))
                .then(b.score.cmp(&a.score))
        });
        self.hsps.dedup_by(|later, kept| {
            key(later) == key(kept) && later.q_end == kept.q_end && later.s_end == kept.s_end
        });

        self.sort_by_score();
        before - self.hsps.len()
    }

    /// Fold in the HSPs of the next chunk. Both lists are in whole-subject
    /// coordinates; `overlap_start..overlap_end` is the stretch the two
    /// chunks share. HSPs touching the overlap that intersect on both
    /// sequences are duplicates and only the preferred one is kept.
    pub fn merge_chunk(&mut self, next: HspList, overlap_start: usize, overlap_end: usize) {
        for hsp in next.hsps {
            let (lo, hi) = if hsp.subject_in_nucleotides() {
                (3 * overlap_start, 3 * overlap_end + 2)
            } else {
                (overlap_start, overlap_end)
            };
            let duplicate = if hsp.s_start < hi {
                self.hsps
                    .iter()
                    .position(|h| h.s_end > lo && h.intersects(&hsp))
            } else {
                None
            };
            match duplicate {
                Some(i) => {
                    if hsp.preferred_over(&self.hsps[i]) {
                        self.hsps[i] = hsp;
                    }
                }
                None => self.hsps.push(hsp),
            }
        }
    }

    /// Append HSPs from another frame of the same subject.
    pub fn append(&mut self, other: HspList) {
        self.hsps.extend(other.hsps);
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryResults {
    pub query_index: usize,
    pub query_id: String,
    pub lists: Vec<HspList>,
}

impl QueryResults {
    pub fn num_hsps(&self) -> usize {
        self.lists.iter().map(HspList::len).sum()
    }
}

/// Per-query HSP lists across all subjects searched.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    queries: Vec<QueryResults>,
    hitlist_size: usize,
}

impl ResultSet {
    pub fn new(query: &QueryBlock, hitlist_size: usize) -> Self {
        Self {
            queries: (0..query.num_queries())
                .map(|i| QueryResults {
                    query_index: i,
                    query_id: query.query_id(i).to_string(),
                    lists: Vec::new(),
                })
                .collect(),
            hitlist_size,
        }
    }

    pub fn hitlist_size(&self) -> usize {
        self.hitlist_size
    }

    /// Split a subject's HSP list by query and keep it. Each query holds
    /// at most `hitlist_size` lists once pruned.
    pub fn save_hitlist(&mut self, list: HspList) {
        if list.is_empty() {
            return;
        }
        let oid = list.oid;
        let mut per_query: Vec<Option<HspList>> = vec![None; self.queries.len()];
        for hsp in list.hsps {
            per_query[hsp.query_index]
                .get_or_insert_with(|| HspList::new(oid))
                .hsps
                .push(hsp);
        }
        for (results, split) in self.queries.iter_mut().zip(per_query) {
            if let Some(mut split) = split {
                split.sort_by_score();
                results.lists.push(split);
                if results.lists.len() >= 2 * self.hitlist_size {
                    Self::prune(results, self.hitlist_size);
                }
            }
        }
    }

    fn prune(results: &mut QueryResults, hitlist_size: usize) {
        results.lists.retain(|l| !l.is_empty());
        results.lists.sort_by(compare_hsp_lists);
        results.lists.truncate(hitlist_size);
    }

    /// Final ordering: HSPs within each list by score, lists by
    /// significance, truncated to the hitlist size.
    pub fn sort_results(&mut self) {
        for results in &mut self.queries {
            for list in &mut results.lists {
                list.sort_by_score();
            }
            Self::prune(results, self.hitlist_size);
        }
    }

    pub fn queries(&self) -> &[QueryResults] {
        &self.queries
    }

    pub fn queries_mut(&mut self) -> &mut [QueryResults] {
        &mut self.queries
    }

    pub fn num_hsps(&self) -> usize {
        self.queries.iter().map(QueryResults::num_hsps).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_hsps() == 0
    }

    pub fn hsps(&self) -> impl Iterator<Item = (&QueryResults, &HspList, &Hsp)> {
        self.queries.iter().flat_map(|q| {
            q.lists
                .iter()
                .flat_map(move |l| l.hsps.iter().map(move |h| (q, l, h)))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn hsp(context: usize, q: (usize, usize), s: (usize, usize), score: i32) -> Hsp {
        Hsp {
            context,
            query_index: 0,
            query_frame: 0,
            subject_frame: 0,
            q_start: q.0,
            q_end: q.1,
            s_start: s.0,
            s_end: s.1,
            q_gapped_start: q.0,
            s_gapped_start: s.0,
            score,
            bit_score: 0.0,
            evalue: 1.0 / score as f64,
            out_of_frame: false,
            transcript: None,
        }
    }

    #[test]
    fn test_reap() {
        let mut list = HspList::new(0);
        list.hsps = vec![hsp(0, (0, 10), (0, 10), 50), hsp(0, (20, 30), (20, 30), 10)];
        list.hsps[1].evalue = 20.0;
        assert_eq!(list.reap(5, 10.0), 1);
        assert_eq!(list.hsps[0].score, 50);
        assert_eq!(list.reap(60, 10.0), 1);
        assert!(list.is_empty());
    }

    #[test]
    fn test_purge_common_endpoints() {
        let mut list = HspList::new(0);
        list.hsps = vec![
            hsp(0, (0, 10), (0, 10), 20),
            hsp(0, (0, 12), (0, 12), 25),
            hsp(0, (5, 30), (5, 30), 40),
            hsp(0, (8, 30), (8, 30), 30),
            hsp(1, (0, 10), (0, 10), 20),
        ];
        assert_eq!(list.purge_common_endpoints(), 2);
        let scores: Vec<i32> = list.hsps.iter().map(|h| h.score).collect();
        assert_eq!(scores, vec![40, 25, 20]);
    }

    #[test]
    fn test_merge_chunk_collapses_overlap_duplicates() {
        let mut first = HspList::new(3);
        first.hsps = vec![hsp(0, (0, 20), (100, 120), 30), hsp(0, (40, 60), (190, 198), 12)];
        let mut next = HspList::new(3);
        next.hsps = vec![hsp(0, (40, 70), (190, 220), 40), hsp(0, (0, 20), (300, 320), 30)];
        first.merge_chunk(next, 180, 200);
        assert_eq!(first.len(), 3);
        assert!(first.hsps.iter().any(|h| h.s_start == 190 && h.score == 40));
        assert!(!first.hsps.iter().any(|h| h.score == 12));
    }

    #[test]
    fn test_save_hitlist_splits_by_query_and_prunes() {
        let mut results = ResultSet {
            queries: vec![QueryResults::default(), QueryResults::default()],
            hitlist_size: 2,
        };
        for oid in 0..5 {
            let mut list = HspList::new(oid);
            let mut a = hsp(0, (0, 10), (0, 10), 10 + oid as i32);
            a.query_index = 0;
            let mut b = hsp(2, (0, 10), (0, 10), 50);
            b.query_index = 1;
            list.hsps = vec![a, b];
            results.save_hitlist(list);
        }
        results.sort_results();
        let first: Vec<usize> = results.queries()[0].lists.iter().map(|l| l.oid).collect();
        assert_eq!(first, vec![4, 3]);
        // equal significance: lower ordinal first
        let second: Vec<usize> = results.queries()[1].lists.iter().map(|l| l.oid).collect();
        assert_eq!(second, vec![0, 1]);
    }
}
