use anyhow::Result;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::core::blast_frames::sequence_coords;
use crate::core::blast_hits::{Hsp, HspList, ResultSet};
use crate::core::blast_options::Program;

/// One tabular output row.
#[derive(Debug, Clone)]
pub struct Hit {
    pub query_id: String,
    pub subject_id: String,
    pub identity: f64,
    pub length: usize,
    pub mismatch: usize,
    pub gapopen: usize,
    pub q_start: usize,
    pub q_end: usize,
    pub s_start: usize,
    pub s_end: usize,
    pub e_value: f64,
    pub bit_score: f64,
    /// Query index, in input order.
    pub q_idx: u32,
    /// Subject ordinal.
    pub s_idx: u32,
    pub raw_score: i32,
}

impl Hit {
    /// Build the row of one HSP. Lengths are those of the sequences as
    /// supplied (nucleotides for translated sides).
    pub fn from_hsp(
        program: Program,
        hsp: &Hsp,
        oid: usize,
        query_id: &str,
        query_len: usize,
        subject_id: &str,
        subject_len: usize,
    ) -> Self {
        let (q_start, q_end) = sequence_coords(
            hsp.q_start,
            hsp.q_end,
            hsp.query_frame,
            program.translates_query(),
            hsp.out_of_frame && program.translates_query(),
            query_len,
        );
        let (s_start, s_end) = sequence_coords(
            hsp.s_start,
            hsp.s_end,
            hsp.subject_frame,
            program.translates_subject(),
            hsp.subject_in_nucleotides(),
            subject_len,
        );

        let (identity, length, mismatch, gapopen) = match &hsp.transcript {
            Some(t) => {
                let stats = t.stats();
                (stats.identity(), stats.length, stats.mismatches, stats.gap_opens)
            }
            None => (0.0, hsp.q_len().max(hsp.s_len()), 0, 0),
        };

        Self {
            query_id: query_id.to_string(),
            subject_id: subject_id.to_string(),
            identity,
            length,
            mismatch,
            gapopen,
            q_start,
            q_end,
            s_start,
            s_end,
            e_value: hsp.evalue,
            bit_score: hsp.bit_score,
            q_idx: hsp.query_index as u32,
            s_idx: oid as u32,
            raw_score: hsp.score,
        }
    }
}

/// Rows of a finished search in result order: query, then HSP list,
/// then HSP. `subject` yields the id and length of an ordinal.
pub fn hits_from_results(
    program: Program,
    results: &ResultSet,
    query_lengths: &[usize],
    subject: impl Fn(usize) -> (String, usize),
) -> Vec<Hit> {
    let mut hits = Vec::with_capacity(results.num_hsps());
    for q in results.queries() {
        for list in &q.lists {
            let (subject_id, subject_len) = subject(list.oid);
            for hsp in &list.hsps {
                hits.push(Hit::from_hsp(
                    program,
                    hsp,
                    list.oid,
                    &q.query_id,
                    query_lengths[q.query_index],
                    &subject_id,
                    subject_len,
                ));
            }
        }
    }
    hits
}

/// Compare two e-values, treating both as equal when they are
/// effectively zero.
#[inline]
pub fn evalue_comp(evalue1: f64, evalue2: f64) -> Ordering {
    const EPSILON: f64 = 1.0e-180;
    if evalue1 < EPSILON && evalue2 < EPSILON {
        Ordering::Equal
    } else if evalue1 < evalue2 {
        Ordering::Less
    } else if evalue1 > evalue2 {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Order of HSPs within a list.
/// Order: score DESC → s_start ASC → s_end DESC → q_start ASC → q_end DESC
pub fn score_compare_hsps(a: &Hsp, b: &Hsp) -> Ordering {
    match b.score.cmp(&a.score) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match a.s_start.cmp(&b.s_start) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match b.s_end.cmp(&a.s_end) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match a.q_start.cmp(&b.q_start) {
        Ordering::Equal => {}
        ord => return ord,
    }
    b.q_end.cmp(&a.q_end)
}

/// Order of HSP lists within a query. Empty lists go last.
/// Order: best_score DESC → best_evalue ASC → oid ASC
pub fn compare_hsp_lists(a: &HspList, b: &HspList) -> Ordering {
    if a.is_empty() && b.is_empty() {
        return Ordering::Equal;
    } else if a.is_empty() {
        return Ordering::Greater;
    } else if b.is_empty() {
        return Ordering::Less;
    }

    match b.best_score().cmp(&a.best_score()) {
        Ordering::Equal => {}
        ord => return ord,
    }

    match evalue_comp(a.best_evalue(), b.best_evalue()) {
        Ordering::Equal => {}
        ord => return ord,
    }

    a.oid.cmp(&b.oid)
}

pub fn write_output(hits: &[Hit], out_path: Option<&PathBuf>) -> Result<()> {
    let stdout = io::stdout();
    let mut writer: Box<dyn Write> = if let Some(path) = out_path {
        Box::new(BufWriter::new(File::create(path)?))
    } else {
        Box::new(BufWriter::new(stdout.lock()))
    };

    for hit in hits {
        writeln!(
            writer,
            "{}\t{}\t{:.3}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.1e}\t{:.1}",
            hit.query_id,
            hit.subject_id,
            hit.identity,
            hit.length,
            hit.mismatch,
            hit.gapopen,
            hit.q_start,
            hit.q_end,
            hit.s_start,
            hit.s_end,
            hit.e_value,
            hit.bit_score
        )?;
    }
    writer.flush()?;
    Ok(())
}
