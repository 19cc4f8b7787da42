//! Effective lengths and search space per query context.

use super::tables::KarlinParams;

/// Iterations of the length adjustment fixed point.
const LENGTH_ADJUSTMENT_ITERATIONS: usize = 5;

/// Effective search space with length-adjusted values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSpace {
    pub effective_query_len: f64,
    pub effective_db_len: f64,
    pub effective_space: f64,
    pub length_adjustment: i64,
}

impl SearchSpace {
    /// Search space without length adjustment.
    pub fn simple(query_len: usize, db_len: u64) -> Self {
        let q = query_len as f64;
        let d = db_len as f64;
        Self {
            effective_query_len: q,
            effective_db_len: d,
            effective_space: q * d,
            length_adjustment: 0,
        }
    }

    /// Length-adjusted search space of one query context against a
    /// database of `db_num_seqs` sequences totalling `db_len` residues.
    ///
    /// The adjustment `l` is iterated from 0:
    /// - gapped: `l = round((ln K + ln((m - l) * max(N, n - N*l))) * alpha/lambda + beta)`
    /// - ungapped: `l = (ln K + ln((m - l) * max(1, n - N*l))) / H`
    ///
    /// `l` never exceeds `m - 1/K`, and iteration stops once it moves by at
    /// most one residue.
    pub fn with_length_adjustment(
        query_len: usize,
        db_len: u64,
        db_num_seqs: usize,
        params: &KarlinParams,
        gapped: bool,
    ) -> Self {
        let m = query_len as f64;
        let n = db_len as f64;
        let nseq = db_num_seqs as f64;
        let cap = m - 1.0 / params.k;
        let alpha_d_lambda = params.alpha / params.lambda;

        let mut adjustment = 0.0_f64;
        let mut last = 0.0_f64;
        for _ in 0..LENGTH_ADJUSTMENT_ITERATIONS {
            let query_part = (m - last).max(1.0);
            adjustment = if gapped {
                let db_part = (n - nseq * last).max(nseq);
                ((params.log_k() + (query_part * db_part).ln()) * alpha_d_lambda + params.beta)
                    .round()
            } else {
                let db_part = (n - nseq * last).max(1.0);
                (params.log_k() + (query_part * db_part).ln()) / params.h
            };
            adjustment = adjustment.max(0.0);
            if adjustment > cap {
                adjustment = cap.max(0.0);
                break;
            }
            if (adjustment - last).abs() <= 1.0 {
                break;
            }
            last = adjustment;
        }

        let length_adjustment = adjustment as i64;
        let effective_query_len = (m - length_adjustment as f64).max(1.0 / params.k);
        let effective_db_len = (n - nseq * length_adjustment as f64).max(1.0);
        Self {
            effective_query_len,
            effective_db_len,
            effective_space: effective_query_len * effective_db_len,
            length_adjustment,
        }
    }
}
