//! Karlin-Altschul parameters for the supported scoring systems.
//!
//! Only a reduced set of precomputed values is carried; scoring systems
//! outside it are rejected with a configuration error rather than guessed.

use crate::error::{BlastError, BlastResult};

/// Karlin-Altschul statistical parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KarlinParams {
    pub lambda: f64,
    pub k: f64,
    /// Relative entropy
    pub h: f64,
    /// Length correction slope
    pub alpha: f64,
    /// Length correction intercept
    pub beta: f64,
}

impl KarlinParams {
    #[inline]
    pub fn log_k(&self) -> f64 {
        self.k.ln()
    }
}

/// Table row: (gap_open, gap_extend, lambda, K, H, alpha, beta)
#[derive(Debug, Clone, Copy)]
struct ParamEntry {
    gap_open: i32,
    gap_extend: i32,
    params: KarlinParams,
}

impl ParamEntry {
    const fn new(gap_open: i32, gap_extend: i32, lambda: f64, k: f64, h: f64, alpha: f64, beta: f64) -> Self {
        Self {
            gap_open,
            gap_extend,
            params: KarlinParams {
                lambda,
                k,
                h,
                alpha,
                beta,
            },
        }
    }
}

/// Gap costs marking the ungapped row of a protein table.
const UNGAPPED: i32 = i32::MAX;

const BLOSUM62: &[ParamEntry] = &[
    ParamEntry::new(UNGAPPED, UNGAPPED, 0.3176, 0.134, 0.4012, 0.7916, -3.2),
    ParamEntry::new(11, 2, 0.297, 0.082, 0.27, 1.1, -10.0),
    ParamEntry::new(10, 2, 0.291, 0.075, 0.23, 1.3, -15.0),
    ParamEntry::new(9, 2, 0.279, 0.058, 0.19, 1.5, -19.0),
    ParamEntry::new(8, 2, 0.264, 0.045, 0.15, 1.8, -26.0),
    ParamEntry::new(7, 2, 0.239, 0.027, 0.10, 2.5, -46.0),
    ParamEntry::new(6, 2, 0.201, 0.012, 0.061, 3.3, -58.0),
    ParamEntry::new(13, 1, 0.292, 0.071, 0.23, 1.2, -11.0),
    ParamEntry::new(12, 1, 0.283, 0.059, 0.19, 1.5, -19.0),
    ParamEntry::new(11, 1, 0.267, 0.041, 0.14, 1.9, -30.0),
    ParamEntry::new(10, 1, 0.243, 0.024, 0.10, 2.5, -44.0),
    ParamEntry::new(9, 1, 0.206, 0.010, 0.052, 4.0, -87.0),
];

// Nucleotide tables: the (0, 0) row holds the ungapped values.

const BLASTN_1_2: &[ParamEntry] = &[
    ParamEntry::new(0, 0, 1.28, 0.46, 0.85, 1.5, -2.0),
    ParamEntry::new(2, 2, 1.33, 0.62, 1.1, 1.2, 0.0),
    ParamEntry::new(1, 2, 1.30, 0.52, 0.93, 1.4, -2.0),
    ParamEntry::new(0, 2, 1.19, 0.34, 0.66, 1.8, -3.0),
    ParamEntry::new(3, 1, 1.32, 0.57, 1.0, 1.3, -1.0),
    ParamEntry::new(2, 1, 1.29, 0.49, 0.92, 1.4, -1.0),
    ParamEntry::new(1, 1, 1.14, 0.26, 0.52, 2.2, -5.0),
];

const BLASTN_1_3: &[ParamEntry] = &[
    ParamEntry::new(0, 0, 1.374, 0.711, 1.31, 1.05, 0.0),
    ParamEntry::new(2, 2, 1.37, 0.70, 1.2, 1.1, 0.0),
    ParamEntry::new(1, 2, 1.35, 0.64, 1.1, 1.2, -1.0),
    ParamEntry::new(0, 2, 1.25, 0.42, 0.83, 1.5, -2.0),
    ParamEntry::new(2, 1, 1.34, 0.60, 1.1, 1.2, -1.0),
    ParamEntry::new(1, 1, 1.21, 0.34, 0.71, 1.7, -2.0),
];

const BLASTN_2_3: &[ParamEntry] = &[
    ParamEntry::new(0, 0, 0.55, 0.21, 0.46, 1.2, -5.0),
    ParamEntry::new(4, 4, 0.63, 0.42, 0.84, 0.75, -2.0),
    ParamEntry::new(2, 4, 0.615, 0.37, 0.72, 0.85, -3.0),
    ParamEntry::new(0, 4, 0.55, 0.21, 0.46, 1.2, -5.0),
    ParamEntry::new(3, 3, 0.615, 0.37, 0.68, 0.9, -3.0),
    ParamEntry::new(6, 2, 0.63, 0.42, 0.84, 0.75, -2.0),
    ParamEntry::new(5, 2, 0.625, 0.41, 0.78, 0.8, -2.0),
    ParamEntry::new(4, 2, 0.61, 0.35, 0.68, 0.9, -3.0),
    ParamEntry::new(2, 2, 0.515, 0.14, 0.33, 1.55, -9.0),
];

const BLASTN_1_4: &[ParamEntry] = &[
    ParamEntry::new(0, 0, 1.383, 0.738, 1.36, 1.02, 0.0),
    ParamEntry::new(1, 2, 1.36, 0.67, 1.2, 1.1, 0.0),
    ParamEntry::new(0, 2, 1.26, 0.43, 0.90, 1.4, -1.0),
    ParamEntry::new(2, 1, 1.35, 0.61, 1.1, 1.2, -1.0),
    ParamEntry::new(1, 1, 1.22, 0.35, 0.72, 1.7, -3.0),
];

fn find(table: &[ParamEntry], gap_open: i32, gap_extend: i32) -> Option<KarlinParams> {
    table
        .iter()
        .find(|e| e.gap_open == gap_open && e.gap_extend == gap_extend)
        .map(|e| e.params)
}

fn protein_table(matrix: &str) -> BlastResult<&'static [ParamEntry]> {
    match matrix.to_ascii_uppercase().as_str() {
        "BLOSUM62" => Ok(BLOSUM62),
        other => Err(BlastError::Configuration(format!(
            "no statistical parameters for matrix '{other}'"
        ))),
    }
}

fn nucleotide_table(reward: i32, penalty: i32) -> BlastResult<&'static [ParamEntry]> {
    match (reward, penalty.abs()) {
        (1, 2) => Ok(BLASTN_1_2),
        (1, 3) => Ok(BLASTN_1_3),
        (2, 3) => Ok(BLASTN_2_3),
        (1, 4) => Ok(BLASTN_1_4),
        (r, p) => Err(BlastError::Configuration(format!(
            "no statistical parameters for reward {r} / penalty -{p}"
        ))),
    }
}

pub fn protein_ungapped(matrix: &str) -> BlastResult<KarlinParams> {
    let table = protein_table(matrix)?;
    find(table, UNGAPPED, UNGAPPED)
        .ok_or_else(|| BlastError::Configuration(format!("no ungapped parameters for '{matrix}'")))
}

/// Gap costs are positive.
pub fn protein_gapped(matrix: &str, gap_open: i32, gap_extend: i32) -> BlastResult<KarlinParams> {
    let table = protein_table(matrix)?;
    find(table, gap_open, gap_extend).ok_or_else(|| {
        BlastError::Configuration(format!(
            "gap costs {gap_open}/{gap_extend} are not supported for '{matrix}'"
        ))
    })
}

pub fn nucleotide_ungapped(reward: i32, penalty: i32) -> BlastResult<KarlinParams> {
    let table = nucleotide_table(reward, penalty)?;
    find(table, 0, 0).ok_or_else(|| {
        BlastError::Configuration(format!(
            "no ungapped parameters for reward {reward} / penalty {penalty}"
        ))
    })
}

pub fn nucleotide_gapped(
    reward: i32,
    penalty: i32,
    gap_open: i32,
    gap_extend: i32,
) -> BlastResult<KarlinParams> {
    let table = nucleotide_table(reward, penalty)?;
    find(table, gap_open, gap_extend).ok_or_else(|| {
        BlastError::Configuration(format!(
            "gap costs {gap_open}/{gap_extend} are not supported for reward {reward} / penalty {penalty}"
        ))
    })
}
