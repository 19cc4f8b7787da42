//! Substitution score tables.
//!
//! A `ScoringMatrix` is built once per search or alignment and shared
//! read-only afterwards. Scores are indexed by residue codes (see
//! `crate::sequence`), so lookups are a single multiply-add.

use crate::error::{BlastError, BlastResult};
use crate::sequence::{Alphabet, NUM_BASES};

const PROTEIN_SIZE: usize = 25;

/// BLOSUM62 in matrix order ARNDCQEGHILKMFPSTWYVBJZX*
static BLOSUM62: [i8; PROTEIN_SIZE * PROTEIN_SIZE] = [
    //       A,  R,  N,  D,  C,  Q,  E,  G,  H,  I,  L,  K,  M,  F,  P,  S,  T,  W,  Y,  V,  B,  J,  Z,  X,  *
    /*A*/    4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0, -2, -1, -1, -1, -4,
    /*R*/   -1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3, -1, -2,  0, -1, -4,
    /*N*/   -2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3,  4, -3,  0, -1, -4,
    /*D*/   -2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3,  4, -3,  1, -1, -4,
    /*C*/    0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1, -3, -1, -3, -1, -4,
    /*Q*/   -1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2,  0, -2,  4, -1, -4,
    /*E*/   -1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2,  1, -3,  4, -1, -4,
    /*G*/    0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3, -1, -4, -2, -1, -4,
    /*H*/   -2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3,  0, -3,  0, -1, -4,
    /*I*/   -1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3, -3,  3, -3, -1, -4,
    /*L*/   -1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1, -4,  3, -3, -1, -4,
    /*K*/   -1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2,  0, -3,  1, -1, -4,
    /*M*/   -1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1, -3,  2, -1, -1, -4,
    /*F*/   -2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1, -3,  0, -3, -1, -4,
    /*P*/   -1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2, -2, -3, -1, -1, -4,
    /*S*/    1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2,  0, -2,  0, -1, -4,
    /*T*/    0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0, -1, -1, -1, -1, -4,
    /*W*/   -3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3, -4, -2, -2, -1, -4,
    /*Y*/   -2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1, -3, -1, -2, -1, -4,
    /*V*/    0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4, -3,  2, -2, -1, -4,
    /*B*/   -2, -1,  4,  4, -3,  0,  1, -1,  0, -3, -4,  0, -3, -3, -2,  0, -1, -4, -3, -3,  4, -3,  0, -1, -4,
    /*J*/   -1, -2, -3, -3, -1, -2, -3, -4, -3,  3,  3, -3,  2,  0, -3, -2, -1, -2, -1,  2, -3,  3, -3, -1, -4,
    /*Z*/   -1,  0,  0,  1, -3,  4,  4, -2,  0, -3, -3,  1, -1, -3, -1,  0, -1, -2, -2, -2,  0, -3,  4, -1, -4,
    /*X*/   -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -4,
    /***/   -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4,  1,
];

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringMatrix {
    name: String,
    alphabet: Alphabet,
    size: usize,
    scores: Vec<i32>,
}

impl ScoringMatrix {
    pub fn blosum62() -> Self {
        Self {
            name: "BLOSUM62".to_string(),
            alphabet: Alphabet::Protein,
            size: PROTEIN_SIZE,
            scores: BLOSUM62.iter().map(|&s| s as i32).collect(),
        }
    }

    /// Reward/penalty table over the nucleotide alphabet. Only identical
    /// unambiguous bases score `reward`; every pair involving an ambiguity
    /// code scores `penalty`.
    pub fn nucleotide(reward: i32, penalty: i32) -> Self {
        let size = Alphabet::Nucleotide.size();
        let mut scores = vec![penalty; size * size];
        for b in 0..NUM_BASES as usize {
            scores[b * size + b] = reward;
        }
        Self {
            name: format!("reward{reward}/penalty{penalty}"),
            alphabet: Alphabet::Nucleotide,
            size,
            scores,
        }
    }

    /// Look up a built-in protein matrix by name.
    pub fn by_name(name: &str) -> BlastResult<Self> {
        match name.to_ascii_uppercase().as_str() {
            "BLOSUM62" => Ok(Self::blosum62()),
            other => Err(BlastError::Configuration(format!(
                "unsupported scoring matrix '{other}'"
            ))),
        }
    }

    /// Parse a matrix in the NCBI text layout: `#` comments, a header row
    /// of column symbols, then one row per symbol. Alphabet symbols missing
    /// from the text score as the smallest value present.
    pub fn parse_ncbi(name: &str, text: &str, alphabet: Alphabet) -> BlastResult<Self> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));

        let header = lines
            .next()
            .ok_or_else(|| BlastError::Configuration(format!("matrix '{name}' is empty")))?;
        let columns = header
            .split_whitespace()
            .map(|tok| symbol_code(tok, alphabet, name))
            .collect::<BlastResult<Vec<_>>>()?;

        let size = alphabet.size();
        let mut cells: Vec<Option<i32>> = vec![None; size * size];
        for line in lines {
            let mut fields = line.split_whitespace();
            let Some(row_tok) = fields.next() else {
                continue;
            };
            let row = symbol_code(row_tok, alphabet, name)?;
            let values: Vec<&str> = fields.collect();
            if values.len() != columns.len() {
                return Err(BlastError::Configuration(format!(
                    "matrix '{name}' row '{row_tok}' has {} values, expected {}",
                    values.len(),
                    columns.len()
                )));
            }
            for (&col, v) in columns.iter().zip(values) {
                let score = v.parse::<i32>().map_err(|_| {
                    BlastError::Configuration(format!("matrix '{name}' has bad score '{v}'"))
                })?;
                cells[row as usize * size + col as usize] = Some(score);
            }
        }

        let floor = cells
            .iter()
            .flatten()
            .copied()
            .min()
            .ok_or_else(|| BlastError::Configuration(format!("matrix '{name}' has no scores")))?;
        Ok(Self {
            name: name.to_string(),
            alphabet,
            size,
            scores: cells.into_iter().map(|c| c.unwrap_or(floor)).collect(),
        })
    }

    #[inline(always)]
    pub fn score(&self, a: u8, b: u8) -> i32 {
        self.scores[a as usize * self.size + b as usize]
    }

    #[inline]
    pub fn row(&self, a: u8) -> &[i32] {
        let start = a as usize * self.size;
        &self.scores[start..start + self.size]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_score(&self) -> i32 {
        self.scores.iter().copied().max().unwrap_or(0)
    }

    pub fn min_score(&self) -> i32 {
        self.scores.iter().copied().min().unwrap_or(0)
    }
}

fn symbol_code(token: &str, alphabet: Alphabet, name: &str) -> BlastResult<u8> {
    let bytes = token.as_bytes();
    if bytes.len() != 1 {
        return Err(BlastError::Configuration(format!(
            "matrix '{name}' has bad symbol '{token}'"
        )));
    }
    alphabet.encode(bytes[0]).ok_or_else(|| {
        BlastError::Configuration(format!("matrix '{name}' symbol '{token}' is not in the alphabet"))
    })
}
