//! Backtrace storage for the global aligner.
//!
//! One byte per cell, row-major over `(len1 + 1) x (len2 + 1)` cells.
//! The low two bits hold the move that produced the cell's best score;
//! two more bits record whether the horizontal / vertical gap ending at
//! the cell extended an already open gap.

use super::result::{Transcript, TranscriptOp};
use crate::error::{try_filled_vec, BlastError, BlastResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDir {
    Diagonal,
    /// Space in the first sequence.
    Horizontal,
    /// Space in the second sequence.
    Vertical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceCell(u8);

impl TraceCell {
    const DIR_MASK: u8 = 0b0011;
    const H_EXT: u8 = 0b0100;
    const V_EXT: u8 = 0b1000;

    #[inline]
    pub fn new(dir: TraceDir, h_ext: bool, v_ext: bool) -> Self {
        let mut bits = match dir {
            TraceDir::Diagonal => 0,
            TraceDir::Horizontal => 1,
            TraceDir::Vertical => 2,
        };
        if h_ext {
            bits |= Self::H_EXT;
        }
        if v_ext {
            bits |= Self::V_EXT;
        }
        Self(bits)
    }

    #[inline]
    pub fn dir(self) -> TraceDir {
        match self.0 & Self::DIR_MASK {
            0 => TraceDir::Diagonal,
            1 => TraceDir::Horizontal,
            _ => TraceDir::Vertical,
        }
    }

    #[inline]
    pub fn horizontal_extended(self) -> bool {
        self.0 & Self::H_EXT != 0
    }

    #[inline]
    pub fn vertical_extended(self) -> bool {
        self.0 & Self::V_EXT != 0
    }
}

pub struct BacktraceMatrix {
    cells: Vec<TraceCell>,
    rows: usize,
    cols: usize,
}

impl BacktraceMatrix {
    pub fn try_new(rows: usize, cols: usize) -> BlastResult<Self> {
        let n = rows
            .checked_mul(cols)
            .ok_or_else(|| BlastError::Resource(format!("backtrace matrix {rows} x {cols}")))?;
        Ok(Self {
            cells: try_filled_vec(n, TraceCell::default(), "backtrace matrix")?,
            rows,
            cols,
        })
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> TraceCell {
        self.cells[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, cell: TraceCell) {
        self.cells[row * self.cols + col] = cell;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Walk from the bottom-right cell back to the origin and return the
    /// transcript in left-to-right order. `same(i, j)` tells whether
    /// residue `i` of the first sequence equals residue `j` of the second.
    pub fn walk(&self, same: impl Fn(usize, usize) -> bool) -> BlastResult<Transcript> {
        let mut ops = Vec::with_capacity(self.rows + self.cols);
        let (mut i, mut j) = (self.rows - 1, self.cols - 1);

        while i > 0 || j > 0 {
            let cell = self.get(i, j);
            match cell.dir() {
                TraceDir::Diagonal => {
                    if i == 0 || j == 0 {
                        return Err(BlastError::Internal(format!(
                            "diagonal move on the border at ({i}, {j})"
                        )));
                    }
                    i -= 1;
                    j -= 1;
                    ops.push(if same(i, j) {
                        TranscriptOp::Match
                    } else {
                        TranscriptOp::Replace
                    });
                }
                TraceDir::Horizontal => {
                    let mut key = cell;
                    loop {
                        if j == 0 {
                            return Err(BlastError::Internal(format!(
                                "horizontal move in column 0 at row {i}"
                            )));
                        }
                        ops.push(TranscriptOp::Insert);
                        j -= 1;
                        if j == 0 || !key.horizontal_extended() {
                            break;
                        }
                        key = self.get(i, j);
                    }
                }
                TraceDir::Vertical => {
                    let mut key = cell;
                    loop {
                        if i == 0 {
                            return Err(BlastError::Internal(format!(
                                "vertical move in row 0 at column {j}"
                            )));
                        }
                        ops.push(TranscriptOp::Delete);
                        i -= 1;
                        if i == 0 || !key.vertical_extended() {
                            break;
                        }
                        key = self.get(i, j);
                    }
                }
            }
        }

        ops.reverse();
        Ok(Transcript::new(ops))
    }
}
