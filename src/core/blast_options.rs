//! Search options
//!
//! `SearchOptions` is the plain option record handed to the search
//! engine. Each BLAST program has a preset; callers adjust fields and
//! the engine calls [`SearchOptions::validate`] before building anything.

use std::fmt;
use std::str::FromStr;

use crate::error::{BlastError, BlastResult};
use crate::sequence::Alphabet;
use crate::utils::dust::DustParams;
use crate::utils::seg::SegParams;

/// Longest subject stretch searched in one piece.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 5_000_000;

/// Residues shared by consecutive chunks of a long subject.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Subject ordinals handed to a worker per queue request.
pub const DEFAULT_DB_CHUNK_SIZE: usize = 16;

/// Default number of HSP lists kept per query.
pub const DEFAULT_HITLIST_SIZE: usize = 500;

pub const DEFAULT_EVALUE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    Blastn,
    Blastp,
    Blastx,
    Tblastn,
    Tblastx,
}

impl Program {
    pub fn name(self) -> &'static str {
        match self {
            Program::Blastn => "blastn",
            Program::Blastp => "blastp",
            Program::Blastx => "blastx",
            Program::Tblastn => "tblastn",
            Program::Tblastx => "tblastx",
        }
    }

    /// Alphabet the caller supplies queries in.
    pub fn query_alphabet(self) -> Alphabet {
        match self {
            Program::Blastn | Program::Blastx | Program::Tblastx => Alphabet::Nucleotide,
            Program::Blastp | Program::Tblastn => Alphabet::Protein,
        }
    }

    /// Alphabet the caller supplies subjects in.
    pub fn subject_alphabet(self) -> Alphabet {
        match self {
            Program::Blastn | Program::Tblastn | Program::Tblastx => Alphabet::Nucleotide,
            Program::Blastp | Program::Blastx => Alphabet::Protein,
        }
    }

    /// Alphabet the seeds and extensions are scored in.
    pub fn search_alphabet(self) -> Alphabet {
        match self {
            Program::Blastn => Alphabet::Nucleotide,
            _ => Alphabet::Protein,
        }
    }

    pub fn translates_query(self) -> bool {
        matches!(self, Program::Blastx | Program::Tblastx)
    }

    pub fn translates_subject(self) -> bool {
        matches!(self, Program::Tblastn | Program::Tblastx)
    }

    pub fn is_nucleotide(self) -> bool {
        self == Program::Blastn
    }

    /// Number of query contexts each query expands into.
    pub fn contexts_per_query(self) -> usize {
        match self {
            Program::Blastn => 2,
            Program::Blastx | Program::Tblastx => 6,
            Program::Blastp | Program::Tblastn => 1,
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Program {
    type Err = BlastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blastn" => Ok(Program::Blastn),
            "blastp" => Ok(Program::Blastp),
            "blastx" => Ok(Program::Blastx),
            "tblastn" => Ok(Program::Tblastn),
            "tblastx" => Ok(Program::Tblastx),
            other => Err(BlastError::Configuration(format!("unknown program '{other}'"))),
        }
    }
}

/// Gapped extension backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionMethod {
    /// Score-only x-drop dynamic programming in both directions.
    DynProg,
    /// Keep the ungapped seed as an anchored core and run the x-drop DP
    /// only outward from its ends. Used with megablast seeds.
    Greedy,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub program: Program,

    // Seeding
    pub word_size: usize,
    /// Neighborhood score threshold for protein words (0: exact words only).
    pub word_threshold: i32,
    /// Two-hit window (0: one-hit seeding).
    pub window_size: usize,
    pub megablast: bool,

    // Scoring
    pub matrix_name: String,
    pub reward: i32,
    pub penalty: i32,
    /// Gap opening cost (non-negative).
    pub gap_open: i32,
    /// Gap extension cost per residue (non-negative).
    pub gap_extend: i32,
    pub frame_shift_penalty: i32,

    // Extension, all drop-offs in bits
    pub x_drop_ungapped: f64,
    pub x_drop_gapped: f64,
    pub x_drop_gapped_final: f64,
    /// Ungapped score in bits needed to trigger gapped extension.
    pub gap_trigger: f64,
    pub gapped: bool,
    pub out_of_frame: bool,
    pub extension_method: ExtensionMethod,

    // Hit saving
    pub evalue_threshold: f64,
    /// Explicit minimum raw score.
    pub cutoff_score: Option<i32>,
    pub hitlist_size: usize,

    // Query filtering
    /// Hide low-complexity query stretches from the lookup table: DUST
    /// for blastn, SEG on every protein context otherwise.
    pub mask_low_complexity: bool,
    pub dust: DustParams,
    pub seg: SegParams,

    // Scheduling
    pub num_threads: usize,
    pub max_chunk_length: usize,
    pub chunk_overlap: usize,
    pub db_chunk_size: usize,
}

impl SearchOptions {
    pub fn for_program(program: Program) -> Self {
        match program {
            Program::Blastn => Self::blastn(),
            Program::Blastp => Self::blastp(),
            Program::Blastx => Self::blastx(),
            Program::Tblastn => Self::tblastn(),
            Program::Tblastx => Self::tblastx(),
        }
    }

    fn protein_defaults(program: Program, word_threshold: i32) -> Self {
        Self {
            program,
            word_size: 3,
            word_threshold,
            window_size: 40,
            megablast: false,
            matrix_name: "BLOSUM62".to_string(),
            reward: 0,
            penalty: 0,
            gap_open: 11,
            gap_extend: 1,
            frame_shift_penalty: 0,
            x_drop_ungapped: 7.0,
            x_drop_gapped: 15.0,
            x_drop_gapped_final: 25.0,
            gap_trigger: 22.0,
            gapped: true,
            out_of_frame: false,
            extension_method: ExtensionMethod::DynProg,
            evalue_threshold: DEFAULT_EVALUE,
            cutoff_score: None,
            hitlist_size: DEFAULT_HITLIST_SIZE,
            mask_low_complexity: false,
            dust: DustParams::default(),
            seg: SegParams::default(),
            num_threads: 1,
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            db_chunk_size: DEFAULT_DB_CHUNK_SIZE,
        }
    }

    pub fn blastn() -> Self {
        Self {
            program: Program::Blastn,
            word_size: 11,
            word_threshold: 0,
            window_size: 0,
            megablast: false,
            matrix_name: String::new(),
            reward: 2,
            penalty: -3,
            gap_open: 5,
            gap_extend: 2,
            frame_shift_penalty: 0,
            x_drop_ungapped: 20.0,
            x_drop_gapped: 30.0,
            x_drop_gapped_final: 100.0,
            gap_trigger: 27.0,
            gapped: true,
            out_of_frame: false,
            extension_method: ExtensionMethod::DynProg,
            evalue_threshold: DEFAULT_EVALUE,
            cutoff_score: None,
            hitlist_size: DEFAULT_HITLIST_SIZE,
            mask_low_complexity: true,
            dust: DustParams::default(),
            seg: SegParams::default(),
            num_threads: 1,
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            db_chunk_size: DEFAULT_DB_CHUNK_SIZE,
        }
    }

    pub fn megablast() -> Self {
        Self {
            word_size: 28,
            megablast: true,
            reward: 1,
            penalty: -2,
            gap_open: 2,
            gap_extend: 2,
            x_drop_gapped: 25.0,
            extension_method: ExtensionMethod::Greedy,
            ..Self::blastn()
        }
    }

    pub fn blastp() -> Self {
        Self::protein_defaults(Program::Blastp, 11)
    }

    pub fn blastx() -> Self {
        Self::protein_defaults(Program::Blastx, 12)
    }

    pub fn tblastn() -> Self {
        Self::protein_defaults(Program::Tblastn, 13)
    }

    /// tblastx runs ungapped only.
    pub fn tblastx() -> Self {
        Self {
            gapped: false,
            ..Self::protein_defaults(Program::Tblastx, 13)
        }
    }

    /// Check option consistency. Word size against the alphabet is
    /// checked when the lookup table is built.
    pub fn validate(&self) -> BlastResult<()> {
        let bad = |msg: String| Err(BlastError::BadParameter(msg));

        if self.word_size == 0 {
            return bad("word size must be positive".to_string());
        }
        if self.hitlist_size == 0 {
            return bad("hitlist size must be positive".to_string());
        }
        if !(self.evalue_threshold > 0.0) {
            return bad(format!(
                "e-value threshold must be positive, got {}",
                self.evalue_threshold
            ));
        }
        if self.gap_open < 0 || self.gap_extend < 0 {
            return bad(format!(
                "gap costs must be non-negative, got open {} extend {}",
                self.gap_open, self.gap_extend
            ));
        }
        if self.gapped && self.gap_open == 0 && self.gap_extend == 0 {
            return bad("gapped search needs a non-zero gap cost".to_string());
        }
        if self.frame_shift_penalty < 0 {
            return bad(format!(
                "frame shift penalty must be non-negative, got {}",
                self.frame_shift_penalty
            ));
        }
        for (name, value) in [
            ("ungapped x-drop", self.x_drop_ungapped),
            ("gapped x-drop", self.x_drop_gapped),
            ("final gapped x-drop", self.x_drop_gapped_final),
            ("gap trigger", self.gap_trigger),
        ] {
            if !(value >= 0.0) {
                return bad(format!("{name} must be non-negative, got {value}"));
            }
        }
        if self.num_threads == 0 {
            return bad("thread count must be positive".to_string());
        }
        if self.db_chunk_size == 0 {
            return bad("database chunk size must be positive".to_string());
        }
        if self.chunk_overlap >= self.max_chunk_length {
            return bad(format!(
                "chunk overlap {} must be smaller than the chunk length {}",
                self.chunk_overlap, self.max_chunk_length
            ));
        }
        if let Some(cutoff) = self.cutoff_score {
            if cutoff <= 0 {
                return bad(format!("cutoff score must be positive, got {cutoff}"));
            }
        }

        if self.program.is_nucleotide() {
            if self.reward <= 0 || self.penalty >= 0 {
                return bad(format!(
                    "nucleotide scoring needs reward > 0 and penalty < 0, got {} / {}",
                    self.reward, self.penalty
                ));
            }
        } else if self.matrix_name.is_empty() {
            return Err(BlastError::Configuration(format!(
                "{} needs a substitution matrix",
                self.program
            )));
        }

        if self.mask_low_complexity {
            let dust = &self.dust;
            if !(2..=64).contains(&dust.level)
                || !(8..=64).contains(&dust.window)
                || !(1..=32).contains(&dust.linker)
            {
                return bad(format!(
                    "DUST level, window and linker out of range: {} {} {}",
                    dust.level, dust.window, dust.linker
                ));
            }
            let seg = &self.seg;
            if seg.window == 0 || !(seg.locut >= 0.0) || !(seg.hicut >= seg.locut) {
                return bad(format!(
                    "SEG needs a window and 0 <= locut <= hicut, got {} {} {}",
                    seg.window, seg.locut, seg.hicut
                ));
            }
        }

        if self.megablast && !self.program.is_nucleotide() {
            return Err(BlastError::Configuration(format!(
                "megablast seeding is only available for blastn, not {}",
                self.program
            )));
        }
        if self.out_of_frame {
            if !matches!(self.program, Program::Blastx | Program::Tblastn) {
                return Err(BlastError::Configuration(format!(
                    "out-of-frame alignment needs exactly one translated side, not {}",
                    self.program
                )));
            }
            if !self.gapped {
                return Err(BlastError::Configuration(
                    "out-of-frame alignment needs a gapped search".to_string(),
                ));
            }
        }
        if self.extension_method == ExtensionMethod::Greedy && !self.program.is_nucleotide() {
            return Err(BlastError::Configuration(
                "seed-anchored extension is only available for nucleotide searches".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::blastn()
    }
}
