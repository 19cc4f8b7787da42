//! Parameters derived from the search options
//!
//! Options carry drop-offs and triggers in bits; the search works in raw
//! scores. Everything here is computed once per search, after the
//! effective search spaces of the query contexts are known, and is
//! read-only afterwards.

use log::debug;

use crate::core::blast_options::SearchOptions;
use crate::core::query_info::QueryBlock;
use crate::error::BlastResult;
use crate::stats::{
    raw_score_from_bit_score, raw_score_from_evalue, tables, x_drop_from_bits, KarlinParams,
    SearchSpace,
};
use crate::utils::ScoringMatrix;

/// Scoring matrix plus the statistical parameters that go with it.
#[derive(Debug, Clone)]
pub struct ScoreBlock {
    pub matrix: ScoringMatrix,
    pub kbp_ungapped: KarlinParams,
    pub kbp_gapped: Option<KarlinParams>,
}

impl ScoreBlock {
    pub fn new(options: &SearchOptions) -> BlastResult<Self> {
        if options.program.is_nucleotide() {
            let (reward, penalty) = (options.reward, options.penalty);
            Ok(Self {
                matrix: ScoringMatrix::nucleotide(reward, penalty),
                kbp_ungapped: tables::nucleotide_ungapped(reward, penalty)?,
                kbp_gapped: if options.gapped {
                    Some(tables::nucleotide_gapped(
                        reward,
                        penalty,
                        options.gap_open,
                        options.gap_extend,
                    )?)
                } else {
                    None
                },
            })
        } else {
            Ok(Self {
                matrix: ScoringMatrix::by_name(&options.matrix_name)?,
                kbp_ungapped: tables::protein_ungapped(&options.matrix_name)?,
                kbp_gapped: if options.gapped {
                    Some(tables::protein_gapped(
                        &options.matrix_name,
                        options.gap_open,
                        options.gap_extend,
                    )?)
                } else {
                    None
                },
            })
        }
    }

    /// Parameters used for e-values of final HSPs.
    pub fn kbp(&self) -> &KarlinParams {
        self.kbp_gapped.as_ref().unwrap_or(&self.kbp_ungapped)
    }
}

/// Fill the effective search space of every query context against a
/// database of `db_num_seqs` sequences totalling `db_length` residues.
/// For translated subjects the database length is counted in codons.
pub fn calc_effective_lengths(
    query: &mut QueryBlock,
    options: &SearchOptions,
    sbp: &ScoreBlock,
    db_length: u64,
    db_num_seqs: usize,
) {
    let db_length = if options.program.translates_subject() {
        db_length / 3
    } else {
        db_length
    };
    let db_num_seqs = db_num_seqs.max(1);

    for index in 0..query.contexts().len() {
        let length = query.context(index).length;
        let space = if length == 0 {
            SearchSpace::simple(0, db_length)
        } else {
            SearchSpace::with_length_adjustment(
                length,
                db_length,
                db_num_seqs,
                sbp.kbp(),
                options.gapped,
            )
        };
        query.set_search_space(index, &space);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitSavingParams {
    /// Minimum raw score of a saved HSP.
    pub cutoff_score: i32,
    pub hitlist_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordParams {
    /// Raw ungapped x-drop.
    pub x_dropoff: i32,
    /// Ungapped score a seed extension must reach to be kept.
    pub cutoff_score: i32,
    pub window_size: usize,
    pub word_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionParams {
    /// Positive gap costs.
    pub gap_open: i32,
    pub gap_extend: i32,
    pub frame_shift_penalty: i32,
    pub gap_x_dropoff: i32,
    pub gap_x_dropoff_final: i32,
}

/// All derived parameters of one search.
#[derive(Debug, Clone)]
pub struct SearchParameters {
    pub sbp: ScoreBlock,
    pub word: WordParams,
    pub ext: ExtensionParams,
    pub hit: HitSavingParams,
    pub evalue_threshold: f64,
}

impl SearchParameters {
    /// Derive the raw-score parameters. `query` must already carry its
    /// effective search spaces.
    pub fn new(options: &SearchOptions, query: &QueryBlock, sbp: ScoreBlock) -> Self {
        let kbp = *sbp.kbp();

        let evalue_cutoff =
            raw_score_from_evalue(options.evalue_threshold, &kbp, query.max_search_space().max(1.0));
        let cutoff_score = options
            .cutoff_score
            .unwrap_or(1)
            .max(evalue_cutoff)
            .max(1);
        let hit = HitSavingParams {
            cutoff_score,
            hitlist_size: options.hitlist_size,
        };

        let word_cutoff = if options.gapped {
            raw_score_from_bit_score(options.gap_trigger, &sbp.kbp_ungapped).min(cutoff_score)
        } else {
            cutoff_score
        };
        let word = WordParams {
            x_dropoff: x_drop_from_bits(options.x_drop_ungapped, &sbp.kbp_ungapped),
            cutoff_score: word_cutoff.max(1),
            window_size: options.window_size,
            word_size: options.word_size,
        };

        let gap_x_dropoff = x_drop_from_bits(options.x_drop_gapped, &kbp);
        let ext = ExtensionParams {
            gap_open: options.gap_open,
            gap_extend: options.gap_extend,
            frame_shift_penalty: options.frame_shift_penalty,
            gap_x_dropoff,
            gap_x_dropoff_final: x_drop_from_bits(options.x_drop_gapped_final, &kbp)
                .max(gap_x_dropoff),
        };

        debug!(
            "derived parameters: ungapped x-drop {} word cutoff {} gapped x-drop {}/{} hit cutoff {}",
            word.x_dropoff, word.cutoff_score, ext.gap_x_dropoff, ext.gap_x_dropoff_final, hit.cutoff_score
        );

        Self {
            sbp,
            word,
            ext,
            hit,
            evalue_threshold: options.evalue_threshold,
        }
    }
}
