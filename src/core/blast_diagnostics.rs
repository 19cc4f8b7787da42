//! Diagnostic counters for the search pipeline
//!
//! Counters are always collected and handed back as [`ReturnStats`];
//! the multi-line summary is only logged when the BLASTCORE_DIAGNOSTICS
//! environment variable is set.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use log::info;

use crate::core::blast_gapalign::GappedStats;
use crate::core::blast_traceback::TracebackStats;
use crate::core::blast_wordfinder::WordFinderStats;

/// Check if diagnostics are enabled via environment variable
pub fn diagnostics_enabled() -> bool {
    std::env::var("BLASTCORE_DIAGNOSTICS")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Counters shared by the workers of one search.
#[derive(Debug, Default)]
pub struct SearchDiagnostics {
    // Seed stage
    pub db_hits: AtomicU64,
    pub init_extends: AtomicU64,
    pub good_init_extends: AtomicU64,
    // Gapped stage
    pub gapped_extensions: AtomicU64,
    pub prelim_gapped_passed: AtomicU64,
    pub seeds_contained: AtomicU64,
    pub hsps_reaped: AtomicU64,
    // Traceback
    pub traceback_failures: AtomicU64,
    // Subjects
    pub subjects_searched: AtomicU64,
    pub subjects_skipped: AtomicU64,
}

impl SearchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_word_finder(&self, stats: &WordFinderStats) {
        self.db_hits.fetch_add(stats.db_hits, AtomicOrdering::Relaxed);
        self.init_extends
            .fetch_add(stats.init_extends, AtomicOrdering::Relaxed);
        self.good_init_extends
            .fetch_add(stats.good_init_extends, AtomicOrdering::Relaxed);
    }

    pub fn add_gapped(&self, stats: &GappedStats) {
        self.gapped_extensions
            .fetch_add(stats.extensions, AtomicOrdering::Relaxed);
        self.prelim_gapped_passed
            .fetch_add(stats.prelim_passed, AtomicOrdering::Relaxed);
        self.seeds_contained
            .fetch_add(stats.contained_skipped, AtomicOrdering::Relaxed);
    }

    pub fn add_traceback(&self, stats: &TracebackStats) {
        self.traceback_failures
            .fetch_add(stats.failures, AtomicOrdering::Relaxed);
        self.hsps_reaped
            .fetch_add(stats.reaped, AtomicOrdering::Relaxed);
    }

    pub fn add_reaped(&self, n: usize) {
        self.hsps_reaped.fetch_add(n as u64, AtomicOrdering::Relaxed);
    }

    pub fn subject_searched(&self) {
        self.subjects_searched.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn subject_skipped(&self) {
        self.subjects_skipped.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn snapshot(&self, x_drops: XDropValues) -> ReturnStats {
        let load = |c: &AtomicU64| c.load(AtomicOrdering::Relaxed);
        ReturnStats {
            db_hits: load(&self.db_hits),
            init_extends: load(&self.init_extends),
            good_init_extends: load(&self.good_init_extends),
            gapped_extensions: load(&self.gapped_extensions),
            prelim_gapped_passed: load(&self.prelim_gapped_passed),
            seeds_contained: load(&self.seeds_contained),
            hsps_reaped: load(&self.hsps_reaped),
            traceback_failures: load(&self.traceback_failures),
            subjects_searched: load(&self.subjects_searched),
            subjects_skipped: load(&self.subjects_skipped),
            x_drops,
        }
    }
}

/// Raw x-drop values the search ran with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XDropValues {
    pub ungapped: i32,
    pub gapped: i32,
    pub gapped_final: i32,
}

/// Plain copy of the counters, returned with every search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReturnStats {
    pub db_hits: u64,
    pub init_extends: u64,
    pub good_init_extends: u64,
    pub gapped_extensions: u64,
    pub prelim_gapped_passed: u64,
    pub seeds_contained: u64,
    pub hsps_reaped: u64,
    pub traceback_failures: u64,
    pub subjects_searched: u64,
    pub subjects_skipped: u64,
    pub x_drops: XDropValues,
}

impl ReturnStats {
    /// Log the pipeline summary at info level.
    pub fn log_summary(&self, program: &str) {
        info!("=== {program} pipeline diagnostics ===");
        info!("Seed stage:");
        info!("  Word hits:                  {}", self.db_hits);
        info!("  Ungapped extensions:        {}", self.init_extends);
        info!("  Good ungapped extensions:   {}", self.good_init_extends);
        info!("Gapped stage:");
        info!("  Gapped extensions:          {}", self.gapped_extensions);
        info!("  Seeds inside earlier HSPs:  {}", self.seeds_contained);
        info!("  Passed preliminary cutoff:  {}", self.prelim_gapped_passed);
        info!("  HSPs reaped:                {}", self.hsps_reaped);
        info!("  Traceback failures:         {}", self.traceback_failures);
        info!("Subjects:");
        info!("  Searched:                   {}", self.subjects_searched);
        info!("  Skipped:                    {}", self.subjects_skipped);
        info!(
            "X-drops (raw): ungapped {} gapped {} final {}",
            self.x_drops.ungapped, self.x_drops.gapped, self.x_drops.gapped_final
        );
    }
}
