//! Search core
//!
//! Everything between a query block and a sorted result set:
//!
//! - **Setup** (`blast_options`, `query_info`, `blast_filter`, `blast_parameters`)
//!   - Options, concatenated query contexts, low-complexity masking,
//!     cutoffs and search spaces
//!
//! - **Lookup tables** (`blast_lookup`, `blast_aalookup`, `blast_nalookup`)
//!   - Word index over the query and subject scanning
//!
//! - **Seeding** (`blast_extend`, `blast_wordfinder`)
//!   - Diagonal bookkeeping, two-hit triggering, ungapped extension
//!
//! - **Gapped alignment** (`blast_gapalign`, `blast_frames`, `blast_traceback`)
//!   - Score-only x-drop extension, out-of-frame extension, traceback
//!
//! - **HSP management** (`blast_hits`)
//!   - E-values, reaping, endpoint purging, chunk merging, hit lists
//!
//! - **Driver** (`blast_engine`, `work_queue`, `blast_diagnostics`)

// Setup
pub mod blast_filter;
pub mod blast_options;
pub mod blast_parameters;
pub mod query_info;

// Lookup tables
pub mod blast_aalookup;
pub mod blast_lookup;
pub mod blast_nalookup;

// Seeding
pub mod blast_extend;
pub mod blast_wordfinder;

// Gapped alignment
pub mod blast_frames;
pub mod blast_gapalign;
pub mod blast_traceback;

// HSP management
pub mod blast_hits;

// Driver
pub mod blast_diagnostics;
pub mod blast_engine;
pub mod work_queue;

pub use blast_engine::{SearchEngine, SearchOutcome};
pub use blast_options::{ExtensionMethod, Program, SearchOptions};
