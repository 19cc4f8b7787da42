//! Integration tests for blastcore
//!
//! Tests are organized by area:
//! - `align/` - Needleman-Wunsch aligner properties and guards
//! - `seed/` - word finding and ungapped extension
//! - `search/` - the search engine end to end
//! - `stats/` - e-values and search spaces

pub mod align;
pub mod helpers;
pub mod search;
pub mod seed;
pub mod stats;
