//! Tests for seeding and ungapped extension

pub mod extension;
