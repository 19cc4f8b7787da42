//! Query low-complexity filtering
//!
//! Nucleotide queries are run through DUST once per query on the plus
//! strand and the result is mirrored onto the minus strand. Protein
//! queries and translated frames go through SEG context by context.
//! Masked positions are only hidden from the lookup table.

use log::{debug, info};

use crate::core::blast_options::SearchOptions;
use crate::core::query_info::QueryBlock;
use crate::utils::dust::DustMasker;
use crate::utils::seg::SegMasker;
use crate::utils::MaskedInterval;

/// Mask `query` as `options` ask. Returns the number of masked
/// positions across all contexts.
pub fn mask_query(query: &mut QueryBlock, options: &SearchOptions) -> usize {
    if !options.mask_low_complexity {
        return 0;
    }
    let (filter, ranges) = if query.program().is_nucleotide() {
        ("DUST", dust_ranges(query, &DustMasker::new(options.dust)))
    } else {
        ("SEG", seg_ranges(query, &SegMasker::new(options.seg)))
    };
    for &(context, interval) in &ranges {
        debug!(
            "{filter}: context {context} masked [{}, {})",
            interval.start, interval.end
        );
        query.mask_range(context, interval.start, interval.end);
    }

    let masked = query.masked_count();
    if masked > 0 {
        info!(
            "{filter} masked {masked} of {} query positions ({:.2}%)",
            query.total_length(),
            100.0 * masked as f64 / query.total_length().max(1) as f64
        );
    }
    masked
}

fn dust_ranges(query: &QueryBlock, masker: &DustMasker) -> Vec<(usize, MaskedInterval)> {
    let mut ranges = Vec::new();
    for (index, ctx) in query.contexts().iter().enumerate() {
        if ctx.frame < 0 {
            continue;
        }
        let intervals = masker.mask(query.context_slice(index));
        // the minus strand directly follows its plus strand
        let minus = query
            .contexts()
            .get(index + 1)
            .filter(|m| m.query_index == ctx.query_index && m.frame < 0)
            .map(|m| (index + 1, m.length));
        for interval in intervals {
            if let Some((minus_index, len)) = minus {
                ranges.push((
                    minus_index,
                    MaskedInterval::new(len - interval.end, len - interval.start),
                ));
            }
            ranges.push((index, interval));
        }
    }
    ranges
}

fn seg_ranges(query: &QueryBlock, masker: &SegMasker) -> Vec<(usize, MaskedInterval)> {
    query
        .contexts()
        .iter()
        .enumerate()
        .filter(|(_, ctx)| ctx.length > 0)
        .flat_map(|(index, _)| {
            masker
                .mask(query.context_slice(index))
                .into_iter()
                .map(move |interval| (index, interval))
        })
        .collect()
}
