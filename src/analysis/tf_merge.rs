//! Cross-timeframe reconciliation. Bands detected independently on several
//! timeframes and sitting on the same price shelf collapse into one band
//! carrying the union of the evidence. The confluence boost itself happens
//! in the scorer's timeframe-alignment term, not here.

use itertools::Itertools;

use crate::config::MergeConfig;
use crate::domain::band::{Band, BandSubtype};

/// Overlap tolerance for the merge pass.
pub fn merge_tolerance(mean_atr: f64, current_price: f64, config: &MergeConfig) -> f64 {
    (config.proximity_atr_mult * mean_atr).max(config.proximity_floor_pct * current_price.abs())
}

/// Merge per-timeframe band lists into one set. Bands must already carry
/// their originating timeframe tag. Same-type bands whose ranges overlap
/// within `tolerance` fold together; everything else passes through.
///
/// Merging a list with itself only widens the tag sets and sums the touch
/// counts; ranges are unchanged because the union of identical ranges is
/// the range itself.
pub fn merge_across_timeframes(lists: Vec<Vec<Band>>, tolerance: f64) -> Vec<Band> {
    // Deterministic merge order regardless of which timeframe finished first.
    let flat = lists.into_iter().flatten().sorted_by(|a, b| {
        a.price_low
            .partial_cmp(&b.price_low)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.price_high
                    .partial_cmp(&b.price_high)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    let mut merged: Vec<Band> = Vec::new();
    for band in flat {
        match merged
            .iter_mut()
            .find(|kept| kept.band_type == band.band_type && kept.overlaps(&band, tolerance))
        {
            Some(kept) => fold(kept, &band),
            None => merged.push(band),
        }
    }

    merged
}

fn fold(into: &mut Band, other: &Band) {
    into.price_low = into.price_low.min(other.price_low);
    into.price_high = into.price_high.max(other.price_high);
    into.sources.extend(other.sources.iter().copied());
    into.timeframes.extend(other.timeframes.iter().copied());
    into.touch_count += other.touch_count;
    into.last_touched = into.last_touched.max(other.last_touched);
    into.volume_cluster |= other.volume_cluster;
    into.vwap_zone |= other.vwap_zone;
    into.flipped |= other.flipped;
    into.total_volume = match (into.total_volume, other.total_volume) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    };
    // Evidence-backed beats fallback once any non-fallback member joins.
    if other.subtype != BandSubtype::Fallback {
        into.subtype = other.subtype;
    }
}
