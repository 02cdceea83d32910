//! Zone filter: width sanity, overlap dedup, minimum spacing, and the final
//! per-timeframe cap. Pure function of its input plus volatility.

use crate::config::{DEBUG_FLAGS, FilterConfig};
use crate::domain::band::Band;

/// Preference order when two bands compete: more corroborating sources wins,
/// then more touches, then proximity to current price.
fn stronger(a: &Band, b: &Band, current_price: f64) -> bool {
    (a.sources.len(), a.touch_count)
        .cmp(&(b.sources.len(), b.touch_count))
        .then_with(|| {
            let da = (a.mid_price() - current_price).abs();
            let db = (b.mid_price() - current_price).abs();
            db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
        })
        .is_gt()
}

/// Fold `weaker` into `keeper`: union the ranges (unless that would blow the
/// width cap) and pool the evidence.
fn absorb(keeper: &mut Band, weaker: &Band, max_width: f64) {
    let union_low = keeper.price_low.min(weaker.price_low);
    let union_high = keeper.price_high.max(weaker.price_high);
    if union_high - union_low <= max_width {
        keeper.price_low = union_low;
        keeper.price_high = union_high;
    }
    keeper.sources.extend(weaker.sources.iter().copied());
    keeper.timeframes.extend(weaker.timeframes.iter().copied());
    keeper.touch_count += weaker.touch_count;
    keeper.last_touched = keeper.last_touched.max(weaker.last_touched);
    keeper.volume_cluster |= weaker.volume_cluster;
    keeper.vwap_zone |= weaker.vwap_zone;
    keeper.total_volume = match (keeper.total_volume, weaker.total_volume) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    };
}

/// Filter one timeframe's candidates. Applies, in order: staleness cut,
/// width bounds, same-type overlap dedup, minimum gap between any two
/// survivors, then the per-timeframe cap. If everything is rejected but
/// candidates existed, the nearest few are rescued so thin data still
/// produces a usable list.
pub fn filter_bands(
    candidates: Vec<Band>,
    mean_atr: f64,
    current_price: f64,
    now_ms: i64,
    config: &FilterConfig,
) -> Vec<Band> {
    if candidates.is_empty() {
        return candidates;
    }

    let min_width = config.min_width_atr_mult * mean_atr;
    let max_width = config.max_width_atr_mult * mean_atr;
    let min_gap = (config.min_gap_atr_mult * mean_atr)
        .max(config.min_gap_floor_pct * current_price.abs());

    let fresh: Vec<Band> = candidates
        .iter()
        .filter(|band| match (config.max_age_minutes, band.last_touched) {
            (Some(max_age), Some(ts)) => {
                let age_min = (now_ms - ts) as f64 / 60_000.0;
                age_min <= max_age
            }
            _ => true,
        })
        .cloned()
        .collect();

    let mut sized: Vec<Band> = fresh
        .iter()
        .filter(|band| {
            let ok = band.span() >= min_width && band.span() <= max_width;
            if !ok && DEBUG_FLAGS.print_filter_decisions {
                log::debug!(
                    "filter: dropped {} band [{:.4}, {:.4}] for width {:.4} outside [{:.4}, {:.4}]",
                    band.band_type,
                    band.price_low,
                    band.price_high,
                    band.span(),
                    min_width,
                    max_width
                );
            }
            ok
        })
        .cloned()
        .collect();

    // Strongest first so the greedy passes below keep the right ones.
    sized.sort_by(|a, b| {
        if stronger(a, b, current_price) {
            std::cmp::Ordering::Less
        } else if stronger(b, a, current_price) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });

    // Same-type overlap dedup: weaker overlapping bands fold into the
    // stronger one they hit first.
    let mut deduped: Vec<Band> = Vec::new();
    for band in sized {
        match deduped
            .iter_mut()
            .find(|kept| kept.band_type == band.band_type && kept.overlaps(&band, 0.0))
        {
            Some(kept) => absorb(kept, &band, max_width),
            None => deduped.push(band),
        }
    }

    // Minimum spacing between any two survivors, regardless of type.
    let mut spaced: Vec<Band> = Vec::new();
    for band in deduped {
        let crowded = spaced.iter().any(|kept| {
            let gap = if band.price_low > kept.price_high {
                band.price_low - kept.price_high
            } else if kept.price_low > band.price_high {
                kept.price_low - band.price_high
            } else {
                0.0
            };
            gap < min_gap
        });
        if crowded {
            if DEBUG_FLAGS.print_filter_decisions {
                log::debug!(
                    "filter: dropped {} band [{:.4}, {:.4}] for crowding (gap < {:.4})",
                    band.band_type,
                    band.price_low,
                    band.price_high,
                    min_gap
                );
            }
            continue;
        }
        spaced.push(band);
    }

    spaced.truncate(config.max_zones);

    if spaced.is_empty() && config.rescue_nearest > 0 {
        return rescue(candidates, current_price, config.rescue_nearest);
    }

    spaced
}

/// Everything got filtered: hand back the candidates nearest current price
/// rather than nothing at all.
fn rescue(mut candidates: Vec<Band>, current_price: f64, keep: usize) -> Vec<Band> {
    log::debug!(
        "filter rejected all {} candidates, rescuing {} nearest price",
        candidates.len(),
        keep
    );
    candidates.sort_by(|a, b| {
        let da = (a.mid_price() - current_price).abs();
        let db = (b.mid_price() - current_price).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(keep);
    candidates
}
