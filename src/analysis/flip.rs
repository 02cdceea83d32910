//! Flip/retest tagging. A band breached decisively and later retested from
//! the other side has inverted its role; the tagger replays the candle
//! history through a small per-band state machine to find those inversions.

use crate::config::{DEBUG_FLAGS, FlipConfig};
use crate::domain::band::{Band, BandSubtype};
use crate::models::timeseries::CandleSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreachDir {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlipState {
    Unbroken,
    Breached(BreachDir),
    Retested,
}

/// Replay `series` against each band and tag confirmed flips: set
/// `flipped = true`, `subtype = retest`, and swap the band's type. A band
/// that breaches but never retests within the lookahead stays untagged.
///
/// Evaluated once over the available history per run; no state carries
/// across invocations.
pub fn tag_flips(bands: &mut [Band], series: &CandleSeries, config: &FlipConfig) {
    let lookahead = config
        .retest_lookahead
        .or_else(|| series.timeframe.map(|tf| tf.default_flip_lookahead()))
        .unwrap_or(4);

    for band in bands.iter_mut() {
        if replay(band, series, lookahead, config.breach_tolerance_pct) == FlipState::Retested {
            if DEBUG_FLAGS.print_flip_transitions {
                log::debug!(
                    "flip confirmed: {} [{:.4}, {:.4}] now acts as {}",
                    band.band_type,
                    band.price_low,
                    band.price_high,
                    band.band_type.swapped()
                );
            }
            band.flipped = true;
            band.subtype = BandSubtype::Retest;
            band.band_type = band.band_type.swapped();
        }
    }
}

fn replay(band: &Band, series: &CandleSeries, lookahead: usize, breach_tol_pct: f64) -> FlipState {
    use crate::domain::band::BandType;

    let mut state = FlipState::Unbroken;
    let mut idx = 0;

    while idx < series.len() {
        let close = series.close_prices[idx];
        let tol = breach_tol_pct * close.abs();

        match state {
            FlipState::Unbroken => {
                // Only a close through the far edge counts as a breach.
                let breached = match band.band_type {
                    BandType::Support if close < band.price_low - tol => Some(BreachDir::Down),
                    BandType::Resistance if close > band.price_high + tol => Some(BreachDir::Up),
                    _ => None,
                };
                if let Some(dir) = breached {
                    if DEBUG_FLAGS.print_flip_transitions {
                        log::debug!(
                            "breach at idx {idx}: close {close:.4} through {} [{:.4}, {:.4}]",
                            band.band_type,
                            band.price_low,
                            band.price_high
                        );
                    }
                    state = FlipState::Breached(dir);
                }
            }
            FlipState::Breached(dir) => {
                let re_entered = series.low_prices[idx] <= band.price_high
                    && series.high_prices[idx] >= band.price_low;
                if re_entered {
                    // Price must react away from the band, in the breach
                    // direction, within the lookahead window.
                    let window_end = (idx + 1 + lookahead).min(series.len());
                    let reacted = (idx + 1..window_end).any(|j| {
                        let c = series.close_prices[j];
                        let t = breach_tol_pct * c.abs();
                        match dir {
                            BreachDir::Up => c > band.price_high + t,
                            BreachDir::Down => c < band.price_low - t,
                        }
                    });
                    if reacted {
                        return FlipState::Retested;
                    }
                    // No reaction for this entry; a later one may still
                    // confirm, so skip past the inspected window.
                    idx = window_end;
                    continue;
                }
            }
            FlipState::Retested => unreachable!(),
        }

        idx += 1;
    }

    state
}
