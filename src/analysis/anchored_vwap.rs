//! Anchored VWAP: volume-weighted average price from a meaningful reference
//! bar forward, plus detection of rejection bands around the VWAP line.

use crate::config::{AnchorKind, VwapConfig};
use crate::domain::band::{Band, BandSubtype, BandType, SourceTag};
use crate::models::timeseries::CandleSeries;

const STANDARD_ANCHORS: [AnchorKind; 4] = [
    AnchorKind::SessionOpen,
    AnchorKind::PrevSessionHigh,
    AnchorKind::PrevSessionLow,
    AnchorKind::BreakoutBar,
];

/// Resolve an anchor event to a candle index. None when the event does not
/// exist in this candle set (skipped, not fatal).
pub fn resolve_anchor(series: &CandleSeries, anchor: AnchorKind) -> Option<usize> {
    match anchor {
        AnchorKind::SessionOpen => series.current_session_range().map(|(start, _)| start),
        AnchorKind::PrevSessionHigh => {
            let (start, end) = series.prev_session_range()?;
            argmax_in(&series.high_prices[start..end]).map(|offset| start + offset)
        }
        AnchorKind::PrevSessionLow => {
            let (start, end) = series.prev_session_range()?;
            argmin_in(&series.low_prices[start..end]).map(|offset| start + offset)
        }
        AnchorKind::BreakoutBar => {
            let (prev_start, prev_end) = series.prev_session_range()?;
            let (cur_start, cur_end) = series.current_session_range()?;
            let prev_high = series.high_prices[prev_start..prev_end]
                .iter()
                .cloned()
                .fold(f64::MIN, f64::max);
            let prev_low = series.low_prices[prev_start..prev_end]
                .iter()
                .cloned()
                .fold(f64::MAX, f64::min);
            (cur_start..cur_end).find(|&idx| {
                series.high_prices[idx] > prev_high || series.low_prices[idx] < prev_low
            })
        }
    }
}

/// Running volume-weighted average of typical price from `anchor_idx` to the
/// end of the series. Zero cumulative volume falls back to the typical price
/// itself so the line stays defined.
pub fn anchored_vwap(series: &CandleSeries, anchor_idx: usize) -> Vec<f64> {
    if anchor_idx >= series.len() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(series.len() - anchor_idx);
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;

    for idx in anchor_idx..series.len() {
        let candle = series.get_candle(idx);
        cum_pv += candle.typical_price() * candle.volume;
        cum_vol += candle.volume;
        let vwap = if cum_vol > 0.0 {
            cum_pv / cum_vol
        } else {
            candle.typical_price()
        };
        out.push(vwap);
    }

    out
}

/// Candidate bands from VWAP rejections across every configured anchor.
///
/// A rejection is a candle whose range reaches into the tolerance band
/// around the VWAP line while the next candle closes back outside it - price
/// approached the line and was turned away. Overlapping bands from multiple
/// anchors are left as-is; deduplication is the filter's and merger's job.
pub fn vwap_rejection_bands(series: &CandleSeries, config: &VwapConfig) -> Vec<Band> {
    let anchors: &[AnchorKind] = if config.anchors.is_empty() {
        &STANDARD_ANCHORS
    } else {
        &config.anchors
    };

    let mut bands = Vec::new();
    for &anchor in anchors {
        let Some(anchor_idx) = resolve_anchor(series, anchor) else {
            log::debug!("vwap anchor {anchor:?} unresolvable for this series, skipped");
            continue;
        };
        let vwap = anchored_vwap(series, anchor_idx);
        collect_rejections(series, anchor_idx, &vwap, config, &mut bands);
    }

    bands
}

fn collect_rejections(
    series: &CandleSeries,
    anchor_idx: usize,
    vwap: &[f64],
    config: &VwapConfig,
    bands: &mut Vec<Band>,
) {
    let tol_pct = config.rejection_tolerance_pct;
    let mut prev_was_rejection = false;

    for (offset, &line) in vwap.iter().enumerate() {
        let idx = anchor_idx + offset;
        if idx + 1 >= series.len() {
            break;
        }

        let tol = line * tol_pct;
        let band_low = line - tol;
        let band_high = line + tol;

        let touches = series.low_prices[idx] <= band_high && series.high_prices[idx] >= band_low;
        if !touches {
            prev_was_rejection = false;
            continue;
        }

        let next_close = series.close_prices[idx + 1];
        let moved_away = next_close > band_high || next_close < band_low;
        if !moved_away {
            prev_was_rejection = false;
            continue;
        }

        // Runs of consecutive rejections collapse to the first bar; the rest
        // would just re-emit almost the same range.
        if prev_was_rejection {
            continue;
        }
        prev_was_rejection = true;

        let band_type = if next_close > band_high {
            BandType::Support // price bounced up off the line
        } else {
            BandType::Resistance
        };

        match Band::new(band_low, band_high, band_type, BandSubtype::Primary, SourceTag::Vwap) {
            Ok(mut band) => {
                band.vwap_zone = true;
                band.touch_count = 1;
                band.last_touched = Some(series.timestamps_ms[idx]);
                bands.push(band);
            }
            Err(e) => log::warn!("skipping malformed VWAP band: {e}"),
        }
    }
}

fn argmax_in(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.partial_cmp(b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ib.cmp(ia))
        })
        .map(|(i, _)| i)
}

fn argmin_in(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| {
            a.partial_cmp(b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::Candle;
    use crate::utils::TimeUtils;

    fn series(rows: &[(f64, f64, f64, f64, f64)]) -> CandleSeries {
        let candles: Vec<Candle> = rows
            .iter()
            .enumerate()
            .map(|(i, &(o, h, l, c, v))| Candle::new(i as i64 * TimeUtils::MS_IN_5_MIN, o, h, l, c, v))
            .collect();
        CandleSeries::from_candles(None, &candles)
    }

    #[test]
    fn vwap_of_uniform_series_is_the_typical_price() {
        let s = series(&[(100.0, 101.0, 99.0, 100.0, 10.0); 5]);
        let vwap = anchored_vwap(&s, 0);
        assert_eq!(vwap.len(), 5);
        for v in vwap {
            assert!((v - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn out_of_range_anchor_yields_empty_series() {
        let s = series(&[(100.0, 101.0, 99.0, 100.0, 10.0); 3]);
        assert!(anchored_vwap(&s, 10).is_empty());
    }

    #[test]
    fn detects_a_bounce_off_the_line() {
        // VWAP sits near 100; one candle dips to the line and the next
        // closes well above the tolerance band.
        let s = series(&[
            (100.0, 101.0, 99.0, 100.0, 10.0),
            (100.0, 101.0, 99.0, 100.0, 10.0),
            (100.0, 101.0, 99.5, 100.0, 10.0), // touch
            (101.0, 103.0, 100.9, 102.5, 10.0), // away, upward
            (102.5, 103.0, 102.0, 102.8, 10.0),
        ]);
        let config = VwapConfig {
            rejection_tolerance_pct: 0.005,
            anchors: vec![AnchorKind::SessionOpen],
        };
        let bands = vwap_rejection_bands(&s, &config);
        assert!(!bands.is_empty());
        assert!(bands.iter().any(|b| b.band_type == BandType::Support && b.vwap_zone));
    }

    #[test]
    fn unresolvable_anchor_is_skipped_not_fatal() {
        // Single-session data: prev-session anchors cannot resolve.
        let s = series(&[(100.0, 101.0, 99.0, 100.0, 10.0); 5]);
        let config = VwapConfig {
            rejection_tolerance_pct: 0.005,
            anchors: vec![AnchorKind::PrevSessionHigh, AnchorKind::PrevSessionLow],
        };
        let bands = vwap_rejection_bands(&s, &config);
        assert!(bands.is_empty());
    }
}
