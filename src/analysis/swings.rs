//! Swing extraction: local price extrema over a centered rolling window.

use crate::config::SwingConfig;
use crate::models::swing::{SwingKind, SwingPoint};
use crate::models::timeseries::CandleSeries;
use crate::utils::maths_utils::percentile;

#[allow(unused_imports)]
use crate::config::DEBUG_FLAGS;

/// Lazily walk the series and yield swing points.
///
/// A candle at index `i` is a swing high when its high is the maximum high
/// within `[i-w, i+w]`; symmetric for lows. Edges where the window would run
/// off either end are skipped, so a series shorter than `2w+1` yields
/// nothing. Ties resolve to the earliest index: an equal extremum earlier in
/// the window disqualifies the candidate.
pub fn extract_swings<'a>(
    series: &'a CandleSeries,
    config: &SwingConfig,
) -> impl Iterator<Item = SwingPoint> + 'a {
    let w = config.window;
    let use_wicks = config.use_wicks;
    let volume_filter_pct = config.volume_filter_pct;

    let range = if series.len() >= 2 * w + 1 && w > 0 {
        w..series.len() - w
    } else {
        // Too short for a single full window. Empty output, not an error.
        0..0
    };

    range.flat_map(move |i| {
        let mut found: Vec<SwingPoint> = Vec::with_capacity(2);

        if let Some(point) = candidate_at(series, i, w, SwingKind::High, use_wicks) {
            found.push(point);
        }
        if let Some(point) = candidate_at(series, i, w, SwingKind::Low, use_wicks) {
            found.push(point);
        }

        if let Some(pct) = volume_filter_pct {
            found.retain(|point| passes_volume_filter(series, i, w, pct, point));
        }

        found
    })
}

fn candidate_at(
    series: &CandleSeries,
    i: usize,
    w: usize,
    kind: SwingKind,
    use_wicks: bool,
) -> Option<SwingPoint> {
    let value_at = |idx: usize| -> f64 {
        if use_wicks {
            match kind {
                SwingKind::High => series.high_prices[idx],
                SwingKind::Low => series.low_prices[idx],
            }
        } else {
            series.close_prices[idx]
        }
    };

    let center = value_at(i);

    for j in (i - w)..=(i + w) {
        if j == i {
            continue;
        }
        let other = value_at(j);
        let disqualified = match kind {
            // Strictly-better before the center, or equal-or-better before it,
            // kills the candidate; after the center only strictly-better does.
            // That resolves ties to the earliest index.
            SwingKind::High => {
                if j < i {
                    other >= center
                } else {
                    other > center
                }
            }
            SwingKind::Low => {
                if j < i {
                    other <= center
                } else {
                    other < center
                }
            }
        };
        if disqualified {
            #[cfg(debug_assertions)]
            if DEBUG_FLAGS.print_swing_candidates {
                log::debug!(
                    "swing candidate {:?}@{} disqualified by index {}",
                    kind,
                    i,
                    j
                );
            }
            return None;
        }
    }

    Some(SwingPoint {
        timestamp_ms: series.timestamps_ms[i],
        price: center,
        kind,
        window: w,
        volume: Some(series.volumes[i]),
    })
}

/// Low-conviction reversal rejection: the swing candle's volume must reach
/// the configured percentile of the surrounding window's volume.
fn passes_volume_filter(
    series: &CandleSeries,
    i: usize,
    w: usize,
    pct: f64,
    point: &SwingPoint,
) -> bool {
    let window_volumes = &series.volumes[i - w..=i + w];
    let Some(threshold) = percentile(window_volumes, pct) else {
        return true;
    };
    let passed = point.volume.unwrap_or(0.0) >= threshold;
    if !passed {
        log::debug!(
            "swing at idx {} dropped: volume {:.2} below p{:.0} of window ({:.2})",
            i,
            point.volume.unwrap_or(0.0),
            pct,
            threshold
        );
    }
    passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::Candle;
    use crate::domain::timeframe::Timeframe;

    fn series_from_closes(prices: &[f64]) -> CandleSeries {
        let candles: Vec<Candle> = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Candle::new(i as i64 * 60_000, p, p + 0.5, p - 0.5, p, 10.0))
            .collect();
        CandleSeries::from_candles(Some(Timeframe::M5), &candles)
    }

    fn default_config() -> SwingConfig {
        SwingConfig {
            window: 3,
            volume_filter_pct: None,
            use_wicks: true,
        }
    }

    #[test]
    fn too_short_series_yields_nothing() {
        let series = series_from_closes(&[1.0, 2.0, 3.0]);
        let swings: Vec<_> = extract_swings(&series, &default_config()).collect();
        assert!(swings.is_empty());
    }

    #[test]
    fn monotonic_series_has_no_interior_swing_high_low_pairs() {
        // Strictly increasing: no interior candle is a full-window extremum
        // except where the window reaches the ends.
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&prices);
        let swings: Vec<_> = extract_swings(&series, &default_config()).collect();

        // The only legal swings sit within one window of the endpoints.
        for s in &swings {
            let idx = (s.timestamp_ms / 60_000) as usize;
            assert!(
                idx < 6 || idx >= 13,
                "spurious mid-series swing at index {idx}"
            );
        }
        assert!(swings.len() <= 2);
    }

    #[test]
    fn finds_the_obvious_peak_and_trough() {
        let prices = [
            100.0, 101.0, 102.0, 103.0, 110.0, 103.0, 102.0, 101.0, 95.0, 101.0, 102.0, 103.0,
            104.0, 105.0, 106.0,
        ];
        let series = series_from_closes(&prices);
        let swings: Vec<_> = extract_swings(&series, &default_config()).collect();

        let highs: Vec<_> = swings.iter().filter(|s| s.kind == SwingKind::High).collect();
        let lows: Vec<_> = swings.iter().filter(|s| s.kind == SwingKind::Low).collect();

        assert!(highs.iter().any(|s| (s.price - 110.5).abs() < 1e-9));
        assert!(lows.iter().any(|s| (s.price - 94.5).abs() < 1e-9));
    }

    #[test]
    fn ties_resolve_to_the_earliest_index() {
        // Two equal peaks inside one window: only the first may qualify.
        let prices = [
            100.0, 101.0, 102.0, 105.0, 103.0, 105.0, 101.0, 100.0, 99.0, 98.0, 97.0, 96.0,
        ];
        let series = series_from_closes(&prices);
        let swings: Vec<_> = extract_swings(&series, &default_config()).collect();

        let peak_swings: Vec<_> = swings
            .iter()
            .filter(|s| s.kind == SwingKind::High && (s.price - 105.5).abs() < 1e-9)
            .collect();
        assert_eq!(peak_swings.len(), 1);
        assert_eq!(peak_swings[0].timestamp_ms, 3 * 60_000);
    }

    #[test]
    fn volume_filter_drops_thin_swings() {
        let prices = [
            100.0, 101.0, 102.0, 103.0, 110.0, 103.0, 102.0, 101.0, 100.0, 99.0, 98.0,
        ];
        let mut candles: Vec<Candle> = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Candle::new(i as i64 * 60_000, p, p + 0.5, p - 0.5, p, 100.0))
            .collect();
        // The peak candle trades almost nothing.
        candles[4].volume = 1.0;
        let series = CandleSeries::from_candles(Some(Timeframe::M5), &candles);

        let mut config = default_config();
        config.volume_filter_pct = Some(50.0);
        let swings: Vec<_> = extract_swings(&series, &config).collect();
        assert!(swings.iter().all(|s| (s.price - 110.5).abs() > 1e-9));
    }
}
