//! Opening-gap zones. A session that opens well away from the prior
//! session's close leaves a thinly-traded void behind it; while the gap
//! stays unfilled, the prior close tends to act as support (gap up) or
//! resistance (gap down).

use crate::config::GapConfig;
use crate::domain::band::{Band, BandSubtype, BandType, SourceTag};
use crate::models::timeseries::CandleSeries;

/// Candidate bands from unfilled opening gaps between consecutive sessions.
/// Each band is centered on the prior session's close, ATR-wide on each side.
pub fn gap_bands(series: &CandleSeries, mean_atr: f64, config: &GapConfig) -> Vec<Band> {
    if !config.enabled {
        return Vec::new();
    }

    let ranges = series.session_ranges();
    let mut bands = Vec::new();

    for pair in ranges.windows(2) {
        let (prev_start, prev_end) = pair[0];
        let (cur_start, cur_end) = pair[1];
        debug_assert!(prev_start < prev_end);

        let prev_close = series.close_prices[prev_end - 1];
        let open = series.open_prices[cur_start];
        if prev_close <= 0.0 {
            continue;
        }

        let gap_pct = (open - prev_close).abs() / prev_close * 100.0;
        if gap_pct < config.min_gap_pct {
            continue;
        }

        // Skip gaps traded back through right at the open: filled means the
        // session's early bars reached the prior close again.
        let gapped_up = open > prev_close;
        let check_end = (cur_start + config.fill_check_bars).min(cur_end);
        let filled = (cur_start..check_end).any(|idx| {
            if gapped_up {
                series.low_prices[idx] < prev_close
            } else {
                series.high_prices[idx] > prev_close
            }
        });
        if filled {
            log::debug!("gap at session starting idx {cur_start} filled early, skipped");
            continue;
        }

        let band_type = if gapped_up {
            BandType::Support
        } else {
            BandType::Resistance
        };

        match Band::new(
            prev_close - mean_atr,
            prev_close + mean_atr,
            band_type,
            BandSubtype::Primary,
            SourceTag::Gap,
        ) {
            Ok(mut band) => {
                band.last_touched = Some(series.timestamps_ms[cur_start]);
                bands.push(band);
            }
            Err(e) => log::warn!("skipping malformed gap band: {e}"),
        }
    }

    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::Candle;
    use crate::utils::TimeUtils;

    fn two_session_series(prev_close: f64, open: f64, first_bars: &[(f64, f64)]) -> CandleSeries {
        let mut candles = vec![
            Candle::new(0, prev_close, prev_close + 0.5, prev_close - 0.5, prev_close, 10.0),
        ];
        for (i, &(low, high)) in first_bars.iter().enumerate() {
            candles.push(Candle::new(
                TimeUtils::MS_IN_D + i as i64 * TimeUtils::MS_IN_5_MIN,
                open,
                high,
                low,
                (low + high) / 2.0,
                10.0,
            ));
        }
        CandleSeries::from_candles(None, &candles)
    }

    fn config() -> GapConfig {
        GapConfig {
            enabled: true,
            min_gap_pct: 0.3,
            fill_check_bars: 5,
        }
    }

    #[test]
    fn gap_up_emits_a_support_band_at_the_prior_close() {
        // Close 100, open 102: a 2% gap the session never trades back into.
        let s = two_session_series(100.0, 102.0, &[(101.5, 103.0), (102.0, 104.0)]);
        let bands = gap_bands(&s, 1.5, &config());
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].band_type, BandType::Support);
        assert!((bands[0].price_low - 98.5).abs() < 1e-9);
        assert!((bands[0].price_high - 101.5).abs() < 1e-9);
        assert!(bands[0].sources.contains(&SourceTag::Gap));
    }

    #[test]
    fn gap_down_emits_a_resistance_band() {
        let s = two_session_series(100.0, 98.0, &[(97.0, 98.5), (96.5, 98.0)]);
        let bands = gap_bands(&s, 1.5, &config());
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].band_type, BandType::Resistance);
    }

    #[test]
    fn filled_gap_is_skipped() {
        // Second bar dips back below the prior close.
        let s = two_session_series(100.0, 102.0, &[(101.5, 103.0), (99.5, 102.5)]);
        assert!(gap_bands(&s, 1.5, &config()).is_empty());
    }

    #[test]
    fn small_gap_is_ignored() {
        // 0.1% gap sits below the threshold.
        let s = two_session_series(100.0, 100.1, &[(100.0, 101.0)]);
        assert!(gap_bands(&s, 1.5, &config()).is_empty());
    }

    #[test]
    fn disabled_detector_emits_nothing() {
        let s = two_session_series(100.0, 102.0, &[(101.5, 103.0)]);
        let mut c = config();
        c.enabled = false;
        assert!(gap_bands(&s, 1.5, &c).is_empty());
    }
}
