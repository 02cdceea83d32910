//! Fallback bands from prior-session OHLC levels. These only enter the
//! picture when the evidence-driven producers come up nearly empty, so the
//! caller always gets something actionable back.

use crate::config::FallbackConfig;
use crate::domain::band::{Band, BandSubtype, BandType, SourceTag};
use crate::models::timeseries::CandleSeries;

/// Bands cushioned around the previous session's open/high/low/close. When
/// only one session exists the levels come from that session instead.
pub fn fallback_bands(
    series: &CandleSeries,
    mean_atr: f64,
    current_price: f64,
    config: &FallbackConfig,
) -> Vec<Band> {
    let Some((start, end)) = series
        .prev_session_range()
        .or_else(|| series.current_session_range())
    else {
        return Vec::new();
    };

    let highs = &series.high_prices[start..end];
    let lows = &series.low_prices[start..end];
    let session_high = highs.iter().cloned().fold(f64::MIN, f64::max);
    let session_low = lows.iter().cloned().fold(f64::MAX, f64::min);
    let session_open = series.open_prices[start];
    let session_close = series.close_prices[end - 1];

    let cushion = (config.cushion_atr_mult * mean_atr).max(current_price.abs() * 1e-6);
    let last_ts = series.timestamps_ms[end - 1];

    let mut levels = vec![session_high, session_low, session_open, session_close];
    levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    // Open/close often sit on top of high/low; collapse near-duplicates so
    // we don't emit two bands for the same level.
    levels.dedup_by(|a, b| (*a - *b).abs() < cushion);

    let mut bands = Vec::new();
    for level in levels {
        let band_type = if level <= current_price {
            BandType::Support
        } else {
            BandType::Resistance
        };
        match Band::new(
            level - cushion,
            level + cushion,
            band_type,
            BandSubtype::Fallback,
            SourceTag::Fallback,
        ) {
            Ok(mut band) => {
                band.last_touched = Some(last_ts);
                bands.push(band);
            }
            Err(e) => log::warn!("skipping malformed fallback band: {e}"),
        }
    }

    bands
}
