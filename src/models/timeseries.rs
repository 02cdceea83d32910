use serde::{Deserialize, Serialize};

use crate::domain::candle::Candle;
use crate::domain::timeframe::Timeframe;
use crate::utils::time_utils::epoch_ms_to_day;

// ============================================================================
// CandleSeries: column-oriented candle storage for one instrument + timeframe
// ============================================================================

/// Candles stored as parallel vectors rather than a Vec<Candle>. Analysis
/// passes (ATR, rolling windows, histograms) stream one column at a time, so
/// this layout keeps them cache-friendly and lets us hand out slices.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CandleSeries {
    pub timeframe: Option<Timeframe>,

    pub timestamps_ms: Vec<i64>,

    // Prices
    pub open_prices: Vec<f64>,
    pub high_prices: Vec<f64>,
    pub low_prices: Vec<f64>,
    pub close_prices: Vec<f64>,

    // Volumes
    pub volumes: Vec<f64>,
}

impl CandleSeries {
    /// Build a series from row-form candles. Out-of-order rows are dropped
    /// rather than rejected wholesale - inconsistent input is a data
    /// condition, not a caller bug.
    pub fn from_candles(timeframe: Option<Timeframe>, candles: &[Candle]) -> Self {
        let mut series = CandleSeries {
            timeframe,
            ..Default::default()
        };

        let mut dropped = 0usize;
        let mut last_ts = i64::MIN;
        for candle in candles {
            if candle.timestamp_ms <= last_ts {
                dropped += 1;
                continue;
            }
            last_ts = candle.timestamp_ms;
            series.push(candle);
        }

        if dropped > 0 {
            log::warn!(
                "CandleSeries: dropped {} out-of-order candles ({} kept)",
                dropped,
                series.len()
            );
        }

        series
    }

    fn push(&mut self, candle: &Candle) {
        self.timestamps_ms.push(candle.timestamp_ms);
        self.open_prices.push(candle.open);
        self.high_prices.push(candle.high);
        self.low_prices.push(candle.low);
        self.close_prices.push(candle.close);
        self.volumes.push(candle.volume);
    }

    pub fn len(&self) -> usize {
        self.timestamps_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps_ms.is_empty()
    }

    pub fn get_candle(&self, idx: usize) -> Candle {
        Candle::new(
            self.timestamps_ms[idx],
            self.open_prices[idx],
            self.high_prices[idx],
            self.low_prices[idx],
            self.close_prices[idx],
            self.volumes[idx],
        )
    }

    pub fn last_close(&self) -> Option<f64> {
        self.close_prices.last().copied()
    }

    pub fn last_timestamp_ms(&self) -> Option<i64> {
        self.timestamps_ms.last().copied()
    }

    pub fn total_volume(&self) -> f64 {
        self.volumes.iter().sum()
    }

    // ------------------------------------------------------------------
    // Volatility
    // ------------------------------------------------------------------

    /// Per-candle ATR (Wilder smoothing), aligned index-for-index with the
    /// series. The first value is the plain high-low range.
    pub fn atr_series(&self, period: usize) -> Vec<f64> {
        debug_assert!(period > 0);
        let mut out = Vec::with_capacity(self.len());
        let mut prev_close: Option<f64> = None;
        let mut atr: Option<f64> = None;

        for idx in 0..self.len() {
            let candle = self.get_candle(idx);
            let tr = candle.true_range(prev_close);
            prev_close = Some(candle.close);
            atr = Some(match atr {
                None => tr,
                Some(prev) => (prev * (period as f64 - 1.0) + tr) / period as f64,
            });
            out.push(atr.unwrap_or(tr));
        }

        out
    }

    /// Mean ATR over the whole series, with a fallback for thin data so the
    /// clustering tolerance never degenerates to zero.
    pub fn mean_atr(&self, period: usize, fallback: f64) -> f64 {
        let mean = crate::utils::maths_utils::mean(&self.atr_series(period));
        if mean > 0.0 { mean } else { fallback }
    }

    // ------------------------------------------------------------------
    // Session handling
    // ------------------------------------------------------------------

    /// Index ranges (start, end-exclusive) of each UTC session day, oldest
    /// first. Consecutive because the series is time-ordered.
    pub fn session_ranges(&self) -> Vec<(usize, usize)> {
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        let mut current_day: Option<i64> = None;

        for (idx, &ts) in self.timestamps_ms.iter().enumerate() {
            let day = epoch_ms_to_day(ts);
            match current_day {
                Some(d) if d == day => {
                    if let Some(last) = ranges.last_mut() {
                        last.1 = idx + 1;
                    }
                }
                _ => {
                    ranges.push((idx, idx + 1));
                    current_day = Some(day);
                }
            }
        }

        ranges
    }

    /// The previous session's index range, if at least two sessions exist.
    pub fn prev_session_range(&self) -> Option<(usize, usize)> {
        let ranges = self.session_ranges();
        if ranges.len() < 2 {
            return None;
        }
        Some(ranges[ranges.len() - 2])
    }

    /// The current (latest) session's index range.
    pub fn current_session_range(&self) -> Option<(usize, usize)> {
        self.session_ranges().last().copied()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::TimeUtils;

    fn flat_series(n: usize) -> CandleSeries {
        let candles: Vec<Candle> = (0..n)
            .map(|i| {
                Candle::new(
                    i as i64 * TimeUtils::MS_IN_5_MIN,
                    100.0,
                    101.0,
                    99.0,
                    100.0,
                    10.0,
                )
            })
            .collect();
        CandleSeries::from_candles(Some(Timeframe::M5), &candles)
    }

    #[test]
    fn out_of_order_candles_are_dropped() {
        let candles = vec![
            Candle::new(1000, 1.0, 2.0, 0.5, 1.5, 1.0),
            Candle::new(500, 1.0, 2.0, 0.5, 1.5, 1.0), // stale, dropped
            Candle::new(2000, 1.0, 2.0, 0.5, 1.5, 1.0),
        ];
        let series = CandleSeries::from_candles(None, &candles);
        assert_eq!(series.len(), 2);
        assert_eq!(series.timestamps_ms, vec![1000, 2000]);
    }

    #[test]
    fn atr_is_aligned_and_positive_for_flat_series() {
        let series = flat_series(20);
        let atr = series.atr_series(14);
        assert_eq!(atr.len(), series.len());
        assert!(atr.iter().all(|&v| v > 0.0));
        // Flat candles: TR is constant, so Wilder smoothing stays at 2.0.
        assert!((atr[19] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn session_ranges_split_on_day_boundary() {
        let mut candles = Vec::new();
        for i in 0..5 {
            candles.push(Candle::new(i * TimeUtils::MS_IN_H, 1.0, 2.0, 0.5, 1.5, 1.0));
        }
        for i in 0..3 {
            candles.push(Candle::new(
                TimeUtils::MS_IN_D + i * TimeUtils::MS_IN_H,
                1.0,
                2.0,
                0.5,
                1.5,
                1.0,
            ));
        }
        let series = CandleSeries::from_candles(None, &candles);
        let ranges = series.session_ranges();
        assert_eq!(ranges, vec![(0, 5), (5, 8)]);
        assert_eq!(series.prev_session_range(), Some((0, 5)));
        assert_eq!(series.current_session_range(), Some((5, 8)));
    }

    #[test]
    fn mean_atr_falls_back_on_empty_series() {
        let empty = CandleSeries::default();
        assert_eq!(empty.mean_atr(14, 20.0), 20.0);
    }
}
