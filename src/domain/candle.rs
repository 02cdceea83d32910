use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq)]
pub enum CandleType {
    Bullish,
    Bearish,
}

/// A single OHLCV candle. Timestamps are epoch milliseconds (UTC) and
/// candles are always handled in ascending-time order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Candle {
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Candle {
            timestamp_ms,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn get_type(&self) -> CandleType {
        if self.close >= self.open {
            CandleType::Bullish
        } else {
            CandleType::Bearish
        }
    }

    // Returns the low and high of the candle body as a tuple
    pub fn body_range(&self) -> (f64, f64) {
        match self.get_type() {
            CandleType::Bullish => (self.open, self.close),
            CandleType::Bearish => (self.close, self.open),
        }
    }

    pub fn total_range(&self) -> f64 {
        self.high - self.low
    }

    /// Typical price, the standard VWAP numerator component.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// True range against the previous close (plain high-low when absent).
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(prev) => (self.high - self.low)
                .max((self.high - prev).abs())
                .max((self.low - prev).abs()),
            None => self.high - self.low,
        }
    }
}
