use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::TimeUtils;

/// The candle intervals the pipeline analyses. Ordered smallest to largest so
/// BTreeSet iteration over timeframe tags is deterministic.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
)]
pub enum Timeframe {
    M5,
    M15,
    H1,
}

impl Timeframe {
    pub fn interval_ms(&self) -> i64 {
        match self {
            Timeframe::M5 => TimeUtils::MS_IN_5_MIN,
            Timeframe::M15 => TimeUtils::MS_IN_15_MIN,
            Timeframe::H1 => TimeUtils::MS_IN_H,
        }
    }

    pub fn label(&self) -> &'static str {
        TimeUtils::interval_to_string(self.interval_ms())
    }

    /// Lookahead (in bars) for flip retest confirmation. Coarser timeframes
    /// get fewer bars so the wall-clock window stays comparable.
    pub fn default_flip_lookahead(&self) -> usize {
        match self {
            Timeframe::M5 => 6,
            Timeframe::M15 => 4,
            Timeframe::H1 => 2,
        }
    }

    /// Parse a CLI/config label like "5m" or "1h".
    pub fn from_label(label: &str) -> Option<Timeframe> {
        match label.to_ascii_lowercase().as_str() {
            "5m" | "m5" => Some(Timeframe::M5),
            "15m" | "m15" => Some(Timeframe::M15),
            "1h" | "h1" | "60m" => Some(Timeframe::H1),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
