use chrono::DateTime;

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_MIN * 5;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_MIN * 15;
    pub const MS_IN_30_MIN: i64 = Self::MS_IN_MIN * 30;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

    /// Convert an interval in milliseconds to the usual shorthand (e.g. `5m`, `1h`).
    pub fn interval_to_string(interval_ms: i64) -> &'static str {
        match interval_ms {
            Self::MS_IN_MIN => "1m",
            Self::MS_IN_5_MIN => "5m",
            Self::MS_IN_15_MIN => "15m",
            Self::MS_IN_30_MIN => "30m",
            Self::MS_IN_H => "1h",
            Self::MS_IN_D => "1d",
            _ => "unknown",
        }
    }
}

/// Render an epoch-ms timestamp for logs and reports.
pub fn epoch_ms_to_utc(epoch_ms: i64) -> String {
    match DateTime::from_timestamp_millis(epoch_ms) {
        Some(dt) => dt.format(TimeUtils::STANDARD_TIME_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Which UTC day does this timestamp fall on? Used for session splitting.
pub fn epoch_ms_to_day(epoch_ms: i64) -> i64 {
    epoch_ms.div_euclid(TimeUtils::MS_IN_D)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_index_splits_on_utc_midnight() {
        assert_eq!(epoch_ms_to_day(0), 0);
        assert_eq!(epoch_ms_to_day(TimeUtils::MS_IN_D - 1), 0);
        assert_eq!(epoch_ms_to_day(TimeUtils::MS_IN_D), 1);
    }

    #[test]
    fn interval_shorthands() {
        assert_eq!(TimeUtils::interval_to_string(TimeUtils::MS_IN_5_MIN), "5m");
        assert_eq!(TimeUtils::interval_to_string(TimeUtils::MS_IN_H), "1h");
        assert_eq!(TimeUtils::interval_to_string(42), "unknown");
    }
}
