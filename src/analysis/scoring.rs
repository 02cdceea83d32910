//! Composite zone scoring: five weighted terms, batch-relative rescaling to
//! [0, 10], and a threshold bucketing into a confidence label.

use strum::IntoEnumIterator;

use crate::config::{DEBUG_FLAGS, ScoringConfig};
use crate::domain::band::{Band, BandSubtype, Confidence};
use crate::domain::timeframe::Timeframe;
use crate::utils::maths_utils::rescale_clamped;

/// Historical reversal-pattern counts for a price range. Supplied by a
/// collaborator outside this crate; the scorer only consumes the counts.
pub trait PatternMemory {
    fn reversal_count(&self, price_low: f64, price_high: f64) -> u32;
}

/// The no-op provider: no pattern history, term contributes zero.
pub struct NoPatternMemory;

impl PatternMemory for NoPatternMemory {
    fn reversal_count(&self, _price_low: f64, _price_high: f64) -> u32 {
        0
    }
}

/// Raw composite score for one band. Each term lives in [0, 1] before
/// weighting, so the weights alone set the relative influence.
fn raw_score(
    band: &Band,
    now_ms: i64,
    max_batch_volume: f64,
    patterns: &dyn PatternMemory,
    config: &ScoringConfig,
) -> f64 {
    let recency = match band.last_touched {
        Some(ts) => {
            let age_min = ((now_ms - ts).max(0)) as f64 / 60_000.0;
            (-std::f64::consts::LN_2 * age_min / config.recency_half_life_min).exp()
        }
        None => 0.0,
    };

    // Saturating: the tenth touch is worth far less than the second.
    let touch = 1.0 - (-(band.touch_count as f64) / config.touch_saturation).exp();

    let volume = if band.volume_cluster {
        match (band.total_volume, max_batch_volume > 0.0) {
            // HVN volume known: scale within the batch, floored at half.
            (Some(tv), true) => 0.5 + 0.5 * (tv / max_batch_volume).clamp(0.0, 1.0),
            _ => 1.0,
        }
    } else {
        config.volume_base
    };

    let tf_total = Timeframe::iter().count() as f64;
    let timeframe = (band.timeframes.len() as f64 / tf_total).min(1.0);

    let reversals = patterns.reversal_count(band.price_low, band.price_high);
    let pattern = 1.0 - (-(reversals as f64) / config.pattern_saturation).exp();

    let mut score = config.w_recency * recency
        + config.w_touch * touch
        + config.w_volume * volume
        + config.w_timeframe * timeframe
        + config.w_pattern * pattern;

    if band.subtype == BandSubtype::Fallback {
        score *= config.fallback_penalty;
    }

    if DEBUG_FLAGS.print_score_components {
        log::debug!(
            "score [{:.4}, {:.4}] {}: recency {:.3} touch {:.3} volume {:.3} tf {:.3} pattern {:.3} -> {:.3}",
            band.price_low,
            band.price_high,
            band.band_type,
            recency,
            touch,
            volume,
            timeframe,
            pattern,
            score
        );
    }

    score
}

/// Score a batch of bands in place, filling `score`, `normalized_score`, and
/// `confidence` on every band.
///
/// Normalization is batch-relative: the observed min/max of this batch map
/// to 0 and 10, so normalized scores are comparable within one invocation
/// only, not across runs with different candidate sets.
pub fn score_bands(
    bands: &mut [Band],
    now_ms: i64,
    patterns: &dyn PatternMemory,
    config: &ScoringConfig,
) {
    if bands.is_empty() {
        return;
    }

    let max_batch_volume = bands
        .iter()
        .filter_map(|b| b.total_volume)
        .fold(0.0_f64, f64::max);

    let raw: Vec<f64> = bands
        .iter()
        .map(|band| raw_score(band, now_ms, max_batch_volume, patterns, config))
        .collect();

    let min = raw.iter().cloned().fold(f64::MAX, f64::min);
    let max = raw.iter().cloned().fold(f64::MIN, f64::max);

    for (band, &score) in bands.iter_mut().zip(raw.iter()) {
        let normalized = rescale_clamped(score, min, max, 10.0);
        band.score = Some(score);
        band.normalized_score = Some(normalized);
        band.confidence = Some(bucket_confidence(normalized, config));
    }
}

/// Pure threshold function of the normalized score.
pub fn bucket_confidence(normalized: f64, config: &ScoringConfig) -> Confidence {
    if normalized >= config.t_high {
        Confidence::High
    } else if normalized >= config.t_medium {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZONES;
    use crate::domain::band::{BandType, SourceTag};

    fn band(low: f64, high: f64, touches: u32, last_touched: Option<i64>) -> Band {
        let mut b = Band::new(low, high, BandType::Support, BandSubtype::Primary, SourceTag::Swing)
            .unwrap();
        b.touch_count = touches;
        b.last_touched = last_touched;
        b
    }

    #[test]
    fn more_touches_never_scores_lower() {
        let config = ZONES.scoring.clone();
        let few = band(100.0, 101.0, 1, Some(0));
        let many = band(100.0, 101.0, 6, Some(0));
        let s_few = raw_score(&few, 60_000, 0.0, &NoPatternMemory, &config);
        let s_many = raw_score(&many, 60_000, 0.0, &NoPatternMemory, &config);
        assert!(s_many >= s_few);
    }

    #[test]
    fn recency_decays_with_age() {
        let config = ZONES.scoring.clone();
        let now = 24 * 60 * 60_000;
        let recent = band(100.0, 101.0, 2, Some(now - 5 * 60_000));
        let stale = band(100.0, 101.0, 2, Some(0));
        let s_recent = raw_score(&recent, now, 0.0, &NoPatternMemory, &config);
        let s_stale = raw_score(&stale, now, 0.0, &NoPatternMemory, &config);
        assert!(s_recent > s_stale);
    }

    #[test]
    fn fallback_subtype_is_penalized() {
        let config = ZONES.scoring.clone();
        let primary = band(100.0, 101.0, 2, Some(0));
        let mut fallback = primary.clone();
        fallback.subtype = BandSubtype::Fallback;
        let s_primary = raw_score(&primary, 0, 0.0, &NoPatternMemory, &config);
        let s_fallback = raw_score(&fallback, 0, 0.0, &NoPatternMemory, &config);
        assert!((s_fallback - s_primary * config.fallback_penalty).abs() < 1e-9);
    }

    #[test]
    fn normalized_scores_span_zero_to_ten() {
        let config = ZONES.scoring.clone();
        let now = 60 * 60_000;
        let mut bands = vec![
            band(100.0, 101.0, 8, Some(now)), // strong
            band(110.0, 111.0, 0, None),      // weak
            band(105.0, 106.0, 2, Some(0)),
        ];
        bands[0].volume_cluster = true;
        score_bands(&mut bands, now, &NoPatternMemory, &config.clone());

        for b in &bands {
            let n = b.normalized_score.unwrap();
            assert!((0.0..=10.0).contains(&n));
            assert!(b.confidence.is_some());
        }
        assert!((bands[0].normalized_score.unwrap() - 10.0).abs() < 1e-9);
        assert!(bands[1].normalized_score.unwrap().abs() < 1e-9);
        assert_eq!(bands[0].confidence, Some(Confidence::High));
        assert_eq!(bands[1].confidence, Some(Confidence::Low));
    }

    #[test]
    fn single_band_batch_lands_mid_scale() {
        let config = ZONES.scoring.clone();
        let mut bands = vec![band(100.0, 101.0, 3, Some(0))];
        score_bands(&mut bands, 0, &NoPatternMemory, &config);
        // Degenerate min == max rescales to the middle of the output range.
        assert!((bands[0].normalized_score.unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(bands[0].confidence, Some(Confidence::Medium));
    }

    #[test]
    fn pattern_memory_raises_the_score() {
        struct OneShelf;
        impl PatternMemory for OneShelf {
            fn reversal_count(&self, price_low: f64, _price_high: f64) -> u32 {
                if price_low < 102.0 { 4 } else { 0 }
            }
        }
        let config = ZONES.scoring.clone();
        let with = raw_score(&band(100.0, 101.0, 2, Some(0)), 0, 0.0, &OneShelf, &config);
        let without =
            raw_score(&band(103.0, 104.0, 2, Some(0)), 0, 0.0, &OneShelf, &config);
        assert!(with > without);
    }
}
