//! End-to-end runs of the zone pipeline through the public API.

use zone_scout::domain::BandSubtype;
use zone_scout::{
    Band, BandType, Candle, CandleSeries, NoPatternMemory, Timeframe, ZONES, ZoneBuilder,
};

/// Price oscillating between ~100 and ~110, one full cycle every 10 bars.
fn oscillating_series(timeframe: Timeframe, n: usize) -> CandleSeries {
    let interval = timeframe.interval_ms();
    let candles: Vec<Candle> = (0..n)
        .map(|i| {
            let phase = (i % 10) as f64 / 10.0 * std::f64::consts::TAU;
            let mid = 105.0 - 5.0 * phase.cos();
            Candle::new(i as i64 * interval, mid, mid + 0.4, mid - 0.4, mid, 100.0)
        })
        .collect();
    CandleSeries::from_candles(Some(timeframe), &candles)
}

fn assert_well_formed(band: &Band) {
    assert!(band.price_low < band.price_high);
    assert!(!band.sources.is_empty());
    if let Some(n) = band.normalized_score {
        assert!((0.0..=10.0).contains(&n));
    }
}

#[test]
fn two_timeframes_agreeing_produce_confluent_zones() {
    let builder = ZoneBuilder::new(ZONES.clone()).unwrap();
    let report = builder.build(
        &[
            oscillating_series(Timeframe::M5, 50),
            oscillating_series(Timeframe::M15, 50),
        ],
        &NoPatternMemory,
    );

    assert_eq!(report.per_timeframe.len(), 2);
    for tf in &report.per_timeframe {
        assert!(!tf.bands.is_empty());
        tf.bands.iter().for_each(assert_well_formed);
    }

    // The shared shelves must carry both timeframe tags after merging.
    let confluent: Vec<&Band> = report
        .merged
        .iter()
        .filter(|b| b.timeframes.len() == 2)
        .collect();
    assert!(
        !confluent.is_empty(),
        "expected at least one cross-timeframe zone: {:?}",
        report.merged
    );
    assert!(confluent.iter().any(|b| b.band_type == BandType::Support));
    report.merged.iter().for_each(assert_well_formed);
}

#[test]
fn merged_zones_are_scored_and_ranked_strongest_first() {
    let builder = ZoneBuilder::new(ZONES.clone()).unwrap();
    let report = builder.build(&[oscillating_series(Timeframe::M5, 50)], &NoPatternMemory);

    let scores: Vec<f64> = report
        .merged
        .iter()
        .map(|b| b.normalized_score.expect("merged bands are scored"))
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "not ranked: {scores:?}");
}

#[test]
fn empty_input_is_not_an_error() {
    let builder = ZoneBuilder::new(ZONES.clone()).unwrap();
    let report = builder.build(&[], &NoPatternMemory);
    assert!(report.merged.is_empty());
    assert!(report.per_timeframe.is_empty());
}

#[test]
fn thin_series_publishes_fallback_zones_only() {
    let candles: Vec<Candle> = (0..4)
        .map(|i| {
            Candle::new(
                i * Timeframe::M5.interval_ms(),
                100.0,
                101.0,
                99.0,
                100.0,
                10.0,
            )
        })
        .collect();
    let series = CandleSeries::from_candles(Some(Timeframe::M5), &candles);

    let builder = ZoneBuilder::new(ZONES.clone()).unwrap();
    let report = builder.build(&[series], &NoPatternMemory);
    assert!(!report.merged.is_empty());
    assert!(report.merged.iter().all(|b| b.subtype == BandSubtype::Fallback));
}

#[test]
fn report_serializes_to_json() {
    let builder = ZoneBuilder::new(ZONES.clone()).unwrap();
    let report = builder.build(&[oscillating_series(Timeframe::M5, 50)], &NoPatternMemory);
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"merged\""));
    assert!(json.contains("\"per_timeframe\""));
}
