//! The zone builder: composes every technique into the published band list.
//!
//! Candles for each timeframe flow through swing extraction, clustering,
//! volume profile, anchored VWAP, gap detection, and filtering independently
//! (in parallel); the per-timeframe lists then merge, the merged list is
//! scored, and flips are tagged. The builder always returns a valid report,
//! falling back to prior-session levels on thin data and to an empty list
//! when there is no data at all.

use rayon::prelude::*;
use serde::Serialize;

use anyhow::Result;

use crate::analysis::anchored_vwap::vwap_rejection_bands;
use crate::analysis::clustering::cluster_swings;
use crate::analysis::fallback::fallback_bands;
use crate::analysis::filtering::filter_bands;
use crate::analysis::flip::tag_flips;
use crate::analysis::gap_zones::gap_bands;
use crate::analysis::scoring::{PatternMemory, score_bands};
use crate::analysis::swings::extract_swings;
use crate::analysis::tf_merge::{merge_across_timeframes, merge_tolerance};
use crate::analysis::volume_profile::VolumeProfile;
use crate::config::ZoneConfig;
use crate::domain::band::Band;
use crate::domain::timeframe::Timeframe;
use crate::models::swing::{SwingKind, SwingPoint};
use crate::models::timeseries::CandleSeries;

/// One timeframe's filtered candidate bands.
#[derive(Debug, Clone, Serialize)]
pub struct TimeframeBands {
    pub timeframe: Option<Timeframe>,
    pub bands: Vec<Band>,
}

/// The pipeline's published output: per-timeframe candidates plus the
/// merged, scored, flip-tagged final list (strongest first).
#[derive(Debug, Clone, Serialize)]
pub struct ZoneReport {
    pub per_timeframe: Vec<TimeframeBands>,
    pub merged: Vec<Band>,
}

pub struct ZoneBuilder {
    config: ZoneConfig,
    /// Optional dedicated series for the volume profile (futures volume is
    /// often cleaner than spot); per-timeframe candles are used when absent.
    volume_series: Option<CandleSeries>,
}

impl ZoneBuilder {
    /// Config problems are caller bugs and fail here, up front. Data
    /// problems never fail the builder.
    pub fn new(config: ZoneConfig) -> Result<Self> {
        config.validate()?;
        Ok(ZoneBuilder {
            config,
            volume_series: None,
        })
    }

    pub fn with_volume_series(mut self, series: CandleSeries) -> Self {
        self.volume_series = Some(series);
        self
    }

    /// Run the full pipeline over one series per timeframe.
    pub fn build(&self, series_by_timeframe: &[CandleSeries], patterns: &dyn PatternMemory) -> ZoneReport {
        let now_ms = series_by_timeframe
            .iter()
            .filter_map(|s| s.last_timestamp_ms())
            .max()
            .unwrap_or(0);

        // Per-timeframe stages are independent; fan out, join before merging.
        let per_tf: Vec<(Option<Timeframe>, Vec<Band>, f64, Option<f64>)> = series_by_timeframe
            .par_iter()
            .map(|series| self.candidates_for(series, now_ms))
            .collect();

        let current_price = per_tf
            .iter()
            .find_map(|(_, _, _, price)| *price)
            .unwrap_or(0.0);
        let atrs: Vec<f64> = per_tf
            .iter()
            .filter(|(_, _, _, price)| price.is_some())
            .map(|(_, _, atr, _)| *atr)
            .collect();
        let mean_atr = if atrs.is_empty() {
            self.config.atr_fallback_pct * current_price.abs()
        } else {
            atrs.iter().sum::<f64>() / atrs.len() as f64
        };

        let tolerance = merge_tolerance(mean_atr, current_price, &self.config.merge);
        let mut merged = merge_across_timeframes(
            per_tf.iter().map(|(_, bands, _, _)| bands.clone()).collect(),
            tolerance,
        );

        // Flips replay against the finest series that actually has data.
        if let Some(base) = series_by_timeframe.iter().find(|s| !s.is_empty()) {
            tag_flips(&mut merged, base, &self.config.flip);
        }

        score_bands(&mut merged, now_ms, patterns, &self.config.scoring);
        enrich(&mut merged, current_price, now_ms);

        // Strongest first for the downstream consumer.
        merged.sort_by(|a, b| {
            b.normalized_score
                .partial_cmp(&a.normalized_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(top_n) = self.config.top_n {
            merged.truncate(top_n);
        }

        let per_timeframe = per_tf
            .into_iter()
            .map(|(timeframe, bands, _, _)| TimeframeBands { timeframe, bands })
            .collect();

        ZoneReport {
            per_timeframe,
            merged,
        }
    }

    /// Stages 1-6 for one timeframe. Returns (timeframe, filtered bands,
    /// mean ATR, last close).
    fn candidates_for(
        &self,
        series: &CandleSeries,
        now_ms: i64,
    ) -> (Option<Timeframe>, Vec<Band>, f64, Option<f64>) {
        let Some(current_price) = series.last_close() else {
            return (series.timeframe, Vec::new(), 0.0, None);
        };

        let mean_atr = series.mean_atr(
            self.config.atr_period,
            self.config.atr_fallback_pct * current_price.abs(),
        );

        let mut candidates: Vec<Band> = Vec::new();

        // Swings, split by kind, clustered into shelves.
        let (highs, lows): (Vec<SwingPoint>, Vec<SwingPoint>) =
            extract_swings(series, &self.config.swing)
                .partition(|point| point.kind == SwingKind::High);
        candidates.extend(cluster_swings(&highs, mean_atr, &self.config.cluster));
        candidates.extend(cluster_swings(&lows, mean_atr, &self.config.cluster));

        // Volume profile, from the dedicated series when one is set.
        let volume_input = self.volume_series.as_ref().unwrap_or(series);
        if let Some(profile) =
            VolumeProfile::build(volume_input, self.config.volume_profile.bucket_count)
        {
            candidates.extend(profile.hvn_bands(current_price, &self.config.volume_profile));
            warn_low_volume_spans(&candidates, &profile, &self.config.volume_profile);
        }

        candidates.extend(vwap_rejection_bands(series, &self.config.vwap));
        candidates.extend(gap_bands(series, mean_atr, &self.config.gap));

        if let Some(tf) = series.timeframe {
            for band in candidates.iter_mut() {
                band.timeframes.insert(tf);
            }
        }

        let mut filtered = filter_bands(
            candidates,
            mean_atr,
            current_price,
            now_ms,
            &self.config.filter,
        );

        // Thin data: fall back to prior-session levels so the caller always
        // has a structural reference.
        if filtered.len() < self.config.fallback.min_candidates {
            log::info!(
                "{} candidate(s) after filtering on {}, adding prior-session fallback bands",
                filtered.len(),
                series
                    .timeframe
                    .map(|tf| tf.to_string())
                    .unwrap_or_else(|| "untagged series".to_string())
            );
            let mut extra =
                fallback_bands(series, mean_atr, current_price, &self.config.fallback);
            if let Some(tf) = series.timeframe {
                for band in extra.iter_mut() {
                    band.timeframes.insert(tf);
                }
            }
            filtered.extend(extra);
        }

        enrich(&mut filtered, current_price, now_ms);
        (series.timeframe, filtered, mean_atr, Some(current_price))
    }
}

/// Fill the status and age metadata relative to the latest candle.
fn enrich(bands: &mut [Band], current_price: f64, now_ms: i64) {
    for band in bands.iter_mut() {
        band.status = Some(band.status_at(current_price));
        band.age_minutes = band
            .last_touched
            .map(|ts| ((now_ms - ts).max(0)) as f64 / 60_000.0);
    }
}

/// Width sanity: a band sitting mostly inside a low-volume gap is suspect.
/// Logged for diagnosis, not dropped; thin-volume instruments would lose
/// every band otherwise.
fn warn_low_volume_spans(
    candidates: &[Band],
    profile: &VolumeProfile,
    config: &crate::config::VolumeProfileConfig,
) {
    let lvn_runs = profile.low_volume_runs(config.lvn_percentile);
    for band in candidates {
        for run in &lvn_runs {
            let (run_low, _) = profile.range.bucket_bounds(run.start_bucket);
            let (_, run_high) = profile.range.bucket_bounds(run.end_bucket);
            if band.price_low >= run_low && band.price_high <= run_high {
                log::debug!(
                    "{} band [{:.4}, {:.4}] spans a low-volume gap [{:.4}, {:.4}]",
                    band.band_type,
                    band.price_low,
                    band.price_high,
                    run_low,
                    run_high
                );
            }
        }
    }
}
