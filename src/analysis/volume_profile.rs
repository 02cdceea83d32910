//! Price-volume histogram: Point of Control plus high/low volume nodes.

use crate::config::VolumeProfileConfig;
use crate::domain::band::{Band, BandSubtype, BandType, SourceTag};
use crate::models::timeseries::CandleSeries;
use crate::utils::maths_utils::{PriceRange, get_min_max, percentile};

/// Histogram of traded volume by price bucket over the observed range.
#[derive(Debug, Clone)]
pub struct VolumeProfile {
    pub range: PriceRange,
    pub bucket_volumes: Vec<f64>,
}

/// A run of adjacent qualifying buckets, merged so we emit one wide node
/// instead of many one-bucket slivers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRun {
    pub start_bucket: usize,
    pub end_bucket: usize, // inclusive
    pub total_volume: f64,
}

impl VolumeProfile {
    /// Accumulate each candle's volume across the buckets its low..high range
    /// intersects, splitting the volume evenly between them (density logic -
    /// a wide candle should not dominate every bucket it grazes).
    pub fn build(series: &CandleSeries, bucket_count: usize) -> Option<Self> {
        if series.is_empty() || bucket_count < 2 {
            return None;
        }

        let (min_price, _) = get_min_max(&series.low_prices);
        let (_, max_price) = get_min_max(&series.high_prices);
        if !(max_price > min_price) {
            // All candles at one price: no structure to read.
            return None;
        }

        let range = PriceRange::new(min_price, max_price, bucket_count);
        let mut bucket_volumes = vec![0.0; bucket_count];

        for idx in 0..series.len() {
            let candle = series.get_candle(idx);
            if candle.volume <= 0.0 {
                continue;
            }

            let buckets = range.count_intersecting_buckets(candle.low, candle.high);
            if buckets == 0 {
                continue;
            }
            let per_bucket = candle.volume / buckets as f64;
            let start = range.bucket_index(candle.low);
            for volume in bucket_volumes.iter_mut().skip(start).take(buckets) {
                *volume += per_bucket;
            }
        }

        Some(VolumeProfile {
            range,
            bucket_volumes,
        })
    }

    pub fn total_volume(&self) -> f64 {
        self.bucket_volumes.iter().sum()
    }

    fn non_empty_buckets(&self) -> usize {
        self.bucket_volumes.iter().filter(|&&v| v > 0.0).count()
    }

    /// Bucket with the highest traded volume. Earliest bucket wins a tie.
    pub fn poc(&self) -> Option<usize> {
        if self.total_volume() <= 0.0 {
            return None;
        }
        self.bucket_volumes
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| {
                a.partial_cmp(b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(ib.cmp(ia)) // earlier index preferred on ties
            })
            .map(|(i, _)| i)
    }

    /// Runs of adjacent buckets at or above the given percentile of
    /// non-empty bucket volume.
    pub fn high_volume_runs(&self, hvn_percentile: f64) -> Vec<NodeRun> {
        let threshold = match self.node_threshold(hvn_percentile) {
            Some(t) => t,
            None => return Vec::new(),
        };
        self.runs_where(|v| v >= threshold && v > 0.0)
    }

    /// Runs of adjacent buckets at or below the given percentile. Kept for
    /// zone-width sanity checks; LVNs never become bands on their own.
    pub fn low_volume_runs(&self, lvn_percentile: f64) -> Vec<NodeRun> {
        let threshold = match self.node_threshold(lvn_percentile) {
            Some(t) => t,
            None => return Vec::new(),
        };
        self.runs_where(|v| v <= threshold)
    }

    fn node_threshold(&self, pct: f64) -> Option<f64> {
        let non_empty: Vec<f64> = self
            .bucket_volumes
            .iter()
            .copied()
            .filter(|&v| v > 0.0)
            .collect();
        percentile(&non_empty, pct)
    }

    fn runs_where(&self, qualifies: impl Fn(f64) -> bool) -> Vec<NodeRun> {
        let mut runs: Vec<NodeRun> = Vec::new();
        let mut current: Option<NodeRun> = None;

        for (idx, &volume) in self.bucket_volumes.iter().enumerate() {
            if qualifies(volume) {
                match current.as_mut() {
                    Some(run) => {
                        run.end_bucket = idx;
                        run.total_volume += volume;
                    }
                    None => {
                        current = Some(NodeRun {
                            start_bucket: idx,
                            end_bucket: idx,
                            total_volume: volume,
                        });
                    }
                }
            } else if let Some(run) = current.take() {
                runs.push(run);
            }
        }
        if let Some(run) = current {
            runs.push(run);
        }

        runs
    }

    /// Candidate bands from high volume nodes. Empty when the histogram has
    /// no volume or only one populated bucket (insufficient structure).
    pub fn hvn_bands(&self, current_price: f64, config: &VolumeProfileConfig) -> Vec<Band> {
        if self.total_volume() <= 0.0 || self.non_empty_buckets() < 2 {
            log::debug!("volume profile too thin for HVN bands");
            return Vec::new();
        }

        let mut bands = Vec::new();
        for run in self.high_volume_runs(config.hvn_percentile) {
            // A "node" covering the whole histogram is no node at all (flat
            // profile); there is nothing local about it.
            if run.start_bucket == 0 && run.end_bucket == self.range.n_buckets() - 1 {
                log::debug!("flat volume profile, no usable HVN structure");
                continue;
            }
            let (low, _) = self.range.bucket_bounds(run.start_bucket);
            let (_, high) = self.range.bucket_bounds(run.end_bucket);
            let mid = (low + high) / 2.0;
            let band_type = if mid <= current_price {
                BandType::Support
            } else {
                BandType::Resistance
            };

            match Band::new(low, high, band_type, BandSubtype::Primary, SourceTag::Volume) {
                Ok(mut band) => {
                    band.volume_cluster = true;
                    band.total_volume = Some(run.total_volume);
                    bands.push(band);
                }
                Err(e) => log::warn!("skipping malformed HVN band: {e}"),
            }
        }

        bands
    }
}
