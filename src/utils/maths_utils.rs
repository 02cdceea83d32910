use argminmax::ArgMinMax;
use statrs::statistics::{Data, OrderStatistics};
use std::cmp::{max, min};

/// A fixed price range split into equal-width buckets. Backbone of the
/// volume-profile histogram and anywhere else we need price -> bucket maths.
#[derive(serde::Deserialize, serde::Serialize, Default, Debug, Clone)]
pub struct PriceRange {
    pub start_range: f64,
    pub end_range: f64,
    pub n_buckets: usize,
}

impl PriceRange {
    pub fn new(start_range: f64, end_range: f64, n_buckets: usize) -> Self {
        debug_assert!(end_range > start_range);
        debug_assert!(n_buckets > 0);
        Self {
            start_range,
            end_range,
            n_buckets,
        }
    }

    #[inline]
    pub fn n_buckets(&self) -> usize {
        self.n_buckets
    }

    pub fn min_max(&self) -> (f64, f64) {
        (self.start_range, self.end_range)
    }

    pub fn range_length(&self) -> f64 {
        self.end_range - self.start_range
    }

    pub fn bucket_size(&self) -> f64 {
        self.range_length() / (self.n_buckets as f64)
    }

    pub fn bucket_index(&self, value: f64) -> usize {
        let index = (value - self.start_range) / self.bucket_size();
        let bucket_index = if index < 0.0 { 0 } else { index as usize };

        // Clamping handles floating-point inaccuracies at the boundary.
        bucket_index.min(self.n_buckets - 1)
    }

    pub fn bucket_bounds(&self, bucket_index: usize) -> (f64, f64) {
        debug_assert!(bucket_index < self.n_buckets);
        let lower_bound = self.start_range + bucket_index as f64 * self.bucket_size();
        let upper_bound = self.start_range + (bucket_index + 1) as f64 * self.bucket_size();
        (lower_bound, upper_bound)
    }

    /// How many buckets does [x_low, x_high] intersect?
    pub fn count_intersecting_buckets(&self, mut x_low: f64, mut x_high: f64) -> usize {
        // Swap the values over if necessary
        if x_high < x_low {
            (x_low, x_high) = (x_high, x_low);
        }
        let first = max(
            0,
            ((x_low - self.start_range) / self.bucket_size()).floor() as isize,
        );
        let last = min(
            (self.n_buckets - 1) as isize,
            ((x_high - self.start_range) / self.bucket_size()).floor() as isize,
        );

        if last < first {
            return 0;
        }
        // Inclusive of both ends.
        (last - first + 1) as usize
    }
}

pub fn get_max(vec: &[f64]) -> f64 {
    let max_index: usize = vec.argmax();
    vec[max_index]
}

pub fn get_min(vec: &[f64]) -> f64 {
    let min_index: usize = vec.argmin();
    vec[min_index]
}

pub fn get_min_max(vec: &[f64]) -> (f64, f64) {
    (get_min(vec), get_max(vec))
}

/// Empirical percentile of a sample, `pct` in [0, 100].
/// Returns None for an empty sample.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut data = Data::new(values.to_vec());
    Some(data.percentile(pct.clamp(0.0, 100.0) as usize))
}

/// Rescale `value` from [observed_min, observed_max] onto [0, out_max].
/// A degenerate observed range maps everything to the midpoint.
pub fn rescale_clamped(value: f64, observed_min: f64, observed_max: f64, out_max: f64) -> f64 {
    let span = observed_max - observed_min;
    if span <= f64::EPSILON {
        return out_max / 2.0;
    }
    (((value - observed_min) / span) * out_max).clamp(0.0, out_max)
}

/// Simple arithmetic mean. Empty input yields 0.0 (callers guard on length
/// where the distinction matters).
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
