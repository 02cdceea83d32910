//! Grouping swing points into candidate price bands.
//!
//! Two first-class strategies, selected by config (never discovered through
//! failure): density clustering (single-link over price, tolerance scaled by
//! volatility) and equal-frequency quantile binning.

use crate::config::{ClusterConfig, ClusterMode};
use crate::domain::band::{Band, BandSubtype, BandType, SourceTag};
use crate::models::swing::{SwingKind, SwingPoint};

#[allow(unused_imports)]
use crate::config::DEBUG_FLAGS;

/// Cluster one kind of swing point into candidate bands.
///
/// `mean_atr` sizes the clustering tolerance (`tolerance_multiplier x ATR`).
/// Deterministic: points are sorted by (price, timestamp) before assignment,
/// so identical input always yields identical clusters.
pub fn cluster_swings(
    points: &[SwingPoint],
    mean_atr: f64,
    config: &ClusterConfig,
) -> Vec<Band> {
    if points.is_empty() {
        return Vec::new();
    }
    debug_assert!(
        points.iter().all(|p| p.kind == points[0].kind),
        "cluster_swings expects a single swing kind"
    );

    let tolerance = (config.tolerance_multiplier * mean_atr).max(f64::EPSILON);

    let mut sorted: Vec<&SwingPoint> = points.iter().collect();
    sorted.sort_by(|a, b| {
        a.price
            .partial_cmp(&b.price)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.timestamp_ms.cmp(&b.timestamp_ms))
    });

    let clusters = match config.mode {
        ClusterMode::Density => density_clusters(&sorted, tolerance),
        ClusterMode::Quantile => quantile_clusters(&sorted, config.quantile_bins),
    };

    let band_type = match points[0].kind {
        SwingKind::High => BandType::Resistance,
        SwingKind::Low => BandType::Support,
    };

    let mut bands = Vec::new();
    for cluster in clusters {
        if cluster.len() < config.min_points {
            log::debug!(
                "cluster of {} point(s) below min_points {}, discarded",
                cluster.len(),
                config.min_points
            );
            continue;
        }

        let min_price = cluster.first().map(|p| p.price).unwrap_or_default();
        let max_price = cluster.last().map(|p| p.price).unwrap_or_default();

        // Cushion keeps single-price clusters from degenerating into
        // zero-width bands and gives real clusters a little breathing room.
        // Floored to a price-scaled epsilon so the band is always valid.
        let cushion = (config.cushion_fraction * tolerance).max(max_price.abs() * 1e-6);

        let price_low = min_price - cushion;
        let price_high = max_price + cushion;
        let last_touched = cluster.iter().map(|p| p.timestamp_ms).max();

        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_cluster_membership {
            log::debug!(
                "cluster {band_type} [{price_low:.2}, {price_high:.2}] from {} point(s)",
                cluster.len()
            );
        }

        match Band::new(
            price_low,
            price_high,
            band_type,
            BandSubtype::Primary,
            SourceTag::Swing,
        ) {
            Ok(mut band) => {
                band.touch_count = cluster.len() as u32;
                band.last_touched = last_touched;
                bands.push(band);
            }
            Err(e) => log::warn!("skipping malformed cluster band: {e}"),
        }
    }

    bands
}

/// Single-link density pass over price-sorted points: a point joins the
/// current cluster when within `tolerance` of the previous member.
fn density_clusters<'a>(sorted: &[&'a SwingPoint], tolerance: f64) -> Vec<Vec<&'a SwingPoint>> {
    let mut clusters: Vec<Vec<&SwingPoint>> = Vec::new();

    for point in sorted {
        match clusters.last_mut() {
            Some(cluster)
                if point.price - cluster.last().map(|p| p.price).unwrap_or(f64::MIN)
                    <= tolerance =>
            {
                cluster.push(point);
            }
            _ => clusters.push(vec![point]),
        }
    }

    clusters
}

/// Equal-frequency binning: sorted points split into `bins` groups of (near)
/// equal size, each bin one cluster.
fn quantile_clusters<'a>(sorted: &[&'a SwingPoint], bins: usize) -> Vec<Vec<&'a SwingPoint>> {
    let bins = bins.max(1).min(sorted.len());
    let per_bin = sorted.len().div_ceil(bins);

    sorted
        .chunks(per_bin)
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(price: f64, ts: i64) -> SwingPoint {
        SwingPoint {
            timestamp_ms: ts,
            price,
            kind: SwingKind::Low,
            window: 3,
            volume: None,
        }
    }

    fn config() -> ClusterConfig {
        ClusterConfig {
            mode: ClusterMode::Density,
            tolerance_multiplier: 1.0,
            min_points: 2,
            cushion_fraction: 0.25,
            quantile_bins: 4,
        }
    }

    #[test]
    fn groups_nearby_points_into_one_band() {
        let points = vec![
            point(100.0, 1000),
            point(100.5, 2000),
            point(101.0, 3000),
            // Far away, alone - discarded by min_points.
            point(150.0, 4000),
        ];
        let bands = cluster_swings(&points, 2.0, &config());

        assert_eq!(bands.len(), 1);
        let band = &bands[0];
        assert_eq!(band.band_type, BandType::Support);
        assert_eq!(band.touch_count, 3);
        assert_eq!(band.last_touched, Some(3000));
        assert!(band.price_low < 100.0 && band.price_high > 101.0);
        assert!(band.sources.contains(&SourceTag::Swing));
    }

    #[test]
    fn clustering_is_idempotent() {
        let points = vec![
            point(100.0, 1000),
            point(100.8, 2000),
            point(105.0, 3000),
            point(105.3, 4000),
        ];
        let first = cluster_swings(&points, 1.0, &config());
        let second = cluster_swings(&points, 1.0, &config());

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.price_low, b.price_low);
            assert_eq!(a.price_high, b.price_high);
            assert_eq!(a.touch_count, b.touch_count);
        }
    }

    #[test]
    fn input_order_does_not_change_clusters() {
        let forward = vec![point(100.0, 1000), point(100.5, 2000), point(101.0, 3000)];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = cluster_swings(&forward, 2.0, &config());
        let b = cluster_swings(&reversed, 2.0, &config());
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].price_low, b[0].price_low);
        assert_eq!(a[0].price_high, b[0].price_high);
    }

    #[test]
    fn quantile_mode_splits_by_frequency() {
        let points: Vec<SwingPoint> = (0..8).map(|i| point(100.0 + i as f64, i)).collect();
        let mut cfg = config();
        cfg.mode = ClusterMode::Quantile;
        cfg.quantile_bins = 4;

        let bands = cluster_swings(&points, 1.0, &cfg);
        assert_eq!(bands.len(), 4);
        assert!(bands.iter().all(|b| b.touch_count == 2));
    }

    #[test]
    fn identical_prices_still_produce_a_valid_band() {
        let points = vec![point(100.0, 1000), point(100.0, 2000)];
        let bands = cluster_swings(&points, 0.0, &config());
        assert_eq!(bands.len(), 1);
        assert!(bands[0].price_low < bands[0].price_high);
    }
}
