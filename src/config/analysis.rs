//! Analysis and computation configuration.
//!
//! `ZONES` holds the defaults; callers clone it, tweak what they need, and
//! pass the record into the pipeline. Nothing in the crate reads settable
//! global state - the config travels explicitly through every entry point.

use anyhow::{Result, bail};

/// Swing extraction (centered rolling window over highs/lows).
#[derive(Debug, Clone)]
pub struct SwingConfig {
    /// Window radius `w`; a swing needs to be extremal across [i-w, i+w].
    pub window: usize,
    /// If set, discard swings whose volume sits below this percentile of the
    /// surrounding window's volume (0-100). None disables the filter.
    pub volume_filter_pct: Option<f64>,
    /// Compare candle wicks (high/low) rather than closes.
    pub use_wicks: bool,
}

/// How swing points are grouped into price bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMode {
    /// Density clustering: a point joins a cluster when within tolerance of
    /// any existing member (single-link over sorted prices).
    Density,
    /// Equal-frequency quantile binning. First-class alternative, not a
    /// degraded fallback.
    Quantile,
}

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub mode: ClusterMode,
    /// Tolerance = multiplier x mean ATR. The single tunable knob.
    pub tolerance_multiplier: f64,
    /// Clusters smaller than this are discarded (not enough evidence).
    pub min_points: usize,
    /// Band cushion as a fraction of the clustering tolerance.
    pub cushion_fraction: f64,
    /// Bin count for quantile mode.
    pub quantile_bins: usize,
}

#[derive(Debug, Clone)]
pub struct VolumeProfileConfig {
    /// Price buckets spanning the observed range.
    pub bucket_count: usize,
    /// Buckets at or above this percentile of bucket volume are HVNs (0-100).
    pub hvn_percentile: f64,
    /// Buckets at or below this percentile are LVNs (0-100).
    pub lvn_percentile: f64,
}

/// Anchor events for anchored VWAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    SessionOpen,
    PrevSessionHigh,
    PrevSessionLow,
    /// First bar of the current session whose range breaks the prior
    /// session's high or low.
    BreakoutBar,
}

#[derive(Debug, Clone)]
pub struct VwapConfig {
    /// Tolerance band around the VWAP line, as a fraction (0.005 = +/-0.5%).
    pub rejection_tolerance_pct: f64,
    pub anchors: Vec<AnchorKind>,
}

/// Opening-gap zone detection (supplementary source).
#[derive(Debug, Clone)]
pub struct GapConfig {
    pub enabled: bool,
    /// Minimum open-vs-prior-close distance, percent of prior close.
    pub min_gap_pct: f64,
    /// A gap filled within this many bars of the session open is skipped.
    pub fill_check_bars: usize,
}

#[derive(Debug, Clone)]
pub struct FallbackConfig {
    /// Cushion around prev-session OHLC levels, multiple of mean ATR.
    pub cushion_atr_mult: f64,
    /// Fallback kicks in when fewer candidates than this survive.
    pub min_candidates: usize,
}

#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Width bounds, multiples of mean ATR.
    pub min_width_atr_mult: f64,
    pub max_width_atr_mult: f64,
    /// Minimum gap between surviving bands, multiple of mean ATR.
    pub min_gap_atr_mult: f64,
    /// Absolute floor for the minimum gap, fraction of current price.
    pub min_gap_floor_pct: f64,
    /// Keep at most this many bands per timeframe.
    pub max_zones: usize,
    /// Drop bands older than this many minutes. None = no staleness cut.
    pub max_age_minutes: Option<f64>,
    /// When filtering rejects everything, rescue this many candidates
    /// nearest the current price instead of returning nothing.
    pub rescue_nearest: usize,
}

#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Cross-timeframe overlap tolerance, multiple of the averaged ATR.
    pub proximity_atr_mult: f64,
    /// Absolute floor for the tolerance, fraction of current price.
    pub proximity_floor_pct: f64,
}

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    // Term weights (need not sum to 1).
    pub w_recency: f64,
    pub w_touch: f64,
    pub w_volume: f64,
    pub w_timeframe: f64,
    pub w_pattern: f64,

    /// Half-life of the recency decay, minutes.
    pub recency_half_life_min: f64,
    /// Touch term saturation constant: 1 - exp(-touches / saturation).
    pub touch_saturation: f64,
    /// Volume term when volume_cluster is false.
    pub volume_base: f64,
    /// Pattern term saturation constant.
    pub pattern_saturation: f64,
    /// Raw-score multiplier for fallback-subtype bands (< 1 penalizes).
    pub fallback_penalty: f64,

    // Confidence thresholds on the normalized 0-10 scale.
    pub t_high: f64,
    pub t_medium: f64,
}

#[derive(Debug, Clone)]
pub struct FlipConfig {
    /// A close must exceed the far edge by this fraction of price to count
    /// as a breach.
    pub breach_tolerance_pct: f64,
    /// Bars after re-entry in which price must react for a retest to
    /// confirm. None = per-timeframe default.
    pub retest_lookahead: Option<usize>,
}

/// The master pipeline configuration.
#[derive(Debug, Clone)]
pub struct ZoneConfig {
    /// ATR period shared by every volatility-scaled knob.
    pub atr_period: usize,
    /// Mean-ATR fallback for thin data, fraction of current price.
    pub atr_fallback_pct: f64,
    /// Trim the final merged list to the strongest N. None keeps all.
    pub top_n: Option<usize>,

    // Sub-groups
    pub swing: SwingConfig,
    pub cluster: ClusterConfig,
    pub volume_profile: VolumeProfileConfig,
    pub vwap: VwapConfig,
    pub gap: GapConfig,
    pub fallback: FallbackConfig,
    pub filter: FilterConfig,
    pub merge: MergeConfig,
    pub scoring: ScoringConfig,
    pub flip: FlipConfig,
}

pub const ZONES: ZoneConfig = ZoneConfig {
    atr_period: 14,
    atr_fallback_pct: 0.005,
    top_n: None,

    swing: SwingConfig {
        window: 3,
        volume_filter_pct: None,
        use_wicks: true,
    },

    cluster: ClusterConfig {
        mode: ClusterMode::Density,
        tolerance_multiplier: 1.0,
        min_points: 2,
        cushion_fraction: 0.25,
        quantile_bins: 4,
    },

    volume_profile: VolumeProfileConfig {
        bucket_count: 24,
        hvn_percentile: 80.0,
        lvn_percentile: 20.0,
    },

    vwap: VwapConfig {
        rejection_tolerance_pct: 0.005,
        anchors: Vec::new(), // empty means "all standard anchors" (see anchored_vwap.rs)
    },

    gap: GapConfig {
        enabled: true,
        min_gap_pct: 0.3,
        fill_check_bars: 5,
    },

    fallback: FallbackConfig {
        cushion_atr_mult: 0.25,
        min_candidates: 1,
    },

    filter: FilterConfig {
        min_width_atr_mult: 0.1,
        max_width_atr_mult: 1.5,
        min_gap_atr_mult: 1.0,
        min_gap_floor_pct: 0.0005,
        max_zones: 8,
        max_age_minutes: None,
        rescue_nearest: 3,
    },

    merge: MergeConfig {
        proximity_atr_mult: 0.75,
        proximity_floor_pct: 0.0015,
    },

    scoring: ScoringConfig {
        w_recency: 2.0,
        w_touch: 1.5,
        w_volume: 1.0,
        w_timeframe: 1.5,
        w_pattern: 1.0,
        recency_half_life_min: 180.0,
        touch_saturation: 4.0,
        volume_base: 0.25,
        pattern_saturation: 3.0,
        fallback_penalty: 0.75,
        t_high: 7.0,
        t_medium: 4.0,
    },

    flip: FlipConfig {
        breach_tolerance_pct: 0.001,
        retest_lookahead: None,
    },
};

impl Default for ZoneConfig {
    fn default() -> Self {
        ZONES.clone()
    }
}

impl ZoneConfig {
    /// Reject caller bugs at construction time. Data conditions (thin input,
    /// bad anchors) are never validated here - those degrade gracefully at
    /// run time instead.
    pub fn validate(&self) -> Result<()> {
        if self.atr_period == 0 {
            bail!("atr_period must be >= 1");
        }
        if self.swing.window == 0 {
            bail!("swing.window must be >= 1");
        }
        if let Some(pct) = self.swing.volume_filter_pct {
            if !(0.0..=100.0).contains(&pct) {
                bail!("swing.volume_filter_pct must be within 0-100, got {pct}");
            }
        }
        if self.cluster.min_points == 0 {
            bail!("cluster.min_points must be >= 1");
        }
        if self.cluster.tolerance_multiplier <= 0.0 {
            bail!(
                "cluster.tolerance_multiplier must be positive, got {}",
                self.cluster.tolerance_multiplier
            );
        }
        if self.cluster.quantile_bins == 0 {
            bail!("cluster.quantile_bins must be >= 1");
        }
        if self.volume_profile.bucket_count < 2 {
            bail!(
                "volume_profile.bucket_count must be >= 2, got {}",
                self.volume_profile.bucket_count
            );
        }
        if self.volume_profile.lvn_percentile >= self.volume_profile.hvn_percentile {
            bail!(
                "volume_profile: lvn_percentile ({}) must be below hvn_percentile ({})",
                self.volume_profile.lvn_percentile,
                self.volume_profile.hvn_percentile
            );
        }
        if self.vwap.rejection_tolerance_pct <= 0.0 {
            bail!("vwap.rejection_tolerance_pct must be positive");
        }
        if self.filter.max_width_atr_mult <= self.filter.min_width_atr_mult {
            bail!(
                "filter: max_width_atr_mult ({}) must exceed min_width_atr_mult ({})",
                self.filter.max_width_atr_mult,
                self.filter.min_width_atr_mult
            );
        }
        if self.filter.max_zones == 0 {
            bail!("filter.max_zones must be >= 1");
        }
        let weights = [
            self.scoring.w_recency,
            self.scoring.w_touch,
            self.scoring.w_volume,
            self.scoring.w_timeframe,
            self.scoring.w_pattern,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("scoring weights must be finite and non-negative");
        }
        if self.scoring.t_high <= self.scoring.t_medium {
            bail!(
                "scoring: t_high ({}) must exceed t_medium ({})",
                self.scoring.t_high,
                self.scoring.t_medium
            );
        }
        if self.scoring.recency_half_life_min <= 0.0 || self.scoring.touch_saturation <= 0.0 {
            bail!("scoring decay/saturation constants must be positive");
        }
        if self.flip.breach_tolerance_pct < 0.0 {
            bail!("flip.breach_tolerance_pct must be non-negative");
        }
        Ok(())
    }
}
