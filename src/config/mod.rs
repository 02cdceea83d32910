//! Configuration module for the zone-scout pipeline.

pub mod analysis;

mod debug; // Private; use crate::config::DEBUG_FLAGS, not crate::config::debug::DEBUG_FLAGS
pub use debug::DEBUG_FLAGS;

// Re-export commonly used items
pub use analysis::{
    AnchorKind, ClusterConfig, ClusterMode, FallbackConfig, FilterConfig, FlipConfig, GapConfig,
    MergeConfig, ScoringConfig, SwingConfig, VolumeProfileConfig, VwapConfig, ZoneConfig, ZONES,
};
