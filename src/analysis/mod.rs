// Zone inference pipeline, leaves first: swings -> clusters -> volume/vwap/gap
// sources -> filter -> cross-timeframe merge -> scoring -> flip tagging.
pub mod anchored_vwap;
pub mod builder;
pub mod clustering;
pub mod fallback;
pub mod filtering;
pub mod flip;
pub mod gap_zones;
pub mod scoring;
pub mod swings;
pub mod tf_merge;
pub mod volume_profile;

// Re-export commonly used types
pub use builder::{ZoneBuilder, ZoneReport};
pub use scoring::{NoPatternMemory, PatternMemory};
pub use volume_profile::VolumeProfile;
