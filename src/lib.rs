#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod analysis;
pub mod config;
pub mod domain;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use analysis::{NoPatternMemory, PatternMemory, ZoneBuilder, ZoneReport};
pub use config::{ZONES, ZoneConfig};
pub use domain::{Band, BandType, Candle, Confidence, Timeframe};
pub use models::timeseries::CandleSeries;

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Candle input as TIMEFRAME=PATH (e.g. 5m=btc_5m.json). Repeatable.
    #[arg(short, long = "input", value_name = "TF=PATH")]
    pub inputs: Vec<String>,

    /// Dedicated candle file for the volume profile (e.g. futures volume)
    #[arg(long, value_name = "PATH")]
    pub volume: Option<String>,

    /// Keep only the strongest N merged zones
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Pretty-print the JSON report
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}
