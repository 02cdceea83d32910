// Data models for zone analysis
// These modules contain pure business logic independent of I/O concerns

pub mod swing;
pub mod timeseries;

// Re-export key types for convenience
pub use swing::{SwingKind, SwingPoint};
pub use timeseries::CandleSeries;
