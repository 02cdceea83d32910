// Domain types and value objects
pub mod band;
pub mod candle;
pub mod timeframe;

// Re-export commonly used types
pub use band::{Band, BandStatus, BandSubtype, BandType, Confidence, SourceTag};
pub use candle::Candle;
pub use timeframe::Timeframe;
