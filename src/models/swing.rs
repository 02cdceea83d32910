use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SwingKind {
    High,
    Low,
}

/// A local price extremum relative to a centered window. Produced by the
/// swing extractor; never mutated afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SwingPoint {
    pub timestamp_ms: i64,
    pub price: f64,
    pub kind: SwingKind,
    /// Window radius the extractor used when this swing qualified.
    pub window: usize,
    pub volume: Option<f64>,
}
