use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::timeframe::Timeframe;

/// Which side of price the band is expected to defend.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BandType {
    Support,
    Resistance,
}

impl BandType {
    pub fn swapped(&self) -> Self {
        match self {
            BandType::Support => BandType::Resistance,
            BandType::Resistance => BandType::Support,
        }
    }
}

impl fmt::Display for BandType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BandType::Support => write!(f, "support"),
            BandType::Resistance => write!(f, "resistance"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BandSubtype {
    Primary,
    Retest,
    Fallback,
}

/// The technique that produced (or later confirmed) a band.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
)]
pub enum SourceTag {
    Swing,
    Volume,
    Vwap,
    Gap,
    Fallback,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceTag::Swing => write!(f, "swing"),
            SourceTag::Volume => write!(f, "volume"),
            SourceTag::Vwap => write!(f, "vwap"),
            SourceTag::Gap => write!(f, "gap"),
            SourceTag::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Where the latest close sits relative to the band. Enrichment metadata,
/// not part of scoring's five weighted terms.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BandStatus {
    Inside,
    Testing,
    Rejected,
    Untouched,
}

/// The central entity: a price range flagged as historically significant.
///
/// Lifecycle: a producer (clusterer / volume profile / VWAP / gap / fallback)
/// creates it unscored; the merger may widen its tag sets; the scorer fills
/// in score / normalized_score / confidence; the flip tagger may swap its
/// type. After the builder returns, a Band is an immutable snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Band {
    pub price_low: f64,
    pub price_high: f64,
    pub band_type: BandType,
    pub subtype: BandSubtype,
    pub sources: BTreeSet<SourceTag>,
    pub timeframes: BTreeSet<Timeframe>,
    pub touch_count: u32,
    /// Epoch ms of the most recent touch; None if never touched post-creation.
    pub last_touched: Option<i64>,
    pub volume_cluster: bool,
    pub vwap_zone: bool,
    pub flipped: bool,

    /// Total traded volume of the contributing HVN bucket(s), when known.
    pub total_volume: Option<f64>,

    // Set by the scorer, None until then.
    pub score: Option<f64>,
    pub normalized_score: Option<f64>,
    pub confidence: Option<Confidence>,

    // Enrichment relative to the latest candle (filled before filtering).
    pub status: Option<BandStatus>,
    pub age_minutes: Option<f64>,
}

impl Band {
    /// Construct a band, rejecting malformed input up front. Every producer
    /// goes through here so a band is well-formed from birth.
    pub fn new(
        price_low: f64,
        price_high: f64,
        band_type: BandType,
        subtype: BandSubtype,
        source: SourceTag,
    ) -> Result<Self> {
        if !(price_low < price_high) {
            bail!(
                "Band requires price_low < price_high, got [{}, {}]",
                price_low,
                price_high
            );
        }
        if !price_low.is_finite() || !price_high.is_finite() {
            bail!("Band bounds must be finite, got [{}, {}]", price_low, price_high);
        }

        let mut sources = BTreeSet::new();
        sources.insert(source);

        Ok(Band {
            price_low,
            price_high,
            band_type,
            subtype,
            sources,
            timeframes: BTreeSet::new(),
            touch_count: 0,
            last_touched: None,
            volume_cluster: false,
            vwap_zone: false,
            flipped: false,
            total_volume: None,
            score: None,
            normalized_score: None,
            confidence: None,
            status: None,
            age_minutes: None,
        })
    }

    pub fn span(&self) -> f64 {
        self.price_high - self.price_low
    }

    pub fn mid_price(&self) -> f64 {
        (self.price_low + self.price_high) / 2.0
    }

    pub fn contains(&self, price: f64) -> bool {
        self.price_low <= price && price <= self.price_high
    }

    /// Do two bands overlap once each is padded by `tolerance`?
    pub fn overlaps(&self, other: &Band, tolerance: f64) -> bool {
        !(self.price_high < other.price_low - tolerance
            || self.price_low > other.price_high + tolerance)
    }

    /// Classify price-band relationship for the enrichment pass.
    pub fn status_at(&self, price: f64) -> BandStatus {
        if self.contains(price) {
            return BandStatus::Inside;
        }
        let margin = 0.1 * self.span();
        if (price - self.price_low).abs() <= margin || (price - self.price_high).abs() <= margin {
            return BandStatus::Testing;
        }
        // Beyond testing distance on the "wrong" side means price went through.
        let beyond = match self.band_type {
            BandType::Support => price < self.price_low,
            BandType::Resistance => price > self.price_high,
        };
        if beyond {
            BandStatus::Rejected
        } else {
            BandStatus::Untouched
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(low: f64, high: f64, band_type: BandType) -> Band {
        Band::new(low, high, band_type, BandSubtype::Primary, SourceTag::Swing).unwrap()
    }

    #[test]
    fn rejects_inverted_or_degenerate_range() {
        assert!(Band::new(10.0, 9.0, BandType::Support, BandSubtype::Primary, SourceTag::Swing).is_err());
        assert!(Band::new(10.0, 10.0, BandType::Support, BandSubtype::Primary, SourceTag::Swing).is_err());
        assert!(Band::new(f64::NAN, 10.0, BandType::Support, BandSubtype::Primary, SourceTag::Swing).is_err());
    }

    #[test]
    fn new_band_always_has_a_source() {
        let b = band(100.0, 102.0, BandType::Support);
        assert!(!b.sources.is_empty());
        assert!(b.sources.contains(&SourceTag::Swing));
        assert!(b.score.is_none());
    }

    #[test]
    fn overlap_respects_tolerance() {
        let a = band(100.0, 102.0, BandType::Support);
        let b = band(103.0, 105.0, BandType::Support);
        assert!(!a.overlaps(&b, 0.5));
        assert!(a.overlaps(&b, 1.5));
    }

    #[test]
    fn status_classification() {
        let support = band(100.0, 102.0, BandType::Support);
        assert_eq!(support.status_at(101.0), BandStatus::Inside);
        assert_eq!(support.status_at(102.1), BandStatus::Testing);
        assert_eq!(support.status_at(99.0), BandStatus::Rejected);
        assert_eq!(support.status_at(110.0), BandStatus::Untouched);
    }
}
