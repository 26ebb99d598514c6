//! Weighted fusion of gated indicator percentages into a risk score.

use eo_anomaly_models::{IndicatorKind, RiskLevel};

/// Upper bound of the fused score.
pub const MAX_RISK_SCORE: f64 = 100.0;

/// Scores above this are [`RiskLevel::High`].
pub const HIGH_THRESHOLD: f64 = 60.0;

/// Scores above this (and not high) are [`RiskLevel::Moderate`].
pub const MODERATE_THRESHOLD: f64 = 30.0;

/// Fusion weight of an indicator. Weights sum to 1.0; thermal is the
/// most specific signal and carries the most.
#[must_use]
pub const fn weight(kind: IndicatorKind) -> f64 {
    match kind {
        IndicatorKind::Vegetation | IndicatorKind::Soil => 0.25,
        IndicatorKind::Thermal => 0.30,
        IndicatorKind::Water => 0.20,
    }
}

/// Gated affected-area percentages of the four indicators.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GatedPercentages {
    /// Vegetation.
    pub ndvi: f64,
    /// Thermal.
    pub thermal: f64,
    /// Water.
    pub water: f64,
    /// Soil.
    pub soil: f64,
}

impl GatedPercentages {
    /// Sets one indicator's gated percentage.
    pub fn set(&mut self, kind: IndicatorKind, value: f64) {
        let slot = match kind {
            IndicatorKind::Vegetation => &mut self.ndvi,
            IndicatorKind::Thermal => &mut self.thermal,
            IndicatorKind::Water => &mut self.water,
            IndicatorKind::Soil => &mut self.soil,
        };
        *slot = value;
    }
}

/// `min(100, 0.25·ndvi + 0.30·thermal + 0.20·water + 0.25·soil)`, floored
/// at 0.
#[must_use]
pub fn fuse(gated: &GatedPercentages) -> f64 {
    let score = weight(IndicatorKind::Vegetation) * gated.ndvi
        + weight(IndicatorKind::Thermal) * gated.thermal
        + weight(IndicatorKind::Water) * gated.water
        + weight(IndicatorKind::Soil) * gated.soil;
    score.clamp(0.0, MAX_RISK_SCORE)
}

/// Tiers a score: `> 60` high, `> 30` moderate, otherwise low.
#[must_use]
pub fn classify(score: f64) -> RiskLevel {
    if score > HIGH_THRESHOLD {
        RiskLevel::High
    } else if score > MODERATE_THRESHOLD {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}
