//! The four fixed indicator definitions.
//!
//! | Indicator | Formula | Catalog | Decision | Anomalous when | Noise gate |
//! |---|---|---|---|---|---|
//! | `ndvi` | `(B8 - B4) / (B8 + B4)` | Sentinel-2 | z-score | `< -1.2` | 5% |
//! | `thermal` | `ST_B10 * 0.00341802 + 149.0` | Landsat 9 | z-score | `> 1.5` | 5% |
//! | `water` | `(B11 - B12) / (B11 + B12)` | Sentinel-2 | direct | `> 0.03` | 3% |
//! | `soil` | `((B4 + B11) - (B8 + B2)) / ((B4 + B11) + (B8 + B2))` | Sentinel-2 | direct | `> 0.10` | 4% |

use eo_anomaly_models::{Collection, Comparator, DecisionMode, IndicatorKind, Satellite};

/// Added to the baseline standard deviation before dividing.
pub const Z_SCORE_EPSILON: f64 = 1e-6;

/// Which sensor family an indicator reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagerySource {
    /// The optical catalog of the requested satellite.
    Optical,
    /// Landsat 9 surface temperature, independent of the requested
    /// satellite.
    Thermal,
}

/// Static description of one anomaly indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorDefinition {
    /// Which indicator.
    pub kind: IndicatorKind,
    /// Band formula evaluated by the EOS per image.
    pub formula: &'static str,
    /// Sensor family.
    pub source: ImagerySource,
    /// How the decision value is derived.
    pub mode: DecisionMode,
    /// Per-pixel comparison.
    pub comparator: Comparator,
    /// Literal anomaly threshold.
    pub threshold: f64,
    /// Affected-area percentage at or below which the indicator is
    /// zeroed.
    pub gate_min_pct: f64,
}

impl IndicatorDefinition {
    /// The catalog this indicator reads for the given satellite.
    #[must_use]
    pub const fn collection(&self, satellite: Satellite) -> Collection {
        match self.source {
            ImagerySource::Optical => satellite.optical_collection(),
            ImagerySource::Thermal => Collection::Landsat9L2,
        }
    }

    /// Whether the decision value is standardized against a baseline.
    #[must_use]
    pub fn needs_baseline(&self) -> bool {
        self.mode == DecisionMode::ZScore
    }
}

/// All indicators, in fusion order.
pub static INDICATORS: [IndicatorDefinition; 4] = [
    IndicatorDefinition {
        kind: IndicatorKind::Vegetation,
        formula: "(B8 - B4) / (B8 + B4)",
        source: ImagerySource::Optical,
        mode: DecisionMode::ZScore,
        comparator: Comparator::LessThan,
        threshold: -1.2,
        gate_min_pct: 5.0,
    },
    IndicatorDefinition {
        kind: IndicatorKind::Thermal,
        formula: "ST_B10 * 0.00341802 + 149.0",
        source: ImagerySource::Thermal,
        mode: DecisionMode::ZScore,
        comparator: Comparator::GreaterThan,
        threshold: 1.5,
        gate_min_pct: 5.0,
    },
    IndicatorDefinition {
        kind: IndicatorKind::Water,
        formula: "(B11 - B12) / (B11 + B12)",
        source: ImagerySource::Optical,
        mode: DecisionMode::Direct,
        comparator: Comparator::GreaterThan,
        threshold: 0.03,
        gate_min_pct: 3.0,
    },
    IndicatorDefinition {
        kind: IndicatorKind::Soil,
        formula: "((B4 + B11) - (B8 + B2)) / ((B4 + B11) + (B8 + B2))",
        source: ImagerySource::Optical,
        mode: DecisionMode::Direct,
        comparator: Comparator::GreaterThan,
        threshold: 0.10,
        gate_min_pct: 4.0,
    },
];

/// Looks up the definition of one indicator.
#[must_use]
pub fn definition(kind: IndicatorKind) -> &'static IndicatorDefinition {
    match kind {
        IndicatorKind::Vegetation => &INDICATORS[0],
        IndicatorKind::Thermal => &INDICATORS[1],
        IndicatorKind::Water => &INDICATORS[2],
        IndicatorKind::Soil => &INDICATORS[3],
    }
}
