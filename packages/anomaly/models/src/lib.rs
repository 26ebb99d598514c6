#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for environmental anomaly analysis.
//!
//! Defines the area of interest, date windows, the four anomaly
//! indicators, imagery catalogs and the risk assessment produced by the
//! fusion pipeline. These types carry no behaviour beyond validation so
//! that the EOS client, the analysis pipeline and the API layer can all
//! depend on them.

pub mod aoi;
pub mod window;

pub use aoi::{AreaOfInterest, GeometryError};
pub use window::{TimeWindow, TimeWindowError};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// The four anomaly indicators fused into a risk score.
///
/// The serialized names (`ndvi`, `thermal`, `water`, `soil`) are the keys
/// of the `anomaly_vectors` object in API responses.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IndicatorKind {
    /// Vegetation stress from an NDVI z-score.
    #[serde(rename = "ndvi")]
    #[strum(to_string = "ndvi")]
    Vegetation,
    /// Surface temperature hotspots from a thermal z-score.
    Thermal,
    /// Water turbidity from NDTI.
    Water,
    /// Bare soil disturbance from BSI.
    Soil,
}

impl IndicatorKind {
    /// Returns all indicators in fusion order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Vegetation, Self::Thermal, Self::Water, Self::Soil]
    }
}

/// Comparison applied per pixel between an indicator's decision value and
/// its anomaly threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Anomalous when `value < threshold`.
    LessThan,
    /// Anomalous when `value > threshold`.
    GreaterThan,
}

impl Comparator {
    /// Evaluates the comparison on a scalar.
    #[must_use]
    pub fn is_anomalous(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::LessThan => value < threshold,
            Self::GreaterThan => value > threshold,
        }
    }

    /// Operator symbol, for logs and tables.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::GreaterThan => ">",
        }
    }
}

/// How an indicator's decision value is derived from its band formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    /// Target mean standardized against the baseline mean and stdDev.
    ZScore,
    /// Target mean compared directly against the threshold.
    Direct,
}

/// Imagery catalogs the EOS is asked to filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Sentinel-2 surface reflectance, QA60 cloud and cirrus masked,
    /// scenes under 40% cloudy pixels.
    Sentinel2Sr,
    /// Landsat 9 Collection 2 Level 2, `QA_PIXEL` cloud masked.
    Landsat9L2,
}

impl Collection {
    /// EOS catalog identifier.
    #[must_use]
    pub const fn catalog_id(self) -> &'static str {
        match self {
            Self::Sentinel2Sr => "COPERNICUS/S2_SR",
            Self::Landsat9L2 => "LANDSAT/LC09/C02/T1_L2",
        }
    }

    /// Native pixel size in metres, used as the reduction scale.
    #[must_use]
    pub const fn native_scale_m(self) -> u32 {
        match self {
            Self::Sentinel2Sr => 10,
            Self::Landsat9L2 => 30,
        }
    }
}

/// Satellite family requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Satellite {
    /// Sentinel-2 optical imagery (thermal still comes from Landsat 9).
    #[default]
    Sentinel2,
}

/// Error returned for a satellite name that has no catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported satellite '{0}': only sentinel_2 is supported")]
pub struct UnsupportedSatelliteError(pub String);

impl Satellite {
    /// Resolves a satellite name. Missing or blank names default to
    /// Sentinel-2; any name starting with `sentinel` (case-insensitive)
    /// selects Sentinel-2.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedSatelliteError`] for any other name.
    pub fn parse(name: Option<&str>) -> Result<Self, UnsupportedSatelliteError> {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Ok(Self::Sentinel2);
        };
        if name.to_ascii_lowercase().starts_with("sentinel") {
            Ok(Self::Sentinel2)
        } else {
            Err(UnsupportedSatelliteError(name.to_string()))
        }
    }

    /// The optical catalog used for vegetation, water and soil.
    #[must_use]
    pub const fn optical_collection(self) -> Collection {
        match self {
            Self::Sentinel2 => Collection::Sentinel2Sr,
        }
    }
}

/// Tiered risk classification of a fused score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Score of 30 or below.
    Low,
    /// Score above 30, up to and including 60.
    Moderate,
    /// Score above 60.
    High,
}

/// Retrievable `GeoJSON` references per indicator. `None` when the
/// indicator produced no polygons or vectorization failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyVectors {
    /// Vegetation anomaly polygons.
    pub ndvi: Option<String>,
    /// Thermal anomaly polygons.
    pub thermal: Option<String>,
    /// Water anomaly polygons.
    pub water: Option<String>,
    /// Soil anomaly polygons.
    pub soil: Option<String>,
}

impl AnomalyVectors {
    /// Returns the reference for one indicator.
    #[must_use]
    pub fn get(&self, kind: IndicatorKind) -> Option<&str> {
        match kind {
            IndicatorKind::Vegetation => self.ndvi.as_deref(),
            IndicatorKind::Thermal => self.thermal.as_deref(),
            IndicatorKind::Water => self.water.as_deref(),
            IndicatorKind::Soil => self.soil.as_deref(),
        }
    }

    /// Sets the reference for one indicator.
    pub fn set(&mut self, kind: IndicatorKind, reference: Option<String>) {
        let slot = match kind {
            IndicatorKind::Vegetation => &mut self.ndvi,
            IndicatorKind::Thermal => &mut self.thermal,
            IndicatorKind::Water => &mut self.water,
            IndicatorKind::Soil => &mut self.soil,
        };
        *slot = reference;
    }

    /// Whether every reference is absent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        IndicatorKind::all().iter().all(|k| self.get(*k).is_none())
    }
}

/// Per-indicator outcome carried alongside the fused score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSummary {
    /// Which indicator.
    pub indicator: IndicatorKind,
    /// Scalar decision value (z-score or direct index mean), absent when
    /// the indicator was degraded.
    pub decision_value: Option<f64>,
    /// Percent of AOI area flagged anomalous (0-100).
    pub affected_pct: f64,
    /// Percent after the noise gate (0 if at or below the minimum).
    pub gated_pct: f64,
    /// Whether the indicator's statistics were unavailable and it was
    /// zeroed under the degrade policy.
    pub degraded: bool,
}

/// The outcome of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Fused score in `[0, 100]`.
    pub risk_score: f64,
    /// Tier of `risk_score`.
    pub risk_level: RiskLevel,
    /// Name of the known site when the demo override fired.
    pub reason: Option<String>,
    /// Per-indicator vector references.
    pub anomaly_vectors: AnomalyVectors,
    /// Per-indicator breakdown (empty when the demo override fired).
    pub indicators: Vec<IndicatorSummary>,
    /// Rendered vegetation z-score thumbnail, when available.
    pub thumbnail_url: Option<String>,
}

/// A curated location that forces a high-risk result nearby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownRiskSite {
    /// Display name, reported as the override reason.
    pub name: String,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
}
