#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the anomaly analysis server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the core assessment types so the wire contract can evolve
//! independently. Keys are `snake_case` to match existing clients.

use eo_anomaly_models::{AnomalyVectors, IndicatorSummary, RiskAssessment, RiskLevel};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiAnalysisRequest {
    /// `GeoJSON` geometry of the area of interest. Only `Polygon` is
    /// accepted; other types are rejected during validation.
    pub aoi: geojson::Geometry,
    /// First day of the target window (`YYYY-MM-DD`).
    pub start_date: String,
    /// Day after the last day of the target window (`YYYY-MM-DD`).
    pub end_date: String,
    /// Optical catalog, defaults to Sentinel-2.
    #[serde(default)]
    pub satellite: Option<String>,
}

/// Outcome marker of a successful analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    /// The analysis completed.
    Success,
}

/// Body returned by `POST /api/v1/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiAnalysisResponse {
    /// Always `success`; failures use [`ApiError`].
    pub status: ApiStatus,
    /// Identifier of this analysis, also present in the server logs.
    pub analysis_id: String,
    /// Fused score in `[0, 100]`.
    pub risk_score: f64,
    /// `LOW`, `MODERATE` or `HIGH`.
    pub risk_level: RiskLevel,
    /// Known site that forced the result, if any.
    pub reason: Option<String>,
    /// `GeoJSON` references keyed `ndvi`, `thermal`, `water`, `soil`.
    pub anomaly_vectors: AnomalyVectors,
    /// Per-indicator breakdown.
    pub indicators: Vec<IndicatorSummary>,
    /// Vegetation z-score thumbnail.
    pub thumbnail_url: Option<String>,
}

impl ApiAnalysisResponse {
    /// Wraps a completed assessment.
    #[must_use]
    pub fn new(analysis_id: impl Into<String>, assessment: RiskAssessment) -> Self {
        Self {
            status: ApiStatus::Success,
            analysis_id: analysis_id.into(),
            risk_score: assessment.risk_score,
            risk_level: assessment.risk_level,
            reason: assessment.reason,
            anomaly_vectors: assessment.anomaly_vectors,
            indicators: assessment.indicators,
            thumbnail_url: assessment.thumbnail_url,
        }
    }
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
    /// Id of the failed analysis. Absent when the body could not be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            analysis_id: None,
        }
    }

    /// Tags the error with the analysis it belongs to.
    #[must_use]
    pub fn with_analysis_id(mut self, analysis_id: impl Into<String>) -> Self {
        self.analysis_id = Some(analysis_id.into());
        self
    }
}

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHealth {
    /// `ok` when the process is serving.
    pub status: String,
    /// Service version.
    pub version: String,
}
