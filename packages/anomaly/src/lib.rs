#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Multi-indicator environmental anomaly analysis.
//!
//! Given an area of interest and a target date window, four indicators
//! (vegetation stress, thermal hotspots, water turbidity, bare soil) are
//! computed remotely by an Earth Observation Service, thresholded into
//! per-pixel masks, measured as a share of the AOI, noise gated, and
//! fused into a single 0-100 risk score with a LOW / MODERATE / HIGH
//! tier. Anomaly masks are exported as `GeoJSON` references.
//!
//! The entry point is [`pipeline::analyze`].

pub mod area;
pub mod demo;
pub mod export;
pub mod extract;
pub mod fusion;
pub mod gate;
pub mod indicators;
pub mod pipeline;
pub mod settings;
pub mod sites;

#[cfg(test)]
mod mock;

pub use pipeline::{AnalysisRequest, analyze, analyze_with_sites};
pub use settings::{AnalysisSettings, MissingBaselinePolicy};

use eo_anomaly_eos::EosError;
use eo_anomaly_models::{GeometryError, TimeWindowError, UnsupportedSatelliteError};
use thiserror::Error;

/// Errors that fail an analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The AOI is not a usable polygon.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    /// The target window is empty, reversed, unparseable, or leaves no
    /// room for a baseline.
    #[error("Invalid time window: {0}")]
    InvalidTimeWindow(#[from] TimeWindowError),

    /// The requested satellite has no optical catalog.
    #[error("Unsupported satellite: {0}")]
    UnsupportedSatellite(#[from] UnsupportedSatelliteError),

    /// Statistics or areas needed by the score could not be produced.
    #[error("Computation unavailable: {message}")]
    ComputationUnavailable {
        /// What could not be computed.
        message: String,
    },

    /// The EOS could not be reached, even after re-initializing.
    #[error("Earth Observation Service unavailable: {0}")]
    ServiceUnavailable(#[source] EosError),
}

impl AnalysisError {
    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::ComputationUnavailable {
            message: message.into(),
        }
    }

    /// Maps an EOS failure during computation. Credential failures mean
    /// the service itself is unusable; everything else is scoped to the
    /// value being computed.
    pub(crate) fn from_eos(what: &str, error: EosError) -> Self {
        match error {
            EosError::Auth { .. } => Self::ServiceUnavailable(error),
            other => Self::unavailable(format!("{what}: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_service_unavailable() {
        let err = AnalysisError::from_eos(
            "ndvi target mean",
            EosError::Auth {
                message: "expired".to_string(),
            },
        );
        assert!(matches!(err, AnalysisError::ServiceUnavailable(_)));
    }

    #[test]
    fn other_failures_name_the_value() {
        let err = AnalysisError::from_eos(
            "ndvi target mean",
            EosError::Status {
                status: 500,
                message: "boom".to_string(),
            },
        );
        match err {
            AnalysisError::ComputationUnavailable { message } => {
                assert!(message.starts_with("ndvi target mean:"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
