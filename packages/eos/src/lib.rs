#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the remote Earth Observation Service (EOS).
//!
//! The EOS owns every imagery operation: catalog filtering and cloud
//! masking, band math, spatial reduction, thresholding, vectorization and
//! thumbnail rendering. This crate exposes those operations as explicit
//! request/response calls behind the [`EarthObservationService`] trait so
//! the analysis pipeline can be driven by the real [`HttpEos`] client or
//! by a deterministic mock in tests.
//!
//! Each statistic is its own round-trip. Nothing is deferred or batched
//! into an expression graph on this side.

pub mod config;
pub mod http;

pub use config::EosConfig;
pub use http::HttpEos;

use eo_anomaly_models::{AreaOfInterest, Collection, Comparator, TimeWindow};
use geo::{Distance as _, Haversine, Point};
use thiserror::Error;

/// Errors from EOS operations.
#[derive(Debug, Error)]
pub enum EosError {
    /// HTTP request failed (connection, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("EOS returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The service refused the task as too large to compute.
    #[error("Task too large: {message}")]
    TooLarge {
        /// Message from the service.
        message: String,
    },

    /// Session credentials were rejected or could not be loaded.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Description of the failure.
        message: String,
    },

    /// Client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// A geometry could not be used for the requested operation.
    #[error("Geometry error: {message}")]
    Geometry {
        /// Description of the problem.
        message: String,
    },
}

/// Statistic computed over a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Arithmetic mean of pixel values.
    Mean,
    /// Standard deviation of pixel values.
    StdDev,
}

/// A scalar reduction of a band formula over a region and window.
#[derive(Debug, Clone)]
pub struct ReduceRequest<'a> {
    /// Region to reduce over.
    pub region: &'a AreaOfInterest,
    /// Catalog to filter.
    pub collection: Collection,
    /// Band formula evaluated per image, e.g. `(B8 - B4) / (B8 + B4)`.
    pub formula: &'a str,
    /// Acquisition window.
    pub window: TimeWindow,
    /// Statistic to compute.
    pub reducer: Reducer,
}

/// The per-pixel image a mask or thumbnail is derived from.
///
/// With a `baseline` the EOS standardizes the target composite against
/// the baseline mean and stdDev (plus a small epsilon). Without one the
/// target composite is used directly.
#[derive(Debug, Clone)]
pub struct DecisionImage<'a> {
    /// Catalog to filter.
    pub collection: Collection,
    /// Band formula evaluated per image.
    pub formula: &'a str,
    /// Window of the recent composite.
    pub target: TimeWindow,
    /// Historical window for z-scoring, if any.
    pub baseline: Option<TimeWindow>,
}

/// A per-pixel threshold mask request.
#[derive(Debug, Clone)]
pub struct MaskRequest<'a> {
    /// Region to clip the mask to.
    pub region: &'a AreaOfInterest,
    /// Image being thresholded.
    pub image: DecisionImage<'a>,
    /// Per-pixel comparison.
    pub comparator: Comparator,
    /// Literal threshold.
    pub threshold: f64,
}

/// Opaque reference to a mask held by the EOS.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaskHandle(pub String);

impl MaskHandle {
    /// The handle's identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Vectorization cost policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorEffort {
    /// Let the EOS coarsen scale and tile the work to stay within its
    /// pixel budget.
    BestEffort,
    /// Vectorize at native scale or fail.
    Exact,
}

/// Visualization parameters for a rendered thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct VisParams {
    /// Value mapped to the first palette color.
    pub min: f64,
    /// Value mapped to the last palette color.
    pub max: f64,
    /// Hex colors without a leading `#`.
    pub palette: Vec<String>,
}

/// A thumbnail rendering request.
#[derive(Debug, Clone)]
pub struct ThumbnailRequest<'a> {
    /// Region to render.
    pub region: &'a AreaOfInterest,
    /// Image to render.
    pub image: DecisionImage<'a>,
    /// Color mapping.
    pub vis: VisParams,
    /// Output pixel size in metres.
    pub scale_m: u32,
}

/// Operations the analysis pipeline needs from the Earth Observation
/// Service.
#[async_trait::async_trait]
pub trait EarthObservationService: Send + Sync {
    /// Reduces a band formula to a scalar over a region.
    ///
    /// Returns `Ok(None)` when the window has no usable imagery.
    ///
    /// # Errors
    ///
    /// Returns [`EosError`] if the request fails.
    async fn reduce(&self, request: &ReduceRequest<'_>) -> Result<Option<f64>, EosError>;

    /// Thresholds a decision image per pixel and returns a handle to the
    /// resulting mask.
    ///
    /// # Errors
    ///
    /// Returns [`EosError`] if the request fails.
    async fn mask(&self, request: &MaskRequest<'_>) -> Result<MaskHandle, EosError>;

    /// Sums per-pixel area in square metres over `region`, restricted to
    /// `mask` when given, or the whole region otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`EosError`] if the request fails.
    async fn area_sum(
        &self,
        region: &AreaOfInterest,
        mask: Option<&MaskHandle>,
    ) -> Result<f64, EosError>;

    /// Converts a mask into polygons clipped to `region` and returns a URL
    /// to the `GeoJSON` `FeatureCollection`, or `None` when no polygons
    /// were produced.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::TooLarge`] if the task exceeds the service's
    /// budget, or any other [`EosError`] if the request fails.
    async fn vectorize(
        &self,
        mask: &MaskHandle,
        region: &AreaOfInterest,
        effort: VectorEffort,
    ) -> Result<Option<String>, EosError>;

    /// Renders an image and returns a URL to the PNG.
    ///
    /// # Errors
    ///
    /// Returns [`EosError`] if the request fails.
    async fn thumbnail(&self, request: &ThumbnailRequest<'_>) -> Result<Option<String>, EosError>;

    /// Great-circle distance in kilometres between the region and a point.
    ///
    /// Defaults to a local haversine distance from the region centroid.
    ///
    /// # Errors
    ///
    /// Returns [`EosError::Geometry`] if the region has no centroid.
    async fn distance_km(
        &self,
        region: &AreaOfInterest,
        point: Point<f64>,
    ) -> Result<f64, EosError> {
        centroid_distance_km(region, point)
    }

    /// Cheap connectivity and session check.
    ///
    /// # Errors
    ///
    /// Returns [`EosError`] if the service is unreachable or the session
    /// is invalid.
    async fn ping(&self) -> Result<(), EosError>;

    /// Re-establishes the session with the service.
    ///
    /// # Errors
    ///
    /// Returns [`EosError`] if credentials are rejected or the service is
    /// unreachable.
    async fn reinitialize(&self) -> Result<(), EosError>;
}

/// Haversine distance in kilometres from the region's centroid to `point`.
///
/// # Errors
///
/// Returns [`EosError::Geometry`] if the region has no centroid.
pub fn centroid_distance_km(region: &AreaOfInterest, point: Point<f64>) -> Result<f64, EosError> {
    let centroid = region.centroid().ok_or_else(|| EosError::Geometry {
        message: "region has no centroid".to_string(),
    })?;
    Ok(Haversine.distance(centroid, point) / 1000.0)
}

/// Makes sure the EOS session is usable before expensive work starts.
///
/// Pings the service; if that fails, re-initializes the session exactly
/// once.
///
/// # Errors
///
/// Returns the re-initialization error if the second attempt fails.
pub async fn ensure_ready(eos: &dyn EarthObservationService) -> Result<(), EosError> {
    match eos.ping().await {
        Ok(()) => Ok(()),
        Err(e) => {
            log::warn!("EOS ping failed ({e}), re-initializing session");
            match eos.reinitialize().await {
                Ok(()) => {
                    log::info!("EOS session re-initialized");
                    Ok(())
                }
                Err(e) => {
                    log::error!("EOS re-initialization failed: {e}");
                    Err(e)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn aoi_around(lon: f64, lat: f64) -> AreaOfInterest {
        let d = 0.0001;
        AreaOfInterest::from_rings(&[vec![
            vec![lon - d, lat - d],
            vec![lon + d, lat - d],
            vec![lon + d, lat + d],
            vec![lon - d, lat + d],
        ]])
        .unwrap()
    }

    #[test]
    fn centroid_distance_one_degree_latitude() {
        let aoi = aoi_around(0.0, 0.0);
        let km = centroid_distance_km(&aoi, Point::new(0.0, 1.0)).unwrap();
        assert!((km - 111.195).abs() < 0.1, "got {km}");
    }

    #[test]
    fn centroid_distance_zero_at_centroid() {
        let aoi = aoi_around(30.1, 51.39);
        let km = centroid_distance_km(&aoi, Point::new(30.1, 51.39)).unwrap();
        assert!(km < 0.001, "got {km}");
    }

    /// Connectivity stub: fails the first `ping_failures` pings and
    /// optionally fails re-initialization.
    struct FlakyService {
        ping_failures: usize,
        reinit_fails: bool,
        pings: AtomicUsize,
        reinits: AtomicUsize,
    }

    impl FlakyService {
        fn new(ping_failures: usize, reinit_fails: bool) -> Self {
            Self {
                ping_failures,
                reinit_fails,
                pings: AtomicUsize::new(0),
                reinits: AtomicUsize::new(0),
            }
        }
    }

    fn unavailable() -> EosError {
        EosError::Status {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    #[async_trait::async_trait]
    impl EarthObservationService for FlakyService {
        async fn reduce(&self, _: &ReduceRequest<'_>) -> Result<Option<f64>, EosError> {
            Err(unavailable())
        }

        async fn mask(&self, _: &MaskRequest<'_>) -> Result<MaskHandle, EosError> {
            Err(unavailable())
        }

        async fn area_sum(
            &self,
            _: &AreaOfInterest,
            _: Option<&MaskHandle>,
        ) -> Result<f64, EosError> {
            Err(unavailable())
        }

        async fn vectorize(
            &self,
            _: &MaskHandle,
            _: &AreaOfInterest,
            _: VectorEffort,
        ) -> Result<Option<String>, EosError> {
            Err(unavailable())
        }

        async fn thumbnail(&self, _: &ThumbnailRequest<'_>) -> Result<Option<String>, EosError> {
            Err(unavailable())
        }

        async fn ping(&self) -> Result<(), EosError> {
            let n = self.pings.fetch_add(1, Ordering::SeqCst);
            if n < self.ping_failures {
                Err(unavailable())
            } else {
                Ok(())
            }
        }

        async fn reinitialize(&self) -> Result<(), EosError> {
            self.reinits.fetch_add(1, Ordering::SeqCst);
            if self.reinit_fails {
                Err(EosError::Auth {
                    message: "bad key".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn ready_service_is_not_reinitialized() {
        let svc = FlakyService::new(0, false);
        ensure_ready(&svc).await.unwrap();
        assert_eq!(svc.reinits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_ping_reinitializes_once() {
        let svc = FlakyService::new(5, false);
        ensure_ready(&svc).await.unwrap();
        assert_eq!(svc.pings.load(Ordering::SeqCst), 1);
        assert_eq!(svc.reinits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_reinitialization_is_surfaced() {
        let svc = FlakyService::new(1, true);
        let err = ensure_ready(&svc).await.unwrap_err();
        assert!(matches!(err, EosError::Auth { .. }));
        assert_eq!(svc.reinits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn default_distance_uses_centroid() {
        let svc = FlakyService::new(0, false);
        let aoi = aoi_around(0.0, 0.0);
        let km = svc.distance_km(&aoi, Point::new(0.0, 1.0)).await.unwrap();
        assert!((km - 111.195).abs() < 0.1);
    }
}
