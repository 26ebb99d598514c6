//! Anomaly vector export and thumbnail rendering.
//!
//! Both are best-effort: a failure is logged and reported as an absent
//! reference, never as a failed request.

use eo_anomaly_eos::{EarthObservationService, EosError, MaskHandle, ThumbnailRequest, VectorEffort, VisParams};
use eo_anomaly_models::{AnomalyVectors, AreaOfInterest, IndicatorKind, Satellite};
use futures::future::join_all;
use thiserror::Error;

use crate::extract::{AnalysisWindows, decision_image};
use crate::indicators::definition;

/// Lower bound of the thumbnail color ramp (z-score).
pub const THUMBNAIL_MIN: f64 = -3.0;

/// Upper bound of the thumbnail color ramp (z-score).
pub const THUMBNAIL_MAX: f64 = 3.0;

/// Green, yellow, red.
pub const THUMBNAIL_PALETTE: [&str; 3] = ["00ff00", "ffff00", "ff0000"];

/// One indicator's mask could not be vectorized.
#[derive(Debug, Error)]
#[error("Vectorization unavailable for {indicator}: {source}")]
pub struct VectorizationUnavailable {
    /// Which indicator.
    pub indicator: IndicatorKind,
    /// Underlying EOS failure.
    #[source]
    pub source: EosError,
}

/// Vectorizes one mask.
///
/// # Errors
///
/// Returns [`VectorizationUnavailable`] if the EOS rejects or fails the
/// task.
pub async fn export_vector(
    eos: &dyn EarthObservationService,
    indicator: IndicatorKind,
    mask: &MaskHandle,
    aoi: &AreaOfInterest,
    effort: VectorEffort,
) -> Result<Option<String>, VectorizationUnavailable> {
    eos.vectorize(mask, aoi, effort)
        .await
        .map_err(|source| VectorizationUnavailable { indicator, source })
}

/// Vectorizes every mask concurrently. Failed indicators get a `None`
/// reference and the rest are unaffected.
pub async fn export_vectors(
    eos: &dyn EarthObservationService,
    aoi: &AreaOfInterest,
    masks: &[(IndicatorKind, &MaskHandle)],
    effort: VectorEffort,
) -> AnomalyVectors {
    let results = join_all(
        masks
            .iter()
            .map(|(kind, mask)| export_vector(eos, *kind, mask, aoi, effort)),
    )
    .await;

    let mut vectors = AnomalyVectors::default();
    for ((kind, _), result) in masks.iter().zip(results) {
        match result {
            Ok(reference) => vectors.set(*kind, reference),
            Err(e) => {
                log::warn!("{e}");
                vectors.set(*kind, None);
            }
        }
    }
    vectors
}

/// Renders the vegetation z-score image as a PNG thumbnail.
///
/// Returns `None` if rendering fails.
pub async fn render_thumbnail(
    eos: &dyn EarthObservationService,
    aoi: &AreaOfInterest,
    satellite: Satellite,
    windows: &AnalysisWindows,
    scale_m: u32,
) -> Option<String> {
    let request = ThumbnailRequest {
        region: aoi,
        image: decision_image(definition(IndicatorKind::Vegetation), satellite, windows),
        vis: VisParams {
            min: THUMBNAIL_MIN,
            max: THUMBNAIL_MAX,
            palette: THUMBNAIL_PALETTE.iter().map(ToString::to_string).collect(),
        },
        scale_m,
    };
    match eos.thumbnail(&request).await {
        Ok(url) => url,
        Err(e) => {
            log::warn!("Thumbnail unavailable: {e}");
            None
        }
    }
}
