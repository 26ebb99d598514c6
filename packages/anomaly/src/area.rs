//! Affected-area percentages.
//!
//! The AOI's total area is measured once per request and shared by all
//! four indicators; each indicator then costs one masked-area sum.

use eo_anomaly_eos::{EarthObservationService, MaskHandle};
use eo_anomaly_models::{AreaOfInterest, IndicatorKind};

use crate::AnalysisError;

/// `100 · masked / total`, clamped to `[0, 100]`.
///
/// Returns 0 for a non-positive total or a non-finite result.
#[must_use]
pub fn area_percentage(masked_m2: f64, total_m2: f64) -> f64 {
    if total_m2 <= 0.0 {
        return 0.0;
    }
    let pct = masked_m2 / total_m2 * 100.0;
    if pct.is_finite() {
        pct.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Total AOI area, measured once per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AoiArea {
    total_m2: f64,
}

impl AoiArea {
    /// Measures the AOI's pixel area through the EOS.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ComputationUnavailable`] if the sum fails
    /// or is not positive.
    pub async fn measure(
        eos: &dyn EarthObservationService,
        aoi: &AreaOfInterest,
    ) -> Result<Self, AnalysisError> {
        let total_m2 = eos
            .area_sum(aoi, None)
            .await
            .map_err(|e| AnalysisError::from_eos("AOI area", e))?;
        if !total_m2.is_finite() || total_m2 <= 0.0 {
            return Err(AnalysisError::unavailable(format!(
                "AOI area is not positive ({total_m2} m²)"
            )));
        }
        log::debug!("AOI area {total_m2:.0} m²");
        Ok(Self { total_m2 })
    }

    /// Percentage of the AOI covered by `mask`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ComputationUnavailable`] if the masked sum
    /// fails or is negative or non-finite.
    pub async fn percentage_of(
        &self,
        eos: &dyn EarthObservationService,
        aoi: &AreaOfInterest,
        kind: IndicatorKind,
        mask: &MaskHandle,
    ) -> Result<f64, AnalysisError> {
        let masked_m2 = eos
            .area_sum(aoi, Some(mask))
            .await
            .map_err(|e| AnalysisError::from_eos(&format!("{kind} anomaly area"), e))?;
        if !masked_m2.is_finite() || masked_m2 < 0.0 {
            return Err(AnalysisError::unavailable(format!(
                "{kind} anomaly area is not a valid area ({masked_m2} m²)"
            )));
        }
        Ok(area_percentage(masked_m2, self.total_m2))
    }
}
