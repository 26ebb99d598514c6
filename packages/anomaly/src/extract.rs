//! Per-indicator statistics and mask extraction.
//!
//! For each indicator the EOS is asked for the target-window mean (and,
//! for z-scored indicators, the baseline mean and stdDev) concurrently,
//! then for the thresholded per-pixel mask. No pixel data crosses the
//! wire, only scalars and a mask handle.

use eo_anomaly_eos::{
    DecisionImage, EarthObservationService, MaskHandle, MaskRequest, ReduceRequest, Reducer,
};
use eo_anomaly_models::{AreaOfInterest, DecisionMode, Satellite, TimeWindow};

use crate::AnalysisError;
use crate::indicators::{IndicatorDefinition, Z_SCORE_EPSILON};

/// Target and baseline windows of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindows {
    /// Recent window under analysis.
    pub target: TimeWindow,
    /// Historical window from the configured anchor to the target start.
    pub baseline: TimeWindow,
}

impl AnalysisWindows {
    /// Derives the baseline from `anchor` up to the target start.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidTimeWindow`] if the target starts
    /// on or before `anchor`.
    pub fn new(anchor: chrono::NaiveDate, target: TimeWindow) -> Result<Self, AnalysisError> {
        let baseline = TimeWindow::baseline_before(anchor, &target)?;
        Ok(Self { target, baseline })
    }
}

/// Scalar decision value and mask of one indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// z-score or direct index mean.
    pub decision_value: f64,
    /// Handle of the thresholded mask.
    pub mask: MaskHandle,
}

/// Standardizes a target mean against baseline statistics.
#[must_use]
pub fn z_score(target_mean: f64, baseline_mean: f64, baseline_std: f64) -> f64 {
    (target_mean - baseline_mean) / (baseline_std + Z_SCORE_EPSILON)
}

/// The per-pixel image an indicator is thresholded on.
#[must_use]
pub fn decision_image(
    def: &IndicatorDefinition,
    satellite: Satellite,
    windows: &AnalysisWindows,
) -> DecisionImage<'static> {
    DecisionImage {
        collection: def.collection(satellite),
        formula: def.formula,
        target: windows.target,
        baseline: def.needs_baseline().then_some(windows.baseline),
    }
}

async fn reduce_required(
    eos: &dyn EarthObservationService,
    def: &IndicatorDefinition,
    aoi: &AreaOfInterest,
    satellite: Satellite,
    window: TimeWindow,
    reducer: Reducer,
    label: &str,
) -> Result<f64, AnalysisError> {
    let request = ReduceRequest {
        region: aoi,
        collection: def.collection(satellite),
        formula: def.formula,
        window,
        reducer,
    };
    let what = format!("{} {label}", def.kind);
    let value = eos
        .reduce(&request)
        .await
        .map_err(|e| AnalysisError::from_eos(&what, e))?;

    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(AnalysisError::unavailable(format!(
            "{what} is not finite ({v}) for {}..{}",
            window.start(),
            window.end()
        ))),
        None => Err(AnalysisError::unavailable(format!(
            "{what}: no usable imagery in {}..{}",
            window.start(),
            window.end()
        ))),
    }
}

/// Computes the decision value and mask of one indicator.
///
/// # Errors
///
/// Returns [`AnalysisError::ComputationUnavailable`] if any statistic is
/// missing or the mask cannot be built, or
/// [`AnalysisError::ServiceUnavailable`] on credential failure.
pub async fn extract(
    eos: &dyn EarthObservationService,
    def: &IndicatorDefinition,
    aoi: &AreaOfInterest,
    satellite: Satellite,
    windows: &AnalysisWindows,
) -> Result<Extraction, AnalysisError> {
    let target = reduce_required(
        eos,
        def,
        aoi,
        satellite,
        windows.target,
        Reducer::Mean,
        "target mean",
    );

    let decision_value = match def.mode {
        DecisionMode::Direct => target.await?,
        DecisionMode::ZScore => {
            let baseline_mean = reduce_required(
                eos,
                def,
                aoi,
                satellite,
                windows.baseline,
                Reducer::Mean,
                "baseline mean",
            );
            let baseline_std = reduce_required(
                eos,
                def,
                aoi,
                satellite,
                windows.baseline,
                Reducer::StdDev,
                "baseline stdDev",
            );
            let (t, m, s) = tokio::try_join!(target, baseline_mean, baseline_std)?;
            z_score(t, m, s)
        }
    };

    let request = MaskRequest {
        region: aoi,
        image: decision_image(def, satellite, windows),
        comparator: def.comparator,
        threshold: def.threshold,
    };
    let mask = eos
        .mask(&request)
        .await
        .map_err(|e| AnalysisError::from_eos(&format!("{} mask", def.kind), e))?;

    log::debug!(
        "{}: decision value {decision_value:.4} ({} {} {}, AOI mean {})",
        def.kind,
        if def.needs_baseline() { "z" } else { "mean" },
        def.comparator.symbol(),
        def.threshold,
        if def.comparator.is_anomalous(decision_value, def.threshold) {
            "anomalous"
        } else {
            "normal"
        }
    );

    Ok(Extraction {
        decision_value,
        mask,
    })
}
