//! End-to-end analysis of one request.
//!
//! 1. Validate the AOI, target window, satellite and derived baseline.
//! 2. Short-circuit near a known site.
//! 3. Make sure the EOS session is usable.
//! 4. Measure the AOI once and extract all four indicators concurrently.
//! 5. Gate and fuse the percentages into a score and tier.
//! 6. Export anomaly vectors and the thumbnail under what is left of the
//!    deadline.

use eo_anomaly_eos::{EarthObservationService, EosError, MaskHandle, ensure_ready};
use eo_anomaly_models::{
    AnomalyVectors, AreaOfInterest, IndicatorKind, IndicatorSummary, KnownRiskSite,
    RiskAssessment, Satellite, TimeWindow,
};
use futures::future::join_all;
use tokio::time::{Instant, timeout_at};

use crate::area::AoiArea;
use crate::demo::{find_override_site, override_assessment};
use crate::export::{export_vectors, render_thumbnail};
use crate::extract::{AnalysisWindows, Extraction, extract};
use crate::fusion::{GatedPercentages, classify, fuse};
use crate::gate::gate;
use crate::indicators::{INDICATORS, IndicatorDefinition};
use crate::settings::{AnalysisSettings, MissingBaselinePolicy};
use crate::sites::known_sites;
use crate::AnalysisError;

/// A validated analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Area of interest.
    pub aoi: AreaOfInterest,
    /// Recent window under analysis.
    pub target: TimeWindow,
    /// Optical imagery source.
    pub satellite: Satellite,
}

impl AnalysisRequest {
    /// Validates raw request fields.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidTimeWindow`] for unparseable or
    /// empty windows and [`AnalysisError::UnsupportedSatellite`] for a
    /// satellite without an optical catalog.
    pub fn new(
        aoi: AreaOfInterest,
        start_date: &str,
        end_date: &str,
        satellite: Option<&str>,
    ) -> Result<Self, AnalysisError> {
        let target = TimeWindow::parse(start_date, end_date)?;
        let satellite = Satellite::parse(satellite)?;
        Ok(Self {
            aoi,
            target,
            satellite,
        })
    }
}

/// Computed state of one indicator before fusion.
#[derive(Debug)]
struct IndicatorOutcome {
    kind: IndicatorKind,
    extraction: Option<Extraction>,
    affected_pct: f64,
    gated_pct: f64,
}

impl IndicatorOutcome {
    fn degraded(kind: IndicatorKind) -> Self {
        Self {
            kind,
            extraction: None,
            affected_pct: 0.0,
            gated_pct: 0.0,
        }
    }

    fn summary(&self) -> IndicatorSummary {
        IndicatorSummary {
            indicator: self.kind,
            decision_value: self.extraction.as_ref().map(|e| e.decision_value),
            affected_pct: self.affected_pct,
            gated_pct: self.gated_pct,
            degraded: self.extraction.is_none(),
        }
    }
}

/// Applies the missing-baseline policy to an indicator failure.
fn degrade_or_fail(
    def: &IndicatorDefinition,
    error: AnalysisError,
    policy: MissingBaselinePolicy,
) -> Result<IndicatorOutcome, AnalysisError> {
    match (policy, error) {
        (MissingBaselinePolicy::Degrade, AnalysisError::ComputationUnavailable { message }) => {
            log::warn!("Degrading {}: {message}", def.kind);
            Ok(IndicatorOutcome::degraded(def.kind))
        }
        (_, error) => Err(error),
    }
}

async fn measure_indicator(
    eos: &dyn EarthObservationService,
    def: &'static IndicatorDefinition,
    request: &AnalysisRequest,
    windows: &AnalysisWindows,
    area: &AoiArea,
    policy: MissingBaselinePolicy,
) -> Result<IndicatorOutcome, AnalysisError> {
    let extraction = match extract(eos, def, &request.aoi, request.satellite, windows).await {
        Ok(e) => e,
        Err(e) => return degrade_or_fail(def, e, policy),
    };

    let affected_pct = match area
        .percentage_of(eos, &request.aoi, def.kind, &extraction.mask)
        .await
    {
        Ok(p) => p,
        Err(e) => return degrade_or_fail(def, e, policy),
    };

    let gated_pct = gate(affected_pct, def.gate_min_pct);
    log::debug!(
        "{}: {affected_pct:.2}% affected, {gated_pct:.2}% after gate",
        def.kind
    );

    Ok(IndicatorOutcome {
        kind: def.kind,
        extraction: Some(extraction),
        affected_pct,
        gated_pct,
    })
}

async fn compute_indicators(
    eos: &dyn EarthObservationService,
    request: &AnalysisRequest,
    windows: &AnalysisWindows,
    policy: MissingBaselinePolicy,
) -> Result<Vec<IndicatorOutcome>, AnalysisError> {
    let area = AoiArea::measure(eos, &request.aoi).await?;

    join_all(
        INDICATORS
            .iter()
            .map(|def| measure_indicator(eos, def, request, windows, &area, policy)),
    )
    .await
    .into_iter()
    .collect()
}

/// Computes all indicators, failing with
/// [`AnalysisError::ComputationUnavailable`] once `deadline` passes.
async fn indicators_by(
    eos: &dyn EarthObservationService,
    request: &AnalysisRequest,
    windows: &AnalysisWindows,
    settings: &AnalysisSettings,
    deadline: Instant,
) -> Result<Vec<IndicatorOutcome>, AnalysisError> {
    timeout_at(
        deadline,
        compute_indicators(eos, request, windows, settings.missing_baseline),
    )
    .await
    .map_err(|_| {
        AnalysisError::unavailable(format!(
            "indicator computation exceeded {}s",
            settings.timeout.as_secs()
        ))
    })?
}

/// Runs the analysis against the built-in known-site catalog.
///
/// # Errors
///
/// See [`analyze_with_sites`].
pub async fn analyze(
    eos: &dyn EarthObservationService,
    request: &AnalysisRequest,
    settings: &AnalysisSettings,
) -> Result<RiskAssessment, AnalysisError> {
    analyze_with_sites(eos, request, settings, known_sites()).await
}

/// Runs the analysis with an explicit known-site catalog.
///
/// # Errors
///
/// * [`AnalysisError::InvalidTimeWindow`] if the target leaves no room for
///   a baseline.
/// * [`AnalysisError::ServiceUnavailable`] if the EOS cannot be reached,
///   or rejects the session, after one re-initialization.
/// * [`AnalysisError::ComputationUnavailable`] if an indicator cannot be
///   computed (under the abort policy) or the deadline passes during
///   indicator work.
pub async fn analyze_with_sites(
    eos: &dyn EarthObservationService,
    request: &AnalysisRequest,
    settings: &AnalysisSettings,
    sites: &[KnownRiskSite],
) -> Result<RiskAssessment, AnalysisError> {
    let windows = AnalysisWindows::new(settings.baseline_start, request.target)?;

    if let Some(site) = find_override_site(eos, &request.aoi, sites).await {
        log::info!("AOI is near known site '{}', returning override", site.name);
        return Ok(override_assessment(site));
    }

    ensure_ready(eos)
        .await
        .map_err(AnalysisError::ServiceUnavailable)?;

    log::info!(
        "Analyzing {} day window from {}",
        request.target.days(),
        request.target.start()
    );
    let deadline = Instant::now() + settings.timeout;

    let outcomes = match indicators_by(eos, request, &windows, settings, deadline).await {
        Err(AnalysisError::ServiceUnavailable(e @ EosError::Auth { .. })) => {
            log::warn!("EOS rejected the session ({e}), re-initializing once");
            eos.reinitialize()
                .await
                .map_err(AnalysisError::ServiceUnavailable)?;
            indicators_by(eos, request, &windows, settings, deadline).await
        }
        other => other,
    }?;

    let mut gated = GatedPercentages::default();
    for outcome in &outcomes {
        gated.set(outcome.kind, outcome.gated_pct);
    }
    let risk_score = fuse(&gated);
    let risk_level = classify(risk_score);
    log::info!("Risk score {risk_score:.2} ({risk_level})");

    let masks: Vec<(IndicatorKind, &MaskHandle)> = outcomes
        .iter()
        .filter_map(|o| o.extraction.as_ref().map(|e| (o.kind, &e.mask)))
        .collect();

    let export = async {
        tokio::join!(
            export_vectors(eos, &request.aoi, &masks, settings.vector_effort),
            render_thumbnail(
                eos,
                &request.aoi,
                request.satellite,
                &windows,
                settings.thumbnail_scale_m
            ),
        )
    };
    let (anomaly_vectors, thumbnail_url) = timeout_at(deadline, export)
        .await
        .unwrap_or_else(|_| {
            log::warn!("Export exceeded the request deadline, returning no references");
            (AnomalyVectors::default(), None)
        });

    Ok(RiskAssessment {
        risk_score,
        risk_level,
        reason: None,
        anomaly_vectors,
        indicators: outcomes.iter().map(IndicatorOutcome::summary).collect(),
        thumbnail_url,
    })
}
