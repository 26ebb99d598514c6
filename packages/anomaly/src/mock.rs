//! Deterministic in-process EOS for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use eo_anomaly_eos::{
    EarthObservationService, EosError, MaskHandle, MaskRequest, ReduceRequest, Reducer,
    ThumbnailRequest, VectorEffort,
};
use eo_anomaly_models::{AreaOfInterest, IndicatorKind, TimeWindow};

use crate::indicators::INDICATORS;
use crate::settings::default_baseline_start;

pub fn baseline_anchor() -> NaiveDate {
    default_baseline_start()
}

pub fn target_window() -> TimeWindow {
    TimeWindow::parse("2024-06-01", "2024-07-01").unwrap()
}

/// Axis-aligned square of half-width `half` degrees centred on a point.
pub fn aoi_square(lon: f64, lat: f64, half: f64) -> AreaOfInterest {
    AreaOfInterest::from_rings(&[vec![
        vec![lon - half, lat - half],
        vec![lon + half, lat - half],
        vec![lon + half, lat + half],
        vec![lon - half, lat + half],
    ]])
    .unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorOutcome {
    /// A URL when the mask covers any area, otherwise no polygons.
    Auto,
    TooLarge,
    Fails,
}

#[derive(Debug, Clone)]
pub struct MockStats {
    pub target_mean: Option<f64>,
    pub baseline_mean: Option<f64>,
    pub baseline_std: Option<f64>,
    pub masked_area_m2: f64,
    pub vector: VectorOutcome,
}

impl Default for MockStats {
    fn default() -> Self {
        Self {
            target_mean: Some(0.4),
            baseline_mean: Some(0.4),
            baseline_std: Some(0.1),
            masked_area_m2: 0.0,
            vector: VectorOutcome::Auto,
        }
    }
}

#[derive(Debug, Default)]
pub struct Calls {
    pub reduce: AtomicUsize,
    pub mask: AtomicUsize,
    pub total_area: AtomicUsize,
    pub masked_area: AtomicUsize,
    pub vectorize: AtomicUsize,
    pub thumbnail: AtomicUsize,
    pub ping: AtomicUsize,
    pub reinit: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        [
            &self.reduce,
            &self.mask,
            &self.total_area,
            &self.masked_area,
            &self.vectorize,
            &self.thumbnail,
            &self.ping,
            &self.reinit,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

pub struct MockEos {
    pub stats: BTreeMap<IndicatorKind, MockStats>,
    pub total_area_m2: f64,
    pub baseline_start: NaiveDate,
    /// Added before every reduce.
    pub delay: Option<Duration>,
    /// Added before every vectorize and thumbnail.
    pub export_delay: Option<Duration>,
    /// Reduces answer 401 until a successful re-initialization.
    pub session_expired: AtomicBool,
    pub ping_fails: bool,
    pub reinit_fails: bool,
    pub thumbnail_fails: bool,
    pub calls: Calls,
}

impl MockEos {
    /// 1 km² AOI where every indicator has imagery and no anomalies.
    pub fn healthy() -> Self {
        Self {
            stats: IndicatorKind::all()
                .iter()
                .map(|k| (*k, MockStats::default()))
                .collect(),
            total_area_m2: 1_000_000.0,
            baseline_start: baseline_anchor(),
            delay: None,
            export_delay: None,
            session_expired: AtomicBool::new(false),
            ping_fails: false,
            reinit_fails: false,
            thumbnail_fails: false,
            calls: Calls::default(),
        }
    }

    pub fn with(mut self, kind: IndicatorKind, f: impl FnOnce(&mut MockStats)) -> Self {
        if let Some(stats) = self.stats.get_mut(&kind) {
            f(stats);
        }
        self
    }

    pub fn with_all(mut self, f: impl Fn(&mut MockStats)) -> Self {
        self.stats.values_mut().for_each(&f);
        self
    }

    fn kind_of_formula(formula: &str) -> Result<IndicatorKind, EosError> {
        INDICATORS
            .iter()
            .find(|d| d.formula == formula)
            .map(|d| d.kind)
            .ok_or_else(|| EosError::Parse {
                message: format!("unknown formula {formula}"),
            })
    }

    fn kind_of_mask(mask: &MaskHandle) -> Result<IndicatorKind, EosError> {
        mask.as_str()
            .strip_prefix("mask-")
            .and_then(|k| k.parse().ok())
            .ok_or_else(|| EosError::Parse {
                message: format!("unknown mask {}", mask.as_str()),
            })
    }

    fn stats_for(&self, kind: IndicatorKind) -> Result<&MockStats, EosError> {
        self.stats.get(&kind).ok_or_else(|| EosError::Parse {
            message: format!("no stats for {kind}"),
        })
    }

    fn unavailable() -> EosError {
        EosError::Status {
            status: 503,
            message: "unavailable".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl EarthObservationService for MockEos {
    async fn reduce(&self, request: &ReduceRequest<'_>) -> Result<Option<f64>, EosError> {
        self.calls.reduce.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.session_expired.load(Ordering::SeqCst) {
            return Err(EosError::Auth {
                message: "session expired".to_string(),
            });
        }
        let stats = self.stats_for(Self::kind_of_formula(request.formula)?)?;
        let is_baseline = request.window.start() == self.baseline_start;
        Ok(match (is_baseline, request.reducer) {
            (false, _) => stats.target_mean,
            (true, Reducer::Mean) => stats.baseline_mean,
            (true, Reducer::StdDev) => stats.baseline_std,
        })
    }

    async fn mask(&self, request: &MaskRequest<'_>) -> Result<MaskHandle, EosError> {
        self.calls.mask.fetch_add(1, Ordering::SeqCst);
        let kind = Self::kind_of_formula(request.image.formula)?;
        Ok(MaskHandle(format!("mask-{kind}")))
    }

    async fn area_sum(
        &self,
        _region: &AreaOfInterest,
        mask: Option<&MaskHandle>,
    ) -> Result<f64, EosError> {
        match mask {
            None => {
                self.calls.total_area.fetch_add(1, Ordering::SeqCst);
                Ok(self.total_area_m2)
            }
            Some(mask) => {
                self.calls.masked_area.fetch_add(1, Ordering::SeqCst);
                Ok(self.stats_for(Self::kind_of_mask(mask)?)?.masked_area_m2)
            }
        }
    }

    async fn vectorize(
        &self,
        mask: &MaskHandle,
        _region: &AreaOfInterest,
        _effort: VectorEffort,
    ) -> Result<Option<String>, EosError> {
        self.calls.vectorize.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.export_delay {
            tokio::time::sleep(delay).await;
        }
        let kind = Self::kind_of_mask(mask)?;
        let stats = self.stats_for(kind)?;
        match stats.vector {
            VectorOutcome::Auto if stats.masked_area_m2 > 0.0 => {
                Ok(Some(format!("https://eos.test/vectors/{kind}.geojson")))
            }
            VectorOutcome::Auto => Ok(None),
            VectorOutcome::TooLarge => Err(EosError::TooLarge {
                message: "too many pixels".to_string(),
            }),
            VectorOutcome::Fails => Err(Self::unavailable()),
        }
    }

    async fn thumbnail(&self, request: &ThumbnailRequest<'_>) -> Result<Option<String>, EosError> {
        self.calls.thumbnail.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.export_delay {
            tokio::time::sleep(delay).await;
        }
        if self.thumbnail_fails {
            return Err(Self::unavailable());
        }
        let kind = Self::kind_of_formula(request.image.formula)?;
        Ok(Some(format!(
            "https://eos.test/thumbnails/{kind}-{}.png",
            request.scale_m
        )))
    }

    async fn ping(&self) -> Result<(), EosError> {
        self.calls.ping.fetch_add(1, Ordering::SeqCst);
        if self.ping_fails {
            Err(Self::unavailable())
        } else {
            Ok(())
        }
    }

    async fn reinitialize(&self) -> Result<(), EosError> {
        self.calls.reinit.fetch_add(1, Ordering::SeqCst);
        if self.reinit_fails {
            Err(EosError::Auth {
                message: "rejected".to_string(),
            })
        } else {
            self.session_expired.store(false, Ordering::SeqCst);
            Ok(())
        }
    }
}
