//! Analysis tunables from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `BASELINE_START` | `2017-01-01` |
//! | `ANALYSIS_TIMEOUT_SECS` | `300` |
//! | `MISSING_BASELINE_POLICY` | `abort` (or `degrade`) |
//! | `THUMBNAIL_SCALE` | `30` |

use std::time::Duration;

use chrono::NaiveDate;
use eo_anomaly_eos::VectorEffort;
use eo_anomaly_models::window::parse_date;
use strum_macros::{AsRefStr, Display, EnumString};

const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_THUMBNAIL_SCALE_M: u32 = 30;

/// First day of the historical baseline unless overridden.
#[must_use]
pub fn default_baseline_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default()
}

/// What to do when an indicator's statistics are unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MissingBaselinePolicy {
    /// Fail the whole request.
    #[default]
    Abort,
    /// Zero the indicator, flag it as degraded, and carry on.
    Degrade,
}

/// Per-request analysis settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSettings {
    /// Anchor of the baseline window.
    pub baseline_start: NaiveDate,
    /// Budget for the whole request. Indicator work past the deadline
    /// fails the request; export past the deadline yields no references.
    pub timeout: Duration,
    /// Handling of unavailable indicator statistics.
    pub missing_baseline: MissingBaselinePolicy,
    /// Thumbnail pixel size in metres.
    pub thumbnail_scale_m: u32,
    /// Vectorization cost policy.
    pub vector_effort: VectorEffort,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            baseline_start: default_baseline_start(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            missing_baseline: MissingBaselinePolicy::default(),
            thumbnail_scale_m: DEFAULT_THUMBNAIL_SCALE_M,
            vector_effort: VectorEffort::BestEffort,
        }
    }
}

impl AnalysisSettings {
    /// Reads the settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`. Unset, empty or unparseable
    /// values fall back to the defaults with a warning.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let baseline_start = get("BASELINE_START").map_or(defaults.baseline_start, |v| {
            parse_date(&v).unwrap_or_else(|e| {
                log::warn!("Ignoring BASELINE_START: {e}");
                defaults.baseline_start
            })
        });

        let timeout = get("ANALYSIS_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.timeout, Duration::from_secs);

        let missing_baseline = get("MISSING_BASELINE_POLICY").map_or(defaults.missing_baseline, |v| {
            v.trim().parse().unwrap_or_else(|_| {
                log::warn!("Unknown MISSING_BASELINE_POLICY '{v}', using abort");
                MissingBaselinePolicy::Abort
            })
        });

        let thumbnail_scale_m = get("THUMBNAIL_SCALE")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|m| *m > 0)
            .unwrap_or(defaults.thumbnail_scale_m);

        Self {
            baseline_start,
            timeout,
            missing_baseline,
            thumbnail_scale_m,
            vector_effort: defaults.vector_effort,
        }
    }
}
