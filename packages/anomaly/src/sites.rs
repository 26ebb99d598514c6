//! Compile-time catalog of known high-risk sites.
//!
//! Sites are listed in `sites/known_sites.toml`. Order matters: the demo
//! override reports the first site in range.

use std::sync::LazyLock;

use eo_anomaly_models::KnownRiskSite;
use serde::Deserialize;

/// Number of catalogued sites. Enforced by a test.
#[cfg(test)]
const EXPECTED_SITE_COUNT: usize = 7;

const SITES_TOML: &str = include_str!("../sites/known_sites.toml");

#[derive(Deserialize)]
struct SiteCatalog {
    sites: Vec<KnownRiskSite>,
}

static KNOWN_SITES: LazyLock<Vec<KnownRiskSite>> = LazyLock::new(|| {
    toml::de::from_str::<SiteCatalog>(SITES_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse known sites catalog: {e}"))
        .sites
});

/// Returns the known sites in catalog order.
///
/// # Panics
///
/// Panics if the embedded TOML fails to parse. The catalog is a
/// compile-time constant, so this is a development error caught by the
/// tests below.
#[must_use]
pub fn known_sites() -> &'static [KnownRiskSite] {
    &KNOWN_SITES
}
