//! Known-site demo override.
//!
//! When the AOI centroid lies within [`OVERRIDE_RADIUS_KM`] of a known
//! site, the request short-circuits to a fixed HIGH assessment naming the
//! site, and no indicator is computed.

use eo_anomaly_eos::EarthObservationService;
use eo_anomaly_models::{AnomalyVectors, AreaOfInterest, KnownRiskSite, RiskAssessment, RiskLevel};
use geo::Point;

/// Sites strictly closer than this trigger the override.
pub const OVERRIDE_RADIUS_KM: f64 = 10.0;

/// Score reported by the override.
pub const OVERRIDE_RISK_SCORE: f64 = 92.0;

/// Returns the first site, in catalog order, whose distance to the AOI is
/// strictly below [`OVERRIDE_RADIUS_KM`].
///
/// A site whose distance cannot be computed is skipped.
pub async fn find_override_site<'a>(
    eos: &dyn EarthObservationService,
    aoi: &AreaOfInterest,
    sites: &'a [KnownRiskSite],
) -> Option<&'a KnownRiskSite> {
    for site in sites {
        let point = Point::new(site.longitude, site.latitude);
        match eos.distance_km(aoi, point).await {
            Ok(km) if km < OVERRIDE_RADIUS_KM => {
                log::debug!("AOI is {km:.2} km from {}", site.name);
                return Some(site);
            }
            Ok(_) => {}
            Err(e) => log::warn!("Distance to {} unavailable: {e}", site.name),
        }
    }
    None
}

/// The fixed assessment returned near a known site.
#[must_use]
pub fn override_assessment(site: &KnownRiskSite) -> RiskAssessment {
    RiskAssessment {
        risk_score: OVERRIDE_RISK_SCORE,
        risk_level: RiskLevel::High,
        reason: Some(site.name.clone()),
        anomaly_vectors: AnomalyVectors::default(),
        indicators: Vec::new(),
        thumbnail_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockEos, aoi_square};

    // One degree of latitude is ~111.195 km on the haversine sphere.
    const KM_PER_DEG_LAT: f64 = 111.195;

    fn site(name: &str, lon: f64, lat: f64) -> KnownRiskSite {
        KnownRiskSite {
            name: name.to_string(),
            longitude: lon,
            latitude: lat,
        }
    }

    #[tokio::test]
    async fn fires_just_inside_radius() {
        let sites = [site("Alpha", 30.0, 50.0)];
        let aoi = aoi_square(30.0, 50.0 + 9.9 / KM_PER_DEG_LAT, 0.001);
        let eos = MockEos::healthy();
        let hit = find_override_site(&eos, &aoi, &sites).await;
        assert_eq!(hit.map(|s| s.name.as_str()), Some("Alpha"));
    }

    #[tokio::test]
    async fn silent_just_outside_radius() {
        let sites = [site("Alpha", 30.0, 50.0)];
        let aoi = aoi_square(30.0, 50.0 + 10.1 / KM_PER_DEG_LAT, 0.001);
        let eos = MockEos::healthy();
        assert!(find_override_site(&eos, &aoi, &sites).await.is_none());
    }

    #[tokio::test]
    async fn first_site_in_range_wins() {
        let sites = [
            site("Far", 0.0, 0.0),
            site("Near A", 10.0, 10.01),
            site("Near B", 10.0, 10.0),
        ];
        let aoi = aoi_square(10.0, 10.0, 0.001);
        let eos = MockEos::healthy();
        let hit = find_override_site(&eos, &aoi, &sites).await;
        assert_eq!(hit.map(|s| s.name.as_str()), Some("Near A"));
    }

    #[test]
    fn override_is_high_with_no_vectors() {
        let assessment = override_assessment(&site("Alpha", 0.0, 0.0));
        assert!((assessment.risk_score - 92.0).abs() < f64::EPSILON);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.reason.as_deref(), Some("Alpha"));
        assert!(assessment.anomaly_vectors.is_empty());
        assert!(assessment.indicators.is_empty());
    }
}
