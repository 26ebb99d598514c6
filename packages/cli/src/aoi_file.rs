//! Loading an area of interest from a `GeoJSON` file.

use std::path::Path;

use eo_anomaly_models::AreaOfInterest;
use geojson::GeoJson;

/// Reads a polygon AOI from a bare geometry, a feature, or the first
/// feature of a feature collection.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not `GeoJSON`, has no
/// geometry, or the geometry is not a valid polygon.
pub fn load_aoi(path: &Path) -> Result<AreaOfInterest, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    parse_aoi(&text)
}

/// Parses a polygon AOI from `GeoJSON` text.
///
/// # Errors
///
/// See [`load_aoi`].
pub fn parse_aoi(text: &str) -> Result<AreaOfInterest, Box<dyn std::error::Error>> {
    let geometry = match text.parse::<GeoJson>()? {
        GeoJson::Geometry(geometry) => Some(geometry),
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .next()
            .and_then(|feature| feature.geometry),
    }
    .ok_or("GeoJSON contains no geometry")?;

    Ok(AreaOfInterest::from_geojson(&geometry)?)
}
