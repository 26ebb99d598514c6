//! Area-of-interest polygon validation and `GeoJSON` conversion.
//!
//! Only single `Polygon` geometries are accepted. Rings do not have to be
//! closed by the caller; [`Polygon::new`] closes them.

use geo::{Area, Centroid, Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons an AOI geometry is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The geometry is not a `Polygon`.
    #[error("unsupported geometry type '{0}': only Polygon is supported")]
    UnsupportedType(String),

    /// The polygon has no rings at all.
    #[error("polygon has no rings")]
    NoRings,

    /// A position does not carry at least a longitude and a latitude.
    #[error("ring {ring}, position {position}: expected [longitude, latitude]")]
    MalformedPosition {
        /// Ring index (0 is the exterior ring).
        ring: usize,
        /// Position index within the ring.
        position: usize,
    },

    /// A coordinate is not finite or lies outside WGS84 bounds.
    #[error("ring {ring}, position {position}: coordinate ({lon}, {lat}) is out of range")]
    OutOfRange {
        /// Ring index (0 is the exterior ring).
        ring: usize,
        /// Position index within the ring.
        position: usize,
        /// Offending longitude.
        lon: f64,
        /// Offending latitude.
        lat: f64,
    },

    /// A ring has fewer than three distinct positions.
    #[error("ring {ring} has {count} distinct positions, at least 3 are required")]
    TooFewPositions {
        /// Ring index (0 is the exterior ring).
        ring: usize,
        /// Number of distinct positions found.
        count: usize,
    },

    /// The exterior ring encloses no area (all positions collinear).
    #[error("polygon exterior ring encloses zero area")]
    Degenerate,
}

/// A validated single-polygon area of interest in WGS84 (lon, lat).
///
/// Serializes to and from a `GeoJSON` geometry object so it can travel
/// inside EOS request bodies unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "geojson::Geometry", into = "geojson::Geometry")]
pub struct AreaOfInterest {
    polygon: Polygon<f64>,
}

impl AreaOfInterest {
    /// Builds an AOI from `GeoJSON`-style polygon rings
    /// (`[[[lon, lat], ...], ...]`). The first ring is the exterior.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if there are no rings, a position is
    /// malformed or out of range, a ring has fewer than three distinct
    /// positions, or the exterior ring is degenerate.
    pub fn from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Self, GeometryError> {
        let mut line_strings = Vec::with_capacity(rings.len());

        for (ring_idx, ring) in rings.iter().enumerate() {
            let mut coords = Vec::with_capacity(ring.len() + 1);

            for (pos_idx, position) in ring.iter().enumerate() {
                let [lon, lat, ..] = position.as_slice() else {
                    return Err(GeometryError::MalformedPosition {
                        ring: ring_idx,
                        position: pos_idx,
                    });
                };
                if !lon.is_finite()
                    || !lat.is_finite()
                    || lon.abs() > 180.0
                    || lat.abs() > 90.0
                {
                    return Err(GeometryError::OutOfRange {
                        ring: ring_idx,
                        position: pos_idx,
                        lon: *lon,
                        lat: *lat,
                    });
                }
                coords.push(Coord { x: *lon, y: *lat });
            }

            let count = distinct_positions(&coords);
            if count < 3 {
                return Err(GeometryError::TooFewPositions {
                    ring: ring_idx,
                    count,
                });
            }

            line_strings.push(LineString::from(coords));
        }

        let mut rings_iter = line_strings.into_iter();
        let Some(exterior) = rings_iter.next() else {
            return Err(GeometryError::NoRings);
        };

        let polygon = Polygon::new(exterior, rings_iter.collect());
        if polygon.unsigned_area() <= 0.0 {
            return Err(GeometryError::Degenerate);
        }

        Ok(Self { polygon })
    }

    /// Builds an AOI from a parsed `GeoJSON` geometry.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedType`] for anything other than
    /// a `Polygon`, or any error from [`Self::from_rings`].
    pub fn from_geojson(geometry: &geojson::Geometry) -> Result<Self, GeometryError> {
        match &geometry.value {
            geojson::Value::Polygon(rings) => Self::from_rings(rings),
            other => Err(GeometryError::UnsupportedType(
                geometry_type_name(other).to_string(),
            )),
        }
    }

    /// The underlying polygon, rings closed.
    #[must_use]
    pub const fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Planar centroid of the polygon.
    #[must_use]
    pub fn centroid(&self) -> Option<Point<f64>> {
        self.polygon.centroid()
    }

    /// Converts the AOI back into a `GeoJSON` geometry.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::from(&self.polygon))
    }
}

impl TryFrom<geojson::Geometry> for AreaOfInterest {
    type Error = GeometryError;

    fn try_from(geometry: geojson::Geometry) -> Result<Self, Self::Error> {
        Self::from_geojson(&geometry)
    }
}

impl From<AreaOfInterest> for geojson::Geometry {
    fn from(aoi: AreaOfInterest) -> Self {
        aoi.to_geojson()
    }
}

/// Counts distinct positions in a ring, ignoring repeats such as the
/// closing position.
fn distinct_positions(coords: &[Coord<f64>]) -> usize {
    let mut keys: Vec<(u64, u64)> = coords
        .iter()
        .map(|c| (c.x.to_bits(), c.y.to_bits()))
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

const fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec<Vec<f64>>> {
        vec![vec![
            vec![30.0, 51.0],
            vec![30.1, 51.0],
            vec![30.1, 51.1],
            vec![30.0, 51.1],
        ]]
    }

    #[test]
    fn open_ring_is_closed() {
        let aoi = AreaOfInterest::from_rings(&square()).unwrap();
        let exterior = aoi.polygon().exterior();
        assert!(exterior.is_closed());
        assert_eq!(exterior.0.len(), 5);
    }

    #[test]
    fn closed_ring_is_accepted_unchanged() {
        let mut rings = square();
        rings[0].push(vec![30.0, 51.0]);
        let aoi = AreaOfInterest::from_rings(&rings).unwrap();
        assert_eq!(aoi.polygon().exterior().0.len(), 5);
    }

    #[test]
    fn centroid_of_square() {
        let aoi = AreaOfInterest::from_rings(&square()).unwrap();
        let c = aoi.centroid().unwrap();
        assert!((c.x() - 30.05).abs() < 1e-9);
        assert!((c.y() - 51.05).abs() < 1e-9);
    }

    #[test]
    fn rejects_empty_polygon() {
        assert_eq!(AreaOfInterest::from_rings(&[]), Err(GeometryError::NoRings));
    }

    #[test]
    fn rejects_short_position() {
        let rings = vec![vec![vec![30.0], vec![30.1, 51.0], vec![30.1, 51.1]]];
        assert_eq!(
            AreaOfInterest::from_rings(&rings),
            Err(GeometryError::MalformedPosition {
                ring: 0,
                position: 0
            })
        );
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let rings = vec![vec![vec![30.0, 91.0], vec![30.1, 51.0], vec![30.1, 51.1]]];
        assert!(matches!(
            AreaOfInterest::from_rings(&rings),
            Err(GeometryError::OutOfRange { ring: 0, position: 0, .. })
        ));
    }

    #[test]
    fn rejects_nan() {
        let rings = vec![vec![
            vec![f64::NAN, 51.0],
            vec![30.1, 51.0],
            vec![30.1, 51.1],
        ]];
        assert!(matches!(
            AreaOfInterest::from_rings(&rings),
            Err(GeometryError::OutOfRange { .. })
        ));
    }

    #[test]
    fn closing_position_does_not_count_as_distinct() {
        let rings = vec![vec![vec![30.0, 51.0], vec![30.1, 51.0], vec![30.0, 51.0]]];
        assert_eq!(
            AreaOfInterest::from_rings(&rings),
            Err(GeometryError::TooFewPositions { ring: 0, count: 2 })
        );
    }

    #[test]
    fn rejects_collinear_exterior() {
        let rings = vec![vec![vec![30.0, 51.0], vec![30.1, 51.0], vec![30.2, 51.0]]];
        assert_eq!(
            AreaOfInterest::from_rings(&rings),
            Err(GeometryError::Degenerate)
        );
    }

    #[test]
    fn rejects_non_polygon_geojson() {
        let geometry = geojson::Geometry::new(geojson::Value::Point(vec![30.0, 51.0]));
        assert_eq!(
            AreaOfInterest::from_geojson(&geometry),
            Err(GeometryError::UnsupportedType("Point".to_string()))
        );
    }

    #[test]
    fn serializes_as_geojson_polygon() {
        let aoi = AreaOfInterest::from_rings(&square()).unwrap();
        let json = serde_json::to_value(&aoi).unwrap();
        assert_eq!(json["type"], "Polygon");
        assert_eq!(json["coordinates"][0].as_array().unwrap().len(), 5);

        let back: AreaOfInterest = serde_json::from_value(json).unwrap();
        assert_eq!(back, aoi);
    }

    #[test]
    fn deserializing_multipolygon_fails() {
        let json = serde_json::json!({
            "type": "MultiPolygon",
            "coordinates": [[[[30.0, 51.0], [30.1, 51.0], [30.1, 51.1], [30.0, 51.0]]]]
        });
        assert!(serde_json::from_value::<AreaOfInterest>(json).is_err());
    }
}
