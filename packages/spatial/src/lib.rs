#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for area attribution.
//!
//! Parses area boundaries from WKT or `GeoJSON` text, builds an R-tree over
//! their envelopes, and provides point-in-polygon lookups used to resolve
//! stations that carry coordinates but no usable area code.

pub mod normalize;

use std::collections::BTreeMap;

use evision_charging_models::AreaCode;
use geo::{Intersects, MultiPolygon};
use geojson::GeoJson;
use rstar::{AABB, RTree, RTreeObject};
use wkt::TryFromWkt;

pub use normalize::{GeometryNormalizer, NormalizedGeometries};

/// Errors that can occur while parsing boundary text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// The field was empty or described an empty geometry.
    #[error("geometry is empty")]
    Empty,

    /// The text is not valid WKT.
    #[error("invalid WKT: {message}")]
    Wkt {
        /// Parser message.
        message: String,
    },

    /// The text is not a valid `GeoJSON` geometry.
    #[error("invalid GeoJSON: {message}")]
    GeoJson {
        /// Parser message.
        message: String,
    },

    /// The geometry parsed but is not a polygon.
    #[error("expected Polygon or MultiPolygon, got {kind}")]
    NotPolygonal {
        /// Geometry type that was found.
        kind: &'static str,
    },
}

/// Parses boundary text into a [`MultiPolygon`].
///
/// Text starting with `{` is read as a `GeoJSON` geometry (or a feature
/// wrapping one); anything else as WKT. `Polygon` and `MultiPolygon` are
/// accepted, every other type is rejected.
///
/// # Errors
///
/// Returns [`GeometryError`] if the text is empty, malformed, or not
/// polygonal.
pub fn parse_geometry_text(text: &str) -> Result<MultiPolygon<f64>, GeometryError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GeometryError::Empty);
    }

    let geometry = if trimmed.starts_with('{') {
        parse_geojson(trimmed)?
    } else {
        geo::Geometry::<f64>::try_from_wkt_str(trimmed).map_err(|e| GeometryError::Wkt {
            message: e.to_string(),
        })?
    };

    let multi_polygon = match geometry {
        geo::Geometry::MultiPolygon(mp) => mp,
        geo::Geometry::Polygon(p) => MultiPolygon(vec![p]),
        other => {
            return Err(GeometryError::NotPolygonal {
                kind: geometry_kind(&other),
            });
        }
    };

    if multi_polygon.0.is_empty() || multi_polygon.0.iter().all(|p| p.exterior().0.is_empty()) {
        return Err(GeometryError::Empty);
    }

    Ok(multi_polygon)
}

fn parse_geojson(text: &str) -> Result<geo::Geometry<f64>, GeometryError> {
    let invalid = |message: String| GeometryError::GeoJson { message };

    let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| invalid(e.to_string()))?;
    let geometry = match geojson {
        GeoJson::Geometry(geometry) => geometry,
        GeoJson::Feature(feature) => feature
            .geometry
            .ok_or_else(|| invalid("feature has no geometry".to_string()))?,
        GeoJson::FeatureCollection(_) => {
            return Err(invalid("expected a geometry, got a FeatureCollection".to_string()));
        }
    };

    geometry
        .try_into()
        .map_err(|e: geojson::Error| invalid(e.to_string()))
}

const fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

/// Converts a boundary into a `GeoJSON` geometry for the presentation layer.
#[must_use]
pub fn to_geojson(boundary: &MultiPolygon<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(boundary))
}

/// A boundary polygon stored in the R-tree with its area code.
struct BoundaryEntry {
    area_code: AreaCode,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree of area boundaries for point-in-polygon attribution.
pub struct SpatialIndex {
    areas: RTree<BoundaryEntry>,
}

impl SpatialIndex {
    /// Builds the index from normalized boundaries.
    #[must_use]
    pub fn from_boundaries(boundaries: &BTreeMap<AreaCode, MultiPolygon<f64>>) -> Self {
        let entries = boundaries
            .iter()
            .map(|(area_code, polygon)| BoundaryEntry {
                area_code: area_code.clone(),
                envelope: compute_envelope(polygon),
                polygon: polygon.clone(),
            })
            .collect::<Vec<_>>();

        let areas = RTree::bulk_load(entries);
        log::info!("Loaded {} area boundaries into spatial index", areas.size());

        Self { areas }
    }

    /// Number of indexed boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.areas.size()
    }

    /// Returns `true` if no boundaries are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.areas.size() == 0
    }

    /// Looks up the area containing a point. Boundary points count as
    /// inside.
    ///
    /// A point on an edge shared by adjacent areas, or inside overlapping
    /// boundaries, matches several areas; the smallest area code wins.
    #[must_use]
    pub fn lookup_area(&self, lng: f64, lat: f64) -> Option<&AreaCode> {
        let point = geo::Point::new(lng, lat);
        let query_env = AABB::from_point([lng, lat]);

        self.areas
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.intersects(&point))
            .map(|entry| &entry.area_code)
            .min()
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    use geo::BoundingRect;

    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use evision_charging_models::AreaCodeRange;

    use super::*;

    pub(crate) fn square_wkt(min_x: f64, min_y: f64, size: f64) -> String {
        let (max_x, max_y) = (min_x + size, min_y + size);
        format!(
            "POLYGON(({min_x} {min_y}, {max_x} {min_y}, {max_x} {max_y}, {min_x} {max_y}, {min_x} {min_y}))"
        )
    }

    fn code(raw: &str) -> AreaCode {
        AreaCode::parse(raw, AreaCodeRange::new(0, 99_999)).unwrap()
    }

    #[test]
    fn parses_wkt_polygon() {
        let mp = parse_geometry_text(&square_wkt(13.0, 52.0, 1.0)).unwrap();
        assert_eq!(mp.0.len(), 1);
    }

    #[test]
    fn parses_wkt_multipolygon() {
        let mp = parse_geometry_text(
            "MULTIPOLYGON(((0 0, 1 0, 1 1, 0 1, 0 0)), ((2 2, 3 2, 3 3, 2 3, 2 2)))",
        )
        .unwrap();
        assert_eq!(mp.0.len(), 2);
    }

    #[test]
    fn parses_geojson_polygon() {
        let mp = parse_geometry_text(
            r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#,
        )
        .unwrap();
        assert_eq!(mp.0.len(), 1);
    }

    #[test]
    fn rejects_empty_malformed_and_non_polygon() {
        assert_eq!(parse_geometry_text("  "), Err(GeometryError::Empty));
        assert!(matches!(
            parse_geometry_text("POLYGON((0 0, 1"),
            Err(GeometryError::Wkt { .. })
        ));
        assert_eq!(
            parse_geometry_text("POINT(13.4 52.5)"),
            Err(GeometryError::NotPolygonal { kind: "Point" })
        );
        assert!(matches!(
            parse_geometry_text(r#"{"type":"Point""#),
            Err(GeometryError::GeoJson { .. })
        ));
    }

    #[test]
    fn looks_up_containing_area() {
        let mut boundaries = BTreeMap::new();
        boundaries.insert(
            code("10115"),
            parse_geometry_text(&square_wkt(13.0, 52.0, 1.0)).unwrap(),
        );
        boundaries.insert(
            code("10117"),
            parse_geometry_text(&square_wkt(14.0, 52.0, 1.0)).unwrap(),
        );
        let index = SpatialIndex::from_boundaries(&boundaries);

        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup_area(13.5, 52.5).map(AreaCode::as_str), Some("10115"));
        assert_eq!(index.lookup_area(14.5, 52.5).map(AreaCode::as_str), Some("10117"));
        assert_eq!(index.lookup_area(20.0, 52.5), None);
    }

    #[test]
    fn overlapping_areas_resolve_to_smallest_code() {
        let mut boundaries = BTreeMap::new();
        boundaries.insert(
            code("12000"),
            parse_geometry_text(&square_wkt(0.0, 0.0, 10.0)).unwrap(),
        );
        boundaries.insert(
            code("11000"),
            parse_geometry_text(&square_wkt(4.0, 4.0, 2.0)).unwrap(),
        );
        let index = SpatialIndex::from_boundaries(&boundaries);

        assert_eq!(index.lookup_area(5.0, 5.0).map(AreaCode::as_str), Some("11000"));
        assert_eq!(index.lookup_area(1.0, 1.0).map(AreaCode::as_str), Some("12000"));
    }

    #[test]
    fn point_on_shared_edge_goes_to_smallest_code() {
        let mut boundaries = BTreeMap::new();
        boundaries.insert(
            code("10117"),
            parse_geometry_text(&square_wkt(1.0, 0.0, 1.0)).unwrap(),
        );
        boundaries.insert(
            code("10115"),
            parse_geometry_text(&square_wkt(0.0, 0.0, 1.0)).unwrap(),
        );
        let index = SpatialIndex::from_boundaries(&boundaries);

        assert_eq!(index.lookup_area(1.0, 0.5).map(AreaCode::as_str), Some("10115"));
        assert_eq!(index.lookup_area(2.0, 0.5).map(AreaCode::as_str), Some("10117"));
        assert_eq!(index.lookup_area(0.0, 0.0).map(AreaCode::as_str), Some("10115"));
        assert_eq!(index.lookup_area(2.5, 0.5), None);
    }

    #[test]
    fn exports_geojson_multipolygon() {
        let mp = parse_geometry_text(&square_wkt(0.0, 0.0, 1.0)).unwrap();
        let geometry = to_geojson(&mp);
        assert!(matches!(geometry.value, geojson::Value::MultiPolygon(_)));
    }
}
