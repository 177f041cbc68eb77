//! Minimal GeoJSON model for route files.
//!
//! Only the subset this crate consumes is modeled: a `FeatureCollection`
//! whose features carry `LineString` or `MultiLineString` geometries. Any
//! other geometry type deserializes into [`Geometry::Other`] and is ignored
//! rather than rejected, so route files may mix in points or polygons
//! without breaking the load.

use serde::Deserialize;

use crate::coord::LonLat;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// A GeoJSON Feature. Properties are not consumed and are dropped on parse.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

/// The geometry types honored by the route loader.
///
/// Positions are parsed as `Vec<f64>` rather than fixed pairs because
/// GeoJSON allows a third (elevation) component; only the first two are
/// used.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    /// Any other geometry type; ignored.
    #[serde(other)]
    Other,
}

/// Flattens every honored geometry in a collection into vertex paths.
///
/// `MultiLineString` contributes one path per member line. Positions with
/// fewer than two components or non-finite values are skipped. No minimum
/// length is enforced here; the loader discards too-short paths so it can
/// account for them.
pub fn extract_line_paths(collection: &FeatureCollection) -> Vec<Vec<LonLat>> {
    let mut paths = Vec::new();

    for feature in &collection.features {
        match &feature.geometry {
            Some(Geometry::LineString { coordinates }) => {
                paths.push(positions_to_path(coordinates));
            }
            Some(Geometry::MultiLineString { coordinates }) => {
                for line in coordinates {
                    paths.push(positions_to_path(line));
                }
            }
            Some(Geometry::Other) | None => {}
        }
    }

    paths
}

fn positions_to_path(positions: &[Vec<f64>]) -> Vec<LonLat> {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| LonLat::new(p[0], p[1]))
        .filter(LonLat::is_finite)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> FeatureCollection {
        serde_json::from_str(json).expect("valid test fixture")
    }

    #[test]
    fn test_line_string_extraction() {
        let collection = parse(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"name": "route 1"},
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[-74.0, 40.7], [-73.9, 40.8], [-73.8, 40.9]]
                    }
                }]
            }"#,
        );

        let paths = extract_line_paths(&collection);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 3);
        assert_eq!(paths[0][0], LonLat::new(-74.0, 40.7));
    }

    #[test]
    fn test_multi_line_string_yields_one_path_per_line() {
        let collection = parse(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "MultiLineString",
                        "coordinates": [
                            [[0.0, 0.0], [1.0, 1.0]],
                            [[2.0, 2.0], [3.0, 3.0], [4.0, 4.0]]
                        ]
                    }
                }]
            }"#,
        );

        let paths = extract_line_paths(&collection);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].len(), 2);
        assert_eq!(paths[1].len(), 3);
    }

    #[test]
    fn test_other_geometries_are_ignored() {
        let collection = parse(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}},
                    {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
                    {"type": "Feature", "geometry": null},
                    {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[5.0, 5.0], [6.0, 6.0]]}}
                ]
            }"#,
        );

        let paths = extract_line_paths(&collection);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0][1], LonLat::new(6.0, 6.0));
    }

    #[test]
    fn test_elevation_component_is_dropped() {
        let collection = parse(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[-74.0, 40.7, 10.0], [-73.9, 40.8, 12.5]]
                    }
                }]
            }"#,
        );

        let paths = extract_line_paths(&collection);
        assert_eq!(paths[0], vec![LonLat::new(-74.0, 40.7), LonLat::new(-73.9, 40.8)]);
    }

    #[test]
    fn test_malformed_positions_are_skipped() {
        let collection = parse(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[-74.0], [-73.9, 40.8], [-73.8, 40.9]]
                    }
                }]
            }"#,
        );

        let paths = extract_line_paths(&collection);
        assert_eq!(paths[0].len(), 2);
    }

    #[test]
    fn test_empty_collection() {
        let collection = parse(r#"{"type": "FeatureCollection", "features": []}"#);
        assert!(extract_line_paths(&collection).is_empty());
    }
}
