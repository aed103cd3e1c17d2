use std::fs;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{FeatureCollection, GeoJson, Geometry, Value};

use crate::error::{GeoError, Result};
use crate::model::{Feature, ZoneProperties};

/// Reads the world GeoJSON file into zone features.
pub fn read_world(path: &Path) -> Result<Vec<Feature>> {
    let content = fs::read_to_string(path).map_err(|e| GeoError::io(path, e))?;
    let geojson = content
        .parse::<GeoJson>()
        .map_err(|source| GeoError::GeoJson {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

    match geojson {
        GeoJson::FeatureCollection(collection) => features_from_collection(collection),
        _ => Err(GeoError::NotFeatureCollection {
            path: path.to_path_buf(),
        }),
    }
}

/// Converts a GeoJSON collection. Only Polygon and MultiPolygon geometries
/// are accepted; a missing geometry becomes an empty multi-polygon.
pub fn features_from_collection(collection: FeatureCollection) -> Result<Vec<Feature>> {
    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = to_multi_polygon(index, feature.geometry)?;
            let properties = ZoneProperties::from_json(feature.properties.unwrap_or_default());
            Ok(Feature::new(properties, geometry))
        })
        .collect()
}

fn to_multi_polygon(index: usize, geometry: Option<Geometry>) -> Result<MultiPolygon<f64>> {
    // ジオメトリなしは空として扱い、検証で null geometry として報告する
    let Some(geometry) = geometry else {
        return Ok(MultiPolygon::new(vec![]));
    };

    match geometry.value {
        Value::Polygon(rings) => Ok(MultiPolygon::new(
            polygon_from_rings(index, rings)?.into_iter().collect(),
        )),
        Value::MultiPolygon(polygons) => {
            let mut parts = Vec::with_capacity(polygons.len());
            for rings in polygons {
                parts.extend(polygon_from_rings(index, rings)?);
            }
            Ok(MultiPolygon::new(parts))
        }
        other => Err(GeoError::UnsupportedGeometry {
            index,
            kind: geometry_type_name(&other).to_string(),
        }),
    }
}

fn geometry_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn polygon_from_rings(index: usize, rings: Vec<Vec<Vec<f64>>>) -> Result<Option<Polygon<f64>>> {
    let mut rings = rings
        .into_iter()
        .map(|ring| ring_from_positions(index, ring))
        .collect::<Result<Vec<_>>>()?
        .into_iter();
    // 外周リングがなければポリゴンなし
    let Some(exterior) = rings.next() else {
        return Ok(None);
    };
    Ok(Some(Polygon::new(exterior, rings.collect())))
}

fn ring_from_positions(index: usize, positions: Vec<Vec<f64>>) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            // 高さなど3番目以降の値は捨てる
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(GeoError::MalformedPosition {
                index,
                len: position.len(),
            }),
        })
        .collect()
}

fn ring_to_positions(ring: &LineString<f64>) -> Vec<Vec<f64>> {
    ring.coords().map(|c| vec![c.x, c.y]).collect()
}

pub fn polygon_to_geojson(polygon: &Polygon<f64>) -> Geometry {
    let mut rings = vec![ring_to_positions(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring_to_positions));
    Geometry::new(Value::Polygon(rings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn collection(value: serde_json::Value) -> FeatureCollection {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_polygon_and_multipolygon_features() {
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "zoneName": "A", "countryKey": "A" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "zoneName": "B" },
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [[[2, 0], [3, 0], [3, 1], [2, 0]]],
                            [[[4, 0], [5, 0], [5, 1], [4, 0]]]
                        ]
                    }
                }
            ]
        }));

        let features = features_from_collection(fc).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].zone_name(), Some("A"));
        assert_eq!(features[0].geometry.0.len(), 1);
        assert_eq!(features[1].geometry.0.len(), 2);
        assert_eq!(features[1].geometry.0[1].exterior().0[0], Coord { x: 4.0, y: 0.0 });
    }

    #[test]
    fn test_null_and_empty_geometries_have_no_rings() {
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "zoneName": "A" }, "geometry": null },
                {
                    "type": "Feature",
                    "properties": { "zoneName": "B" },
                    "geometry": { "type": "Polygon", "coordinates": [] }
                }
            ]
        }));

        let features = features_from_collection(fc).unwrap();
        assert!(features.iter().all(|f| f.geometry.0.is_empty()));
    }

    #[test]
    fn test_unsupported_geometry_is_fatal() {
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "zoneName": "A" },
                    "geometry": { "type": "Point", "coordinates": [0, 0] }
                }
            ]
        }));

        let err = features_from_collection(fc).unwrap_err();
        match err {
            GeoError::UnsupportedGeometry { index, kind } => {
                assert_eq!(index, 0);
                assert_eq!(kind, "Point");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_position_is_fatal() {
        let ring = vec![vec![0.0, 0.0], vec![1.0], vec![1.0, 1.0], vec![0.0, 0.0]];
        let fc = FeatureCollection {
            bbox: None,
            features: vec![
                geojson::Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Polygon(vec![vec![
                        vec![0.0, 0.0],
                        vec![1.0, 0.0],
                        vec![0.0, 0.0],
                    ]]))),
                    id: None,
                    properties: None,
                    foreign_members: None,
                },
                geojson::Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::MultiPolygon(vec![vec![ring]]))),
                    id: None,
                    properties: None,
                    foreign_members: None,
                },
            ],
            foreign_members: None,
        };

        let err = features_from_collection(fc).unwrap_err();
        assert!(matches!(err, GeoError::MalformedPosition { index: 1, len: 1 }));
    }

    #[test]
    fn test_read_world_rejects_bare_geometry() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"type": "Point", "coordinates": [0, 0]}}"#).unwrap();

        let err = read_world(file.path()).unwrap_err();
        assert!(matches!(err, GeoError::NotFeatureCollection { .. }));
    }

    #[test]
    fn test_polygon_to_geojson_keeps_holes() {
        let polygon = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 0.0)]),
            vec![LineString::from(vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)])],
        );
        let Value::Polygon(rings) = polygon_to_geojson(&polygon).value else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[1][0], vec![1.0, 1.0]);
    }
}
