use geo::Polygon;

use crate::model::{Feature, ZoneProperties};
use crate::precision::{round_multi_polygon, round_polygon};

/// One physical polygon of a zone, borrowing the properties of the feature
/// it was exploded from.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature<'a> {
    /// Index of the source feature in the input collection.
    pub source: usize,
    pub properties: &'a ZoneProperties,
    pub polygon: Polygon<f64>,
}

impl PolygonFeature<'_> {
    pub fn zone_name(&self) -> Option<&str> {
        self.properties.zone_name.as_deref()
    }

    pub fn label(&self) -> &str {
        self.properties.label()
    }
}

/// Explodes every multi-polygon into its parts and rounds the coordinates
/// to `precision` digits.
pub fn normalize<'a, I>(features: I, precision: u32) -> Vec<PolygonFeature<'a>>
where
    I: IntoIterator<Item = &'a Feature>,
{
    features
        .into_iter()
        .enumerate()
        .flat_map(|(source, feature)| {
            feature.geometry.iter().map(move |polygon| PolygonFeature {
                source,
                properties: &feature.properties,
                polygon: round_polygon(polygon, precision),
            })
        })
        .collect()
}

/// Same precision treatment without exploding the feature.
pub fn normalize_feature(feature: &Feature, precision: u32) -> Feature {
    Feature::new(
        feature.properties.clone(),
        round_multi_polygon(&feature.geometry, precision),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn feature(name: &str, polygons: Vec<Polygon<f64>>) -> Feature {
        Feature::new(
            ZoneProperties {
                zone_name: Some(name.to_string()),
                ..Default::default()
            },
            MultiPolygon::new(polygons),
        )
    }

    fn island(x: f64) -> Polygon<f64> {
        polygon![
            (x: x + 0.123_456_789, y: 0.0),
            (x: x + 1.0, y: 0.0),
            (x: x + 1.0, y: 1.000_000_4),
        ]
    }

    #[test]
    fn test_multipolygon_parts_share_properties() {
        let features = vec![
            feature("A", vec![island(0.0)]),
            feature("B", vec![island(5.0), island(10.0), island(15.0)]),
        ];

        let polygons = normalize(&features, 6);
        assert_eq!(polygons.len(), 4);
        assert_eq!(polygons[0].zone_name(), Some("A"));
        assert!(polygons[1..].iter().all(|p| p.zone_name() == Some("B")));
        assert!(polygons[1..].iter().all(|p| p.source == 1));
        assert_eq!(polygons[0].polygon.exterior().0[0].x, 0.123_457);
        assert_eq!(polygons[0].polygon.exterior().0[2].y, 1.0);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let features = vec![feature("B", vec![island(5.0), island(10.0)])];
        let once = normalize(&features, 6);

        let rebuilt: Vec<Feature> = once
            .iter()
            .map(|p| Feature::new(p.properties.clone(), MultiPolygon::new(vec![p.polygon.clone()])))
            .collect();
        let twice = normalize(&rebuilt, 6);

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(a.polygon, b.polygon);
            assert_eq!(a.properties, b.properties);
        }
    }

    #[test]
    fn test_empty_geometry_yields_no_polygons() {
        let features = vec![feature("A", vec![])];
        assert!(normalize(&features, 6).is_empty());
    }
}
