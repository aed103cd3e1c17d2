use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::model::{AggregatedFeature, Feature};

/// Rounds to a fixed number of decimal digits. `-0.0` becomes `0.0`.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn round_coord(coord: Coord<f64>, precision: u32) -> Coord<f64> {
    Coord {
        x: round_to(coord.x, precision),
        y: round_to(coord.y, precision),
    }
}

/// Rounds every vertex and drops consecutive duplicates created by the rounding.
pub fn round_ring(ring: &LineString<f64>, precision: u32) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for coord in ring.coords() {
        let rounded = round_coord(*coord, precision);
        if coords.last() != Some(&rounded) {
            coords.push(rounded);
        }
    }
    LineString::new(coords)
}

pub fn round_polygon(polygon: &Polygon<f64>, precision: u32) -> Polygon<f64> {
    Polygon::new(
        round_ring(polygon.exterior(), precision),
        polygon
            .interiors()
            .iter()
            .map(|ring| round_ring(ring, precision))
            .collect(),
    )
}

pub fn round_multi_polygon(geometry: &MultiPolygon<f64>, precision: u32) -> MultiPolygon<f64> {
    MultiPolygon::new(
        geometry
            .iter()
            .map(|polygon| round_polygon(polygon, precision))
            .collect(),
    )
}

/// Rounds the whole aggregated collection for output. Roles and
/// properties are carried over unchanged.
pub fn round_features(features: &[AggregatedFeature], precision: u32) -> Vec<AggregatedFeature> {
    features
        .iter()
        .map(|f| AggregatedFeature {
            feature: Feature::new(
                f.feature.properties.clone(),
                round_multi_polygon(&f.feature.geometry, precision),
            ),
            role: f.role,
        })
        .collect()
}
