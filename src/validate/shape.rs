use std::collections::BTreeMap;

use geo::Polygon;
use rayon::prelude::*;
use tracing::warn;

use crate::geometry::{convex_deviation, union_polygons};
use crate::normalize::PolygonFeature;

/// Polygons whose convex-hull deviation exceeds `max_deviation`.
pub fn complex_polygons(polygons: &[PolygonFeature<'_>], max_deviation: f64) -> Vec<String> {
    polygons
        .par_iter()
        .filter_map(|polygon| {
            let deviation = convex_deviation(&polygon.polygon);
            if deviation.is_infinite() {
                warn!("{} has a degenerate convex hull", polygon.label());
            }
            (deviation > max_deviation).then(|| {
                format!(
                    "{} is too complex (convex deviation {:.3} > {})",
                    polygon.label(),
                    deviation,
                    max_deviation
                )
            })
        })
        .collect()
}

/// Zones with two or more polygons that touch or overlap each other.
///
/// Separate islands are fine; parts that dissolve into one another should
/// have been a single polygon.
pub fn neighboring_duplicates(polygons: &[PolygonFeature<'_>]) -> Vec<String> {
    // ゾーン名ごとにポリゴンをまとめる
    let mut groups: BTreeMap<&str, Vec<Polygon<f64>>> = BTreeMap::new();
    for polygon in polygons {
        if let Some(name) = polygon.zone_name() {
            groups.entry(name).or_default().push(polygon.polygon.clone());
        }
    }

    // 結合して数が減れば接しているポリゴンがある
    let groups: Vec<_> = groups.into_iter().filter(|(_, parts)| parts.len() > 1).collect();
    groups
        .par_iter()
        .filter_map(|(name, parts)| {
            let merged = union_polygons(parts).0.len();
            (merged < parts.len()).then(|| {
                format!(
                    "{} has {} neighboring polygons that dissolve into {}",
                    name,
                    parts.len(),
                    merged
                )
            })
        })
        .collect()
}
