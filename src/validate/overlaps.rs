use std::collections::{BTreeSet, HashSet};

use geo::Rect;
use rayon::prelude::*;

use crate::geometry::{bounding_rect, intersection_area};
use crate::model::AggregatedFeature;
use crate::normalize::{normalize, PolygonFeature};

/// Pairs of zones whose polygons overlap by more than `min_area` m².
///
/// Every zone of a country that has a combined shape is skipped, the
/// combined shape included. Each offending pair is reported once, names
/// sorted.
pub fn find_overlaps(features: &[AggregatedFeature], min_area: f64, precision: u32) -> Vec<String> {
    // 統合済みの国に属するゾーンは対象外
    let combined_countries: HashSet<&str> = features
        .iter()
        .filter(|f| f.role.is_combined())
        .filter_map(|f| f.feature.country_key())
        .collect();
    let polygons = normalize(
        features
            .iter()
            .filter(|f| !f.role.is_combined())
            .filter(|f| {
                !matches!(f.feature.country_key(), Some(key) if combined_countries.contains(key))
            })
            .map(|f| &f.feature),
        precision,
    );

    // 外接矩形で候補を絞り、実際の重なり面積を並列で計算
    let pairs = candidate_pairs(&polygons);
    let overlapping: BTreeSet<(&str, &str)> = pairs
        .par_iter()
        .filter(|(a, b)| intersection_area(&a.polygon, &b.polygon) > min_area)
        .map(|(a, b)| {
            let (a, b) = (a.label(), b.label());
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        })
        .collect();

    overlapping
        .into_iter()
        .map(|(a, b)| format!("{} overlaps {}", a, b))
        .collect()
}

/// Polygon pairs of different zones whose bounding boxes intersect.
///
/// Sweeps along x so only boxes that share an x range are compared.
fn candidate_pairs<'p, 'a>(
    polygons: &'p [PolygonFeature<'a>],
) -> Vec<(&'p PolygonFeature<'a>, &'p PolygonFeature<'a>)> {
    let mut boxed: Vec<(Rect<f64>, &PolygonFeature<'a>)> = polygons
        .iter()
        .filter_map(|p| bounding_rect(&p.polygon).map(|rect| (rect, p)))
        .collect();
    boxed.sort_by(|(a, _), (b, _)| a.min().x.total_cmp(&b.min().x));

    let mut pairs = Vec::new();
    for (i, (rect, polygon)) in boxed.iter().enumerate() {
        for (other_rect, other) in &boxed[i + 1..] {
            // x でソート済みなので以降は重ならない
            if other_rect.min().x > rect.max().x {
                break;
            }
            if other_rect.min().y > rect.max().y || other_rect.max().y < rect.min().y {
                continue;
            }
            if polygon.label() == other.label() {
                continue;
            }
            pairs.push((*polygon, *other));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Feature, ViewRole, ZoneProperties};
    use geo::{polygon, MultiPolygon, Polygon};

    fn zone(name: &str, role: ViewRole, polygons: Vec<Polygon<f64>>) -> AggregatedFeature {
        let country = match role {
            ViewRole::Standalone => name,
            _ => &name[..1],
        };
        AggregatedFeature {
            feature: Feature::new(
                ZoneProperties {
                    zone_name: Some(name.to_string()),
                    country_key: Some(country.to_string()),
                    ..Default::default()
                },
                MultiPolygon::new(polygons),
            ),
            role,
        }
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    #[test]
    fn test_shared_edge_is_not_an_overlap() {
        let features = vec![
            zone("A", ViewRole::Standalone, vec![rect(0.0, 0.0, 1.0, 1.0)]),
            zone("B", ViewRole::Standalone, vec![rect(1.0, 0.0, 2.0, 1.0)]),
        ];
        assert!(find_overlaps(&features, 6_000_000.0, 6).is_empty());
    }

    #[test]
    fn test_overlap_is_reported_once_with_both_names() {
        // 0.5 x 1 度の重なり ≒ 6,200 km²
        let features = vec![
            zone("B", ViewRole::Standalone, vec![rect(0.5, 0.0, 1.5, 1.0)]),
            zone("A", ViewRole::Standalone, vec![rect(0.0, 0.0, 1.0, 1.0)]),
        ];
        assert_eq!(find_overlaps(&features, 6_000_000.0, 6), vec!["A overlaps B"]);
    }

    #[test]
    fn test_small_overlap_is_tolerated() {
        // 0.0001 x 1 度 ≒ 1.2 km² は閾値未満
        let features = vec![
            zone("A", ViewRole::Standalone, vec![rect(0.0, 0.0, 1.0, 1.0)]),
            zone("B", ViewRole::Standalone, vec![rect(0.9999, 0.0, 2.0, 1.0)]),
        ];
        assert!(find_overlaps(&features, 6_000_000.0, 6).is_empty());
    }

    #[test]
    fn test_combined_country_is_not_compared_with_its_sub_zones() {
        let features = vec![
            zone("B1", ViewRole::SubZone, vec![rect(0.0, 0.0, 1.0, 1.0)]),
            zone("B2", ViewRole::SubZone, vec![rect(1.0, 0.0, 2.0, 1.0)]),
            zone("B", ViewRole::Combined, vec![rect(0.0, 0.0, 2.0, 1.0)]),
        ];
        assert!(find_overlaps(&features, 6_000_000.0, 6).is_empty());
    }

    #[test]
    fn test_zones_of_combined_country_are_skipped() {
        // B1 と B2 は約 6,200 km² 重なるが、B は統合済み
        let features = vec![
            zone("A", ViewRole::Standalone, vec![rect(-1.0, 0.0, 0.0, 1.0)]),
            zone("B1", ViewRole::SubZone, vec![rect(0.0, 0.0, 1.0, 1.0)]),
            zone("B2", ViewRole::SubZone, vec![rect(0.5, 0.0, 2.0, 1.0)]),
            zone("B", ViewRole::Combined, vec![rect(0.0, 0.0, 2.0, 1.0)]),
        ];
        assert!(find_overlaps(&features, 6_000_000.0, 6).is_empty());
    }

    #[test]
    fn test_standalone_zones_still_checked_next_to_combined_country() {
        let features = vec![
            zone("A", ViewRole::Standalone, vec![rect(1.5, 0.0, 2.5, 1.0)]),
            zone("B1", ViewRole::SubZone, vec![rect(0.0, 0.0, 1.0, 1.0)]),
            zone("B2", ViewRole::SubZone, vec![rect(1.0, 0.0, 2.0, 1.0)]),
            zone("B", ViewRole::Combined, vec![rect(0.0, 0.0, 2.0, 1.0)]),
            zone("C", ViewRole::Standalone, vec![rect(2.0, 0.0, 3.0, 1.0)]),
        ];
        assert_eq!(find_overlaps(&features, 6_000_000.0, 6), vec!["A overlaps C"]);
    }

    #[test]
    fn test_sweep_skips_distant_boxes() {
        let polygons_source = vec![
            zone("A", ViewRole::Standalone, vec![rect(0.0, 0.0, 1.0, 1.0)]),
            zone("B", ViewRole::Standalone, vec![rect(0.5, 5.0, 1.5, 6.0)]),
            zone("C", ViewRole::Standalone, vec![rect(10.0, 0.0, 11.0, 1.0)]),
        ];
        let polygons = normalize(polygons_source.iter().map(|f| &f.feature), 6);
        assert!(candidate_pairs(&polygons).is_empty());
    }
}
