//! Thin layer over `geo` for the operations the pipeline relies on.
//!
//! Areas are spherical (Chamberlain-Duquette on the WGS84 equatorial radius)
//! in square metres, lengths are haversine kilometres.

use geo::{
    BooleanOps, BoundingRect, ChamberlainDuquetteArea, ConvexHull, Haversine, Length, LineString,
    MultiPolygon, Polygon, Rect,
};

pub fn area(polygon: &Polygon<f64>) -> f64 {
    polygon.chamberlain_duquette_unsigned_area()
}

pub fn multi_area(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.chamberlain_duquette_unsigned_area()
}

pub fn ring_length_km(ring: &LineString<f64>) -> f64 {
    ring.length::<Haversine>() / 1000.0
}

/// `(area(hull) - area) / area(hull)`. A hull without area counts as
/// infinitely complex.
pub fn convex_deviation(polygon: &Polygon<f64>) -> f64 {
    let hull_area = area(&polygon.convex_hull());
    if !hull_area.is_finite() || hull_area <= 0.0 {
        return f64::INFINITY;
    }
    (hull_area - area(polygon)) / hull_area
}

pub fn bounding_rect(polygon: &Polygon<f64>) -> Option<Rect<f64>> {
    polygon.bounding_rect()
}

pub fn multi_bounding_rect(geometry: &MultiPolygon<f64>) -> Option<Rect<f64>> {
    geometry.bounding_rect()
}

pub fn intersection_area(a: &Polygon<f64>, b: &Polygon<f64>) -> f64 {
    multi_area(&a.intersection(b))
}

pub fn union_pair(a: MultiPolygon<f64>, b: MultiPolygon<f64>) -> MultiPolygon<f64> {
    if a.0.is_empty() {
        return b;
    }
    if b.0.is_empty() {
        return a;
    }
    a.union(&b)
}

/// Dissolves all parts into one geometry.
///
/// Halves are unioned on the rayon pool; the split points only depend on the
/// input length so the output is identical run to run.
pub fn union_all(parts: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
    match parts {
        [] => MultiPolygon::new(vec![]),
        [single] => single.clone(),
        _ => {
            let (left, right) = parts.split_at(parts.len() / 2);
            let (left, right) = rayon::join(|| union_all(left), || union_all(right));
            union_pair(left, right)
        }
    }
}

pub fn union_polygons(polygons: &[Polygon<f64>]) -> MultiPolygon<f64> {
    let parts: Vec<MultiPolygon<f64>> = polygons
        .iter()
        .map(|polygon| MultiPolygon::new(vec![polygon.clone()]))
        .collect();
    union_all(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]
    }

    #[test]
    fn test_area_of_one_degree_square_at_equator() {
        // 1度四方 ≒ 111.3km × 111.3km
        let a = area(&square(0.0, 0.0, 1.0));
        assert!((a - 1.239e10).abs() / 1.239e10 < 0.01, "area = {a}");
    }

    #[test]
    fn test_convex_square_has_no_deviation() {
        assert!(convex_deviation(&square(0.0, 0.0, 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_notched_square_deviation() {
        let notched = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 0.5),
            (x: 0.5, y: 0.5),
            (x: 0.5, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        let deviation = convex_deviation(&notched);
        // 凸包 0.875、面積 0.75
        assert!((deviation - 0.125 / 0.875).abs() < 1e-3, "deviation = {deviation}");
    }

    #[test]
    fn test_degenerate_polygon_is_maximally_complex() {
        let line = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        assert_eq!(convex_deviation(&line), f64::INFINITY);
    }

    #[test]
    fn test_union_all_merges_touching_squares() {
        let merged = union_polygons(&[
            square(0.0, 0.0, 1.0),
            square(1.0, 0.0, 1.0),
            square(5.0, 0.0, 1.0),
        ]);
        assert_eq!(merged.0.len(), 2);
        let expected = area(&square(0.0, 0.0, 1.0)) * 2.0 + area(&square(5.0, 0.0, 1.0));
        assert!((multi_area(&merged) - expected).abs() / expected < 1e-6);
    }

    #[test]
    fn test_union_all_of_nothing_is_empty() {
        assert!(union_all(&[]).0.is_empty());
    }

    #[test]
    fn test_shared_edge_has_no_intersection_area() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(1.0, 0.0, 1.0);
        assert!(intersection_area(&a, &b) < 1.0);
    }

    #[test]
    fn test_ring_length_km() {
        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        assert!((ring_length_km(&ring) - 111.19).abs() < 0.1);
    }
}
