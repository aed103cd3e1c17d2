use std::fmt;

use geo::Polygon;
use rayon::prelude::*;

use crate::geometry::{area, bounding_rect, ring_length_km, union_polygons};
use crate::normalize::PolygonFeature;

/// A hole left between zones after dissolving the whole world.
#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    pub polygon: Polygon<f64>,
    /// m²
    pub area: f64,
    /// Perimeter in km per m² of area.
    pub ratio: f64,
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match bounding_rect(&self.polygon) {
            Some(rect) => {
                let center = rect.center();
                write!(
                    f,
                    "Found gap around [{:.4}, {:.4}] ({:.0} m²)",
                    center.x, center.y, self.area
                )
            }
            None => write!(f, "Found gap ({:.0} m²)", self.area),
        }
    }
}

/// Interior rings of the dissolved world smaller than `min_area` and
/// with a perimeter/area ratio above `sliver_ratio`.
///
/// Larger holes are lakes or enclaved countries without a zone and are
/// left alone.
pub fn find_gaps(polygons: &[PolygonFeature<'_>], min_area: f64, sliver_ratio: f64) -> Vec<Gap> {
    // 全ゾーンを1つに結合
    let parts: Vec<Polygon<f64>> = polygons.iter().map(|p| p.polygon.clone()).collect();
    let world = union_polygons(&parts);

    // 内周リング（穴）を取り出す
    let holes: Vec<Polygon<f64>> = world
        .iter()
        .flat_map(|polygon| polygon.interiors().iter())
        .map(|ring| Polygon::new(ring.clone(), vec![]))
        .collect();

    holes
        .into_par_iter()
        .filter_map(|hole| {
            // 面積と周長/面積比で判定
            let hole_area = area(&hole);
            if hole_area <= 0.0 || hole_area >= min_area {
                return None;
            }
            let ratio = ring_length_km(hole.exterior()) / hole_area;
            (ratio > sliver_ratio).then_some(Gap {
                polygon: hole,
                area: hole_area,
                ratio,
            })
        })
        .collect()
}
