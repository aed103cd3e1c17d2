use geo::{coord, Rect};
use serde::Serialize;

use crate::error::{GeoError, Result};
use crate::geometry::multi_bounding_rect;
use crate::model::Feature;
use crate::precision::round_to;

/// `[[min_lon, min_lat], [max_lon, max_lat]]`
pub type BoundingBox = [[f64; 2]; 2];

#[derive(Serialize)]
struct Snippet {
    bounding_box: BoundingBox,
}

/// Bounding box of every polygon named `zone`, widened by `padding` degrees
/// on each side.
pub fn zone_bounding_box(
    features: &[Feature],
    zone: &str,
    padding: f64,
    precision: u32,
) -> Result<BoundingBox> {
    let rect = features
        .iter()
        .filter(|feature| feature.zone_name() == Some(zone))
        .filter_map(|feature| multi_bounding_rect(&feature.geometry))
        .reduce(|a, b| {
            Rect::new(
                coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        })
        .ok_or_else(|| GeoError::ZoneNotFound {
            zone: zone.to_string(),
        })?;

    Ok([
        [
            round_to(rect.min().x - padding, precision),
            round_to(rect.min().y - padding, precision),
        ],
        [
            round_to(rect.max().x + padding, precision),
            round_to(rect.max().y + padding, precision),
        ],
    ])
}

/// Renders the box as a `bounding_box:` entry of a zone config file.
pub fn to_yaml_snippet(bounding_box: BoundingBox) -> Result<String> {
    Ok(serde_yaml::to_string(&Snippet { bounding_box })?)
}
