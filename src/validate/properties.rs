use std::collections::BTreeSet;

use crate::config::ZonesConfig;
use crate::model::{AggregatedFeature, Feature};
use crate::normalize::PolygonFeature;

/// Features with no coordinate rings.
pub fn null_geometries(features: &[Feature]) -> Vec<String> {
    features
        .iter()
        .enumerate()
        // 全ポリゴンの外周が空なら欠損
        .filter(|(_, feature)| {
            feature
                .geometry
                .iter()
                .all(|polygon| polygon.exterior().0.is_empty())
        })
        .map(|(index, feature)| {
            format!(
                "{} (feature {}) has null geometry",
                feature.properties.label(),
                index
            )
        })
        .collect()
}

/// Polygons carrying none of zoneName, countryKey and countryName.
pub fn missing_properties(polygons: &[PolygonFeature<'_>]) -> Vec<String> {
    polygons
        .iter()
        .enumerate()
        .filter(|(_, polygon)| {
            let props = polygon.properties;
            props.zone_name.is_none() && props.country_key.is_none() && props.country_name.is_none()
        })
        .map(|(index, polygon)| {
            format!(
                "polygon {} (feature {}) is missing zoneName, countryKey and countryName",
                index, polygon.source
            )
        })
        .collect()
}

/// Zone names in the geometry and keys of the zones config must match both ways.
pub fn zones_config_mismatches(features: &[AggregatedFeature], zones: &ZonesConfig) -> Vec<String> {
    let mut violations = Vec::new();
    let mut names = BTreeSet::new();

    // ジオメトリ側 → 設定側
    for (index, feature) in features.iter().enumerate() {
        match feature.zone_name() {
            None => violations.push(format!("feature {} has no zoneName", index)),
            Some(name) => {
                names.insert(name);
                if !zones.contains_key(name) {
                    violations.push(format!("{} is missing from the zones config", name));
                }
            }
        }
    }

    // 設定側 → ジオメトリ側
    for key in zones.keys() {
        if !names.contains(key.as_str()) {
            violations.push(format!("{} is in the zones config but has no geometry", key));
        }
    }

    violations
}
