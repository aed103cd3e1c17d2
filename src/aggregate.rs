use std::collections::{BTreeSet, HashMap};

use geo::Polygon;
use rayon::prelude::*;
use tracing::{error, info};

use crate::config::ZonesConfig;
use crate::error::{GeoError, Result};
use crate::geometry::union_polygons;
use crate::model::{AggregatedFeature, Feature, ViewRole, ZoneProperties};
use crate::normalize::normalize_feature;
use crate::precision::round_multi_polygon;

/// Builds the aggregated collection: every input zone tagged with its view
/// role, followed by one combined feature per country that declares sub-zones.
///
/// All sub-zones referenced by the config must have geometry; every missing
/// one is reported before failing.
pub fn aggregate(
    features: &[Feature],
    zones: &ZonesConfig,
    precision: u32,
) -> Result<Vec<AggregatedFeature>> {
    // 座標を正規化
    let normalized: Vec<Feature> = features
        .iter()
        .map(|feature| normalize_feature(feature, precision))
        .collect();

    // ゾーン名ごとにまとめる
    let mut by_zone: HashMap<&str, Vec<&Feature>> = HashMap::new();
    for feature in &normalized {
        if let Some(name) = feature.zone_name() {
            by_zone.entry(name).or_default().push(feature);
        }
    }

    // サブゾーンを持つ国を抽出
    let countries: Vec<(&String, &[String])> = zones
        .iter()
        .filter(|(_, zone)| zone.has_sub_zones())
        .map(|(key, zone)| (key, zone.sub_zones()))
        .collect();

    // 参照されているサブゾーンが全て存在するか確認
    let mut missing: Vec<String> = Vec::new();
    for (_, sub_zones) in &countries {
        for sub_zone in sub_zones.iter() {
            if !by_zone.contains_key(sub_zone.as_str()) && !missing.contains(sub_zone) {
                missing.push(sub_zone.clone());
            }
        }
    }
    if !missing.is_empty() {
        for zone in &missing {
            error!("Sub-zone {} is listed in the zones config but has no geometry", zone);
        }
        return Err(GeoError::MissingSubZones { zones: missing });
    }

    let sub_zone_names: BTreeSet<&str> = countries
        .iter()
        .flat_map(|(_, sub_zones)| sub_zones.iter().map(String::as_str))
        .collect();

    // 入力ゾーンに表示上の役割を付与
    let mut aggregated: Vec<AggregatedFeature> = normalized
        .iter()
        .map(|feature| {
            let role = match feature.zone_name() {
                Some(name) if sub_zone_names.contains(name) => ViewRole::SubZone,
                _ => ViewRole::Standalone,
            };
            AggregatedFeature {
                feature: feature.clone(),
                role,
            }
        })
        .collect();

    // 国ごとにサブゾーンを並列で結合
    let combined: Vec<AggregatedFeature> = countries
        .par_iter()
        .map(|(country, sub_zones)| {
            let members: Vec<&Feature> = sub_zones
                .iter()
                .flat_map(|name| by_zone[name.as_str()].iter().copied())
                .collect();
            combine_country(country, &members, precision)
        })
        .collect();

    info!(
        "Aggregated {} zones and {} combined countries",
        aggregated.len(),
        combined.len()
    );
    aggregated.extend(combined);
    Ok(aggregated)
}

fn combine_country(country: &str, members: &[&Feature], precision: u32) -> AggregatedFeature {
    let polygons: Vec<Polygon<f64>> = members
        .iter()
        .flat_map(|feature| feature.geometry.iter().cloned())
        .collect();
    // 結合結果は丸め直す
    let geometry = round_multi_polygon(&union_polygons(&polygons), precision);

    // 国キーは最初のサブゾーンから取得（なければ設定キー）
    let first = members.first().map(|feature| &feature.properties);
    let country_key = first
        .and_then(|p| p.country_key.clone())
        .unwrap_or_else(|| country.to_string());
    let properties = ZoneProperties {
        zone_name: Some(country_key.clone()),
        country_key: Some(country_key),
        country_name: first.and_then(|p| p.country_name.clone()),
        extra: Default::default(),
    };

    AggregatedFeature {
        feature: Feature::new(properties, geometry),
        role: ViewRole::Combined,
    }
}
