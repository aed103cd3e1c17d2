use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::{ExchangesConfig, ZonesConfig};
use crate::error::{GeoError, Result};

/// Exchange arrows hidden in each map view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeExclusions {
    /// Sub-zone exchanges, superseded by the country-level arrow.
    pub exchanges_to_exclude_country_view: Vec<String>,
    /// Country-level exchanges, superseded by the sub-zone arrows.
    pub exchanges_to_exclude_zone_view: Vec<String>,
}

/// Partitions exchange keys into the two exclusion lists, in key order.
pub fn exchanges_to_exclude(
    zones: &ZonesConfig,
    exchanges: &ExchangesConfig,
) -> Result<ExchangeExclusions> {
    // サブゾーンと、サブゾーンを持つ国の一覧
    let sub_zones: BTreeSet<&str> = zones
        .values()
        .flat_map(|zone| zone.sub_zones())
        .map(String::as_str)
        .collect();
    let split_countries: BTreeSet<&str> = zones
        .iter()
        .filter(|(_, zone)| zone.has_sub_zones())
        .map(|(key, _)| key.as_str())
        .collect();

    let mut exclusions = ExchangeExclusions::default();
    for key in exchanges.keys() {
        let (from, to) = split_exchange_key(key)?;
        let touches_sub_zone = sub_zones.contains(from) || sub_zones.contains(to);

        // 国表示ではサブゾーンに接続する矢印を隠す
        if touches_sub_zone {
            exclusions.exchanges_to_exclude_country_view.push(key.clone());
        }
        // ゾーン表示では分割された国同士の矢印を隠す（両端とも国であること）
        if !touches_sub_zone && (split_countries.contains(from) || split_countries.contains(to)) {
            exclusions.exchanges_to_exclude_zone_view.push(key.clone());
        }
    }
    Ok(exclusions)
}

fn split_exchange_key(key: &str) -> Result<(&str, &str)> {
    match key.split_once("->") {
        Some((from, to)) if !from.is_empty() && !to.is_empty() => Ok((from, to)),
        _ => Err(GeoError::MalformedExchangeKey {
            key: key.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExchangeConfig, ZoneConfig};

    fn zones() -> ZonesConfig {
        let mut zones = ZonesConfig::new();
        for key in ["A", "B1", "B2", "C"] {
            zones.insert(key.to_string(), ZoneConfig::default());
        }
        zones.insert(
            "B".to_string(),
            ZoneConfig {
                sub_zone_names: Some(vec!["B1".to_string(), "B2".to_string()]),
                ..Default::default()
            },
        );
        zones
    }

    fn exchanges(keys: &[&str]) -> ExchangesConfig {
        keys.iter()
            .map(|key| (key.to_string(), ExchangeConfig::default()))
            .collect()
    }

    #[test]
    fn test_sub_zone_exchange_is_hidden_in_country_view_only() {
        let exclusions = exchanges_to_exclude(&zones(), &exchanges(&["B1->A"])).unwrap();
        assert_eq!(exclusions.exchanges_to_exclude_country_view, vec!["B1->A"]);
        assert!(exclusions.exchanges_to_exclude_zone_view.is_empty());
    }

    #[test]
    fn test_partitions_every_kind_of_exchange() {
        let exclusions =
            exchanges_to_exclude(&zones(), &exchanges(&["A->B", "A->C", "B1->B2", "B2->C"]))
                .unwrap();

        assert_eq!(
            exclusions.exchanges_to_exclude_country_view,
            vec!["B1->B2", "B2->C"]
        );
        assert_eq!(exclusions.exchanges_to_exclude_zone_view, vec!["A->B"]);
    }

    #[test]
    fn test_country_to_foreign_sub_zone_stays_visible_in_zone_view() {
        let mut zones = zones();
        zones.insert(
            "X".to_string(),
            ZoneConfig {
                sub_zone_names: Some(vec!["X1".to_string(), "X2".to_string()]),
                ..Default::default()
            },
        );

        let exclusions = exchanges_to_exclude(&zones, &exchanges(&["B->X1", "B->X"])).unwrap();
        assert_eq!(exclusions.exchanges_to_exclude_country_view, vec!["B->X1"]);
        assert_eq!(exclusions.exchanges_to_exclude_zone_view, vec!["B->X"]);
    }

    #[test]
    fn test_serializes_with_camel_case_keys() {
        let exclusions = exchanges_to_exclude(&zones(), &exchanges(&["B1->A"])).unwrap();
        let json = serde_json::to_value(&exclusions).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "exchangesToExcludeCountryView": ["B1->A"],
                "exchangesToExcludeZoneView": [],
            })
        );
    }

    #[test]
    fn test_malformed_key_is_rejected() {
        let err = exchanges_to_exclude(&zones(), &exchanges(&["A-B"])).unwrap_err();
        assert!(matches!(err, GeoError::MalformedExchangeKey { key } if key == "A-B"));
    }
}
