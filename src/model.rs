use geo::MultiPolygon;
use serde_json::{Map, Value};

pub const ZONE_NAME: &str = "zoneName";
pub const COUNTRY_KEY: &str = "countryKey";
pub const COUNTRY_NAME: &str = "countryName";
pub const IS_AGGREGATED_VIEW: &str = "isAggregatedView";
pub const IS_HIGHEST_GRANULARITY: &str = "isHighestGranularity";
pub const IS_COMBINED: &str = "isCombined";
pub const CENTER: &str = "center";

/// Properties derived by the pipeline. They are dropped from input features.
const DERIVED_KEYS: [&str; 4] = [IS_AGGREGATED_VIEW, IS_HIGHEST_GRANULARITY, IS_COMBINED, CENTER];

/// Property bag of a zone feature.
///
/// The three identifying keys are lifted out; everything else is passed
/// through to the topology output untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneProperties {
    pub zone_name: Option<String>,
    pub country_key: Option<String>,
    pub country_name: Option<String>,
    pub extra: Map<String, Value>,
}

impl ZoneProperties {
    pub fn from_json(mut map: Map<String, Value>) -> Self {
        let mut take = |key: &str| match map.remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let zone_name = take(ZONE_NAME);
        let country_key = take(COUNTRY_KEY);
        let country_name = take(COUNTRY_NAME);
        for key in DERIVED_KEYS {
            map.remove(key);
        }

        Self {
            zone_name,
            country_key,
            country_name,
            extra: map,
        }
    }

    pub fn to_json(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        for (key, value) in [
            (ZONE_NAME, &self.zone_name),
            (COUNTRY_KEY, &self.country_key),
            (COUNTRY_NAME, &self.country_name),
        ] {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        map
    }

    /// Name used in log lines; falls back to the country when the zone is unnamed.
    pub fn label(&self) -> &str {
        self.zone_name
            .as_deref()
            .or(self.country_key.as_deref())
            .or(self.country_name.as_deref())
            .unwrap_or("<unnamed>")
    }
}

/// A zone feature. Polygon inputs are stored as single-part multi-polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub properties: ZoneProperties,
    pub geometry: MultiPolygon<f64>,
}

impl Feature {
    pub fn new(properties: ZoneProperties, geometry: MultiPolygon<f64>) -> Self {
        Self {
            properties,
            geometry,
        }
    }

    pub fn zone_name(&self) -> Option<&str> {
        self.properties.zone_name.as_deref()
    }

    pub fn country_key(&self) -> Option<&str> {
        self.properties.country_key.as_deref()
    }
}

/// How a feature takes part in the aggregated ("country") and
/// disaggregated ("zone") map views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewRole {
    /// Zone without sub-zones, shown as-is in both views.
    Standalone,
    /// Sub-zone of a country; replaced by the country union in the aggregated view.
    SubZone,
    /// Union of a country's sub-zones synthesized by the aggregator.
    Combined,
}

impl ViewRole {
    pub fn is_aggregated_view(self) -> bool {
        !matches!(self, ViewRole::SubZone)
    }

    pub fn is_highest_granularity(self) -> bool {
        !matches!(self, ViewRole::Combined)
    }

    pub fn is_combined(self) -> bool {
        matches!(self, ViewRole::Combined)
    }

    /// Writes the view flags into a property map.
    pub fn tag(self, map: &mut Map<String, Value>) {
        map.insert(
            IS_AGGREGATED_VIEW.to_string(),
            Value::Bool(self.is_aggregated_view()),
        );
        map.insert(
            IS_HIGHEST_GRANULARITY.to_string(),
            Value::Bool(self.is_highest_granularity()),
        );
        if self.is_combined() {
            map.insert(IS_COMBINED.to_string(), Value::Bool(true));
        }
    }
}

/// Feature of the aggregated collection. The role is fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedFeature {
    pub feature: Feature,
    pub role: ViewRole,
}

impl AggregatedFeature {
    pub fn zone_name(&self) -> Option<&str> {
        self.feature.zone_name()
    }

    pub fn to_json_properties(&self) -> Map<String, Value> {
        let mut map = self.feature.properties.to_json();
        self.role.tag(&mut map);
        map
    }
}
