//! Build parameters and the per-zone / per-exchange YAML configuration.
//!
//! Zone files live in one directory, one file per zone, keyed by file stem
//! (`DK-DK1.yaml` -> `DK-DK1`). Exchange files are keyed the same way with
//! `_` standing in for the arrow (`DK-DK1_SE-SE3.yaml` -> `DK-DK1->SE-SE3`).
//! Fields this tool does not use are ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{GeoError, Result};

pub const DEFAULT_MIN_AREA_HOLES: f64 = 600_000.0;
pub const DEFAULT_MAX_CONVEX_DEVIATION: f64 = 0.708;
pub const DEFAULT_MIN_AREA_INTERSECTION: f64 = 6_000_000.0;
pub const DEFAULT_SLIVER_RATIO: f64 = 0.0;
pub const DEFAULT_NORMALIZE_PRECISION: u32 = 6;
pub const DEFAULT_OUTPUT_PRECISION: u32 = 4;
pub const DEFAULT_BOUNDING_BOX_PADDING: f64 = 0.5;

/// Zones whose bounding-box midpoint lands somewhere misleading
/// (dateline crossings, far-flung islands).
const CENTROID_OVERRIDES: [(&str, [f64; 2]); 4] = [
    ("FJ", [178.1, -17.7]),
    ("NZ", [172.5, -41.3]),
    ("RU", [94.0, 62.0]),
    ("US-AK", [-151.0, 63.6]),
];

/// Immutable parameters of one build, created once at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoBuildConfig {
    pub world_path: PathBuf,
    pub out_path: PathBuf,
    pub exclusions_path: PathBuf,
    pub error_path: PathBuf,
    pub zones_dir: PathBuf,
    pub exchanges_dir: PathBuf,
    /// Holes smaller than this (m²) are accidental gaps.
    pub min_area_holes: f64,
    pub max_convex_deviation: f64,
    /// Intersections larger than this (m²) are overlaps.
    pub min_area_intersection: f64,
    /// Perimeter (km) to area (m²) ratio a hole must exceed to count as a gap.
    pub sliver_ratio: f64,
    pub normalize_precision: u32,
    pub output_precision: u32,
    pub bounding_box_padding: f64,
    pub centroid_overrides: BTreeMap<String, [f64; 2]>,
    pub verify_no_updates: bool,
}

impl Default for GeoBuildConfig {
    fn default() -> Self {
        Self {
            world_path: PathBuf::from("geo/world.geojson"),
            out_path: PathBuf::from("src/config/world.json"),
            exclusions_path: PathBuf::from("src/config/excludedAggregatedExchanges.json"),
            error_path: PathBuf::from("geo"),
            zones_dir: PathBuf::from("config/zones"),
            exchanges_dir: PathBuf::from("config/exchanges"),
            min_area_holes: DEFAULT_MIN_AREA_HOLES,
            max_convex_deviation: DEFAULT_MAX_CONVEX_DEVIATION,
            min_area_intersection: DEFAULT_MIN_AREA_INTERSECTION,
            sliver_ratio: DEFAULT_SLIVER_RATIO,
            normalize_precision: DEFAULT_NORMALIZE_PRECISION,
            output_precision: DEFAULT_OUTPUT_PRECISION,
            bounding_box_padding: DEFAULT_BOUNDING_BOX_PADDING,
            centroid_overrides: CENTROID_OVERRIDES
                .iter()
                .map(|(zone, center)| (zone.to_string(), *center))
                .collect(),
            verify_no_updates: false,
        }
    }
}

impl GeoBuildConfig {
    pub fn gaps_path(&self) -> PathBuf {
        self.error_path.join("gaps.geojson")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ZoneConfig {
    #[serde(default, rename = "subZoneNames")]
    pub sub_zone_names: Option<Vec<String>>,
    #[serde(default)]
    pub bounding_box: Option<[[f64; 2]; 2]>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl ZoneConfig {
    pub fn sub_zones(&self) -> &[String] {
        self.sub_zone_names.as_deref().unwrap_or(&[])
    }

    pub fn has_sub_zones(&self) -> bool {
        !self.sub_zones().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default)]
    pub lonlat: Option<[f64; 2]>,
    #[serde(default)]
    pub rotation: Option<f64>,
}

pub type ZonesConfig = BTreeMap<String, ZoneConfig>;
pub type ExchangesConfig = BTreeMap<String, ExchangeConfig>;

pub fn load_zones_config(dir: &Path) -> Result<ZonesConfig> {
    load_yaml_dir(dir, |stem| stem.to_string())
}

pub fn load_exchanges_config(dir: &Path) -> Result<ExchangesConfig> {
    load_yaml_dir(dir, |stem| stem.replace('_', "->"))
}

fn load_yaml_dir<T, F>(dir: &Path, key_for: F) -> Result<BTreeMap<String, T>>
where
    T: DeserializeOwned + Default,
    F: Fn(&str) -> String,
{
    let entries = fs::read_dir(dir).map_err(|e| GeoError::io(dir, e))?;

    let mut configs = BTreeMap::new();
    for entry in entries {
        let path = entry.map_err(|e| GeoError::io(dir, e))?.path();
        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !is_yaml {
            continue;
        }

        let key = key_for(stem);
        let value = load_yaml_file(&path)?;
        configs.insert(key, value);
    }

    debug!("Loaded {} config entries from {:?}", configs.len(), dir);
    Ok(configs)
}

fn load_yaml_file<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| GeoError::io(path, e))?;
    // 空のファイルは全フィールド省略扱い
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&content).map_err(|source| GeoError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
