use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeoError>;

/// 検証チェックの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCheck {
    NullGeometry,
    RequiredProperties,
    Complexity,
    NeighboringIds,
    Gaps,
    Overlaps,
    ZonesConfig,
}

impl fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = match self {
            ValidationCheck::NullGeometry => "Feature(s) contains null geometry",
            ValidationCheck::RequiredProperties => "Feature(s) are missing properties",
            ValidationCheck::Complexity => "Feature(s) too complex",
            ValidationCheck::NeighboringIds => "Feature(s) has neighboring duplicate zone ids",
            ValidationCheck::Gaps => "Found gaps between zones",
            ValidationCheck::Overlaps => "Feature(s) overlap",
            ValidationCheck::ZonesConfig => "Zone(s) do not match the zones config",
        };
        f.write_str(summary)
    }
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse GeoJSON at {path}: {source}")]
    GeoJson {
        path: PathBuf,
        source: Box<geojson::Error>,
    },

    #[error("failed to parse YAML at {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize YAML: {0}")]
    YamlSerialize(#[from] serde_yaml::Error),

    #[error("{path} does not contain a FeatureCollection")]
    NotFeatureCollection { path: PathBuf },

    #[error("feature {index} has unsupported geometry type {kind}")]
    UnsupportedGeometry { index: usize, kind: String },

    #[error("feature {index} has a position with {len} coordinate(s), expected at least 2")]
    MalformedPosition { index: usize, len: usize },

    #[error("missing geometry for sub-zone(s): {}", .zones.join(", "))]
    MissingSubZones { zones: Vec<String> },

    #[error("invalid exchange key {key:?}: expected \"<zoneA>-><zoneB>\"")]
    MalformedExchangeKey { key: String },

    #[error("feature {index} has no zoneName")]
    UnnamedFeature { index: usize },

    #[error("zone {zone} has no geometry in the world file")]
    ZoneNotFound { zone: String },

    #[error("{check} ({} violation(s))", .violations.len())]
    Validation {
        check: ValidationCheck,
        violations: Vec<String>,
    },

    #[error("did not expect any updates to {path}, rebuild and commit the artifact")]
    UnexpectedUpdate { path: PathBuf },
}

impl GeoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeoError::Io {
            path: path.into(),
            source,
        }
    }
}
