use std::fs;
use std::path::Path;

use geo::Polygon;
use geojson::{Feature as GeoJsonFeature, FeatureCollection};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::error::{GeoError, Result};
use crate::parser::polygon_to_geojson;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonStyle {
    Compact,
    Pretty,
}

/// Writes build artifacts only when their content changed.
///
/// Existing files are compared byte-for-byte first and then structurally,
/// so a reformatted but equivalent file is not rewritten. In verify mode any
/// change is an error and nothing is written.
#[derive(Debug, Default)]
pub struct ArtifactWriter {
    verify_no_updates: bool,
}

impl ArtifactWriter {
    pub fn new(verify_no_updates: bool) -> Self {
        Self { verify_no_updates }
    }

    pub fn write_json<T: Serialize>(
        &self,
        path: &Path,
        value: &T,
        style: JsonStyle,
    ) -> Result<WriteOutcome> {
        let name = file_name(path);
        let content = match style {
            JsonStyle::Compact => serde_json::to_string(value)?,
            JsonStyle::Pretty => serde_json::to_string_pretty(value)? + "\n",
        };

        if self.is_unchanged(path, &content, value)? {
            info!("No changes to {}", name);
            return Ok(WriteOutcome::Unchanged);
        }

        if self.verify_no_updates {
            error!("Did not expect any updates to {}", name);
            return Err(GeoError::UnexpectedUpdate {
                path: path.to_path_buf(),
            });
        }

        info!("Generating new {}", name);
        write_file(path, &content)?;
        Ok(WriteOutcome::Written)
    }

    fn is_unchanged<T: Serialize>(&self, path: &Path, content: &str, value: &T) -> Result<bool> {
        let existing = match fs::read_to_string(path) {
            Ok(existing) => existing,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(GeoError::io(path, e)),
        };
        if existing == content {
            return Ok(true);
        }

        // 書式やキー順だけが異なる場合は変更なしとみなす
        let Ok(existing) = serde_json::from_str::<Value>(&existing) else {
            return Ok(false);
        };
        Ok(existing == serde_json::to_value(value)?)
    }
}

/// Writes hole polygons as a GeoJSON collection for inspection.
pub fn write_polygons_geojson(path: &Path, polygons: &[Polygon<f64>]) -> Result<()> {
    let collection = FeatureCollection {
        bbox: None,
        features: polygons
            .iter()
            .map(|polygon| GeoJsonFeature {
                bbox: None,
                geometry: Some(polygon_to_geojson(polygon)),
                id: None,
                properties: None,
                foreign_members: None,
            })
            .collect(),
        foreign_members: None,
    };
    let content = serde_json::to_string_pretty(&collection)?;
    write_file(path, &content)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GeoError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| GeoError::io(path, e))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
