//! Geometry invariant checks run before any artifact is written.
//!
//! Each check is a pure function returning every violation it finds. The
//! runner logs them one per line and stops at the first failing category.

mod gaps;
mod overlaps;
mod properties;
mod shape;

pub use gaps::find_gaps;
pub use overlaps::find_overlaps;
pub use properties::{missing_properties, null_geometries, zones_config_mismatches};
pub use shape::{complex_polygons, neighboring_duplicates};

use tracing::{error, info};

use crate::config::{GeoBuildConfig, ZonesConfig};
use crate::error::{GeoError, Result, ValidationCheck};
use crate::model::{AggregatedFeature, Feature};
use crate::normalize::normalize;
use crate::writer::write_polygons_geojson;

/// Runs all checks in order.
///
/// `raw` is the collection as read from the world file; the remaining
/// checks look at the aggregated collection. When gaps are found they are
/// also written to `gaps.geojson` in the error directory.
pub fn validate(
    raw: &[Feature],
    aggregated: &[AggregatedFeature],
    zones: &ZonesConfig,
    config: &GeoBuildConfig,
) -> Result<()> {
    info!("Validating geometries...");
    let precision = config.normalize_precision;

    // 1. ジオメトリの欠損
    check(ValidationCheck::NullGeometry, null_geometries(raw))?;

    // 2. 必須プロパティ
    let raw_polygons = normalize(raw, precision);
    check(
        ValidationCheck::RequiredProperties,
        missing_properties(&raw_polygons),
    )?;

    // 3. 形状の複雑さ
    let polygons = normalize(aggregated.iter().map(|f| &f.feature), precision);
    check(
        ValidationCheck::Complexity,
        complex_polygons(&polygons, config.max_convex_deviation),
    )?;
    // 4. 隣接する同名ポリゴン
    check(
        ValidationCheck::NeighboringIds,
        neighboring_duplicates(&polygons),
    )?;

    // 5. ゾーン間の隙間（統合済みの国ポリゴンはサブゾーンと重なるため除外）
    let detailed = normalize(
        aggregated
            .iter()
            .filter(|f| f.role.is_highest_granularity())
            .map(|f| &f.feature),
        precision,
    );
    let gaps = find_gaps(&detailed, config.min_area_holes, config.sliver_ratio);
    if !gaps.is_empty() {
        // 確認用に穴を書き出す
        let gaps_path = config.gaps_path();
        let holes: Vec<_> = gaps.iter().map(|gap| gap.polygon.clone()).collect();
        write_polygons_geojson(&gaps_path, &holes)?;
        error!("Wrote {} gap(s) to {:?}", gaps.len(), gaps_path);
        check(
            ValidationCheck::Gaps,
            gaps.iter().map(|gap| gap.to_string()).collect(),
        )?;
    }

    // 6. ゾーン同士の重なり
    check(
        ValidationCheck::Overlaps,
        find_overlaps(aggregated, config.min_area_intersection, precision),
    )?;
    // 7. ゾーン設定との突き合わせ
    check(
        ValidationCheck::ZonesConfig,
        zones_config_mismatches(aggregated, zones),
    )?;

    info!("All geometry checks passed");
    Ok(())
}

fn check(check: ValidationCheck, violations: Vec<String>) -> Result<()> {
    if violations.is_empty() {
        return Ok(());
    }
    // 違反を全件ログに出してからエラーにする
    for violation in &violations {
        error!("{}", violation);
    }
    Err(GeoError::Validation { check, violations })
}
