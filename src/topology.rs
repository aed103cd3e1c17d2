//! Shared-arc topology in the TopoJSON layout.
//!
//! Rings are cut at junctions (vertices where neighbouring rings stop
//! sharing a boundary) and identical arcs are stored once. A ring that walks
//! a stored arc backwards references it as `!index` (`-index - 1`).
//! Coordinates are stored unquantized.

use std::collections::{BTreeMap, HashMap, HashSet};

use geo::{LineString, MultiPolygon, Polygon};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{GeoError, Result};
use crate::model::{AggregatedFeature, CENTER};
use crate::precision::round_to;

type Point = [f64; 2];
type PointKey = (u64, u64);

fn key(point: &Point) -> PointKey {
    (point[0].to_bits(), point[1].to_bits())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    pub objects: BTreeMap<String, TopologyObject>,
    pub arcs: Vec<Vec<Point>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeometryKind {
    Polygon,
    MultiPolygon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArcRefs {
    Polygon(Vec<Vec<i64>>),
    MultiPolygon(Vec<Vec<Vec<i64>>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyObject {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    pub arcs: ArcRefs,
    pub properties: Map<String, Value>,
}

/// One topology object: every feature sharing a zone name, merged.
struct ZoneGeometry<'a> {
    name: &'a str,
    first: &'a AggregatedFeature,
    geometry: MultiPolygon<f64>,
}

/// Groups features by zone name in first-seen order. Disjoint parts of a
/// zone may arrive as separate features.
fn merge_by_zone(features: &[AggregatedFeature]) -> Result<Vec<ZoneGeometry<'_>>> {
    let mut zones: Vec<ZoneGeometry<'_>> = Vec::new();
    let mut index_of: HashMap<&str, usize> = HashMap::new();

    for (index, feature) in features.iter().enumerate() {
        let name = feature
            .zone_name()
            .ok_or(GeoError::UnnamedFeature { index })?;
        let polygons = feature.feature.geometry.iter().cloned();
        match index_of.get(name) {
            // 同名ゾーンはマルチポリゴンにまとめる
            Some(&i) => zones[i].geometry.0.extend(polygons),
            None => {
                index_of.insert(name, zones.len());
                zones.push(ZoneGeometry {
                    name,
                    first: feature,
                    geometry: MultiPolygon::new(polygons.collect()),
                });
            }
        }
    }

    Ok(zones)
}

/// Builds the topology of the rounded aggregated collection, keyed by zone
/// name, with a centroid attached to every object.
pub fn build_topology(
    features: &[AggregatedFeature],
    centroid_overrides: &BTreeMap<String, [f64; 2]>,
) -> Result<Topology> {
    let zones = merge_by_zone(features)?;

    // 全リングから接合点を求める
    let rings: Vec<Vec<Point>> = zones
        .iter()
        .flat_map(|zone| zone.geometry.iter())
        .flat_map(polygon_rings)
        .map(open_ring)
        .collect();
    let junctions = find_junctions(&rings);

    let mut arcs = ArcStore::default();
    let mut objects = BTreeMap::new();
    for zone in &zones {
        // リングを接合点で切ってアークに登録
        let mut polygons: Vec<Vec<Vec<i64>>> = zone
            .geometry
            .iter()
            .map(|polygon| {
                polygon_rings(polygon)
                    .map(|ring| {
                        cut_ring(&open_ring(ring), &junctions)
                            .into_iter()
                            .map(|arc| arcs.intern(arc))
                            .collect()
                    })
                    .collect()
            })
            .collect();

        let (kind, refs) = if polygons.len() == 1 {
            (GeometryKind::Polygon, ArcRefs::Polygon(polygons.remove(0)))
        } else {
            (GeometryKind::MultiPolygon, ArcRefs::MultiPolygon(polygons))
        };

        // 中心座標（上書き指定があればそちらを優先）
        let mut properties = zone.first.to_json_properties();
        let center = centroid_overrides
            .get(zone.name)
            .copied()
            .or_else(|| bounding_box_center(&zone.geometry));
        if let Some([lon, lat]) = center {
            properties.insert(CENTER.to_string(), serde_json::json!([lon, lat]));
        }

        objects.insert(
            zone.name.to_string(),
            TopologyObject {
                kind,
                arcs: refs,
                properties,
            },
        );
    }

    let arcs = arcs.into_arcs();
    info!(
        "Built topology with {} objects and {} arcs",
        objects.len(),
        arcs.len()
    );
    Ok(Topology {
        kind: "Topology",
        bbox: arcs_bbox(&arcs),
        objects,
        arcs,
    })
}

/// Midpoint of the coordinate bounding box, rounded to one decimal.
pub fn bounding_box_center(geometry: &MultiPolygon<f64>) -> Option<[f64; 2]> {
    let points = geometry
        .iter()
        .flat_map(polygon_rings)
        .flat_map(|ring| ring.coords().map(|c| [c.x, c.y]));
    let [min_x, min_y, max_x, max_y] = points_bbox(points)?;
    Some([
        round_to((min_x + max_x) / 2.0, 1),
        round_to((min_y + max_y) / 2.0, 1),
    ])
}

fn points_bbox(points: impl Iterator<Item = Point>) -> Option<[f64; 4]> {
    points.fold(None, |acc, [x, y]| match acc {
        None => Some([x, y, x, y]),
        Some([min_x, min_y, max_x, max_y]) => {
            Some([min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)])
        }
    })
}

fn arcs_bbox(arcs: &[Vec<Point>]) -> Option<[f64; 4]> {
    points_bbox(arcs.iter().flatten().copied())
}

fn polygon_rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

/// Ring vertices without the closing duplicate.
fn open_ring(ring: &LineString<f64>) -> Vec<Point> {
    let mut points: Vec<Point> = ring.coords().map(|c| [c.x, c.y]).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// A vertex is a junction when it is visited with different neighbours by
/// different rings, or twice by the same ring.
fn find_junctions(rings: &[Vec<Point>]) -> HashSet<PointKey> {
    let mut neighbours: HashMap<PointKey, (PointKey, PointKey)> = HashMap::new();
    let mut junctions = HashSet::new();

    for ring in rings {
        let n = ring.len();
        for i in 0..n {
            let previous = key(&ring[(i + n - 1) % n]);
            let current = key(&ring[i]);
            let next = key(&ring[(i + 1) % n]);

            match neighbours.get(&current) {
                None => {
                    neighbours.insert(current, (previous, next));
                }
                Some(&(p, q)) => {
                    let same_way = p == previous && q == next;
                    let reversed = p == next && q == previous;
                    if !same_way && !reversed {
                        junctions.insert(current);
                    }
                }
            }
        }
    }

    junctions
}

/// Splits an open ring into closed-path arcs running between junctions.
/// A ring without junctions becomes one closed arc starting at its
/// smallest vertex so that equal rings produce equal arcs.
fn cut_ring(ring: &[Point], junctions: &HashSet<PointKey>) -> Vec<Vec<Point>> {
    let n = ring.len();
    if n == 0 {
        return Vec::new();
    }

    let cuts: Vec<usize> = (0..n)
        .filter(|&i| junctions.contains(&key(&ring[i])))
        .collect();

    if cuts.is_empty() {
        let start = (0..n)
            .min_by(|&a, &b| {
                ring[a][0]
                    .total_cmp(&ring[b][0])
                    .then(ring[a][1].total_cmp(&ring[b][1]))
            })
            .unwrap_or(0);
        return vec![(0..=n).map(|k| ring[(start + k) % n]).collect()];
    }

    cuts.iter()
        .enumerate()
        .map(|(i, &from)| {
            let to = cuts.get(i + 1).copied().unwrap_or(cuts[0] + n);
            (from..=to).map(|k| ring[k % n]).collect()
        })
        .collect()
}

#[derive(Default)]
struct ArcStore {
    arcs: Vec<Vec<Point>>,
    index: HashMap<Vec<PointKey>, usize>,
}

impl ArcStore {
    fn intern(&mut self, arc: Vec<Point>) -> i64 {
        let forward: Vec<PointKey> = arc.iter().map(key).collect();
        if let Some(&i) = self.index.get(&forward) {
            return i as i64;
        }
        let backward: Vec<PointKey> = forward.iter().rev().copied().collect();
        if let Some(&i) = self.index.get(&backward) {
            return !(i as i64);
        }

        let i = self.arcs.len();
        self.index.insert(forward, i);
        self.arcs.push(arc);
        i as i64
    }

    fn into_arcs(self) -> Vec<Vec<Point>> {
        self.arcs
    }
}
