//! End-to-end build: load, aggregate, validate, round, build topology and
//! write the artifacts. Nothing is written unless every step succeeds.

use tracing::info;

use crate::aggregate::aggregate;
use crate::config::{
    load_exchanges_config, load_zones_config, ExchangesConfig, GeoBuildConfig, ZonesConfig,
};
use crate::error::Result;
use crate::exchanges::exchanges_to_exclude;
use crate::model::{AggregatedFeature, Feature};
use crate::parser::read_world;
use crate::precision::round_features;
use crate::topology::build_topology;
use crate::validate::validate;
use crate::writer::{ArtifactWriter, JsonStyle, WriteOutcome};

/// What a successful build did with each artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub zones: usize,
    pub world: WriteOutcome,
    pub exclusions: WriteOutcome,
}

struct Inputs {
    raw: Vec<Feature>,
    zones: ZonesConfig,
    exchanges: ExchangesConfig,
}

fn load(config: &GeoBuildConfig) -> Result<Inputs> {
    info!("Reading {:?}", config.world_path);
    let raw = read_world(&config.world_path)?;
    let zones = load_zones_config(&config.zones_dir)?;
    let exchanges = load_exchanges_config(&config.exchanges_dir)?;
    info!(
        "Loaded {} features, {} zone configs and {} exchange configs",
        raw.len(),
        zones.len(),
        exchanges.len()
    );
    Ok(Inputs {
        raw,
        zones,
        exchanges,
    })
}

fn aggregate_and_validate(
    inputs: &Inputs,
    config: &GeoBuildConfig,
) -> Result<Vec<AggregatedFeature>> {
    let aggregated = aggregate(&inputs.raw, &inputs.zones, config.normalize_precision)?;
    validate(&inputs.raw, &aggregated, &inputs.zones, config)?;
    Ok(aggregated)
}

/// Runs the checks only. Returns the number of aggregated features.
pub fn check(config: &GeoBuildConfig) -> Result<usize> {
    let inputs = load(config)?;
    let aggregated = aggregate_and_validate(&inputs, config)?;
    Ok(aggregated.len())
}

/// Full build. In verify mode any artifact change is an error.
pub fn run(config: &GeoBuildConfig) -> Result<BuildReport> {
    let inputs = load(config)?;
    let aggregated = aggregate_and_validate(&inputs, config)?;

    let rounded = round_features(&aggregated, config.output_precision);
    let topology = build_topology(&rounded, &config.centroid_overrides)?;
    let exclusions = exchanges_to_exclude(&inputs.zones, &inputs.exchanges)?;

    let writer = ArtifactWriter::new(config.verify_no_updates);
    let world = writer.write_json(&config.out_path, &topology, JsonStyle::Compact)?;
    let exclusions = writer.write_json(&config.exclusions_path, &exclusions, JsonStyle::Pretty)?;

    Ok(BuildReport {
        zones: topology.objects.len(),
        world,
        exclusions,
    })
}
