pub mod aggregate;
pub mod bounding_box;
pub mod config;
pub mod error;
pub mod exchanges;
pub mod geometry;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod precision;
pub mod topology;
pub mod validate;
pub mod writer;

pub use config::{GeoBuildConfig, ZoneConfig, ZonesConfig};
pub use error::{GeoError, Result, ValidationCheck};
pub use model::{AggregatedFeature, Feature, ViewRole, ZoneProperties};
pub use pipeline::BuildReport;
pub use topology::Topology;
pub use writer::{ArtifactWriter, WriteOutcome};
