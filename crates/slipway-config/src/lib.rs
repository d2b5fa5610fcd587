//! Layered configuration, managed-region splicing, and event-source manifests for Slipway.
//!
//! This crate defines the configuration layer: YAML layer loading by environment
//! (`ConfigStore`), two-layer composition with explicit precedence (`ComposedConfig`),
//! rewriting of the sentinel-delimited environment-variable region of the base file
//! (`splice`), writing the `run_config.yaml` artifact, and reading the JSON manifest
//! of declared event-source triggers (`load_manifest`).

pub mod artifact;
pub mod compose;
pub mod layer;
pub mod manifest;
pub mod splice;

pub use artifact::{discard_artifact, write_artifact, RUN_CONFIG_FILE};
pub use compose::{ArtifactPlan, ComposedConfig, Composition};
pub use layer::{
    parse_layer_str, ConfigLayer, ConfigStore, EnvironmentVariables, LayerRole, LoadedLayer,
    RawConfigText,
};
pub use manifest::{
    load_manifest, manifest_path, EventSourceDescriptor, EventSourceManifest, StartingPosition,
};
pub use splice::{render_region, splice, SpliceError, END_SENTINEL, START_SENTINEL};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml_bw::Error,
    },
    #[error("failed to read event source manifest {}: {source}", path.display())]
    ManifestIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid event source manifest {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed managed region in {}: {source}", path.display())]
    Splice { path: PathBuf, source: SpliceError },
    #[error("failed to render environment_variables: {0}")]
    Render(#[source] serde_yaml_bw::Error),
    #[error("required setting '{0}' is missing from the composed config")]
    MissingSetting(&'static str),
}
