use crate::layer::ENV_CONFIG_DIR;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// `config/event_sources_{environment}.json` under `root`.
pub fn manifest_path(root: &Path, environment: &str) -> PathBuf {
    root.join(ENV_CONFIG_DIR)
        .join(format!("event_sources_{environment}.json"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartingPosition {
    TrimHorizon,
    Latest,
    AtTimestamp,
}

impl fmt::Display for StartingPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TrimHorizon => "TRIM_HORIZON",
            Self::Latest => "LATEST",
            Self::AtTimestamp => "AT_TIMESTAMP",
        })
    }
}

/// One declared trigger from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventSourceDescriptor {
    pub event_source_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_position: Option<StartingPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_position_timestamp: Option<String>,
}

impl EventSourceDescriptor {
    /// The timestamp is only meaningful alongside `AT_TIMESTAMP`.
    pub fn effective_timestamp(&self) -> Option<&str> {
        match self.starting_position {
            Some(StartingPosition::AtTimestamp) => self.starting_position_timestamp.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventSourceManifest {
    #[serde(rename = "EventSourceMappings", default)]
    pub event_source_mappings: Vec<EventSourceDescriptor>,
}

/// Read the declared triggers for `environment`, in manifest order.
///
/// An absent manifest means no triggers are declared and yields an empty list.
pub fn load_manifest(
    root: &Path,
    environment: &str,
) -> Result<Vec<EventSourceDescriptor>, ConfigError> {
    let path = manifest_path(root, environment);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(
                "no event source manifest at {}, no triggers declared",
                path.display()
            );
            return Ok(Vec::new());
        }
        Err(source) => {
            error!("cannot read {}: {source}", path.display());
            return Err(ConfigError::ManifestIo { path, source });
        }
    };

    let manifest: EventSourceManifest = match serde_json::from_str(&content) {
        Ok(m) => m,
        Err(source) => {
            error!("{} is invalid, please review it", path.display());
            return Err(ConfigError::ManifestParse { path, source });
        }
    };

    debug!(
        "{} declares {} event source(s)",
        path.display(),
        manifest.event_source_mappings.len()
    );
    Ok(manifest.event_source_mappings)
}
