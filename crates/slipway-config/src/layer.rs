use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Base configuration file, relative to the project root.
pub const BASE_CONFIG_FILE: &str = "config.yaml";
/// Directory holding the per-environment override files.
pub const ENV_CONFIG_DIR: &str = "config";
const ENVIRONMENT_VARIABLES_KEY: &str = "environment_variables";

/// `environment_variables` mapping. Keys are kept sorted so the rendered
/// region is stable across runs.
pub type EnvironmentVariables = BTreeMap<String, serde_yaml_bw::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Base,
    Environment,
}

impl LayerRole {
    /// `config.yaml` for the base layer, `config/{environment}.yaml` otherwise.
    pub fn path(self, root: &Path, environment: &str) -> PathBuf {
        match self {
            Self::Base => root.join(BASE_CONFIG_FILE),
            Self::Environment => root
                .join(ENV_CONFIG_DIR)
                .join(format!("{environment}.yaml")),
        }
    }
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("base"),
            Self::Environment => f.write_str("environment"),
        }
    }
}

/// One parsed configuration file.
///
/// The recognized fields are typed; anything else at the top level lands in
/// `extra` so it still takes part in composition.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_variables: Option<EnvironmentVariables>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml_bw::Value>,
}

/// Verbatim source of a config file, split after every newline so that
/// concatenating the lines reproduces the file byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfigText {
    lines: Vec<String>,
}

impl RawConfigText {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_owned).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.lines.concat()
    }
}

/// A layer together with where it came from and its raw text.
#[derive(Debug, Clone)]
pub struct LoadedLayer {
    pub role: LayerRole,
    pub path: PathBuf,
    pub layer: ConfigLayer,
    pub raw: RawConfigText,
}

impl LoadedLayer {
    fn empty(role: LayerRole, path: PathBuf) -> Self {
        Self {
            role,
            path,
            layer: ConfigLayer::default(),
            raw: RawConfigText::default(),
        }
    }
}

/// Parse a YAML layer. Documents holding only comments, whitespace or an
/// explicit null yield an empty layer.
///
/// `<<` merge keys are resolved before the layer is typed. A bare
/// `environment_variables:` key still counts as declared and becomes an empty
/// mapping.
pub fn parse_layer_str(input: &str) -> Result<ConfigLayer, serde_yaml_bw::Error> {
    let blank = input
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#') || l == "---");
    if blank {
        return Ok(ConfigLayer::default());
    }

    let mut value: serde_yaml_bw::Value = serde_yaml_bw::from_str(input)?;
    if value.is_null() {
        return Ok(ConfigLayer::default());
    }
    value.apply_merge()?;
    if let Some(vars) = value
        .as_mapping_mut()
        .and_then(|m| m.get_mut(ENVIRONMENT_VARIABLES_KEY))
    {
        if vars.is_null() {
            *vars = serde_yaml_bw::to_value(EnvironmentVariables::new())?;
        }
    }
    serde_yaml_bw::from_value(value)
}

/// Loads configuration layers from a project root.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load one layer for `environment`.
    ///
    /// A missing file is not an error: it yields an empty layer with no lines.
    /// Unreadable or malformed files abort with the offending path attached.
    pub fn load(&self, environment: &str, role: LayerRole) -> Result<LoadedLayer, ConfigError> {
        let path = role.path(&self.root, environment);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "no {role} config at {}, using an empty layer",
                    path.display()
                );
                return Ok(LoadedLayer::empty(role, path));
            }
            Err(source) => {
                error!("cannot read {}: {source}", path.display());
                return Err(ConfigError::ConfigIo { path, source });
            }
        };

        let layer = match parse_layer_str(&content) {
            Ok(layer) => layer,
            Err(source) => {
                error!("{} is invalid, please review it", path.display());
                return Err(ConfigError::ConfigParse { path, source });
            }
        };
        debug!("loaded {role} config from {}", path.display());

        Ok(LoadedLayer {
            role,
            path,
            layer,
            raw: RawConfigText::new(&content),
        })
    }
}
