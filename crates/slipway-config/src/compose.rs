use crate::layer::{ConfigLayer, ConfigStore, EnvironmentVariables, LayerRole, RawConfigText};
use crate::splice::{render_region, splice};
use crate::ConfigError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// The merged configuration for one environment.
///
/// Top-level fields are merged shallowly with the environment layer winning;
/// `environment_variables` is merged key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposedConfig {
    pub region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub function_name: Option<String>,
    pub endpoint_url: Option<String>,
    pub environment_variables: EnvironmentVariables,
    pub extra: BTreeMap<String, serde_yaml_bw::Value>,
}

impl ComposedConfig {
    /// Merge `overlay` (environment-specific) on top of `base`.
    pub fn merge(base: ConfigLayer, overlay: ConfigLayer) -> Self {
        let mut environment_variables = base.environment_variables.unwrap_or_default();
        environment_variables.extend(overlay.environment_variables.unwrap_or_default());

        let mut extra = base.extra;
        extra.extend(overlay.extra);

        Self {
            region: overlay.region.or(base.region),
            aws_access_key_id: overlay.aws_access_key_id.or(base.aws_access_key_id),
            aws_secret_access_key: overlay.aws_secret_access_key.or(base.aws_secret_access_key),
            function_name: overlay.function_name.or(base.function_name),
            endpoint_url: overlay.endpoint_url.or(base.endpoint_url),
            environment_variables,
            extra,
        }
    }

    pub fn function_name(&self) -> Result<&str, ConfigError> {
        self.function_name
            .as_deref()
            .ok_or(ConfigError::MissingSetting("function_name"))
    }

    pub fn region(&self) -> Result<&str, ConfigError> {
        self.region
            .as_deref()
            .ok_or(ConfigError::MissingSetting("region"))
    }
}

/// How the output artifact is produced from the base file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactPlan {
    /// The environment layer declares no `environment_variables`; the base
    /// file is copied unmodified.
    CopyVerbatim,
    /// The managed region is replaced with the composed variables.
    Splice,
}

/// Result of composing one environment, ready to be rendered to disk.
#[derive(Debug, Clone)]
pub struct Composition {
    pub environment: String,
    pub config: ComposedConfig,
    pub base_path: PathBuf,
    pub base_text: RawConfigText,
    pub plan: ArtifactPlan,
}

impl Composition {
    /// Produce the text of the output artifact.
    pub fn render(&self) -> Result<String, ConfigError> {
        match self.plan {
            ArtifactPlan::CopyVerbatim => Ok(self.base_text.to_text()),
            ArtifactPlan::Splice => {
                let region = render_region(&self.config.environment_variables)
                    .map_err(ConfigError::Render)?;
                splice(&self.base_text, &region).map_err(|source| ConfigError::Splice {
                    path: self.base_path.clone(),
                    source,
                })
            }
        }
    }
}

impl ConfigStore {
    /// Compose the configuration for `environment`.
    ///
    /// The environment layer is loaded first, then the base layer.
    pub fn compose(&self, environment: &str) -> Result<Composition, ConfigError> {
        let overlay = self.load(environment, LayerRole::Environment)?;
        let base = self.load(environment, LayerRole::Base)?;

        let plan = if overlay.layer.environment_variables.is_some() {
            ArtifactPlan::Splice
        } else {
            info!(
                "{} declares no environment_variables, base config passes through unchanged",
                overlay.path.display()
            );
            ArtifactPlan::CopyVerbatim
        };

        let config = ComposedConfig::merge(base.layer, overlay.layer);
        debug!(
            "composed {environment}: {} environment variables",
            config.environment_variables.len()
        );

        Ok(Composition {
            environment: environment.to_owned(),
            config,
            base_path: base.path,
            base_text: base.raw,
            plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::parse_layer_str;
    use std::fs;
    use std::path::Path;

    const BASE: &str = "\
region: us-east-1
function_name: tester
# === START_ENV_VARIABLES ===
environment_variables:
  region: Mesa Blanca
  host: Rozelle
# === END_ENV_VARIABLES ===
timeout: 30
";

    fn project(base: &str, env: Option<(&str, &str)>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), base).unwrap();
        if let Some((name, content)) = env {
            let env_dir = dir.path().join("config");
            fs::create_dir_all(&env_dir).unwrap();
            fs::write(env_dir.join(format!("{name}.yaml")), content).unwrap();
        }
        dir
    }

    fn var<'a>(config: &'a ComposedConfig, key: &str) -> Option<&'a str> {
        config.environment_variables.get(key).and_then(|v| v.as_str())
    }

    #[test]
    fn environment_variables_merge_key_by_key() {
        let base = parse_layer_str(
            "environment_variables:\n  region: Mesa Blanca\n  host: Rozelle\n",
        )
        .unwrap();
        let overlay = parse_layer_str("environment_variables:\n  region: Snowdream\n").unwrap();
        let composed = ComposedConfig::merge(base, overlay);
        assert_eq!(composed.environment_variables.len(), 2);
        assert_eq!(var(&composed, "region"), Some("Snowdream"));
        assert_eq!(var(&composed, "host"), Some("Rozelle"));
    }

    #[test]
    fn top_level_fields_prefer_environment_layer() {
        let base = parse_layer_str("region: us-east-1\nfunction_name: base-fn\nmemory: 128\n")
            .unwrap();
        let overlay = parse_layer_str("region: eu-west-1\nmemory: 512\n").unwrap();
        let composed = ComposedConfig::merge(base, overlay);
        assert_eq!(composed.region.as_deref(), Some("eu-west-1"));
        assert_eq!(composed.function_name.as_deref(), Some("base-fn"));
        assert_eq!(composed.extra["memory"].as_i64(), Some(512));
    }

    #[test]
    fn compose_splices_when_environment_declares_variables() {
        let dir = project(
            BASE,
            Some(("qa", "environment_variables:\n  region: Snowdream\n")),
        );
        let composition = ConfigStore::new(dir.path()).compose("qa").unwrap();
        assert_eq!(composition.plan, ArtifactPlan::Splice);
        assert_eq!(var(&composition.config, "region"), Some("Snowdream"));
        assert_eq!(var(&composition.config, "host"), Some("Rozelle"));

        let text = composition.render().unwrap();
        assert!(text.starts_with("region: us-east-1\nfunction_name: tester\n"));
        assert!(text.contains("region: Snowdream"));
        assert!(!text.contains("Mesa Blanca"));
        assert!(text.ends_with("# === END_ENV_VARIABLES ===\ntimeout: 30\n"));
    }

    #[test]
    fn compose_copies_base_without_environment_variables() {
        let dir = project(BASE, Some(("qa", "region: eu-west-1\n")));
        let composition = ConfigStore::new(dir.path()).compose("qa").unwrap();
        assert_eq!(composition.plan, ArtifactPlan::CopyVerbatim);
        assert_eq!(composition.config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(composition.render().unwrap(), BASE);
    }

    #[test]
    fn bare_environment_variables_key_still_splices() {
        let dir = project(BASE, Some(("qa", "environment_variables:\n")));
        let composition = ConfigStore::new(dir.path()).compose("qa").unwrap();
        assert_eq!(composition.plan, ArtifactPlan::Splice);
        assert_eq!(var(&composition.config, "region"), Some("Mesa Blanca"));
        assert_eq!(var(&composition.config, "host"), Some("Rozelle"));
        assert!(composition.render().unwrap().contains("host: Rozelle"));
    }

    #[test]
    fn compose_without_environment_file_copies_base() {
        let dir = project(BASE, None);
        let composition = ConfigStore::new(dir.path()).compose("production").unwrap();
        assert_eq!(composition.plan, ArtifactPlan::CopyVerbatim);
        assert_eq!(composition.config.function_name().unwrap(), "tester");
    }

    #[test]
    fn compose_propagates_malformed_environment_layer() {
        let dir = project(BASE, Some(("qa", "environment_variables: [\n")));
        let err = ConfigStore::new(dir.path()).compose("qa").unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParse { ref path, .. } if path.ends_with(Path::new("config/qa.yaml"))));
    }

    #[test]
    fn missing_settings_are_reported_by_name() {
        let composed = ComposedConfig::default();
        assert!(matches!(
            composed.function_name(),
            Err(ConfigError::MissingSetting("function_name"))
        ));
        assert!(matches!(
            composed.region(),
            Err(ConfigError::MissingSetting("region"))
        ));
    }
}
