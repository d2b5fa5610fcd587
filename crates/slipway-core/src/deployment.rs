use crate::reconcile::{reconcile, ReconcileAction};
use crate::run_type::RunType;
use crate::runner::ToolRunner;
use crate::CoreError;
use serde::Serialize;
use slipway_config::{
    discard_artifact, load_manifest, write_artifact, ArtifactPlan, ComposedConfig, Composition,
    ConfigStore, RUN_CONFIG_FILE,
};
use slipway_remote::ClientFactory;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Summary of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_type: String,
    pub environment: String,
    pub artifact: ArtifactPlan,
    pub artifact_path: PathBuf,
    pub artifact_kept: bool,
    pub event_sources: Vec<ReconcileAction>,
}

/// Drives a full run: compose, write the artifact, run the tool, and for
/// deploys bring the declared event sources in line.
pub struct Deployment<'a> {
    store: ConfigStore,
    runner: &'a dyn ToolRunner,
    clients: &'a dyn ClientFactory,
    keep_artifact: bool,
}

/// Removes the artifact when the run ends, however it ends.
struct ArtifactGuard {
    path: PathBuf,
    keep: bool,
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.keep {
            debug!("keeping {}", self.path.display());
        } else {
            discard_artifact(&self.path);
        }
    }
}

impl<'a> Deployment<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        runner: &'a dyn ToolRunner,
        clients: &'a dyn ClientFactory,
    ) -> Self {
        Self {
            store: ConfigStore::new(root),
            runner,
            clients,
            keep_artifact: false,
        }
    }

    /// Leave the artifact on disk after the run.
    #[must_use]
    pub fn keep_artifact(mut self, keep: bool) -> Self {
        self.keep_artifact = keep;
        self
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.store.root().join(RUN_CONFIG_FILE)
    }

    /// Compose `environment` and write the artifact.
    pub fn prepare(&self, environment: &str) -> Result<Composition, CoreError> {
        let composition = self.store.compose(environment)?;
        let rendered = composition.render()?;
        write_artifact(&self.artifact_path(), &rendered)?;
        info!(
            "wrote {} for {environment} ({:?})",
            self.artifact_path().display(),
            composition.plan
        );
        Ok(composition)
    }

    /// Reconcile the triggers declared for `environment`.
    ///
    /// No client is built when the manifest declares nothing. The function
    /// name and region must both be configured before any remote call.
    pub fn sync_event_sources(
        &self,
        environment: &str,
        config: &ComposedConfig,
    ) -> Result<Vec<ReconcileAction>, CoreError> {
        let descriptors = load_manifest(self.store.root(), environment)?;
        if descriptors.is_empty() {
            info!("no event sources declared for {environment}");
            return Ok(Vec::new());
        }
        let function_name = config.function_name()?;
        let region = config.region()?;
        debug!(
            "reconciling {} event source(s) for {function_name} in {region}",
            descriptors.len()
        );
        let api = self.clients.build(config)?;
        Ok(reconcile(&descriptors, function_name, api.as_ref())?)
    }

    pub fn execute(&self, run_type: &RunType) -> Result<RunReport, CoreError> {
        let environment = run_type.environment();
        let _guard = ArtifactGuard {
            path: self.artifact_path(),
            keep: self.keep_artifact,
        };

        let composition = self.prepare(environment)?;
        self.runner.run(&run_type.tool_args(), self.store.root())?;

        let event_sources = if run_type.is_deploy() {
            self.sync_event_sources(environment, &composition.config)?
        } else {
            Vec::new()
        };

        Ok(RunReport {
            run_type: run_type.to_string(),
            environment: environment.to_owned(),
            artifact: composition.plan,
            artifact_path: self.artifact_path(),
            artifact_kept: self.keep_artifact,
            event_sources,
        })
    }
}
