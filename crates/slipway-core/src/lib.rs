//! Deployment orchestration for Slipway.
//!
//! This crate ties together configuration composition, the external
//! deploy/build/invoke tool, and the remote API into a single `Deployment` run.
//! It also provides the event-source reconciler, which turns every declared
//! trigger into a create, or into a lookup followed by an update when the
//! trigger is already registered.

pub mod deployment;
pub mod reconcile;
pub mod run_type;
pub mod runner;

pub use deployment::{Deployment, RunReport};
pub use reconcile::{reconcile, ReconcileAction};
pub use run_type::RunType;
pub use runner::{ProcessRunner, ToolRunner};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(#[from] slipway_config::ConfigError),
    #[error("remote error: {0}")]
    Remote(#[from] slipway_remote::RemoteError),
    #[error("execution type not recognized: '{0}'")]
    InvalidExecutionType(String),
    #[error("failed to launch '{program}': {source}")]
    ToolLaunch {
        program: String,
        source: std::io::Error,
    },
    #[error("'{program} {args}' exited with {status}")]
    ToolFailed {
        program: String,
        args: String,
        status: String,
    },
}
