use crate::CoreError;
use slipway_config::RUN_CONFIG_FILE;
use std::fmt;
use std::str::FromStr;

pub const LOCAL_ENVIRONMENT: &str = "local";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

const DEPLOY_ENVIRONMENTS: [&str; 4] = [LOCAL_ENVIRONMENT, "development", "qa", "production"];
const BUILD_ENVIRONMENTS: [&str; 3] = ["development", "qa", "production"];
const INVOKE_RUN_TYPE: &str = "run-local";
const BUILD_PREFIX: &str = "build-";

/// What a single run does with the composed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunType {
    /// Deploy the function, then reconcile its event sources.
    Deploy { environment: String },
    /// Package without deploying.
    Build { environment: String },
    /// Invoke the function locally against the `local` environment.
    Invoke,
}

impl RunType {
    pub fn environment(&self) -> &str {
        match self {
            RunType::Deploy { environment } | RunType::Build { environment } => environment,
            RunType::Invoke => LOCAL_ENVIRONMENT,
        }
    }

    pub fn is_deploy(&self) -> bool {
        matches!(self, RunType::Deploy { .. })
    }

    /// Arguments handed to the external tool.
    pub fn tool_args(&self) -> Vec<String> {
        let args: &[&str] = match self {
            RunType::Deploy { .. } => &[
                "deploy",
                "--config-file",
                RUN_CONFIG_FILE,
                "--requirements",
                REQUIREMENTS_FILE,
            ],
            RunType::Build { .. } => &[
                "build",
                "--requirements",
                REQUIREMENTS_FILE,
                "--config-file",
                RUN_CONFIG_FILE,
            ],
            RunType::Invoke => &["invoke", "-v", "--config-file", RUN_CONFIG_FILE],
        };
        args.iter().map(|s| (*s).to_owned()).collect()
    }
}

impl FromStr for RunType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if DEPLOY_ENVIRONMENTS.contains(&s) {
            return Ok(RunType::Deploy {
                environment: s.to_owned(),
            });
        }
        if s == INVOKE_RUN_TYPE {
            return Ok(RunType::Invoke);
        }
        match s.strip_prefix(BUILD_PREFIX) {
            Some(env) if BUILD_ENVIRONMENTS.contains(&env) => Ok(RunType::Build {
                environment: env.to_owned(),
            }),
            _ => Err(CoreError::InvalidExecutionType(s.to_owned())),
        }
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunType::Deploy { environment } => f.write_str(environment),
            RunType::Build { environment } => write!(f, "{BUILD_PREFIX}{environment}"),
            RunType::Invoke => f.write_str(INVOKE_RUN_TYPE),
        }
    }
}
