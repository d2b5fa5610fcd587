use crate::CoreError;
use std::path::Path;
use std::process::Command;
use tracing::{debug, error};

pub const DEFAULT_TOOL: &str = "lambda";

/// Runs the external deploy/build/invoke tool.
pub trait ToolRunner {
    fn run(&self, args: &[String], working_dir: &Path) -> Result<(), CoreError>;
}

/// Spawns the tool as a child process and waits for it.
///
/// Standard streams are inherited so the tool's own output reaches the user.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, args: &[String], working_dir: &Path) -> Result<(), CoreError> {
        debug!(
            "running {} {} in {}",
            self.program,
            args.join(" "),
            working_dir.display()
        );
        let status = Command::new(&self.program)
            .args(args)
            .current_dir(working_dir)
            .status()
            .map_err(|source| CoreError::ToolLaunch {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            return Ok(());
        }
        error!("{} {} failed: {status}", self.program, args.join(" "));
        Err(CoreError::ToolFailed {
            program: self.program.clone(),
            args: args.join(" "),
            status: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn successful_tool_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        ProcessRunner::new("true")
            .run(&args(&["deploy"]), dir.path())
            .unwrap();
    }

    #[test]
    fn nonzero_exit_is_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcessRunner::new("false")
            .run(&args(&["build", "--config-file", "run_config.yaml"]), dir.path())
            .unwrap_err();
        match err {
            CoreError::ToolFailed { program, args, .. } => {
                assert_eq!(program, "false");
                assert_eq!(args, "build --config-file run_config.yaml");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcessRunner::new("slipway-no-such-tool-xyz")
            .run(&[], dir.path())
            .unwrap_err();
        assert!(matches!(err, CoreError::ToolLaunch { .. }));
    }

    #[test]
    fn tool_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "x").unwrap();
        ProcessRunner::new("test")
            .run(&args(&["-f", "marker"]), dir.path())
            .unwrap();
    }

    #[test]
    fn default_tool_is_lambda() {
        assert_eq!(ProcessRunner::default().program(), "lambda");
    }
}
