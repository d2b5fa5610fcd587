use crate::ConfigError;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

/// Output artifact consumed by the external deploy/build/invoke tool.
pub const RUN_CONFIG_FILE: &str = "run_config.yaml";

/// Write `content` to `dest`, replacing whatever was there.
///
/// The content goes to a temporary file in the same directory first and is
/// renamed into place, so a failed write never leaves a truncated artifact.
pub fn write_artifact(dest: &Path, content: &str) -> Result<(), ConfigError> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let fail = |source: std::io::Error| {
        error!(
            "cannot write {}, ensure the user has permission to write to {}: {source}",
            dest.display(),
            dir.display()
        );
        ConfigError::ArtifactWrite {
            path: dest.to_path_buf(),
            source,
        }
    };

    let mut tmp = NamedTempFile::new_in(&dir).map_err(fail)?;
    tmp.write_all(content.as_bytes()).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(dest).map_err(|e| fail(e.error))?;
    debug!("wrote {} ({} bytes)", dest.display(), content.len());
    Ok(())
}

/// Remove a previously written artifact. Absence is not an error.
pub fn discard_artifact(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("failed to remove {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_overwrites_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(RUN_CONFIG_FILE);
        std::fs::write(&dest, "stale: true\nmore: lines\n").unwrap();
        write_artifact(&dest, "fresh: true\n").unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "fresh: true\n");
    }

    #[test]
    fn write_into_missing_directory_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no-such-dir").join(RUN_CONFIG_FILE);
        let err = write_artifact(&dest, "x: 1\n").unwrap_err();
        match err {
            ConfigError::ArtifactWrite { path, .. } => assert_eq!(path, dest),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dest.exists());
    }

    #[test]
    fn discard_is_quiet_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(RUN_CONFIG_FILE);
        discard_artifact(&dest);
        std::fs::write(&dest, "x").unwrap();
        discard_artifact(&dest);
        assert!(!dest.exists());
    }
}
