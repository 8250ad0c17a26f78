use crate::error::{ReleaseError, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Build-tool collaborator that refreshes the lockfile
pub trait BuildTool {
    /// Check the project, rewriting the lockfile as needed. With `locked`
    /// the lockfile must already be up to date.
    fn check(&self, locked: bool) -> Result<()>;
}

/// Runs `cargo check -p <package>` in the repository root
#[derive(Debug, Clone)]
pub struct CargoCli {
    package: String,
    workdir: PathBuf,
}

impl CargoCli {
    pub fn new(package: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        CargoCli {
            package: package.into(),
            workdir: workdir.into(),
        }
    }

    fn args(&self, locked: bool) -> Vec<String> {
        let mut args = vec!["check".to_string(), "-p".to_string(), self.package.clone()];
        if locked {
            args.push("--locked".to_string());
        }
        args
    }
}

impl BuildTool for CargoCli {
    fn check(&self, locked: bool) -> Result<()> {
        let args = self.args(locked);
        debug!(?args, "running cargo");

        let output = Command::new("cargo")
            .args(&args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| ReleaseError::runtime(format!("Failed to execute cargo: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReleaseError::runtime(format!(
                "cargo {} failed with exit code {}\nStderr: {}",
                args.join(" "),
                output.status.code().unwrap_or(-1),
                stderr
            )));
        }

        Ok(())
    }
}
