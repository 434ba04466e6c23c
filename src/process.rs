//! External process execution.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::PrepError;

/// Run `cmd` with inherited stdio and require a zero exit status.
pub fn run_checked(cmd: &mut Command, description: &str) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to execute {}", description))?;

    if !status.success() {
        return Err(PrepError::ExternalProcess {
            description: description.to_string(),
            code: status.code(),
        }
        .into());
    }
    Ok(())
}

/// Hard-reset every submodule of the repository at `repo_root`.
pub fn reset_submodules(repo_root: &Path) -> Result<()> {
    eprintln!("  Running: git submodule foreach git reset --hard");
    eprintln!("    Repo: {}", repo_root.display());

    let mut cmd = Command::new("git");
    cmd.arg("submodule")
        .arg("foreach")
        .arg("git")
        .arg("reset")
        .arg("--hard")
        .current_dir(repo_root);
    run_checked(&mut cmd, "git submodule reset")
}
