//! Preflight checks run before anything is modified.
//!
//! Validates that the host has the tools the run shells out to and that
//! the checkout's generator script is usable. This prevents leaving a
//! rewritten manifest behind when the generator could never have run.
//!
//! # Example
//!
//! ```rust
//! use docker_prep::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("git") {
//!     println!("git not installed");
//! }
//!
//! let tools = &[("git", "git")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

use crate::config::PrepConfig;

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Host tools needed for the submodule reset.
///
/// Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("git", "git")];

/// Check that specific tools are available.
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` with list of missing tools and their packages
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check that `script` is an executable regular file.
pub fn check_executable(script: &Path) -> Result<()> {
    let meta = match fs::metadata(script) {
        Ok(meta) => meta,
        Err(_) => bail!("generator script not found: {}", script.display()),
    };
    if !meta.is_file() {
        bail!("generator script is not a file: {}", script.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            bail!(
                "generator script is not executable: {}\n\
                 Run: chmod +x {}",
                script.display(),
                script.display()
            );
        }
    }

    Ok(())
}

/// Run every check the configuration calls for.
pub fn check_host(config: &PrepConfig) -> Result<()> {
    if config.reset_submodules {
        check_required_tools(REQUIRED_TOOLS)?;
    }
    if !config.manifest_path().is_file() {
        bail!(
            "versions manifest not found: {}",
            config.manifest_path().display()
        );
    }
    check_executable(&config.generator_path())
}
