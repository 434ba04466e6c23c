//! End-to-end preparation run.

use anyhow::{Context, Result};

use crate::config::PrepConfig;
use crate::manifest::{render_manifest, rewrite_manifest_file};
use crate::patch::{patch_build_files, PatchSummary};
use crate::{generate, preflight, process};

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepReport {
    pub versions_rewritten: usize,
    pub patch: PatchSummary,
}

/// Reset, rewrite the manifest, regenerate and patch the Dockerfiles.
///
/// The first failure aborts the run. Nothing already written is rolled
/// back; every step is safe to repeat.
pub fn run(config: &PrepConfig) -> Result<PrepReport> {
    preflight::check_host(config).context("preflight checks failed")?;

    if config.reset_submodules {
        println!("[prep:reset] resetting submodules...");
        process::reset_submodules(&config.repo_root)?;
    } else {
        println!("[prep:reset] skipped (reset_submodules = false)");
    }

    println!(
        "[prep:manifest] forcing variant '{}' in {}",
        config.target_variant,
        config.manifest_path().display()
    );
    let manifest = rewrite_manifest_file(config)?;
    print!("{}", render_manifest(&manifest)?);

    println!("[prep:generate] applying templates...");
    generate::run_generator(config)?;

    println!("[prep:patch] injecting '{}'", config.marker_line());
    let patch = patch_build_files(config)?;
    println!(
        "[prep] done: {} versions, {} Dockerfiles patched, {} already patched",
        manifest.len(),
        patch.patched.len(),
        patch.skipped.len()
    );

    Ok(PrepReport {
        versions_rewritten: manifest.len(),
        patch,
    })
}
