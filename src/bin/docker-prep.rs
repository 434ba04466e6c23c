use anyhow::{bail, Context, Result};

use docker_prep::config::load_config;
use docker_prep::prep;

fn usage() -> &'static str {
    "Usage:\n  docker-prep\n\nRun from the repository root. Configuration is read from docker-prep.toml\nand DOCKER_PREP_COMPONENT_DIR; the command takes no arguments."
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        bail!(usage());
    }

    let repo_root = std::env::current_dir().context("resolving current directory")?;
    let config = load_config(&repo_root)
        .with_context(|| format!("loading configuration for '{}'", repo_root.display()))?;

    prep::run(&config).with_context(|| {
        format!(
            "preparing Dockerfiles in '{}'",
            config.component_dir.display()
        )
    })?;
    Ok(())
}
