//! Run configuration.
//!
//! Resolution order:
//! 1. Built-in defaults for the docker-postgres checkout
//! 2. `docker-prep.toml` at the repository root (every key optional)
//! 3. `DOCKER_PREP_COMPONENT_DIR` env var (component directory only)

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Optional config file name, looked up at the repository root.
pub const CONFIG_FILENAME: &str = "docker-prep.toml";

/// Env var overriding the component directory.
pub const COMPONENT_DIR_ENV: &str = "DOCKER_PREP_COMPONENT_DIR";

const DEFAULT_COMPONENT_DIR: &str = "docker/docker-postgres";
const DEFAULT_MANIFEST_FILE: &str = "versions.json";
const DEFAULT_GENERATOR: &str = "apply-templates.sh";
const DEFAULT_BUILD_FILE_NAME: &str = "Dockerfile";
const DEFAULT_BASE_IMAGE: &str = "debian";
const DEFAULT_TARGET_VARIANT: &str = "bookworm";
const DEFAULT_SENTINEL_ARCH: &str = "does-not-exist";
const DEFAULT_CFLAGS: &str = "DEB_CFLAGS_MAINT_APPEND='-DLOCK_DEBUG=1'";

/// Everything the rewriter and patcher need, passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepConfig {
    /// Repository whose submodules get reset.
    pub repo_root: PathBuf,
    /// Checkout holding the manifest, generator and generated Dockerfiles.
    pub component_dir: PathBuf,
    pub manifest_file: String,
    pub generator: String,
    pub build_file_name: String,
    pub base_image: String,
    pub target_variant: String,
    /// Architecture name that never matches, forcing source builds.
    pub sentinel_arch: String,
    /// Flag assignment injected as an `ENV` line.
    pub cflags: String,
    pub reset_submodules: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrepToml {
    component_dir: Option<String>,
    manifest_file: Option<String>,
    generator: Option<String>,
    build_file_name: Option<String>,
    base_image: Option<String>,
    target_variant: Option<String>,
    sentinel_arch: Option<String>,
    cflags: Option<String>,
    reset_submodules: Option<bool>,
}

impl PrepConfig {
    pub fn defaults(repo_root: &Path) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            component_dir: repo_root.join(DEFAULT_COMPONENT_DIR),
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            generator: DEFAULT_GENERATOR.to_string(),
            build_file_name: DEFAULT_BUILD_FILE_NAME.to_string(),
            base_image: DEFAULT_BASE_IMAGE.to_string(),
            target_variant: DEFAULT_TARGET_VARIANT.to_string(),
            sentinel_arch: DEFAULT_SENTINEL_ARCH.to_string(),
            cflags: DEFAULT_CFLAGS.to_string(),
            reset_submodules: true,
        }
    }

    /// `FROM <base-image>:<variant>-slim`
    pub fn anchor_line(&self) -> String {
        format!("FROM {}:{}-slim", self.base_image, self.target_variant)
    }

    /// `ENV <cflags>`
    pub fn marker_line(&self) -> String {
        format!("ENV {}", self.cflags)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.component_dir.join(&self.manifest_file)
    }

    pub fn generator_path(&self) -> PathBuf {
        self.component_dir.join(&self.generator)
    }

    fn apply_toml(&mut self, parsed: PrepToml) {
        if let Some(dir) = parsed.component_dir {
            self.component_dir = resolve_repo_path(&self.repo_root, dir.trim());
        }
        if let Some(value) = parsed.manifest_file {
            self.manifest_file = value;
        }
        if let Some(value) = parsed.generator {
            self.generator = value;
        }
        if let Some(value) = parsed.build_file_name {
            self.build_file_name = value;
        }
        if let Some(value) = parsed.base_image {
            self.base_image = value;
        }
        if let Some(value) = parsed.target_variant {
            self.target_variant = value;
        }
        if let Some(value) = parsed.sentinel_arch {
            self.sentinel_arch = value;
        }
        if let Some(value) = parsed.cflags {
            self.cflags = value;
        }
        if let Some(value) = parsed.reset_submodules {
            self.reset_submodules = value;
        }
    }

    fn validate(&self, source: &str) -> Result<()> {
        let required = [
            ("manifest_file", &self.manifest_file),
            ("generator", &self.generator),
            ("build_file_name", &self.build_file_name),
            ("base_image", &self.base_image),
            ("target_variant", &self.target_variant),
            ("sentinel_arch", &self.sentinel_arch),
            ("cflags", &self.cflags),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                bail!("invalid config '{}': {} must not be empty", source, field);
            }
        }
        if self.target_variant == "variants" {
            bail!(
                "invalid config '{}': target_variant collides with the 'variants' manifest field",
                source
            );
        }
        Ok(())
    }
}

/// Resolve the configuration for a repository root.
pub fn load_config(repo_root: &Path) -> Result<PrepConfig> {
    let override_dir = env::var(COMPONENT_DIR_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty());
    load_config_with_override(repo_root, override_dir.as_deref())
}

fn load_config_with_override(repo_root: &Path, component_dir: Option<&str>) -> Result<PrepConfig> {
    let mut config = PrepConfig::defaults(repo_root);

    let config_path = repo_root.join(CONFIG_FILENAME);
    let source = config_path.display().to_string();
    if config_path.is_file() {
        let raw = fs::read_to_string(&config_path)
            .with_context(|| format!("reading config '{}'", config_path.display()))?;
        let parsed: PrepToml = toml::from_str(&raw)
            .with_context(|| format!("parsing config '{}'", config_path.display()))?;
        config.apply_toml(parsed);
    }

    if let Some(dir) = component_dir {
        config.component_dir = resolve_repo_path(repo_root, dir.trim());
    }

    config.validate(&source)?;
    Ok(config)
}

pub(crate) fn resolve_repo_path(repo_root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        repo_root.join(candidate)
    }
}
