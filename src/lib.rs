//! Build preparation for LOCK_DEBUG PostgreSQL images.
//!
//! Rewrites a docker-postgres checkout so that every generated Dockerfile
//! builds PostgreSQL from source on a single Debian variant with
//! `-DLOCK_DEBUG=1` in the package CFLAGS.
//!
//! - **Manifest rewriting** - Narrow `versions.json` to one variant and force source builds
//! - **Template expansion** - Run the checkout's `apply-templates.sh`
//! - **Patching** - Inject the CFLAGS `ENV` line after the base image line
//! - **Preflight checks** - Host tool and generator validation before anything changes
//!
//! # Flow
//!
//! ```text
//! git submodule foreach git reset --hard
//!     │
//! versions.json ──rewrite──> versions.json (bookworm only, arches = does-not-exist)
//!     │
//! apply-templates.sh ──────> */*/Dockerfile
//!     │
//! patch ───────────────────> FROM debian:bookworm-slim
//!                            ENV DEB_CFLAGS_MAINT_APPEND='-DLOCK_DEBUG=1'
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use docker_prep::{config::load_config, prep};
//!
//! let config = load_config(&std::env::current_dir()?)?;
//! let report = prep::run(&config)?;
//! println!("{} Dockerfiles patched", report.patch.patched.len());
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod manifest;
pub mod patch;
pub mod preflight;
pub mod prep;
pub mod process;

#[cfg(test)]
mod test_support;

pub use config::PrepConfig;
pub use error::PrepError;
pub use patch::{FileOutcome, PatchOutcome, PatchSummary};
pub use prep::PrepReport;
