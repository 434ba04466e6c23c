//! Versions manifest rewriting.
//!
//! The docker-library `versions.json` maps a version id to a record holding
//! `major`, `sha256`, `version` and one object per OS variant. Rewriting
//! narrows every record to a single variant and points its `arches` at an
//! architecture that never exists, so the generated Dockerfiles always
//! compile PostgreSQL from source.
//!
//! `serde_json::Map` is ordered by key (no `preserve_order`), which makes
//! the written manifest sorted and diff-friendly.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::config::PrepConfig;
use crate::error::PrepError;

pub type VersionRecord = Map<String, Value>;
pub type VersionManifest = Map<String, Value>;

const COMMON_FIELDS: &[&str] = &["major", "sha256", "version"];
const VARIANTS_FIELD: &str = "variants";
const ARCHES_FIELD: &str = "arches";

/// Copy `keys` out of `record`, failing on the first absent key.
///
/// Keys are checked in sorted order so the reported field is stable.
pub fn project(version: &str, record: &VersionRecord, keys: &[&str]) -> Result<VersionRecord> {
    let mut ordered = keys.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    let mut projected = Map::new();
    for key in ordered {
        let value = record.get(key).ok_or_else(|| PrepError::MissingField {
            version: version.to_string(),
            field: key.to_string(),
        })?;
        projected.insert(key.to_string(), value.clone());
    }
    Ok(projected)
}

/// Rewrite one record down to `{target, major, sha256, version, variants}`.
pub fn rewrite_record(
    version: &str,
    record: &Value,
    target_variant: &str,
    sentinel_arch: &str,
) -> Result<VersionRecord> {
    let record = record.as_object().ok_or_else(|| PrepError::InvalidRecord {
        version: version.to_string(),
        reason: "record is not a JSON object".to_string(),
    })?;

    let mut keys = COMMON_FIELDS.to_vec();
    keys.push(target_variant);
    let mut rewritten = project(version, record, &keys)?;

    let variant = rewritten
        .get_mut(target_variant)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| PrepError::InvalidRecord {
            version: version.to_string(),
            reason: format!("variant '{}' is not a JSON object", target_variant),
        })?;
    variant.insert(
        ARCHES_FIELD.to_string(),
        Value::Array(vec![Value::String(sentinel_arch.to_string())]),
    );

    rewritten.insert(
        VARIANTS_FIELD.to_string(),
        Value::Array(vec![Value::String(target_variant.to_string())]),
    );
    Ok(rewritten)
}

/// Rewrite every record; nothing is returned unless all records succeed.
pub fn rewrite_manifest(
    manifest: &VersionManifest,
    target_variant: &str,
    sentinel_arch: &str,
) -> Result<VersionManifest> {
    let mut rewritten = Map::new();
    for (version, record) in manifest {
        let record = rewrite_record(version, record, target_variant, sentinel_arch)?;
        rewritten.insert(version.clone(), Value::Object(record));
    }
    Ok(rewritten)
}

pub fn load_manifest(path: &Path) -> Result<VersionManifest> {
    let bytes =
        fs::read(path).with_context(|| format!("reading versions manifest '{}'", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing versions manifest '{}'", path.display()))
}

/// Sorted keys, two-space indentation, trailing newline.
pub fn render_manifest(manifest: &VersionManifest) -> Result<String> {
    let mut text =
        serde_json::to_string_pretty(manifest).context("serializing versions manifest")?;
    text.push('\n');
    Ok(text)
}

pub fn write_manifest(path: &Path, manifest: &VersionManifest) -> Result<()> {
    let text = render_manifest(manifest)?;
    fs::write(path, text)
        .with_context(|| format!("writing versions manifest '{}'", path.display()))
}

/// Load, rewrite and persist the manifest named by `config`.
pub fn rewrite_manifest_file(config: &PrepConfig) -> Result<VersionManifest> {
    let path = config.manifest_path();
    let manifest = load_manifest(&path)?;
    let rewritten = rewrite_manifest(&manifest, &config.target_variant, &config.sentinel_arch)
        .with_context(|| format!("rewriting versions manifest '{}'", path.display()))?;
    write_manifest(&path, &rewritten)?;
    Ok(rewritten)
}
