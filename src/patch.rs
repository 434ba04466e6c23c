//! Generated Dockerfile patching.
//!
//! Each generated Dockerfile gets the marker line (`ENV <cflags>`) inserted
//! directly after the anchor line (`FROM <image>:<variant>-slim`). A file
//! that already carries the marker is left alone, so re-running after a
//! partial failure is safe. A file without the anchor aborts the run.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::PrepConfig;
use crate::error::PrepError;

/// Depth of `<root>/*/*/<file>`, counting the root as depth 0.
const BUILD_FILE_DEPTH: usize = 3;

/// Result of inspecting one file's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    AlreadyPatched,
    Patched(String),
    AnchorMissing,
}

/// What happened to a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Skipped,
    Patched,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSummary {
    pub patched: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl PatchSummary {
    pub fn total(&self) -> usize {
        self.patched.len() + self.skipped.len()
    }
}

/// Find every `root/*/*/<file_name>`, sorted by path.
///
/// Hidden directories are ignored. An empty result means the generator
/// produced nothing and is reported as an error.
pub fn discover_build_files(root: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PrepError::GenerationProducedNothing {
            root: root.to_path_buf(),
            file_name: file_name.to_string(),
        }
        .into());
    }

    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(BUILD_FILE_DEPTH)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));
    for entry in walker {
        let entry = entry.with_context(|| format!("walking '{}'", root.display()))?;
        if entry.depth() == BUILD_FILE_DEPTH
            && entry.file_type().is_file()
            && entry.file_name() == file_name
        {
            found.push(entry.into_path());
        }
    }

    if found.is_empty() {
        return Err(PrepError::GenerationProducedNothing {
            root: root.to_path_buf(),
            file_name: file_name.to_string(),
        }
        .into());
    }
    Ok(found)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Insert `marker` after every line equal to `anchor`.
///
/// The inserted line reuses the anchor's line ending; every other byte is
/// kept as-is.
pub fn patch_contents(contents: &str, anchor: &str, marker: &str) -> PatchOutcome {
    if contents.lines().any(|line| line.trim_end() == marker) {
        return PatchOutcome::AlreadyPatched;
    }

    let mut patched = String::with_capacity(contents.len() + marker.len() + 2);
    let mut anchored = false;
    for line in contents.split_inclusive('\n') {
        patched.push_str(line);
        let (body, ending) = split_line_ending(line);
        if body.trim_end() != anchor {
            continue;
        }
        anchored = true;
        if ending.is_empty() {
            patched.push('\n');
            patched.push_str(marker);
        } else {
            patched.push_str(marker);
            patched.push_str(ending);
        }
    }

    if anchored {
        PatchOutcome::Patched(patched)
    } else {
        PatchOutcome::AnchorMissing
    }
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Patch one file in place. A missing anchor leaves the file untouched.
pub fn patch_file(path: &Path, anchor: &str, marker: &str) -> Result<FileOutcome> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading generated file '{}'", path.display()))?;

    match patch_contents(&contents, anchor, marker) {
        PatchOutcome::AlreadyPatched => Ok(FileOutcome::Skipped),
        PatchOutcome::Patched(patched) => {
            fs::write(path, patched)
                .with_context(|| format!("writing patched file '{}'", path.display()))?;
            Ok(FileOutcome::Patched)
        }
        PatchOutcome::AnchorMissing => Err(PrepError::AnchorNotFound {
            path: path.to_path_buf(),
            anchor: anchor.to_string(),
        }
        .into()),
    }
}

/// Patch every generated build file, stopping at the first failure.
///
/// Files written before a failure stay patched.
pub fn patch_build_files(config: &PrepConfig) -> Result<PatchSummary> {
    let files = discover_build_files(&config.component_dir, &config.build_file_name)?;
    let anchor = config.anchor_line();
    let marker = config.marker_line();

    let mut summary = PatchSummary::default();
    for file in files {
        match patch_file(&file, &anchor, &marker)? {
            FileOutcome::Skipped => {
                println!("{} already patched", file.display());
                summary.skipped.push(file);
            }
            FileOutcome::Patched => {
                println!("{} patched", file.display());
                summary.patched.push(file);
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_dockerfile;
    use tempfile::TempDir;

    const ANCHOR: &str = "FROM debian:bookworm-slim";
    const MARKER: &str = "ENV DEB_CFLAGS_MAINT_APPEND='-DLOCK_DEBUG=1'";

    const GENERATED: &str = "#\n# NOTE: THIS DOCKERFILE IS GENERATED VIA \"apply-templates.sh\"\n#\n\nFROM debian:bookworm-slim\n\nRUN set -ex; apt-get update\n";

    fn config_for(temp: &TempDir) -> PrepConfig {
        let mut config = PrepConfig::defaults(temp.path());
        config.component_dir = temp.path().to_path_buf();
        config
    }

    #[test]
    fn marker_goes_directly_after_anchor() {
        let PatchOutcome::Patched(patched) = patch_contents(GENERATED, ANCHOR, MARKER) else {
            panic!("expected a patch");
        };

        let expected = GENERATED.replace(
            "FROM debian:bookworm-slim\n",
            "FROM debian:bookworm-slim\nENV DEB_CFLAGS_MAINT_APPEND='-DLOCK_DEBUG=1'\n",
        );
        assert_eq!(patched, expected);
    }

    #[test]
    fn anchor_on_last_line_without_newline() {
        let outcome = patch_contents("# x\nFROM debian:bookworm-slim", ANCHOR, MARKER);
        assert_eq!(
            outcome,
            PatchOutcome::Patched(format!("# x\nFROM debian:bookworm-slim\n{MARKER}"))
        );
    }

    #[test]
    fn crlf_line_endings_are_preserved() {
        let outcome = patch_contents("FROM debian:bookworm-slim\r\nRUN true\r\n", ANCHOR, MARKER);
        assert_eq!(
            outcome,
            PatchOutcome::Patched(format!("FROM debian:bookworm-slim\r\n{MARKER}\r\nRUN true\r\n"))
        );
    }

    #[test]
    fn marker_present_means_already_patched() {
        let contents = format!("FROM debian:bookworm-slim\n{MARKER}\n");
        assert_eq!(
            patch_contents(&contents, ANCHOR, MARKER),
            PatchOutcome::AlreadyPatched
        );
    }

    #[test]
    fn other_base_images_are_not_anchors() {
        let contents = "FROM debian:bookworm-slim AS builder\nFROM debian:bullseye-slim\n";
        assert_eq!(
            patch_contents(contents, ANCHOR, MARKER),
            PatchOutcome::AnchorMissing
        );
    }

    #[test]
    fn discovery_matches_exactly_two_levels() {
        let temp = TempDir::new().unwrap();
        write_dockerfile(temp.path(), "16", "bookworm", GENERATED);
        write_dockerfile(temp.path(), "15", "bookworm", GENERATED);
        fs::write(temp.path().join("Dockerfile"), GENERATED).unwrap();
        fs::create_dir_all(temp.path().join("16/bookworm/deep")).unwrap();
        fs::write(temp.path().join("16/bookworm/deep/Dockerfile"), GENERATED).unwrap();
        write_dockerfile(temp.path(), ".git", "modules", GENERATED);

        let files = discover_build_files(temp.path(), "Dockerfile").unwrap();
        assert_eq!(
            files,
            vec![
                temp.path().join("15/bookworm/Dockerfile"),
                temp.path().join("16/bookworm/Dockerfile"),
            ]
        );
    }

    #[test]
    fn empty_generation_is_fatal() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("16/bookworm")).unwrap();

        let err = patch_build_files(&config_for(&temp)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PrepError>(),
            Some(PrepError::GenerationProducedNothing { .. })
        ));
        assert!(err.to_string().contains("No Dockerfiles found"));
    }

    #[test]
    fn patching_twice_skips_everything() {
        let temp = TempDir::new().unwrap();
        write_dockerfile(temp.path(), "15", "bookworm", GENERATED);
        write_dockerfile(temp.path(), "16", "bookworm", GENERATED);
        let config = config_for(&temp);

        let first = patch_build_files(&config).unwrap();
        assert_eq!(first.patched.len(), 2);
        assert!(first.skipped.is_empty());
        let after_first = fs::read_to_string(temp.path().join("16/bookworm/Dockerfile")).unwrap();

        let second = patch_build_files(&config).unwrap();
        assert!(second.patched.is_empty());
        assert_eq!(second.skipped.len(), 2);
        let after_second =
            fs::read_to_string(temp.path().join("16/bookworm/Dockerfile")).unwrap();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn missing_anchor_names_the_file_and_leaves_it_alone() {
        let temp = TempDir::new().unwrap();
        let bad = "FROM alpine:3.19\nRUN true\n";
        write_dockerfile(temp.path(), "16", "alpine3.19", bad);

        let err = patch_build_files(&config_for(&temp)).unwrap_err();
        let bad_path = temp.path().join("16/alpine3.19/Dockerfile");
        match err.downcast_ref::<PrepError>() {
            Some(PrepError::AnchorNotFound { path, anchor }) => {
                assert_eq!(path, &bad_path);
                assert_eq!(anchor, ANCHOR);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("16/alpine3.19/Dockerfile"));
        assert_eq!(fs::read_to_string(&bad_path).unwrap(), bad);
    }

    #[test]
    fn earlier_files_stay_patched_after_abort() {
        let temp = TempDir::new().unwrap();
        write_dockerfile(temp.path(), "15", "bookworm", GENERATED);
        write_dockerfile(temp.path(), "16", "bookworm", "FROM scratch\n");
        let config = config_for(&temp);

        assert!(patch_build_files(&config).is_err());
        let earlier = fs::read_to_string(temp.path().join("15/bookworm/Dockerfile")).unwrap();
        assert!(earlier.contains(MARKER));

        write_dockerfile(temp.path(), "16", "bookworm", GENERATED);
        let rerun = patch_build_files(&config).unwrap();
        assert_eq!(rerun.skipped, vec![temp.path().join("15/bookworm/Dockerfile")]);
        assert_eq!(rerun.patched, vec![temp.path().join("16/bookworm/Dockerfile")]);
    }
}
