//! Fatal conditions raised while preparing the build definitions.
//!
//! Every variant aborts the run. They travel inside `anyhow::Error`, so
//! callers that need the tag use `err.downcast_ref::<PrepError>()`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("version '{version}' is missing required field '{field}'")]
    MissingField { version: String, field: String },

    #[error("version '{version}' has an invalid record: {reason}")]
    InvalidRecord { version: String, reason: String },

    #[error("No Dockerfiles found after processing! (looked for '*/*/{file_name}' under '{}')", .root.display())]
    GenerationProducedNothing { root: PathBuf, file_name: String },

    #[error("{} does not contain \"{anchor}\"!", .path.display())]
    AnchorNotFound { path: PathBuf, anchor: String },

    #[error("{description} failed with exit code: {}", exit_code_label(.code))]
    ExternalProcess {
        description: String,
        code: Option<i32>,
    },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}
