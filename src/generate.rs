//! Template expansion through the checkout's own generator script.

use anyhow::{Context, Result};
use std::process::Command;

use crate::config::PrepConfig;
use crate::process::run_checked;

/// Run the generator with the component directory as working directory.
///
/// The generator reads the rewritten manifest and writes the Dockerfiles.
pub fn run_generator(config: &PrepConfig) -> Result<()> {
    let script = config.generator_path();
    eprintln!("  Running generator: {}", script.display());
    eprintln!("    Working dir: {}", config.component_dir.display());

    let mut cmd = Command::new(&script);
    cmd.current_dir(&config.component_dir);
    run_checked(&mut cmd, &config.generator)
        .with_context(|| format!("expanding templates in '{}'", config.component_dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;
    use crate::test_support::write_script;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(temp: &TempDir) -> PrepConfig {
        let mut config = PrepConfig::defaults(temp.path());
        config.component_dir = temp.path().to_path_buf();
        config
    }

    #[test]
    fn generator_runs_in_component_dir() {
        let temp = TempDir::new().unwrap();
        let config = config_for(&temp);
        write_script(&config.generator_path(), "pwd > ran-here\n");

        run_generator(&config).unwrap();

        let recorded = fs::read_to_string(temp.path().join("ran-here")).unwrap();
        assert_eq!(
            fs::canonicalize(recorded.trim()).unwrap(),
            fs::canonicalize(temp.path()).unwrap()
        );
    }

    #[test]
    fn generator_failure_is_propagated() {
        let temp = TempDir::new().unwrap();
        let config = config_for(&temp);
        write_script(&config.generator_path(), "exit 1\n");

        let err = run_generator(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PrepError>(),
            Some(PrepError::ExternalProcess { code: Some(1), .. })
        ));
    }

    #[test]
    fn missing_generator_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(run_generator(&config_for(&temp)).is_err());
    }
}
