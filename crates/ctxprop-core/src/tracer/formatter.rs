//! External formatter run once over the target directory

use std::io;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::config::FormatterConfig;

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("failed to launch formatter {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("formatter {program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

#[derive(Debug, Clone)]
pub struct Formatter {
    program: String,
    args: Vec<String>,
}

impl Formatter {
    pub fn from_config(config: &FormatterConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    /// The command as it would be typed, for reports
    pub fn command_line(&self, dir: &Path) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.push(dir.display().to_string());
        parts.join(" ")
    }

    pub fn format_directory(&self, dir: &Path) -> Result<(), FormatError> {
        debug!(command = %self.command_line(dir), "running formatter");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(dir)
            .output()
            .map_err(|source| FormatError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(FormatError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn formatter(program: &str) -> Formatter {
        Formatter::from_config(&FormatterConfig {
            program: program.to_string(),
            args: Vec::new(),
        })
    }

    #[test]
    fn test_command_line() {
        let formatter = Formatter::from_config(&FormatterConfig::default());
        assert_eq!(formatter.command_line(Path::new("pkg")), "gofmt -s -w pkg");
    }

    #[test]
    fn test_success() {
        let dir = tempfile::tempdir().unwrap();
        formatter("true").format_directory(dir.path()).unwrap();
    }

    #[test]
    fn test_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let err = formatter("false").format_directory(dir.path()).unwrap_err();
        assert!(matches!(err, FormatError::Failed { .. }));
    }

    #[test]
    fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let err = formatter("ctxprop-no-such-formatter")
            .format_directory(dir.path())
            .unwrap_err();
        assert!(matches!(err, FormatError::Launch { .. }));
    }
}
