/*!
# File Transaction Writer

Replaces a source file so that its content is never lost:

1. write the new text to `<file>.tmp` and sync it
2. rename `<file>` to `<file>.tmp2`
3. rename `<file>.tmp` to `<file>`
4. delete `<file>.tmp2`

At every step either `<file>` or `<file>.tmp2` holds the original text, and a
failed step undoes the ones before it.
*/

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Failure of one transaction step
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("failed to write temporary file {path}: {source}")]
    Temporary {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move {path} aside: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install new content at {path}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The new content is in place; only the backup is left behind
    #[error("rewrote file but failed to remove backup {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    /// Whether the new content reached the target despite the error
    pub fn is_installed(&self) -> bool {
        matches!(self, WriteError::Cleanup { .. })
    }
}

/// One file replacement
#[derive(Debug, Clone)]
pub struct FileTransaction {
    target: PathBuf,
    staged: PathBuf,
    backup: PathBuf,
}

impl FileTransaction {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        let target = target.into();
        Self {
            staged: with_suffix(&target, ".tmp"),
            backup: with_suffix(&target, ".tmp2"),
            target,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn staged_path(&self) -> &Path {
        &self.staged
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Write and sync the new content beside the target
    pub fn stage(&self, content: &str) -> Result<(), WriteError> {
        let temporary = |source| WriteError::Temporary {
            path: self.staged.clone(),
            source,
        };
        let mut file = File::create(&self.staged).map_err(temporary)?;
        file.write_all(content.as_bytes()).map_err(temporary)?;
        file.sync_all().map_err(temporary)?;
        Ok(())
    }

    /// Move the original aside; drops the staged file on failure
    pub fn backup(&self) -> Result<(), WriteError> {
        if let Err(source) = fs::rename(&self.target, &self.backup) {
            self.discard_staged();
            return Err(WriteError::Backup {
                path: self.target.clone(),
                source,
            });
        }
        Ok(())
    }

    /// Move the staged file into place; restores the original on failure
    pub fn install(&self) -> Result<(), WriteError> {
        if let Err(source) = fs::rename(&self.staged, &self.target) {
            if let Err(e) = fs::rename(&self.backup, &self.target) {
                warn!(
                    backup = %self.backup.display(),
                    error = %e,
                    "could not restore original, it remains at the backup path"
                );
            }
            self.discard_staged();
            return Err(WriteError::Install {
                path: self.target.clone(),
                source,
            });
        }
        Ok(())
    }

    /// Remove the original's backup
    pub fn finish(&self) -> Result<(), WriteError> {
        fs::remove_file(&self.backup).map_err(|source| WriteError::Cleanup {
            path: self.backup.clone(),
            source,
        })
    }

    pub fn commit(&self, content: &str) -> Result<(), WriteError> {
        self.stage(content)?;
        self.backup()?;
        self.install()?;
        self.finish()?;
        debug!(path = %self.target.display(), "file replaced");
        Ok(())
    }

    /// Repair what an interrupted transaction left behind
    ///
    /// Returns whether the original had to be restored from its backup.
    pub fn recover(&self) -> io::Result<bool> {
        let mut restored = false;
        if !self.target.exists() && self.backup.exists() {
            fs::rename(&self.backup, &self.target)?;
            restored = true;
        }
        if self.staged.exists() {
            fs::remove_file(&self.staged)?;
        }
        Ok(restored)
    }

    fn discard_staged(&self) {
        if let Err(e) = fs::remove_file(&self.staged) {
            debug!(path = %self.staged.display(), error = %e, "staged file not removed");
        }
    }
}

/// Replace `path` with `content` transactionally
pub fn replace_file(path: &Path, content: &str) -> Result<(), WriteError> {
    FileTransaction::new(path).commit(content)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(content: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handler.go");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_temporary_paths() {
        let tx = FileTransaction::new("/src/handler.go");
        assert_eq!(tx.staged_path(), Path::new("/src/handler.go.tmp"));
        assert_eq!(tx.backup_path(), Path::new("/src/handler.go.tmp2"));
    }

    #[test]
    fn test_commit_replaces_and_cleans_up() {
        let (_dir, path) = setup("old");
        replace_file(&path, "new").unwrap();

        let tx = FileTransaction::new(&path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!tx.staged_path().exists());
        assert!(!tx.backup_path().exists());
    }

    #[test]
    fn test_original_recoverable_at_every_step() {
        let (_dir, path) = setup("old");
        let tx = FileTransaction::new(&path);

        tx.stage("new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");

        tx.backup().unwrap();
        assert!(!path.exists());
        assert_eq!(fs::read_to_string(tx.backup_path()).unwrap(), "old");

        // Interrupted here: recovery puts the original back.
        assert!(tx.recover().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert!(!tx.staged_path().exists());
        assert!(!tx.backup_path().exists());
    }

    #[test]
    fn test_backup_failure_discards_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.go");
        let tx = FileTransaction::new(&path);

        let err = tx.commit("new").unwrap_err();
        assert!(matches!(err, WriteError::Backup { .. }));
        assert!(!err.is_installed());
        assert!(!tx.staged_path().exists());
    }

    #[test]
    fn test_stage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("handler.go");
        let err = replace_file(&path, "new").unwrap_err();
        assert!(matches!(err, WriteError::Temporary { .. }));
    }
}
