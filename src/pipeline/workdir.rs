use anyhow::Context;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::Result;

/// Scratch directory owned by exactly one run.
///
/// Removed by [`WorkDir::close`] on the normal paths; the inner [`TempDir`]
/// removes it on drop if the run unwinds before reaching `close`.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Create a fresh working directory under `root`, or the system temp dir
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("mashup-");

        let dir = match root {
            Some(root) => {
                fs_err::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .context("Failed to create temporary directory")?;

        tracing::debug!("Working directory: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a scratch file inside the directory
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Delete the directory and everything in it.
    ///
    /// Failures are logged and swallowed; they never change a run's outcome.
    pub fn close(self) -> bool {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => {
                tracing::info!("Temporary files cleaned up");
                true
            }
            Err(e) => {
                tracing::error!("Could not clean up temporary files in {}: {}", path.display(), e);
                false
            }
        }
    }
}
