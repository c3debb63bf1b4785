//! Bookkeeping for temporary files and directories created while resolving a
//! source.

use std::collections::VecDeque;
use std::fs::File;
use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};

const TEMP_PREFIX: &str = "edne-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    File,
    Directory,
}

/// A temporary path owned by one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

/// Temporary artifacts in creation order.
///
/// Everything still tracked is deleted when the value is dropped.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    root: Option<PathBuf>,
    items: VecDeque<TempArtifact>,
}

impl TempArtifacts {
    /// Creates an empty set. Artifacts are created under `root`, or under the
    /// system temporary directory when `root` is `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            items: VecDeque::new(),
        }
    }

    fn builder() -> tempfile::Builder<'static, 'static> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX);
        builder
    }

    /// Creates and tracks a new temporary directory.
    pub fn create_dir(&mut self) -> io::Result<PathBuf> {
        let dir = match &self.root {
            Some(root) => Self::builder().tempdir_in(root)?,
            None => Self::builder().tempdir()?,
        };
        let path = dir.keep();
        self.items.push_back(TempArtifact {
            path: path.clone(),
            kind: ArtifactKind::Directory,
        });
        Ok(path)
    }

    /// Creates and tracks a new temporary file, returning it open for writing.
    pub fn create_file(&mut self) -> io::Result<(File, PathBuf)> {
        let file = match &self.root {
            Some(root) => Self::builder().tempfile_in(root)?,
            None => Self::builder().tempfile()?,
        };
        let (file, path) = file.keep().map_err(|e| e.error)?;
        self.items.push_back(TempArtifact {
            path: path.clone(),
            kind: ArtifactKind::File,
        });
        Ok((file, path))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes tracked artifacts oldest first. With `keep_last`, the most
    /// recently created artifact is kept.
    ///
    /// Paths that are already gone are skipped.
    pub fn remove(&mut self, keep_last: bool) {
        let keep = usize::from(keep_last);
        while self.items.len() > keep {
            let Some(artifact) = self.items.pop_front() else {
                break;
            };
            remove_artifact(&artifact);
        }
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        self.remove(false);
    }
}

fn remove_artifact(artifact: &TempArtifact) {
    let result = match artifact.kind {
        ArtifactKind::File => {
            debug!("Removing temporary file {}", artifact.path.display());
            std::fs::remove_file(&artifact.path)
        }
        ArtifactKind::Directory => {
            debug!("Removing temporary directory {}", artifact.path.display());
            std::fs::remove_dir_all(&artifact.path)
        }
    };
    if let Err(e) = result
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!("Failed to remove {}: {}", artifact.path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_remove_is_fifo_and_keeps_last() {
        let root = tempdir().unwrap();
        let mut artifacts = TempArtifacts::new(Some(root.path().to_path_buf()));
        let (_, file) = artifacts.create_file().unwrap();
        let first = artifacts.create_dir().unwrap();
        let last = artifacts.create_dir().unwrap();

        artifacts.remove(true);

        assert!(!file.exists());
        assert!(!first.exists());
        assert!(last.exists());
        assert_eq!(artifacts.len(), 1);

        drop(artifacts);
        assert!(!last.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_tolerates_missing_paths() {
        let root = tempdir().unwrap();
        let mut artifacts = TempArtifacts::new(Some(root.path().to_path_buf()));
        let dir = artifacts.create_dir().unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        artifacts.remove(false);
        artifacts.remove(false);
        assert!(artifacts.is_empty());
    }
}
