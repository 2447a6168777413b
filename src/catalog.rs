//! Directory walking that builds the pool of candidate pictures.
//!
//! The walk is best effort: roots that are missing or unreadable simply
//! contribute nothing. Only a pool that ends up empty is an error.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::error::Error;

/// Immutable set of picture paths the rotation draws from.
///
/// Never empty. Duplicates are kept, so a directory listed twice is twice as
/// likely to be drawn. Cloning is cheap and shares the underlying slice.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    paths: Arc<[PathBuf]>,
}

impl CandidatePool {
    /// Wrap an already collected list of paths.
    ///
    /// # Errors
    /// Returns [`Error::EmptyCatalog`] if `paths` is empty.
    pub fn new(paths: Vec<PathBuf>) -> Result<Self, Error> {
        if paths.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        Ok(Self {
            paths: paths.into(),
        })
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Deref for CandidatePool {
    type Target = [PathBuf];

    fn deref(&self) -> &Self::Target {
        &self.paths
    }
}

/// Returns `true` if the file name of `path` ends in one of `extensions`.
///
/// The suffix includes the leading dot (`photo.JPG` has suffix `.JPG`) and is
/// compared byte for byte, so `.jpg` does not match `.JPG`.
#[must_use]
pub fn has_listed_suffix(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.strip_prefix('.') == Some(ext))
        })
}

/// Walk every directory recursively and collect files with a listed suffix.
///
/// Symlinks are followed. Entries the walker cannot read, including symlink
/// loops it reports, are skipped.
///
/// # Errors
/// Returns [`Error::EmptyCatalog`] if nothing matched.
#[instrument(skip_all, fields(roots = directories.len(), extensions = ?extensions))]
pub fn build(directories: &[PathBuf], extensions: &[String]) -> Result<CandidatePool, Error> {
    let mut out = Vec::new();
    for root in directories {
        let before = out.len();
        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(root = %root.display(), "catalog: skipping unreadable entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if has_listed_suffix(entry.path(), extensions) {
                out.push(entry.into_path());
            }
        }
        debug!(
            root = %root.display(),
            found = out.len() - before,
            "catalog: root walked"
        );
    }

    info!(candidates = out.len(), "catalog built");
    CandidatePool::new(out)
}
