//! Clearing destination trees before a full rebuild.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Cannot create {path}: {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("Cannot remove {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
}

/// Empty `root`, creating it first if it does not exist.
///
/// Directories are removed wholesale; files and symlinks one by one. Symlinks
/// are never followed, so a link to a directory outside the tree only loses
/// the link. Returns the number of top-level entries removed.
pub fn clear_directory(root: &Path) -> Result<usize, ReconcileError> {
    fs::create_dir_all(root).map_err(|source| ReconcileError::Create {
        path: root.to_path_buf(),
        source,
    })?;

    let remove_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ReconcileError::Remove { path, source }
    };

    let mut removed = 0;
    for entry in fs::read_dir(root).map_err(remove_err(root))? {
        let entry = entry.map_err(remove_err(root))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(remove_err(&path))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&path).map_err(remove_err(&path))?;
        } else {
            fs::remove_file(&path).map_err(remove_err(&path))?;
        }
        removed += 1;
    }
    tracing::debug!("cleared {} ({removed} entries)", root.display());
    Ok(removed)
}
