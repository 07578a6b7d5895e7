//! Shared test utilities for the content-partition test suite.
//!
//! Builds throwaway content trees and describes destination trees as sorted
//! string listings, so assertions read like a directory diagram.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_file(tmp.path(), "content/foo/index.md", "<slot a>\n");
//! // ... run the router over trees_in(&tmp) ...
//! assert_eq!(tree_listing(&tmp.path().join("rich")), vec!["foo/index.md"]);
//! ```
//!
//! In listings, a trailing `@` marks a symlink.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::Trees;

// =========================================================================
// Fixture setup
// =========================================================================

/// The standard layout inside a temp dir: `content/`, `plain/`, `rich/`.
pub fn trees_in(tmp: &TempDir) -> Trees {
    let root = std::path::absolute(tmp.path()).unwrap();
    Trees::new(root.join("content"), root.join("plain"), root.join("rich"))
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

// =========================================================================
// Tree inspection
// =========================================================================

/// Every non-directory entry under `root`, relative, `/`-separated, sorted.
/// Symlinks get a trailing `@`. A missing root lists as empty.
pub fn tree_listing(root: &Path) -> Vec<String> {
    if !root.exists() {
        return Vec::new();
    }
    let mut entries: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| !e.file_type().is_dir())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            if e.path_is_symlink() {
                format!("{rel}@")
            } else {
                rel
            }
        })
        .collect();
    entries.sort();
    entries
}

/// Assert that `link` is a relative symlink whose content matches `source`.
pub fn assert_links_to(link: &Path, source: &Path) {
    let target = fs::read_link(link)
        .unwrap_or_else(|e| panic!("{} is not a symlink: {e}", link.display()));
    assert!(
        target.is_relative(),
        "{} -> {} should be relative",
        link.display(),
        target.display()
    );
    let resolved = link.parent().unwrap().join(&target);
    assert_eq!(
        fs::read(&resolved).unwrap(),
        fs::read(source).unwrap(),
        "{} does not resolve to {}",
        link.display(),
        source.display()
    );
}
