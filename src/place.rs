//! Placing files into a destination tree.
//!
//! A placement makes one source file available at the same relative path
//! under a destination root, either as a copy or as a symlink. Links use a
//! relative target (`../../content/guide/image.png`) so the destination tree
//! keeps working if the whole project directory moves.
//!
//! Placement never overwrites. If anything already sits at the destination,
//! including a dangling symlink, the placement is reported as
//! [`Outcome::Skipped`]. This is what makes incremental re-runs safe.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaceError {
    #[error("Cannot inspect {path}: {source}")]
    Inspect { path: PathBuf, source: io::Error },
    #[error("Cannot create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Cannot copy {from} -> {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("Cannot link {link} -> {target}: {source}")]
    Link {
        link: PathBuf,
        target: PathBuf,
        source: io::Error,
    },
}

/// How a file reaches its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Copy,
    Link,
}

/// Which destination tree a file goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tree {
    Plain,
    Rich,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The file was written.
    Placed,
    /// Simulate mode: the file would have been written.
    Simulated,
    /// Something already exists at the destination.
    Skipped,
}

/// One executed (or simulated, or skipped) placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub action: Action,
    pub tree: Tree,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: Outcome,
}

/// Executes placements, optionally without touching the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct Placer {
    simulate: bool,
}

impl Placer {
    pub fn new(simulate: bool) -> Self {
        Self { simulate }
    }

    /// Place `source` (which lives at `relative` under the source root) into
    /// `dest_root`.
    pub fn place(
        &self,
        action: Action,
        tree: Tree,
        source: &Path,
        relative: &Path,
        dest_root: &Path,
    ) -> Result<Placement, PlaceError> {
        let destination = dest_root.join(relative);
        let mut placement = Placement {
            action,
            tree,
            source: source.to_path_buf(),
            destination,
            outcome: Outcome::Skipped,
        };
        let dst = &placement.destination;

        if exists_no_follow(dst).map_err(|source| PlaceError::Inspect {
            path: dst.clone(),
            source,
        })? {
            tracing::debug!("{} already exists", dst.display());
            return Ok(placement);
        }

        let dst_dir = dst.parent().unwrap_or(dest_root);
        if !self.simulate {
            fs::create_dir_all(dst_dir).map_err(|source| PlaceError::CreateDir {
                path: dst_dir.to_path_buf(),
                source,
            })?;
        }

        match action {
            Action::Copy => {
                tracing::info!("copy {} -> {}", source.display(), dst.display());
                if !self.simulate {
                    copy_preserving_times(source, dst).map_err(|e| PlaceError::Copy {
                        from: source.to_path_buf(),
                        to: dst.clone(),
                        source: e,
                    })?;
                }
            }
            Action::Link => {
                let target = relative_path(source, dst_dir);
                tracing::info!("link {} -> {}", dst.display(), target.display());
                if !self.simulate {
                    symlink_file(&target, dst).map_err(|e| PlaceError::Link {
                        link: dst.clone(),
                        target: target.clone(),
                        source: e,
                    })?;
                }
            }
        }

        placement.outcome = if self.simulate {
            Outcome::Simulated
        } else {
            Outcome::Placed
        };
        Ok(placement)
    }
}

/// Existence check that treats a dangling symlink as present.
fn exists_no_follow(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Copy bytes and permissions, then carry over access and modification times.
/// Copy contents and permissions, then carry over the timestamps.
///
/// Setting times needs a handle opened for writing (Windows rejects a
/// read-only one), so a read-only copy is made writable for the duration.
fn copy_preserving_times(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;
    let meta = fs::metadata(from)?;
    let mut times = fs::FileTimes::new().set_modified(meta.modified()?);
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }

    let permissions = meta.permissions();
    if permissions.readonly() {
        let mut writable = permissions.clone();
        #[allow(clippy::permissions_set_readonly_false)]
        writable.set_readonly(false);
        fs::set_permissions(to, writable)?;
    }
    fs::OpenOptions::new().write(true).open(to)?.set_times(times)?;
    if permissions.readonly() {
        fs::set_permissions(to, permissions)?;
    }
    Ok(())
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent.
///
/// Symlinks are not resolved. A `..` that would climb above the root (or the
/// start of a relative path) is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Relative path from directory `base` to `target`.
///
/// Both paths should be absolute (or both relative to the same directory).
/// They are normalized first, so `..` segments in either are handled.
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target = normalize(target);
    let base = normalize(base);
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &target_parts[common..] {
        rel.push(part.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/../../b")), PathBuf::from("../../b"));
        assert_eq!(normalize(Path::new("a/b/..")), PathBuf::from("a"));
    }

    #[test]
    fn relative_path_to_sibling_tree() {
        let rel = relative_path(
            Path::new("/project/content/guide/img.png"),
            Path::new("/project/build/md/guide"),
        );
        assert_eq!(rel, PathBuf::from("../../../content/guide/img.png"));
    }

    #[test]
    fn relative_path_at_root_depth() {
        let rel = relative_path(Path::new("/p/content/a.md"), Path::new("/p/md"));
        assert_eq!(rel, PathBuf::from("../content/a.md"));
    }

    #[test]
    fn relative_path_into_subdirectory() {
        let rel = relative_path(Path::new("/p/x/y/z.md"), Path::new("/p"));
        assert_eq!(rel, PathBuf::from("x/y/z.md"));
    }

    #[test]
    fn relative_path_with_dot_segments() {
        let rel = relative_path(Path::new("/p/./content/../content/a.md"), Path::new("/p/md/."));
        assert_eq!(rel, PathBuf::from("../content/a.md"));
    }

    #[test]
    fn copy_creates_parents_and_keeps_mtime() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src/a/index.md");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "hello").unwrap();
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        fs::OpenOptions::new()
            .write(true)
            .open(&src)
            .unwrap()
            .set_times(fs::FileTimes::new().set_modified(old))
            .unwrap();

        let dst_root = tmp.path().join("rich");
        let placement = Placer::new(false)
            .place(Action::Copy, Tree::Rich, &src, Path::new("a/index.md"), &dst_root)
            .unwrap();

        assert_eq!(placement.outcome, Outcome::Placed);
        let dst = dst_root.join("a/index.md");
        assert_eq!(placement.destination, dst);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "hello");
        assert!(!fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());
        assert_eq!(fs::metadata(&dst).unwrap().modified().unwrap(), old);
    }

    #[cfg(unix)]
    #[test]
    fn read_only_copy_keeps_mtime_and_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src/index.md");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "locked").unwrap();
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(2_000_000);
        fs::OpenOptions::new()
            .write(true)
            .open(&src)
            .unwrap()
            .set_times(fs::FileTimes::new().set_modified(old))
            .unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o444)).unwrap();

        let dst_root = tmp.path().join("rich");
        let placement = Placer::new(false)
            .place(Action::Copy, Tree::Rich, &src, Path::new("index.md"), &dst_root)
            .unwrap();

        assert_eq!(placement.outcome, Outcome::Placed);
        let meta = fs::metadata(dst_root.join("index.md")).unwrap();
        assert_eq!(meta.modified().unwrap(), old);
        assert_eq!(meta.permissions().mode() & 0o777, 0o444);
    }

    #[cfg(unix)]
    #[test]
    fn link_is_relative_and_resolves() {
        let tmp = TempDir::new().unwrap();
        let root = std::path::absolute(tmp.path()).unwrap();
        let src = root.join("content/x/y/page.md");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "page body").unwrap();

        let dst_root = root.join("out/md");
        let placement = Placer::new(false)
            .place(Action::Link, Tree::Plain, &src, Path::new("x/y/page.md"), &dst_root)
            .unwrap();

        let dst = dst_root.join("x/y/page.md");
        assert_eq!(placement.outcome, Outcome::Placed);
        let target = fs::read_link(&dst).unwrap();
        assert!(target.is_relative());
        assert_eq!(target, PathBuf::from("../../../../content/x/y/page.md"));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "page body");
    }

    #[test]
    fn existing_destination_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.md");
        fs::write(&src, "new").unwrap();
        let dst_root = tmp.path().join("out");
        fs::create_dir_all(&dst_root).unwrap();
        fs::write(dst_root.join("a.md"), "old").unwrap();

        let placement = Placer::new(false)
            .place(Action::Copy, Tree::Rich, &src, Path::new("a.md"), &dst_root)
            .unwrap();

        assert_eq!(placement.outcome, Outcome::Skipped);
        assert_eq!(fs::read_to_string(dst_root.join("a.md")).unwrap(), "old");
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_counts_as_existing() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.md");
        fs::write(&src, "x").unwrap();
        let dst_root = tmp.path().join("out");
        fs::create_dir_all(&dst_root).unwrap();
        std::os::unix::fs::symlink("missing.md", dst_root.join("a.md")).unwrap();

        let placement = Placer::new(false)
            .place(Action::Link, Tree::Plain, &src, Path::new("a.md"), &dst_root)
            .unwrap();
        assert_eq!(placement.outcome, Outcome::Skipped);
    }

    #[test]
    fn simulate_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.md");
        fs::write(&src, "x").unwrap();
        let dst_root = tmp.path().join("out");
        let placer = Placer::new(true);

        for action in [Action::Copy, Action::Link] {
            let placement = placer
                .place(action, Tree::Plain, &src, Path::new("deep/a.md"), &dst_root)
                .unwrap();
            assert_eq!(placement.outcome, Outcome::Simulated);
        }
        assert!(!dst_root.exists());
    }

    #[test]
    fn missing_source_fails_copy() {
        let tmp = TempDir::new().unwrap();
        let result = Placer::new(false).place(
            Action::Copy,
            Tree::Rich,
            &tmp.path().join("gone.md"),
            Path::new("gone.md"),
            &tmp.path().join("out"),
        );
        assert!(matches!(result, Err(PlaceError::Copy { .. })));
    }
}
