//! Routing a source tree into the plain and rich trees.
//!
//! The walk goes directory by directory. For each directory only the index
//! document (`index.md` by default) is ever read:
//!
//! ```text
//! content/                    plain/                 rich/
//! ├── index.md      (plain)   ├── index.md@
//! ├── about.md                ├── about.md@
//! └── gallery/
//!     ├── index.md  (rich)                           └── gallery/
//!     ├── cat.jpg                                        ├── index.md   (copy)
//!     └── notes.md                                       ├── cat.jpg@
//!                                                        └── notes.md@
//! ```
//!
//! A rich index is copied, because the component pipeline rewrites it, and
//! every other file next to it is linked into the rich tree so relative
//! references from the document keep resolving. All other files are linked
//! into the plain tree. A directory is decided before any of its files is
//! placed, so a file never shows up in both trees whatever order the OS
//! lists it in.
//!
//! Subdirectories are decided on their own: a rich parent does not make its
//! children rich.

use crate::config::{InvalidMetadataPolicy, PartitionConfig, Trees};
use crate::detect::{Detector, Requirement};
use crate::frontmatter::{self, Metadata};
use crate::place::{Action, Outcome, Placement, Placer, PlaceError, Tree};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Source directory not found: {0}")]
    MissingSource(PathBuf),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("{0} is outside the source tree")]
    OutsideSource(PathBuf),
    #[error(transparent)]
    Place(#[from] PlaceError),
}

/// Where and how one source file is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub action: Action,
    pub tree: Tree,
}

impl RoutingDecision {
    pub const PLAIN: Self = Self {
        action: Action::Link,
        tree: Tree::Plain,
    };
    pub const RICH_INDEX: Self = Self {
        action: Action::Copy,
        tree: Tree::Rich,
    };
    pub const RICH_RESOURCE: Self = Self {
        action: Action::Link,
        tree: Tree::Rich,
    };
}

/// Everything a run did, in order.
#[derive(Debug, Default, Serialize)]
pub struct RouteReport {
    pub placements: Vec<Placement>,
    /// Index documents (relative to the source root) whose front matter did
    /// not decode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_metadata: Vec<PathBuf>,
}

impl RouteReport {
    /// Placements in `tree` done with `action`, whatever their outcome.
    pub fn count(&self, tree: Tree, action: Action) -> usize {
        self.placements
            .iter()
            .filter(|p| p.tree == tree && p.action == action)
            .count()
    }

    pub fn count_outcome(&self, outcome: Outcome) -> usize {
        self.placements
            .iter()
            .filter(|p| p.outcome == outcome)
            .count()
    }

}

/// Walks a source tree and places every regular file.
///
/// The roots in `trees` are expected to be absolute; link targets are
/// computed lexically from them.
pub struct Router<'a> {
    trees: &'a Trees,
    options: &'a PartitionConfig,
    detector: Detector,
    placer: Placer,
}

impl<'a> Router<'a> {
    pub fn new(trees: &'a Trees, options: &'a PartitionConfig, placer: Placer) -> Self {
        Self {
            trees,
            options,
            detector: Detector::new(options.component_tags.as_slice()),
            placer,
        }
    }

    /// Route the whole source tree.
    pub fn route(&self) -> Result<RouteReport, RouteError> {
        if !self.trees.source.is_dir() {
            return Err(RouteError::MissingSource(self.trees.source.clone()));
        }

        let mut report = RouteReport::default();
        for entry in WalkDir::new(&self.trees.source).follow_links(false) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                self.route_directory(entry.path(), &mut report)?;
            }
        }
        Ok(report)
    }

    /// Place the regular files directly inside `dir`.
    fn route_directory(&self, dir: &Path, report: &mut RouteReport) -> Result<(), RouteError> {
        let files = regular_files(dir)?;
        let index = files
            .iter()
            .find(|f| f.file_name().is_some_and(|n| n == self.index_name()));

        if let Some(index) = index {
            let decision = self.decide_index(index, report)?;
            if decision == RoutingDecision::RICH_INDEX {
                self.place(index, decision, report)?;
                return self.link_resources(dir, report);
            }
        }

        for file in &files {
            self.place(file, RoutingDecision::PLAIN, report)?;
        }
        Ok(())
    }

    /// Read an index document and decide which tree it belongs to.
    pub fn decide_index(
        &self,
        path: &Path,
        report: &mut RouteReport,
    ) -> Result<RoutingDecision, RouteError> {
        let bytes = fs::read(path).map_err(|source| RouteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = frontmatter::parse_bytes(&bytes);

        if let Metadata::Invalid(e) = &doc.metadata {
            tracing::warn!("Warning: Could not parse {}: {e}", path.display());
            report
                .invalid_metadata
                .push(self.relative(path)?.to_path_buf());
        }

        let requirement = self.detector.requirement(&doc);
        let rich = match requirement {
            Requirement::Required => true,
            Requirement::NotRequired => false,
            Requirement::Unknown => self.options.invalid_metadata == InvalidMetadataPolicy::Rich,
        };
        tracing::debug!(?requirement, rich, "{}", path.display());

        Ok(if rich {
            RoutingDecision::RICH_INDEX
        } else {
            RoutingDecision::PLAIN
        })
    }

    /// Link every regular file in `dir` except the index into the rich tree.
    ///
    /// Subdirectories are left to the walk.
    pub fn link_resources(&self, dir: &Path, report: &mut RouteReport) -> Result<(), RouteError> {
        for file in regular_files(dir)? {
            if file.file_name().is_some_and(|n| n == self.index_name()) {
                continue;
            }
            self.place(&file, RoutingDecision::RICH_RESOURCE, report)?;
        }
        Ok(())
    }

    fn place(
        &self,
        source: &Path,
        decision: RoutingDecision,
        report: &mut RouteReport,
    ) -> Result<(), RouteError> {
        let relative = self.relative(source)?;
        let dest_root = match decision.tree {
            Tree::Plain => &self.trees.plain,
            Tree::Rich => &self.trees.rich,
        };
        let placement =
            self.placer
                .place(decision.action, decision.tree, source, relative, dest_root)?;
        report.placements.push(placement);
        Ok(())
    }

    fn relative<'p>(&self, path: &'p Path) -> Result<&'p Path, RouteError> {
        path.strip_prefix(&self.trees.source)
            .map_err(|_| RouteError::OutsideSource(path.to_path_buf()))
    }

    fn index_name(&self) -> &str {
        &self.options.index_name
    }
}

/// Files directly inside `dir`, in the order the OS lists them.
///
/// Symbolic links count when they resolve to a regular file; the link itself
/// is what gets placed. Links to directories and dangling links are skipped.
fn regular_files(dir: &Path) -> Result<Vec<PathBuf>, RouteError> {
    let read_err = |source| RouteError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let file_type = entry.file_type().map_err(read_err)?;
        let path = entry.path();
        if file_type.is_file() || (file_type.is_symlink() && points_to_file(&path)) {
            files.push(path);
        } else if !file_type.is_dir() {
            tracing::debug!("skipping non-regular entry {}", path.display());
        }
    }
    Ok(files)
}

fn points_to_file(link: &Path) -> bool {
    fs::metadata(link).is_ok_and(|m| m.is_file())
}
