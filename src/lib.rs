//! # Content Partition
//!
//! Splits a markdown content tree into two trees for a static site build:
//! one for documents that render as plain markdown, and one for documents
//! that need component rendering. The downstream site builder then runs its
//! cheap pipeline over the first tree and its expensive one over the second.
//!
//! # Pipeline
//!
//! ```text
//! 1. Reconcile   plain/ and rich/ emptied       (full rebuilds only)
//! 2. Route       content/ walked dir by dir     (index.md decides the dir)
//! 3. Place       link or copy into plain/rich   (never overwrites)
//! ```
//!
//! A directory goes to the rich tree when its index document asks for it,
//! either with `components: true` in the front matter or by using a
//! component tag such as `<slot ` or `<g-image ` in its body. Its index is
//! then copied and everything next to it is linked. Everything else is
//! linked into the plain tree.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | Splits a document into YAML front matter and body |
//! | [`detect`] | Decides whether a document needs component rendering |
//! | [`route`] | Walks the source tree and decides each file's placement |
//! | [`place`] | Copies or relatively links a file, skipping existing destinations |
//! | [`reconcile`] | Empties destination trees before a full rebuild |
//! | [`config`] | Loads the project config (JSON or TOML) |
//! | [`output`] | CLI output formatting of the run report |
//!
//! # Re-runs
//!
//! Placement skips any destination that already exists, so running twice
//! over an unchanged tree does nothing the second time. That also means an
//! incremental run never picks up a document that moved between trees; use
//! a full rebuild ([`Rebuild::Full`]) for that.

pub mod config;
pub mod detect;
pub mod frontmatter;
pub mod output;
pub mod place;
pub mod reconcile;
pub mod route;

#[cfg(test)]
pub(crate) mod test_helpers;

use config::{Config, ConfigError};
use place::Placer;
use reconcile::ReconcileError;
use route::{RouteError, RouteReport, Router};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Whether destination trees are emptied before placing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rebuild {
    /// Clear both trees, then place everything.
    #[default]
    Full,
    /// Keep what is there; only place files whose destination is missing.
    Incremental,
}

/// How a run treats the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    /// Log everything, write nothing.
    pub simulate: bool,
    pub rebuild: Rebuild,
}

/// Run a partition with the given config.
pub fn partition(config: &Config, mode: RunMode) -> Result<RouteReport, PartitionError> {
    config.validate()?;
    let trees = config.trees().absolute()?;

    if mode.rebuild == Rebuild::Full && !mode.simulate {
        for root in [&trees.plain, &trees.rich] {
            reconcile::clear_directory(root)?;
        }
    }

    let router = Router::new(&trees, &config.partition, Placer::new(mode.simulate));
    Ok(router.route()?)
}
