// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project file discovery.
//!
//! Locate well-known files inside a project tree without knowing the exact
//! layout up front.
//!
//! # Why Breadth-First Widening?
//!
//! Project layouts differ wildly: some keep the app package at the top
//! level, others bury it under `src` or a platform directory. Instead of
//! walking the whole tree, [`find_path`] widens a glob pattern one directory
//! level at a time and takes the first hit. A match at a shallow level
//! always beats a deeper one, so a vendored copy of a file buried inside
//! `node_modules` can never shadow the real one sitting two levels up.
//!
//! Within a single level, matches arrive in lexicographic order, which keeps
//! repeated runs deterministic.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory names that never hold project files worth finding.
pub const DEFAULT_EXCLUSIONS: [&str; 3] = ["node_modules", "build", "dist"];

/// How many directory levels below the search root get widened into.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Find the shallowest file with a given name under a search root.
///
/// The file name is interpreted as a glob pattern, so `*.cfg` finds the
/// first configuration file just as well as a literal name does. Matches
/// with any path component named in `exclusions` (relative to the search
/// root) are rejected.
///
/// Shallower matches always win over deeper ones. Between matches at the
/// same depth, the first one the glob iterator yields wins; rely on the
/// depth, not on any order within it.
///
/// # Errors
///
/// - Return [`Error::BadPattern`] if the assembled glob pattern is invalid.
/// - Return [`Error::NotFound`] if nothing matches within `max_depth`
///   levels.
pub fn find_path(
    file_name: &str,
    search_root: impl AsRef<Path>,
    exclusions: &[impl AsRef<str>],
    max_depth: usize,
) -> Result<PathBuf> {
    let root = search_root.as_ref();
    let mut base = glob::Pattern::escape(root.to_string_lossy().as_ref());
    if !base.ends_with('/') {
        base.push('/');
    }

    for level in 0..max_depth {
        let mut pattern = base.clone();
        for _ in 0..level {
            pattern.push_str("*/");
        }
        pattern.push_str(file_name);

        let matches = glob::glob(&pattern).map_err(|err| Error::BadPattern {
            pattern: pattern.clone(),
            source: err,
        })?;

        for entry in matches {
            // INVARIANT: Unreadable entries never abort the search.
            let Ok(path) = entry else { continue };
            if is_excluded(root, &path, exclusions) {
                debug!("rejecting {} (excluded component)", path.display());
                continue;
            }

            return Ok(path);
        }
    }

    Err(Error::NotFound {
        file_name: file_name.to_string(),
        search_root: root.to_path_buf(),
        max_depth,
    })
}

fn is_excluded(root: &Path, path: &Path, exclusions: &[impl AsRef<str>]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| {
        exclusions
            .iter()
            .any(|name| component.as_os_str() == name.as_ref())
    })
}

/// Project file discovery error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Search pattern assembled from the root was rejected.
    #[error("invalid search pattern {pattern:?}")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Nothing matched within the depth bound.
    #[error("no file named {file_name:?} within {max_depth} levels of {}", search_root.display())]
    NotFound {
        file_name: String,
        search_root: PathBuf,
        max_depth: usize,
    },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
