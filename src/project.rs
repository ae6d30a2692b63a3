// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project layout resolution.
//!
//! Everything oxikit does revolves around three paths: the project root, the
//! app package directory, and the package's init file. They get resolved
//! once, up front, into a [`ProjectPaths`] value that every downstream
//! operation receives explicitly. No global state, no hidden working
//! directory assumptions past this point.

use crate::path::{find_path, DEFAULT_EXCLUSIONS, DEFAULT_MAX_DEPTH};

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Canonical name of the Python package marker file.
pub const INIT_FILE_NAME: &str = "__init__.py";

/// Resolved paths of the project being worked on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectPaths {
    /// Top level of the project, usually the repository top level.
    pub root: PathBuf,

    /// The app package directory that holds the code being shipped.
    pub app: PathBuf,

    /// The package's init file, which carries the version stamp.
    pub init: PathBuf,
}

impl ProjectPaths {
    /// Resolve project paths from overrides or discovery.
    ///
    /// A missing root falls back to the current working directory. A missing
    /// init file is discovered by searching for the shallowest `__init__.py`
    /// under the root, skipping vendored directories. A relative init
    /// override is taken relative to the root. The app directory is always
    /// the parent of the init file.
    ///
    /// # Errors
    ///
    /// - Return [`Error::NoWorkingDirectory`] if no root was given and the
    ///   working directory is unusable.
    /// - Return [`Error::BadRoot`] if the root does not resolve to a real
    ///   directory.
    /// - Return [`Error::Find`] if init file discovery fails.
    pub fn discover(root: Option<PathBuf>, init: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(path) => path,
            None => env::current_dir().map_err(Error::NoWorkingDirectory)?,
        };
        let root = root.canonicalize().map_err(|err| Error::BadRoot {
            root: root.clone(),
            source: err,
        })?;

        let init = match init {
            Some(path) if path.is_absolute() => path,
            Some(path) => root.join(path),
            None => find_path(INIT_FILE_NAME, &root, &DEFAULT_EXCLUSIONS, DEFAULT_MAX_DEPTH)?,
        };

        let app = init
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::NoAppDir { init: init.clone() })?;

        debug!(
            "resolved project paths: root={} app={} init={}",
            root.display(),
            app.display(),
            init.display()
        );

        Ok(Self { root, app, init })
    }

    /// Value for `PYTHONPATH` that puts the project root first.
    ///
    /// Child processes like pytest need to import the app package straight
    /// from source. Prepends the root to the inherited `PYTHONPATH`, unless
    /// the root is already on it, so nested runs never stack duplicates.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Pythonpath`] if the merged value cannot be joined.
    pub fn pythonpath(&self) -> Result<OsString> {
        merge_pythonpath(&self.root, env::var_os("PYTHONPATH"))
    }
}

fn merge_pythonpath(root: &Path, existing: Option<OsString>) -> Result<OsString> {
    let Some(existing) = existing else {
        return Ok(root.as_os_str().to_os_string());
    };
    if existing.is_empty() {
        return Ok(root.as_os_str().to_os_string());
    }

    let entries: Vec<PathBuf> = env::split_paths(&existing).collect();
    if entries.iter().any(|entry| entry == root) {
        return Ok(existing);
    }

    let merged = env::join_paths(std::iter::once(root.to_path_buf()).chain(entries))?;
    Ok(merged)
}

/// Project layout resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Working directory is missing or inaccessible.
    #[error("cannot determine current working directory")]
    NoWorkingDirectory(#[source] std::io::Error),

    /// Project root does not resolve to a real directory.
    #[error("project root {} is not usable", root.display())]
    BadRoot {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Init file discovery failed.
    #[error(transparent)]
    Find(#[from] crate::path::Error),

    /// Init file sits nowhere that can act as an app directory.
    #[error("init file {} has no parent directory", init.display())]
    NoAppDir { init: PathBuf },

    /// Merged PYTHONPATH contains an invalid entry.
    #[error(transparent)]
    Pythonpath(#[from] std::env::JoinPathsError),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
