// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Documentation stub regeneration.
//!
//! # Why Sweep First?
//!
//! `sphinx-apidoc` writes one stub file per module it finds, but never
//! deletes stubs for modules that were removed or renamed. Left alone those
//! stale stubs keep generating documentation pages for code that no longer
//! exists. The sweep deletes everything directly under `docs/source` that is
//! not on the allow list, so the generator starts from a clean slate every
//! run.
//!
//! Entries that resist deletion are reported in the [`CleanupReport`] and
//! logged as warnings rather than aborting the run. A locked file should
//! not cancel a release, but the caller deserves to know about it.

use crate::{git, project::ProjectPaths, syscall};
use std::{
    ffi::{OsStr, OsString},
    fs::{read_dir, read_to_string, remove_dir_all, remove_file, write},
    path::{Path, PathBuf},
    process::ExitStatus,
};
use tracing::{info, instrument, warn};

/// Entry names the sweep always spares.
pub const DEFAULT_KEEP: [&str; 4] = ["conf.py", "index.rst", "_static", "_templates"];

/// Knobs for [`regenerate`].
#[derive(Clone, Debug)]
pub struct RegenerateOptions {
    /// Documentation directory. Defaults to `docs` under the project root.
    pub docs_path: Option<PathBuf>,

    /// Run `make html` for a local build of the rendered pages.
    pub build_locally: bool,

    /// Stage the docs directory once the stubs are regenerated.
    pub stage_for_commit: bool,

    /// Extra entry names the sweep will spare besides [`DEFAULT_KEEP`].
    pub extra_keep: Vec<String>,
}

impl Default for RegenerateOptions {
    fn default() -> Self {
        Self {
            docs_path: None,
            build_locally: false,
            stage_for_commit: true,
            extra_keep: Vec::new(),
        }
    }
}

/// What the stale-stub sweep did to `docs/source`.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Entries the sweep deleted.
    pub removed: Vec<PathBuf>,

    /// Entries that resisted deletion, with the error each one raised.
    pub skipped: Vec<(PathBuf, std::io::Error)>,
}

/// Regenerate Sphinx API stubs for the project's app package.
///
/// Probes for `sphinx-apidoc` before touching anything so a missing
/// generator never costs the user their existing stubs. Both generator
/// subprocesses run with the project root on `PYTHONPATH` so autodoc can
/// import the package being documented.
///
/// # Errors
///
/// - Return [`Error::MissingApidoc`] if `sphinx-apidoc` is not on `PATH`.
/// - Return [`Error::MissingSourceDirectory`] if `docs/source` is absent.
/// - Return [`Error::HtmlBuild`] or [`Error::Apidoc`] if a generator
///   subprocess exits unsuccessfully.
#[instrument(skip(paths, options), level = "debug")]
pub fn regenerate(paths: &ProjectPaths, options: &RegenerateOptions) -> Result<CleanupReport> {
    let apidoc = which::which("sphinx-apidoc").map_err(|err| Error::MissingApidoc { source: err })?;
    let docs_path = options
        .docs_path
        .clone()
        .unwrap_or_else(|| paths.root.join("docs"));

    let report = sweep(&docs_path.join("source"), &options.extra_keep)?;
    for (path, err) in &report.skipped {
        warn!("cannot remove stale docs entry {}: {err}", path.display());
    }

    let pythonpath = paths.pythonpath()?;
    if options.build_locally {
        let status = syscall::status_with_env(
            "make",
            ["html"],
            Some(&docs_path),
            &[("PYTHONPATH", pythonpath.clone())],
        )?;
        if !status.success() {
            return Err(Error::HtmlBuild { status });
        }
    }

    let args = [
        OsString::from("-f"),
        OsString::from("-e"),
        OsString::from("-o"),
        OsString::from("source"),
        paths.app.clone().into_os_string(),
    ];
    let status =
        syscall::status_with_env(&apidoc, args, Some(&docs_path), &[("PYTHONPATH", pythonpath)])?;
    if !status.success() {
        return Err(Error::Apidoc { status });
    }
    info!("regenerated documentation stubs for {}", paths.app.display());

    if options.stage_for_commit {
        git::stage(&paths.root, "docs")?;
    }

    Ok(report)
}

/// Render `README.md` from the init file's module docstring.
///
/// The init file doubles as the project's front page. Its docstring shows
/// up on hover in editors, and this keeps the README from drifting out of
/// sync with it. An init file without a docstring produces an empty README.
///
/// Returns the path of the README that was written.
#[instrument(skip(paths), level = "debug")]
pub fn generate_readme(paths: &ProjectPaths, stage_for_commit: bool) -> Result<PathBuf> {
    let source = read_to_string(&paths.init).map_err(|err| Error::ReadInit {
        init: paths.init.clone(),
        source: err,
    })?;
    let contents = module_docstring(&source).unwrap_or_default();

    let readme = paths.root.join("README.md");
    write(&readme, contents.as_bytes()).map_err(|err| Error::WriteReadme {
        readme: readme.clone(),
        source: err,
    })?;
    info!("rendered {} from the init file docstring", readme.display());

    if stage_for_commit {
        git::stage(&paths.root, "README.md")?;
    }

    Ok(readme)
}

fn sweep(source_dir: &Path, extra_keep: &[String]) -> Result<CleanupReport> {
    if !source_dir.is_dir() {
        return Err(Error::MissingSourceDirectory {
            path: source_dir.to_path_buf(),
        });
    }

    let reader = read_dir(source_dir).map_err(|err| Error::ReadSourceDirectory {
        path: source_dir.to_path_buf(),
        source: err,
    })?;
    let mut entries = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|err| Error::ReadSourceDirectory {
            path: source_dir.to_path_buf(),
            source: err,
        })?;
        entries.push(entry.path());
    }

    // INVARIANT: Sorted order keeps the report deterministic across
    //     filesystems.
    entries.sort();

    let mut report = CleanupReport::default();
    for path in entries {
        let Some(name) = path.file_name() else {
            continue;
        };
        if is_kept(name, extra_keep) {
            continue;
        }

        let removal = if path.is_dir() {
            remove_dir_all(&path)
        } else {
            remove_file(&path)
        };
        match removal {
            Ok(()) => report.removed.push(path),
            Err(err) => report.skipped.push((path, err)),
        }
    }

    Ok(report)
}

fn is_kept(name: &OsStr, extra_keep: &[String]) -> bool {
    DEFAULT_KEEP.iter().any(|kept| name == *kept)
        || extra_keep.iter().any(|kept| name == kept.as_str())
}

fn module_docstring(source: &str) -> Option<String> {
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            offset += line.len();
        } else {
            break;
        }
    }

    // INVARIANT: A docstring is the first statement in the file or nothing
    //     at all.
    let header = source[offset..].trim_start();
    let header = header.trim_start_matches(['r', 'R', 'u', 'U']);
    for delimiter in [r#"""""#, "'''", "\"", "'"] {
        if let Some(body) = header.strip_prefix(delimiter) {
            let end = body.find(delimiter)?;
            return Some(normalize_docstring(&body[..end]));
        }
    }

    None
}

fn normalize_docstring(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    let margin = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut tidy = Vec::with_capacity(lines.len());
    tidy.push(first.trim_start());
    for line in rest {
        tidy.push(line.get(margin..).unwrap_or(""));
    }

    while tidy.first().is_some_and(|line| line.trim().is_empty()) {
        tidy.remove(0);
    }
    while tidy.last().is_some_and(|line| line.trim().is_empty()) {
        tidy.pop();
    }

    tidy.join("\n")
}

/// Documentation regeneration error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Stub generator is not installed.
    #[error("sphinx-apidoc not found on PATH")]
    MissingApidoc {
        #[source]
        source: which::Error,
    },

    /// Docs tree has no source directory to regenerate into.
    #[error("no docs source directory at {:?}", path.display())]
    MissingSourceDirectory { path: PathBuf },

    /// Docs source directory cannot be listed.
    #[error("failed to read docs source directory {:?}", path.display())]
    ReadSourceDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Local HTML build exited unsuccessfully.
    #[error("`make html` exited unsuccessfully ({status})")]
    HtmlBuild { status: ExitStatus },

    /// Stub generator exited unsuccessfully.
    #[error("`sphinx-apidoc` exited unsuccessfully ({status})")]
    Apidoc { status: ExitStatus },

    /// Init file cannot be read.
    #[error("failed to read init file at {:?}", init.display())]
    ReadInit {
        init: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// README cannot be written.
    #[error("failed to write README at {:?}", readme.display())]
    WriteReadme {
        readme: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Project layout could not supply a usable `PYTHONPATH`.
    #[error(transparent)]
    Project(#[from] crate::project::Error),

    /// Invocation of an external tool failed.
    #[error(transparent)]
    Syscall(#[from] syscall::Error),

    /// Staging regenerated files failed.
    #[error(transparent)]
    Git(#[from] git::Error),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
