// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release pipeline sequencing.
//!
//! One [`push_pipeline`] call runs the whole develop-to-release loop: test
//! the project, stamp a new version, regenerate documentation stubs, then
//! commit, tag, and push. Every step is independently optional through
//! [`PushPlan`], so the same entry point serves a full release and a quick
//! docs-only refresh.
//!
//! # Why No Rollback?
//!
//! Steps run in a fixed order and the first failure aborts the run. Nothing
//! already done gets undone. Rolling back a half-finished release means
//! guessing which side effects are safe to revert, and a pushed tag is not,
//! so the pipeline refuses to guess and leaves the partial state in place
//! for the user to inspect.

use crate::{
    docs::{self, CleanupReport, RegenerateOptions},
    git,
    project::ProjectPaths,
    syscall,
    version::{self, VersionChange},
};
use std::{
    ffi::OsString,
    fs::{read_dir, remove_file},
    path::{Path, PathBuf},
    process::ExitStatus,
};
use tracing::{info, instrument, warn};

/// Tag value meaning "derive the tag from the current version stamp."
pub const TAG_FROM_VERSION: &str = "__version__";

/// Git parameters for one pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitParams {
    /// Message for the release commit.
    pub commit_message: String,

    /// Tag to attach, or [`TAG_FROM_VERSION`] to derive `v<version>`.
    pub tag: String,

    /// Annotation message for the tag.
    pub tag_message: String,
}

impl Default for GitParams {
    fn default() -> Self {
        Self {
            commit_message: "New commit".to_string(),
            tag: TAG_FROM_VERSION.to_string(),
            tag_message: "New version".to_string(),
        }
    }
}

/// Knobs for the test step.
#[derive(Clone, Debug)]
pub struct TestOptions {
    /// Collect coverage while the suite runs.
    pub coverage: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self { coverage: true }
    }
}

/// Which steps one [`push_pipeline`] call performs.
#[derive(Clone, Debug)]
pub struct PushPlan {
    /// Run the test suite first. `None` skips it.
    pub tests: Option<TestOptions>,

    /// Change to apply to the version stamp. `None` leaves it alone.
    pub version: Option<VersionChange>,

    /// Regenerate documentation stubs. `None` skips the docs step.
    pub docs: Option<RegenerateOptions>,

    /// Commit, tag, and push. `None` skips publication.
    pub git: Option<GitParams>,

    /// Build and upload distribution artifacts.
    pub deploy: bool,
}

impl Default for PushPlan {
    fn default() -> Self {
        Self {
            tests: Some(TestOptions::default()),
            version: Some(VersionChange::Increment),
            docs: Some(RegenerateOptions::default()),
            git: Some(GitParams::default()),
            deploy: false,
        }
    }
}

/// What one pipeline run actually did.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Version now stamped in the init file, when the version step ran.
    pub version: Option<String>,

    /// Docs sweep outcome, when the docs step ran.
    pub docs: Option<CleanupReport>,

    /// Tag pushed to the remote, when the git step ran.
    pub tag: Option<String>,
}

/// Run the release pipeline.
///
/// Steps run in a fixed order: tests, version stamp, documentation, git
/// publication, deploy. The first failing step aborts the rest; completed
/// steps stay completed.
///
/// # Errors
///
/// Any step failure is surfaced as this module's [`Error`]. See each step's
/// own module for the gritty details.
#[instrument(skip(paths, plan), level = "debug")]
pub fn push_pipeline(paths: &ProjectPaths, plan: &PushPlan) -> Result<PipelineReport> {
    let mut report = PipelineReport::default();

    if let Some(options) = &plan.tests {
        run_tests(paths, options)?;
    }

    if let Some(change) = &plan.version {
        report.version = Some(version::set_version(&paths.init, change)?);
    }

    if let Some(options) = &plan.docs {
        report.docs = Some(docs::regenerate(paths, options)?);
    }

    if let Some(params) = &plan.git {
        report.tag = Some(git_push(paths, params)?);
    }

    if plan.deploy {
        deploy(paths)?;
    }

    Ok(report)
}

/// Run the project's pytest suite against `root/tests`.
///
/// The suite runs with the project root prepended to `PYTHONPATH` so the
/// app package imports without an editable install.
///
/// # Errors
///
/// - Return [`Error::TestsFailed`] when pytest reports failing tests (its
///   exit code 1).
/// - Return [`Error::TestRunner`] on any other unsuccessful exit.
#[instrument(skip(paths), level = "debug")]
pub fn run_tests(paths: &ProjectPaths, options: &TestOptions) -> Result<()> {
    let tests_dir = paths.root.join("tests");
    info!("running pytest against {}", tests_dir.display());

    let mut args = vec![OsString::from("-x")];
    if options.coverage {
        args.push(OsString::from("--cov"));
        args.push(paths.app.clone().into_os_string());
        args.push(OsString::from("--cov-report"));
        args.push(OsString::from("xml:.coverage.xml"));
    }
    args.push(tests_dir.into_os_string());

    let pythonpath = paths.pythonpath()?;
    let status = syscall::status_with_env(
        "pytest",
        args,
        Some(&paths.root),
        &[("PYTHONPATH", pythonpath)],
    )?;

    if options.coverage {
        // INVARIANT: The stray artifact goes away no matter how the run
        //     went; only the XML report is meant to stay.
        let stray = paths.root.join(".coverage");
        if let Err(err) = remove_file(&stray) {
            warn!("cannot remove coverage artifact {}: {err}", stray.display());
        }
    }

    match status.code() {
        Some(0) => Ok(()),
        Some(1) => Err(Error::TestsFailed),
        _ => Err(Error::TestRunner { status }),
    }
}

/// Stage everything, commit, tag, and push with tags.
///
/// Returns the tag that was pushed.
#[instrument(skip(paths, params), level = "debug")]
pub fn git_push(paths: &ProjectPaths, params: &GitParams) -> Result<String> {
    git::commit_all(&paths.root, &params.commit_message)?;

    // INVARIANT: The sentinel resolves after the version step has run, so
    //     the tag reflects the stamp actually committed.
    let tag = resolve_tag(&paths.init, &params.tag)?;
    git::tag(&paths.root, &tag, &params.tag_message)?;
    git::push(&paths.root)?;

    Ok(tag)
}

/// Build distribution artifacts and upload them.
///
/// Shells out to `python -m build`, then hands every entry of `dist/` to
/// `twine upload`. Artifacts are enumerated here rather than passed as a
/// shell glob, so an empty build fails loudly instead of uploading nothing.
#[instrument(skip(paths), level = "debug")]
pub fn deploy(paths: &ProjectPaths) -> Result<()> {
    info!("building distribution artifacts");
    syscall::interactive("python", ["-m", "build"], Some(&paths.root))?;

    let artifacts = dist_artifacts(&paths.root.join("dist"))?;
    info!("uploading {} artifacts", artifacts.len());
    let mut args = vec![OsString::from("upload")];
    args.extend(artifacts);
    syscall::interactive("twine", args, Some(&paths.root))?;

    Ok(())
}

fn resolve_tag(init: &Path, requested: &str) -> Result<String> {
    if requested == TAG_FROM_VERSION {
        Ok(format!("v{}", version::get_version(init)?))
    } else {
        Ok(requested.to_string())
    }
}

fn dist_artifacts(dist: &Path) -> Result<Vec<OsString>> {
    let reader = read_dir(dist).map_err(|err| Error::ReadDist {
        dist: dist.to_path_buf(),
        source: err,
    })?;

    let mut artifacts = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|err| Error::ReadDist {
            dist: dist.to_path_buf(),
            source: err,
        })?;
        artifacts.push(entry.path().into_os_string());
    }
    if artifacts.is_empty() {
        return Err(Error::NothingToUpload {
            dist: dist.to_path_buf(),
        });
    }
    artifacts.sort();

    Ok(artifacts)
}

/// Release pipeline error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Test suite reported failing tests.
    #[error("pytest reported failing tests")]
    TestsFailed,

    /// Test runner died for reasons other than failing tests.
    #[error("pytest exited abnormally ({status})")]
    TestRunner { status: ExitStatus },

    /// Distribution directory cannot be listed.
    #[error("failed to read distribution directory {:?}", dist.display())]
    ReadDist {
        dist: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Build produced nothing to upload.
    #[error("no distribution artifacts found in {:?}", dist.display())]
    NothingToUpload { dist: PathBuf },

    /// Project layout could not supply a usable `PYTHONPATH`.
    #[error(transparent)]
    Project(#[from] crate::project::Error),

    /// Version step failed.
    #[error(transparent)]
    Version(#[from] version::Error),

    /// Docs step failed.
    #[error(transparent)]
    Docs(#[from] docs::Error),

    /// Git publication failed.
    #[error(transparent)]
    Git(#[from] git::Error),

    /// Invocation of an external tool failed.
    #[error(transparent)]
    Syscall(#[from] syscall::Error),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::fs;

    #[test]
    fn git_params_default_to_the_sentinel_tag() {
        let params = GitParams::default();
        assert_eq!(params.commit_message, "New commit");
        assert_eq!(params.tag, TAG_FROM_VERSION);
        assert_eq!(params.tag_message, "New version");
    }

    #[sealed_test]
    fn tag_sentinel_derives_from_the_init_file() {
        fs::write("__init__.py", "__version__ = \"1.2.3\"\n").unwrap();
        let init = Path::new("__init__.py");

        assert_eq!(resolve_tag(init, TAG_FROM_VERSION).unwrap(), "v1.2.3");
        assert_eq!(resolve_tag(init, "v9.9.9").unwrap(), "v9.9.9");
    }

    #[sealed_test]
    fn dist_artifacts_come_back_sorted() {
        fs::create_dir_all("dist").unwrap();
        fs::write("dist/b.whl", "").unwrap();
        fs::write("dist/a.tar.gz", "").unwrap();

        let artifacts = dist_artifacts(Path::new("dist")).unwrap();

        assert_eq!(
            artifacts,
            vec![OsString::from("dist/a.tar.gz"), OsString::from("dist/b.whl")]
        );
    }

    #[sealed_test]
    fn empty_dist_directory_has_nothing_to_upload() {
        fs::create_dir_all("dist").unwrap();
        assert!(matches!(
            dist_artifacts(Path::new("dist")),
            Err(Error::NothingToUpload { .. })
        ));
    }

    #[sealed_test]
    fn missing_dist_directory_fails() {
        assert!(matches!(
            dist_artifacts(Path::new("dist")),
            Err(Error::ReadDist { .. })
        ));
    }

    #[sealed_test]
    fn pipeline_stops_before_the_version_step_when_tests_fail() {
        fs::create_dir_all("demo").unwrap();
        fs::write("demo/__init__.py", "__version__ = \"1.0.0\"\n").unwrap();
        let paths = ProjectPaths {
            root: PathBuf::from("."),
            app: PathBuf::from("demo"),
            init: PathBuf::from("demo/__init__.py"),
        };
        let plan = PushPlan {
            tests: Some(TestOptions { coverage: false }),
            version: Some(VersionChange::Increment),
            docs: None,
            git: None,
            deploy: false,
        };

        // No tests directory exists, so the runner fails no matter whether
        // pytest itself is installed.
        assert!(push_pipeline(&paths, &plan).is_err());
        assert_eq!(
            fs::read_to_string("demo/__init__.py").unwrap(),
            "__version__ = \"1.0.0\"\n"
        );
    }
}
