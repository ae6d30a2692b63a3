// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git plumbing for release publication.
//!
//! # Why Two Git Surfaces?
//!
//! Staging, committing, and pushing go through the `git` binary itself so
//! the user's hooks, credential helpers, and transport configuration apply
//! exactly as they would at their own shell. Tagging goes through [`git2`]
//! instead. Annotated tag creation needs no interaction, and the library
//! call leaves no room for quoting accidents in tag messages.

use crate::syscall;
use git2::{ObjectType, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{info, instrument};

/// Annotation used when the caller provides no tag message.
pub const DEFAULT_TAG_MESSAGE: &str = "New version";

/// Stage everything under the repository and record a commit.
#[instrument(skip(root), level = "debug")]
pub fn commit_all(root: impl AsRef<Path>, message: &str) -> Result<()> {
    let root = root.as_ref();
    syscall::interactive("git", ["add", "."], Some(root))?;
    syscall::interactive("git", ["commit", "-m", message], Some(root))?;
    Ok(())
}

/// Stage a single pathspec without committing.
#[instrument(skip(root), level = "debug")]
pub fn stage(root: impl AsRef<Path>, pathspec: &str) -> Result<()> {
    syscall::interactive("git", ["add", pathspec], Some(root.as_ref()))?;
    Ok(())
}

/// Annotate the current `HEAD` commit with a tag.
///
/// An empty `message` falls back to [`DEFAULT_TAG_MESSAGE`].
///
/// # Errors
///
/// - Return [`Error::OpenRepository`] if `root` holds no git repository.
/// - Return [`Error::Tag`] if `HEAD` cannot be resolved or the tag cannot
///   be written.
#[instrument(skip(root), level = "debug")]
pub fn tag(root: impl AsRef<Path>, name: &str, message: &str) -> Result<()> {
    let root = root.as_ref();
    let repo = Repository::open(root).map_err(|err| Error::OpenRepository {
        root: root.to_path_buf(),
        source: err,
    })?;

    let tag_error = |err: git2::Error| Error::Tag {
        name: name.to_string(),
        source: err,
    };
    let target = repo
        .head()
        .and_then(|head| head.peel(ObjectType::Commit))
        .map_err(tag_error)?;
    let tagger = repo.signature().map_err(tag_error)?;
    repo.tag(name, &target, &tagger, annotation(message), false)
        .map_err(tag_error)?;
    info!("tagged {} as {name}", target.id());

    Ok(())
}

/// Push the current branch together with its tags to the default remote.
///
/// Output of `git push --follow-tags` is captured rather than inherited.
/// A steady spinner covers the silence while the transport does its thing.
#[instrument(skip(root), level = "debug")]
pub fn push(root: impl AsRef<Path>) -> Result<()> {
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")?;
    let progress = ProgressBar::new_spinner()
        .with_style(style)
        .with_message("Pushing commit and tags to remote...");
    progress.enable_steady_tick(Duration::from_millis(100));

    match syscall::non_interactive("git", ["push", "--follow-tags"], Some(root.as_ref())) {
        Ok(output) => {
            progress.finish_with_message("Pushed commit and tags to remote!");
            if !output.is_empty() {
                info!("{output}");
            }
            Ok(())
        }
        Err(err) => {
            progress.finish_and_clear();
            Err(err.into())
        }
    }
}

fn annotation(message: &str) -> &str {
    if message.is_empty() {
        DEFAULT_TAG_MESSAGE
    } else {
        message
    }
}

/// Git plumbing error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Target path holds no git repository.
    #[error("failed to open git repository at {:?}", root.display())]
    OpenRepository {
        root: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// Tag cannot be attached to `HEAD`.
    #[error("failed to tag HEAD as {name:?}")]
    Tag {
        name: String,
        #[source]
        source: git2::Error,
    },

    /// Invocation of the `git` binary failed.
    #[error(transparent)]
    Syscall(#[from] syscall::Error),

    /// Progress bar style contains bad template syntax.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
