// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{git_available, unpack, RepoFixture, RepoKind};

use anyhow::Result;
use indoc::indoc;
use oxikit::{
    pipeline::{self, GitParams, PushPlan, TAG_FROM_VERSION},
    project::ProjectPaths,
    version::{self, VersionChange},
};
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::fs;

const PROJECT: &str = indoc! {r#"
    -- kittenbox/__init__.py --
    """Kittenbox keeps terminal cats entertained."""

    __version__ = "1.2.3"
    -- kittenbox/core.py --
    def pounce():
        return True
"#};

#[sealed_test]
fn git_push_publishes_commit_tag_and_branch() -> Result<()> {
    if !git_available() {
        eprintln!("skipping: no git binary on PATH");
        return Ok(());
    }

    let local = RepoFixture::new("local", RepoKind::Normal)?;
    let origin = RepoFixture::new("origin.git", RepoKind::Bare)?;
    local.set_origin("../origin.git")?;
    unpack(local.workdir()?, PROJECT)?;
    let paths = ProjectPaths::discover(Some("local".into()), None)?;

    let params = GitParams {
        commit_message: "release: sharpen claws".into(),
        tag: TAG_FROM_VERSION.into(),
        tag_message: String::new(),
    };
    let tag = pipeline::git_push(&paths, &params)?;

    assert_eq!(tag, "v1.2.3");
    assert_eq!(local.head_message()?, "release: sharpen claws\n");
    assert_eq!(local.tag_message("v1.2.3")?.as_deref(), Some("New version"));
    assert!(origin.has_reference("refs/heads/main"));
    assert!(origin.has_reference("refs/tags/v1.2.3"));
    Ok(())
}

#[sealed_test]
fn git_push_picks_up_additions_and_deletions() -> Result<()> {
    if !git_available() {
        eprintln!("skipping: no git binary on PATH");
        return Ok(());
    }

    let local = RepoFixture::new("local", RepoKind::Normal)?;
    let origin = RepoFixture::new("origin.git", RepoKind::Bare)?;
    local.set_origin("../origin.git")?;
    local.stage_and_commit("scratch.txt", "temporary notes\n")?;
    unpack(local.workdir()?, PROJECT)?;
    fs::remove_file(local.workdir()?.join("scratch.txt"))?;
    let paths = ProjectPaths::discover(Some("local".into()), None)?;

    let params = GitParams {
        commit_message: "release: tidy the box".into(),
        tag: "v9.9.9".into(),
        tag_message: "done".into(),
    };
    let tag = pipeline::git_push(&paths, &params)?;

    assert_eq!(tag, "v9.9.9");
    let staged = local.staged_paths()?;
    assert!(staged.contains(&"kittenbox/__init__.py".to_string()));
    assert!(!staged.contains(&"scratch.txt".to_string()));
    assert_eq!(local.head_message()?, "release: tidy the box\n");
    assert!(origin.has_reference("refs/tags/v9.9.9"));
    Ok(())
}

#[sealed_test]
fn push_pipeline_stamps_before_the_sentinel_resolves() -> Result<()> {
    if !git_available() {
        eprintln!("skipping: no git binary on PATH");
        return Ok(());
    }

    let local = RepoFixture::new("local", RepoKind::Normal)?;
    let origin = RepoFixture::new("origin.git", RepoKind::Bare)?;
    local.set_origin("../origin.git")?;
    unpack(local.workdir()?, PROJECT)?;
    let paths = ProjectPaths::discover(Some("local".into()), None)?;

    let plan = PushPlan {
        tests: None,
        version: Some(VersionChange::Increment),
        docs: None,
        git: Some(GitParams {
            commit_message: "release: fresh catnip".into(),
            tag: TAG_FROM_VERSION.into(),
            tag_message: "rolling".into(),
        }),
        deploy: false,
    };
    let report = pipeline::push_pipeline(&paths, &plan)?;

    assert_eq!(report.version.as_deref(), Some("1.2.4"));
    assert_eq!(report.tag.as_deref(), Some("v1.2.4"));
    assert_eq!(version::get_version(&paths.init)?, "1.2.4");
    assert_eq!(local.tag_message("v1.2.4")?.as_deref(), Some("rolling"));
    assert!(origin.has_reference("refs/tags/v1.2.4"));
    Ok(())
}
