// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{git_available, unpack, RepoFixture, RepoKind};

use anyhow::Result;
use indoc::indoc;
use oxikit::{
    docs::{self, RegenerateOptions},
    project::ProjectPaths,
};
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::fs;

const PROJECT: &str = indoc! {r#"
    -- kittenbox/__init__.py --
    """Kittenbox keeps terminal cats entertained.

    Ships a box, a red dot, and several crinkle balls.
    """

    __version__ = "1.2.3"
    -- docs/source/conf.py --
    project = "kittenbox"
    -- docs/source/index.rst --
    Kittenbox
    =========
    -- docs/source/kittenbox.core.rst --
    stale stub
"#};

#[sealed_test]
fn readme_renders_the_docstring_and_stages_it() -> Result<()> {
    if !git_available() {
        eprintln!("skipping: no git binary on PATH");
        return Ok(());
    }

    let local = RepoFixture::new("local", RepoKind::Normal)?;
    unpack(local.workdir()?, PROJECT)?;
    let paths = ProjectPaths::discover(Some("local".into()), None)?;

    let readme = docs::generate_readme(&paths, true)?;

    let want = "Kittenbox keeps terminal cats entertained.\n\n\
                Ships a box, a red dot, and several crinkle balls.";
    assert_eq!(fs::read_to_string(&readme)?, want);
    assert!(local.staged_paths()?.contains(&"README.md".to_string()));
    Ok(())
}

#[sealed_test]
fn regenerate_fails_fast_without_the_apidoc_binary() -> Result<()> {
    if which::which("sphinx-apidoc").is_ok() {
        eprintln!("skipping: sphinx-apidoc present on this machine");
        return Ok(());
    }

    fs::create_dir_all("local")?;
    unpack("local", PROJECT)?;
    let paths = ProjectPaths::discover(Some("local".into()), None)?;

    let result = docs::regenerate(&paths, &RegenerateOptions::default());

    assert!(matches!(result, Err(docs::Error::MissingApidoc { .. })));
    // INVARIANT: The availability check runs before the sweep touches disk.
    assert!(paths.root.join("docs/source/kittenbox.core.rst").exists());
    Ok(())
}
