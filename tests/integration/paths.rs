// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::unpack;

use anyhow::Result;
use indoc::indoc;
use oxikit::project::ProjectPaths;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{env, path::Path};

const PROJECT: &str = indoc! {r#"
    -- node_modules/leftpad/__init__.py --
    decoy = True
    -- src/kittenbox/__init__.py --
    """Kittenbox keeps terminal cats entertained."""

    __version__ = "1.2.3"
    -- src/kittenbox/core.py --
    def pounce():
        return True
    -- tests/test_core.py --
    from kittenbox import core


    def test_pounce():
        assert core.pounce()
"#};

#[sealed_test]
fn discovery_skips_vendored_decoys_in_a_real_tree() -> Result<()> {
    unpack(".", PROJECT)?;
    let root = Path::new(".").canonicalize()?;

    let paths = ProjectPaths::discover(Some(".".into()), None)?;

    assert_eq!(paths.root, root);
    assert_eq!(paths.app, root.join("src/kittenbox"));
    assert_eq!(paths.init, root.join("src/kittenbox/__init__.py"));
    Ok(())
}

#[sealed_test]
fn pythonpath_starts_at_the_resolved_root() -> Result<()> {
    unpack(".", PROJECT)?;
    env::remove_var("PYTHONPATH");

    let paths = ProjectPaths::discover(Some(".".into()), None)?;

    assert_eq!(paths.pythonpath()?, paths.root.as_os_str());
    Ok(())
}
