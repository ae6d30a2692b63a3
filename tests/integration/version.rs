// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::unpack;

use anyhow::Result;
use indoc::indoc;
use oxikit::{
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
    __author__ = 'somebody'
    -- kittenbox/core.py --
    def pounce():
        return True
"#};

#[sealed_test]
fn increment_rewrites_only_the_stamp_line() -> Result<()> {
    unpack(".", PROJECT)?;
    let paths = ProjectPaths::discover(Some(".".into()), None)?;

    let stamped = version::set_version(&paths.init, &VersionChange::Increment)?;

    assert_eq!(stamped, "1.2.4");
    assert_eq!(version::get_version(&paths.init)?, "1.2.4");
    assert_eq!(
        fs::read_to_string(&paths.init)?,
        indoc! {r#"
            """Kittenbox keeps terminal cats entertained."""

            __version__ = "1.2.4"
            __author__ = 'somebody'
        "#}
    );
    Ok(())
}

#[sealed_test]
fn incrementing_twice_bumps_the_patch_by_two() -> Result<()> {
    unpack(".", PROJECT)?;
    let paths = ProjectPaths::discover(Some(".".into()), None)?;

    assert_eq!(
        version::set_version(&paths.init, &VersionChange::Increment)?,
        "1.2.4"
    );
    assert_eq!(
        version::set_version(&paths.init, &VersionChange::Increment)?,
        "1.2.5"
    );

    assert_eq!(version::get_version(&paths.init)?, "1.2.5");
    assert_eq!(
        fs::read_to_string(&paths.init)?,
        indoc! {r#"
            """Kittenbox keeps terminal cats entertained."""

            __version__ = "1.2.5"
            __author__ = 'somebody'
        "#}
    );
    Ok(())
}

#[sealed_test]
fn explicit_version_round_trips_through_the_file() -> Result<()> {
    unpack(".", PROJECT)?;
    let paths = ProjectPaths::discover(Some(".".into()), None)?;

    let stamped = version::set_version(&paths.init, &VersionChange::Set("2.0.0rc1".into()))?;

    assert_eq!(stamped, "2.0.0rc1");
    assert_eq!(version::get_version(&paths.init)?, "2.0.0rc1");
    Ok(())
}
