// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the `oxikit.toml` manifest that projects use to
//! configure the release pipeline and the GUI launcher. File I/O is left to
//! the caller to figure out, apart from [`locate_manifest`] which only looks
//! for the file.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Name of the manifest file oxikit looks for.
pub const MANIFEST_FILE_NAME: &str = "oxikit.toml";

/// Project manifest layout.
///
/// Every section is optional. Whatever the manifest leaves out falls back
/// to the built-in defaults, and command-line flags override whatever the
/// manifest does say.
///
/// # General Layout
///
/// A manifest is composed of five sections: `[project]` pins the paths the
/// rest of the tool works from, `[pipeline]` toggles release steps,
/// `[git]` carries publication parameters, `[docs]` tunes stub
/// regeneration, and `[gui]` configures the launcher.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Manifest {
    /// Project layout overrides.
    #[serde(default)]
    pub project: ProjectSection,

    /// Release pipeline step toggles.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Git publication parameters.
    #[serde(default)]
    pub git: GitSection,

    /// Documentation regeneration settings.
    #[serde(default)]
    pub docs: DocsSection,

    /// GUI launcher settings.
    #[serde(default)]
    pub gui: GuiSection,
}

impl FromStr for Manifest {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut manifest: Manifest = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path-valued field.
        manifest.project.root = expand_path(manifest.project.root)?;
        manifest.project.init = expand_path(manifest.project.init)?;
        manifest.gui.log = expand_path(manifest.gui.log)?;
        manifest.gui.built_gui_path = expand_path(manifest.gui.built_gui_path)?;

        Ok(manifest)
    }
}

impl Display for Manifest {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Project layout overrides.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProjectSection {
    /// Project root. Defaults to the current working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Init file holding the version stamp. Discovered when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<PathBuf>,
}

/// Release pipeline step toggles.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PipelineSection {
    /// Run the test suite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<bool>,

    /// Collect coverage while the suite runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<bool>,

    /// Version directive: `increment`, `none`, or an explicit version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Regenerate documentation stubs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<bool>,

    /// Commit, tag, and push when the pipeline runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<bool>,

    /// Build and upload distribution artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy: Option<bool>,
}

/// Git publication parameters.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct GitSection {
    /// Message for the release commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,

    /// Tag to attach, or `__version__` to derive it from the version stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Annotation message for the tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_message: Option<String>,
}

/// Documentation regeneration settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DocsSection {
    /// Extra entry names the stale-stub sweep spares.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_keep: Option<Vec<String>>,

    /// Build HTML locally after regenerating stubs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_locally: Option<bool>,
}

/// GUI launcher settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct GuiSection {
    /// Force development or production behavior.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devel: Option<bool>,

    /// Refuse to launch a second session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_instance: Option<bool>,

    /// Launch record log location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<PathBuf>,

    /// Pre-built asset directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_gui_path: Option<PathBuf>,
}

/// Locate the manifest to use.
///
/// A manifest at the project root wins. Otherwise fall back to the
/// user-level `oxikit/oxikit.toml` under the platform configuration
/// directory. `None` when neither exists.
pub fn locate_manifest(root: &Path) -> Option<PathBuf> {
    let local = root.join(MANIFEST_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    let fallback = dirs::config_dir()?.join("oxikit").join(MANIFEST_FILE_NAME);
    fallback.is_file().then_some(fallback)
}

fn expand_path(path: Option<PathBuf>) -> Result<Option<PathBuf>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let expanded = shellexpand::full(path.to_string_lossy().as_ref())
        .map_err(ConfigError::ShellExpansion)?
        .into_owned();

    Ok(Some(PathBuf::from(expanded)))
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
