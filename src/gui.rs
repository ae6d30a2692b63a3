// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Web GUI session launching.
//!
//! A project managed by oxikit pairs a Python backend with a web front end.
//! This module opens that front end in an app-mode browser window: no tabs,
//! no URL bar, just the project's pages. Which pages depends on where the
//! process finds itself.
//!
//! # Run Modes
//!
//! - **Packaged**: the bundler set [`RESOURCE_DIR_VAR`] and assets ship
//!   inside the bundle under `gui`.
//! - **Source, development**: the front end runs on its own live dev
//!   server, and the window points at [`DEV_SERVER_URL`].
//! - **Source, built**: a previous front-end build produced a static
//!   `index.html`, and the window opens it straight off the disk.
//!
//! Values crossing the bridge from the web side arrive stringly typed.
//! [`coerce_values`] turns them back into booleans and numbers by pattern
//! detection alone. Nothing that crosses the bridge is ever evaluated.

use crate::{
    path::{find_path, DEFAULT_MAX_DEPTH},
    syscall,
};
use serde_json::{Map, Value};
use std::{
    collections::hash_map::DefaultHasher,
    env,
    ffi::OsString,
    fmt,
    fs::OpenOptions,
    hash::{Hash, Hasher},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    process::ExitStatus,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::{info, instrument, warn};

/// Environment variable marking production runs. Set by the bundler.
pub const ENVIRONMENT_VAR: &str = "OXIKIT_ENVIRONMENT";

/// Environment variable pointing at bundled resources.
pub const RESOURCE_DIR_VAR: &str = "OXIKIT_RESOURCE_DIR";

/// Address of the live development server.
pub const DEV_SERVER_URL: &str = "http://localhost:8080";

const DEFAULT_LOG_FILE: &str = "log.log";

/// Knobs for [`run_gui`].
#[derive(Clone, Debug, Default)]
pub struct GuiOptions {
    /// Force development or production behavior. Detected from
    /// [`ENVIRONMENT_VAR`] when unset.
    pub devel: Option<bool>,

    /// Refuse to launch when another session already holds the lock.
    pub single_instance: bool,

    /// Where to append launch records. Packaged runs default to `log.log`.
    pub log_path: Option<PathBuf>,

    /// Pre-built asset directory, skipping discovery.
    pub built_gui_path: Option<PathBuf>,
}

/// How the process is being run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Bundled executable with packaged assets.
    Packaged,

    /// Source checkout talking to the live dev server.
    SourceDevel,

    /// Source checkout serving built assets.
    SourceBuilt,
}

/// Browser backend used for the app window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Edge,
}

impl Browser {
    fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::Chrome => &[
                "google-chrome",
                "google-chrome-stable",
                "chromium",
                "chromium-browser",
                "chrome",
            ],
            Self::Edge => &["microsoft-edge", "microsoft-edge-stable", "msedge"],
        }
    }

    fn locate(&self) -> Option<PathBuf> {
        self.candidates()
            .iter()
            .find_map(|name| which::which(name).ok())
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chrome => write!(f, "chrome"),
            Self::Edge => write!(f, "edge"),
        }
    }
}

/// How one GUI session went.
#[derive(Debug)]
pub struct LaunchReport {
    /// Detected run mode.
    pub mode: RunMode,

    /// Asset directory the session served.
    pub assets: PathBuf,

    /// Address the app window opened on.
    pub url: String,

    /// Backend that actually produced the window.
    pub browser: Browser,

    /// How the browser process ended.
    pub status: ExitStatus,
}

/// Guard holding the single-instance lock for one GUI session.
///
/// Dropping the guard releases the lock. A session that dies without
/// unwinding leaves the lock file behind; delete it to clear the stale
/// lock.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Open the project's web front end in an app-mode browser window.
///
/// Blocks until the browser session ends. A chrome backend that fails to
/// start is retried exactly once against edge; a browser that starts and
/// then exits however it likes is a completed session, reported in the
/// [`LaunchReport`].
///
/// # Errors
///
/// - Return [`Error::WebFilesNotFound`] if no asset directory resolves.
/// - Return [`Error::AlreadyRunning`] if `single_instance` is set and the
///   lock is taken.
/// - Return [`Error::BrowserSession`] if both backends fail to start.
#[instrument(skip(root, options), level = "debug")]
pub fn run_gui(root: impl AsRef<Path>, options: &GuiOptions) -> Result<LaunchReport> {
    let devel = detect_devel(options.devel);
    let (mode, assets) = resolve_assets(root.as_ref(), devel, options.built_gui_path.as_deref())?;
    let url = session_url(devel, &assets);

    let _lock = if options.single_instance {
        Some(acquire_instance_lock(&assets)?)
    } else {
        None
    };

    let log_path = match (&options.log_path, mode) {
        (Some(path), _) => Some(path.clone()),
        (None, RunMode::Packaged) => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        (None, _) => None,
    };
    if let Some(log) = &log_path {
        append_launch_record(log, mode, &assets, &url)?;
    }

    info!("starting {mode:?} session at {url}");
    let (browser, status) = match start_session(Browser::Chrome, &url) {
        Ok(status) => (Browser::Chrome, status),
        Err(err) => {
            // INVARIANT: Exactly one retry, and only against the other
            //     backend.
            warn!("chrome session failed to start: {err}");
            let status = start_session(Browser::Edge, &url)
                .map_err(|err| Error::BrowserSession {
                    source: Box::new(err),
                })?;
            (Browser::Edge, status)
        }
    };

    Ok(LaunchReport {
        mode,
        assets,
        url,
        browser,
        status,
    })
}

/// Parse stringly values arriving from the web side into typed JSON.
///
/// `"true"` and `"false"` become booleans, digit strings become integers,
/// float-shaped strings become numbers when finite, and everything else
/// stays a string. Values that already carry a type pass through untouched.
pub fn coerce_values(values: Map<String, Value>) -> Map<String, Value> {
    values
        .into_iter()
        .map(|(key, value)| {
            let coerced = match value {
                Value::String(text) => coerce(text),
                other => other,
            };
            (key, coerced)
        })
        .collect()
}

fn coerce(text: String) -> Value {
    if text == "true" {
        return Value::Bool(true);
    }
    if text == "false" {
        return Value::Bool(false);
    }
    if let Ok(int) = text.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = text.parse::<f64>() {
        // INVARIANT: NaN and infinities have no JSON representation and
        //     stay strings.
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(text)
}

fn detect_devel(explicit: Option<bool>) -> bool {
    explicit.unwrap_or_else(|| {
        env::var(ENVIRONMENT_VAR)
            .map(|value| value != "production")
            .unwrap_or(true)
    })
}

fn resolve_assets(
    root: &Path,
    devel: bool,
    built_gui_path: Option<&Path>,
) -> Result<(RunMode, PathBuf)> {
    let (mode, assets) = if let Some(resource_dir) = env::var_os(RESOURCE_DIR_VAR) {
        (RunMode::Packaged, PathBuf::from(resource_dir).join("gui"))
    } else if devel {
        let marker = find_path(
            "index.html",
            root,
            &["node_modules", "build"],
            DEFAULT_MAX_DEPTH,
        )?;
        let Some(project) = marker.parent().and_then(Path::parent) else {
            return Err(Error::WebFilesNotFound { assets: marker });
        };
        (RunMode::SourceDevel, project.join("src"))
    } else if let Some(built) = built_gui_path {
        (RunMode::SourceBuilt, built.to_path_buf())
    } else {
        let marker = find_path(
            "index.html",
            root,
            &["public", "node_modules", "build"],
            DEFAULT_MAX_DEPTH,
        )?;
        let Some(dir) = marker.parent() else {
            return Err(Error::WebFilesNotFound { assets: marker });
        };
        (RunMode::SourceBuilt, dir.to_path_buf())
    };

    if !assets.exists() {
        return Err(Error::WebFilesNotFound { assets });
    }

    Ok((mode, assets))
}

fn session_url(devel: bool, assets: &Path) -> String {
    if devel {
        DEV_SERVER_URL.to_string()
    } else {
        format!("file://{}", assets.join("index.html").display())
    }
}

fn start_session(browser: Browser, url: &str) -> Result<ExitStatus> {
    let Some(binary) = browser.locate() else {
        return Err(Error::BrowserMissing { browser });
    };

    let args = [
        OsString::from(format!("--app={url}")),
        OsString::from("--disable-features=TranslateUI"),
    ];
    let status = syscall::status_with_env(&binary, args, None, &[])?;
    Ok(status)
}

fn lock_path(assets: &Path) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    assets.hash(&mut hasher);
    env::temp_dir().join(format!("oxikit-gui-{:016x}.lock", hasher.finish()))
}

fn acquire_instance_lock(assets: &Path) -> Result<InstanceLock> {
    let path = lock_path(assets);

    // INVARIANT: create_new supplies the atomicity; two sessions cannot
    //     both win the same lock file.
    match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(_) => Ok(InstanceLock { path }),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            Err(Error::AlreadyRunning { lock: path })
        }
        Err(err) => Err(Error::Lock {
            lock: path,
            source: err,
        }),
    }
}

fn append_launch_record(path: &Path, mode: RunMode, assets: &Path, url: &str) -> Result<()> {
    let log_error = |err: std::io::Error| Error::LogWrite {
        log: path.to_path_buf(),
        source: err,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = mkdirp::mkdirp(parent).map_err(log_error)?;
        }
    }

    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(log_error)?;
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    writeln!(
        file,
        "{stamp} [{mode:?}] session at {url} serving {}",
        assets.display()
    )
    .map_err(log_error)?;

    Ok(())
}

/// GUI launcher error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Marker file search failed.
    #[error(transparent)]
    Find(#[from] crate::path::Error),

    /// Resolved asset directory does not exist.
    #[error("web files not found at {:?}, point oxikit at where index.html lives", assets.display())]
    WebFilesNotFound { assets: PathBuf },

    /// Another session already holds the single-instance lock.
    #[error("another GUI session appears to be running (lock at {:?})", lock.display())]
    AlreadyRunning { lock: PathBuf },

    /// Single-instance lock cannot be created.
    #[error("failed to create single-instance lock at {:?}", lock.display())]
    Lock {
        lock: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Launch record cannot be appended.
    #[error("failed to append launch record to {:?}", log.display())]
    LogWrite {
        log: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Browser binary is not installed.
    #[error("no {browser} binary found on PATH")]
    BrowserMissing { browser: Browser },

    /// Both browser backends failed to produce a session.
    #[error("browser session failed with both chrome and edge backends")]
    BrowserSession {
        #[source]
        source: Box<Error>,
    },

    /// Browser invocation failed.
    #[error(transparent)]
    Syscall(#[from] syscall::Error),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
