// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External command plumbing.
//!
//! Thin wrappers over [`std::process::Command`] for the handful of external
//! tools oxikit drives: git, pytest, sphinx-apidoc, make, and the packaging
//! toolchain. Callers pick between interactive calls that inherit the
//! terminal, and non-interactive calls that capture output for logging.

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::{Command, ExitStatus},
};
use tracing::debug;

/// Run an external command interactively.
///
/// The child inherits stdin, stdout, and stderr, so the user sees and talks
/// to it directly. Blocks until the command finishes.
///
/// # Errors
///
/// - Return [`Error::Start`] if the command cannot be spawned.
/// - Return [`Error::Exit`] if the command exits unsuccessfully.
pub fn interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl Into<OsString>>,
    cwd: Option<&Path>,
) -> Result<()> {
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let command = render(cmd.as_ref(), &args);
    let status = status_with_env(cmd, args, cwd, &[])?;
    if !status.success() {
        return Err(Error::Exit { command, status });
    }

    Ok(())
}

/// Run an external command interactively with extra environment variables.
///
/// Like [`interactive`], but hands back the raw exit status instead of
/// judging it, for callers that assign meaning to specific exit codes.
///
/// # Errors
///
/// - Return [`Error::Start`] if the command cannot be spawned.
pub fn status_with_env(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl Into<OsString>>,
    cwd: Option<&Path>,
    envs: &[(&str, OsString)],
) -> Result<ExitStatus> {
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let pretty = render(cmd.as_ref(), &args);
    debug!("syscall: {pretty}");

    let mut command = Command::new(cmd.as_ref());
    command.args(&args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    for (key, value) in envs {
        command.env(key, value);
    }

    command
        .spawn()
        .and_then(|mut child| child.wait())
        .map_err(|err| Error::Start {
            command: pretty,
            source: err,
        })
}

/// Run an external command and capture what it said.
///
/// Output to stdout and stderr is merged into one [`String`] so callers can
/// log it as a unit. Never inherits the terminal.
///
/// # Errors
///
/// - Return [`Error::Start`] if the command cannot be spawned.
/// - Return [`Error::ExitWithOutput`] if the command exits unsuccessfully,
///   carrying whatever it managed to print.
pub fn non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl Into<OsString>>,
    cwd: Option<&Path>,
) -> Result<String> {
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let pretty = render(cmd.as_ref(), &args);
    debug!("syscall: {pretty}");

    let mut command = Command::new(cmd.as_ref());
    command.args(&args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command.output().map_err(|err| Error::Start {
        command: pretty.clone(),
        source: err,
    })?;

    let stdout = String::from_utf8_lossy(output.stdout.as_slice());
    let stderr = String::from_utf8_lossy(output.stderr.as_slice());
    let mut message = String::from(stdout);
    if !stderr.is_empty() {
        if !message.is_empty() && !message.ends_with('\n') {
            message.push('\n');
        }
        message.push_str(stderr.as_ref());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        return Err(Error::ExitWithOutput {
            command: pretty,
            status: output.status,
            output: message,
        });
    }

    Ok(message)
}

fn render(cmd: &OsStr, args: &[OsString]) -> String {
    let mut pretty = cmd.to_string_lossy().into_owned();
    for arg in args {
        pretty.push(' ');
        pretty.push_str(arg.to_string_lossy().as_ref());
    }

    pretty
}

/// External command error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command never made it off the ground.
    #[error("failed to start `{command}`")]
    Start {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Command ran, but exited unsuccessfully.
    #[error("`{command}` exited unsuccessfully ({status})")]
    Exit { command: String, status: ExitStatus },

    /// Command ran, but exited unsuccessfully, with captured output.
    #[error("`{command}` exited unsuccessfully ({status}):\n{output}")]
    ExitWithOutput {
        command: String,
        status: ExitStatus,
        output: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
