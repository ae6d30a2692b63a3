// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version stamp editing.
//!
//! A project's version lives as a `__version__ = "x.y.z"` line inside the
//! app package's init file. Editing that stamp sounds trivial, and it almost
//! is, but the file around it is user-owned code that must come back
//! byte-for-byte identical. The rewrite therefore touches exactly one thing:
//! the payload between the first pair of quotes on the first declaration
//! line. Quote style, indentation, inline comments, and every other line
//! survive untouched.
//!
//! # Pitfalls
//!
//! The whole file is parsed before a single byte gets written back, so a
//! malformed stamp can never leave a half-written init file behind. A line
//! only counts as the declaration when its trimmed text starts with
//! `__version__`, which keeps strings that merely mention the name from
//! being rewritten.

use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Prefix that marks the version declaration line.
pub const VERSION_DECLARATION: &str = "__version__";

/// Requested change to the version stamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionChange {
    /// Bump the third (patch) component by one.
    Increment,

    /// Replace the payload verbatim.
    Set(String),
}

impl VersionChange {
    /// Interpret a configuration or CLI directive.
    ///
    /// `"none"` and the empty string mean no change at all, `"increment"`
    /// bumps the patch component, and anything else is taken as an explicit
    /// version to set.
    pub fn from_directive(directive: &str) -> Option<Self> {
        match directive {
            "" | "none" => None,
            "increment" => Some(Self::Increment),
            explicit => Some(Self::Set(explicit.to_string())),
        }
    }
}

/// Read the version payload out of an init file.
///
/// # Errors
///
/// - Return [`Error::ReadInit`] if the init file cannot be read.
/// - Return [`Error::DeclarationNotFound`] if no line declares a version.
/// - Return [`Error::UnquotedDeclaration`] if the declaration carries no
///   quoted payload.
#[instrument(skip(init), level = "debug")]
pub fn get_version(init: impl AsRef<Path>) -> Result<String> {
    let init = init.as_ref();
    let source = read_to_string(init).map_err(|err| Error::ReadInit {
        init: init.to_path_buf(),
        source: err,
    })?;

    let line = declaration_line(&source).ok_or(Error::DeclarationNotFound)?;
    let quote = quote_character(line).ok_or(Error::UnquotedDeclaration)?;
    let payload = line.split(quote).nth(1).unwrap_or_default();

    Ok(payload.to_string())
}

/// Apply a version change to an init file.
///
/// Returns the version that ended up in the file.
///
/// # Errors
///
/// - Return [`Error::ReadInit`] or [`Error::WriteInit`] on I/O trouble.
/// - Return [`Error::DeclarationNotFound`] if no line declares a version.
/// - Return [`Error::UnquotedDeclaration`] if the declaration carries no
///   quoted payload.
/// - Return [`Error::MissingPatch`] or [`Error::PatchNotNumeric`] if an
///   increment finds nothing it can bump.
#[instrument(skip(init), level = "debug")]
pub fn set_version(init: impl AsRef<Path>, change: &VersionChange) -> Result<String> {
    let init = init.as_ref();
    let source = read_to_string(init).map_err(|err| Error::ReadInit {
        init: init.to_path_buf(),
        source: err,
    })?;

    // INVARIANT: Parse the whole file before writing a single byte back.
    let (rewritten, version) = rewrite(&source, change)?;

    write(init, rewritten.as_bytes()).map_err(|err| Error::WriteInit {
        init: init.to_path_buf(),
        source: err,
    })?;
    debug!("version stamp in {} is now {version}", init.display());

    Ok(version)
}

fn declaration_line(source: &str) -> Option<&str> {
    source
        .split_inclusive('\n')
        .find(|line| line.trim_start().starts_with(VERSION_DECLARATION))
}

fn quote_character(line: &str) -> Option<char> {
    if line.contains('"') {
        Some('"')
    } else if line.contains('\'') {
        Some('\'')
    } else {
        None
    }
}

fn rewrite(source: &str, change: &VersionChange) -> Result<(String, String)> {
    let mut rewritten = String::with_capacity(source.len() + 4);
    let mut applied = None;

    for line in source.split_inclusive('\n') {
        if applied.is_none() && line.trim_start().starts_with(VERSION_DECLARATION) {
            // INVARIANT: Double quotes win when both styles appear on the line.
            let quote = quote_character(line).ok_or(Error::UnquotedDeclaration)?;
            let delimiter = quote.to_string();
            let mut fields: Vec<&str> = line.split(quote).collect();

            let next = match change {
                VersionChange::Increment => increment_patch(fields[1])?,
                VersionChange::Set(explicit) => explicit.clone(),
            };
            fields[1] = next.as_str();
            rewritten.push_str(&fields.join(&delimiter));
            applied = Some(next);
        } else {
            rewritten.push_str(line);
        }
    }

    match applied {
        Some(version) => Ok((rewritten, version)),
        None => Err(Error::DeclarationNotFound),
    }
}

fn increment_patch(payload: &str) -> Result<String> {
    let mut fields: Vec<&str> = payload.split('.').collect();
    if fields.len() < 3 {
        return Err(Error::MissingPatch {
            payload: payload.to_string(),
        });
    }

    let patch: u64 = fields[2].parse().map_err(|_| Error::PatchNotNumeric {
        segment: fields[2].to_string(),
        payload: payload.to_string(),
    })?;
    let bumped = (patch + 1).to_string();
    fields[2] = bumped.as_str();

    Ok(fields.join("."))
}

/// Version stamp error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Init file cannot be read.
    #[error("failed to read init file at {:?}", init.display())]
    ReadInit {
        init: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Init file cannot be written back.
    #[error("failed to write init file at {:?}", init.display())]
    WriteInit {
        init: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No line declares a version.
    #[error("no `__version__` declaration found")]
    DeclarationNotFound,

    /// Declaration line carries no quoted payload at all.
    #[error("`__version__` declaration has no quoted payload")]
    UnquotedDeclaration,

    /// Payload has fewer than three dot-separated components.
    #[error("version {payload:?} has no patch component to increment")]
    MissingPatch { payload: String },

    /// Patch component refuses to parse as a non-negative integer.
    #[error("cannot increment non-numeric patch component {segment:?} of version {payload:?}")]
    PatchNotNumeric { segment: String, payload: String },
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
