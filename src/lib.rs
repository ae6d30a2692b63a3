// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release automation for Python projects.
//!
//! Oxikit drives the develop-release loop of a Python project from one
//! place: run the test suite, stamp a new version, regenerate Sphinx stub
//! pages, publish the result as a commit with an annotated tag, and
//! optionally upload distribution artifacts. Projects that ship a web
//! front-end also get a browser-window launcher for development and
//! packaged runs.
//!
//! # Project Layout Discovery
//!
//! Everything starts from a [`project::ProjectPaths`] triple: the project
//! root, the application package directory, and the `__init__.py` file
//! carrying the `__version__` stamp. Callers either pin these paths
//! explicitly or let [`project::ProjectPaths::discover`] walk the tree for
//! them. All other modules take the resolved triple as an argument, so no
//! global state survives between operations.
//!
//! # External Collaborators
//!
//! The test runner, documentation generator, version control client, and
//! package uploader stay external. Oxikit shells out to them through
//! [`syscall`] and treats their exit codes as the source of truth. The one
//! exception is annotated tag creation, which goes through libgit2 so the
//! tag object carries a proper tagger signature.
//!
//! # See Also
//!
//! 1. [`pipeline`]
//! 2. [`docs`]
//! 3. [`gui`]

pub mod config;
pub mod docs;
pub mod git;
pub mod gui;
pub mod path;
pub mod pipeline;
pub mod project;
pub mod syscall;
pub mod version;
