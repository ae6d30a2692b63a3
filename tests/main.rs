// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod integration;

use anyhow::{anyhow, Result};
use git2::{Repository, RepositoryInitOptions};
use simple_txtar::Archive;
use std::{fs, path::Path};

/// Scratch git repository for driving the real `git` binary against.
pub(crate) struct RepoFixture {
    repo: Repository,
}

impl RepoFixture {
    pub(crate) fn new(path: impl AsRef<Path>, kind: RepoKind) -> Result<Self> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        opts.bare(kind.is_bare());
        let repo = Repository::init_opts(path.as_ref(), &opts)?;

        // INVARIANT: Always provide valid name and email.
        //   - Git will complain if this is not set in CI/CD environments.
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;

        if !kind.is_bare() {
            // INVARIANT: Local signing stays off so commit subprocesses never
            //     wait on a key that scratch repositories do not have.
            config.set_str("commit.gpgsign", "false")?;
            config.set_str("tag.gpgsign", "false")?;
        }

        Ok(Self { repo })
    }

    pub(crate) fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| anyhow!("repository has no working tree"))
    }

    pub(crate) fn stage_and_commit(
        &self,
        filename: impl AsRef<Path>,
        contents: impl AsRef<str>,
    ) -> Result<()> {
        let target = self.workdir()?.join(filename.as_ref());
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, contents.as_ref())?;

        // INVARIANT: Always use new tree produced by index after staging new entry.
        let mut index = self.repo.index()?;
        index.add_path(filename.as_ref())?;
        index.write()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;

        // INVARIANT: Always determine latest parent commits to append to.
        let signature = self.repo.signature()?;
        let mut parents = Vec::new();
        if let Some(parent) = self.repo.head().ok().and_then(|head| head.target()) {
            parents.push(self.repo.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        // INVARIANT: Commit to HEAD by appending to obtained parent commits.
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            format!("chore: add {:?}", filename.as_ref()).as_ref(),
            &tree,
            &parents,
        )?;

        Ok(())
    }

    pub(crate) fn set_origin(&self, url: impl AsRef<str>) -> Result<()> {
        self.repo.remote("origin", url.as_ref())?;

        // INVARIANT: Current-branch push semantics keep "git push" working
        //     without an upstream configured ahead of time.
        let mut config = self.repo.config()?;
        config.set_str("push.default", "current")?;

        Ok(())
    }

    pub(crate) fn has_reference(&self, name: &str) -> bool {
        self.repo.find_reference(name).is_ok()
    }

    pub(crate) fn head_message(&self) -> Result<String> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(commit.message().unwrap_or_default().to_owned())
    }

    pub(crate) fn tag_message(&self, name: &str) -> Result<Option<String>> {
        let reference = self.repo.find_reference(&format!("refs/tags/{name}"))?;
        let tag = reference.peel_to_tag()?;
        Ok(tag.message().map(ToOwned::to_owned))
    }

    pub(crate) fn staged_paths(&self) -> Result<Vec<String>> {
        let mut index = self.repo.index()?;
        // INVARIANT: Subprocesses rewrite .git/index behind this handle;
        //     reload before reading.
        index.read(true)?;
        Ok(index
            .iter()
            .map(|entry| String::from_utf8_lossy(&entry.path).into_owned())
            .collect())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) enum RepoKind {
    #[default]
    Normal,

    Bare,
}

impl RepoKind {
    pub(crate) fn is_bare(&self) -> bool {
        match self {
            Self::Bare => true,
            Self::Normal => false,
        }
    }
}

/// Materialize a txtar archive as real files under `root`.
pub(crate) fn unpack(root: impl AsRef<Path>, archive: &str) -> Result<()> {
    let archive = Archive::from(archive);
    for file in archive.iter() {
        let target = root.as_ref().join(&file.name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.content)?;
    }

    Ok(())
}

/// Whether the real `git` binary is on `PATH`.
///
/// Tests that push through it skip instead of failing on machines without
/// one.
pub(crate) fn git_available() -> bool {
    which::which("git").is_ok()
}
