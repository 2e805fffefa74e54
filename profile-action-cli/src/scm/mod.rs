// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod git;

pub trait ScmCommit: Clone {}

/// Author/committer identity applied to a single commit operation.
///
/// The identity is supplied with each operation rather than written into the repository's configuration, so nothing
/// leaks into later invocations that share the same working copy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    #[must_use]
    pub fn bot() -> Self {
        Self {
            name: String::from("github-actions"),
            email: String::from("actions@yaxi.tech"),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::bot()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

pub trait Scm<Commit: ScmCommit> {
    /// Resolve a revision expression (eg. a commit id, or `id~1`) into a commit.
    fn resolve_commit(&self, revision: &str) -> Result<Commit>;
    fn get_commit_identifier(&self, commit: &Commit) -> String;
    fn get_commit_author(&self, commit: &Commit) -> Result<Identity>;
    /// Paths touched between two commits.  Both sides of a rename are reported, so that a file moved out of a
    /// directory still counts as a change to that directory.
    fn get_changed_files(&self, from: &Commit, to: &Commit) -> Result<HashSet<PathBuf>>;
    fn is_working_dir_clean(&self) -> Result<bool>;
    /// Stage everything under `path`, including files that are not yet tracked.
    fn stage_path(&self, path: &Path) -> Result<()>;
    /// Commit all tracked modifications; `amend` replaces the current HEAD commit instead of stacking a new one.
    fn commit_all(&self, message: &str, identity: &Identity, amend: bool) -> Result<()>;
    /// Push the current branch to its upstream.
    fn push(&self, force: bool) -> Result<()>;
    /// Record the contents of `dir` as the complete tree of a new commit on `branch`, parented on the branch's
    /// previous tip (the local branch, falling back to `remote`'s copy of it).  Neither the working tree nor the
    /// checked out branch are touched.
    fn commit_directory_to_branch(
        &self,
        dir: &Path,
        branch: &str,
        remote: &str,
        message: &str,
        identity: &Identity,
    ) -> Result<Commit>;
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;
}
