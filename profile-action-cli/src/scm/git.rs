// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::errors::SubcommandErrors;
use crate::scm::{Identity, Scm, ScmCommit};
use anyhow::{Result, anyhow};
use log::debug;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitScmCommit {
    sha: String,
}

impl ScmCommit for GitScmCommit {}

pub struct GitScm {
    project_dir: PathBuf,
}

impl GitScm {
    #[must_use]
    pub fn new(project_dir: PathBuf) -> Self {
        Self { project_dir }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.project_dir);
        cmd
    }

    /// Run a prepared git command, turning a failure to start or a non-zero exit into a `SubcommandErrors`.
    fn run(mut cmd: Command, display: &str) -> Result<Output> {
        debug!("running {display}");
        let output = cmd.output().map_err(|e| SubcommandErrors::UnableToStart {
            command: display.to_string(),
            error: e,
        })?;

        if !output.status.success() {
            return Err(SubcommandErrors::SubcommandFailed {
                command: display.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }

        Ok(output)
    }

    fn git<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect::<Vec<_>>();
        let display = format!(
            "git {}",
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        let mut cmd = self.command();
        cmd.args(&args);
        Self::run(cmd, &display)
    }

    fn git_stdout<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.git(args)?;
        Ok(String::from_utf8(output.stdout)?)
    }

    /// `git rev-parse --verify`, but a missing revision is `None` rather than an error.
    fn try_rev_parse(&self, revision: &str) -> Result<Option<String>> {
        let output = self
            .command()
            .args(["rev-parse", "--verify", "--quiet", revision])
            .output()
            .map_err(|e| SubcommandErrors::UnableToStart {
                command: format!("git rev-parse --verify --quiet {revision}"),
                error: e,
            })?;
        if output.status.success() {
            Ok(Some(String::from_utf8(output.stdout)?.trim().to_string()))
        } else {
            Ok(None)
        }
    }

    fn identity_args(identity: &Identity) -> [String; 4] {
        [
            String::from("-c"),
            format!("user.name={}", identity.name),
            String::from("-c"),
            format!("user.email={}", identity.email),
        ]
    }
}

impl Scm<GitScmCommit> for GitScm {
    fn resolve_commit(&self, revision: &str) -> Result<GitScmCommit> {
        let stdout = self.git(["rev-parse", "--verify", &format!("{revision}^{{commit}}")])?;
        let stdout = String::from_utf8(stdout.stdout)?;
        Ok(GitScmCommit {
            sha: String::from(stdout.trim()),
        })
    }

    fn get_commit_identifier(&self, commit: &GitScmCommit) -> String {
        commit.sha.clone()
    }

    fn get_commit_author(&self, commit: &GitScmCommit) -> Result<Identity> {
        let stdout = self.git_stdout(["log", "-1", "--format=%an%n%ae", &commit.sha])?;
        let mut lines = stdout.lines();
        match (lines.next(), lines.next()) {
            (Some(name), Some(email)) => Ok(Identity {
                name: String::from(name),
                email: String::from(email),
            }),
            _ => Err(SubcommandErrors::SubcommandOutputParseFailed {
                command: format!("git log -1 --format=%an%n%ae {}", commit.sha),
                error: String::from("expected author name and email lines"),
                output: stdout.clone(),
            }
            .into()),
        }
    }

    fn get_changed_files(
        &self,
        from: &GitScmCommit,
        to: &GitScmCommit,
    ) -> Result<HashSet<PathBuf>> {
        // --no-renames reports a rename as a delete plus an add, which gives us both the old and new path.
        let stdout = self.git_stdout([
            "diff",
            "--name-only",
            "--no-renames",
            "-z",
            &from.sha,
            &to.sha,
        ])?;
        Ok(stdout
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    fn is_working_dir_clean(&self) -> Result<bool> {
        let stdout = self.git_stdout(["status", "--porcelain"])?;
        Ok(stdout.trim().is_empty())
    }

    fn stage_path(&self, path: &Path) -> Result<()> {
        self.git([
            OsStr::new("add"),
            OsStr::new("--all"),
            OsStr::new("--"),
            path.as_os_str(),
        ])?;
        Ok(())
    }

    fn commit_all(&self, message: &str, identity: &Identity, amend: bool) -> Result<()> {
        let mut args = Vec::from(Self::identity_args(identity));
        args.extend(["commit", "-a", "-m", message].map(String::from));
        if amend {
            args.push(String::from("--amend"));
        }
        self.git(&args)?;
        Ok(())
    }

    fn push(&self, force: bool) -> Result<()> {
        if force {
            self.git(["push", "-f"])?;
        } else {
            self.git(["push"])?;
        }
        Ok(())
    }

    fn commit_directory_to_branch(
        &self,
        dir: &Path,
        branch: &str,
        remote: &str,
        message: &str,
        identity: &Identity,
    ) -> Result<GitScmCommit> {
        let git_dir = PathBuf::from(
            self.git_stdout(["rev-parse", "--absolute-git-dir"])?
                .trim(),
        );

        // A private index keeps the real staging area untouched; git creates the file on first use, so it must not
        // exist beforehand.
        let index_dir = tempfile::Builder::new()
            .prefix("profile-action-index")
            .tempdir()?;
        let index_file = index_dir.path().join("index");

        let mut add = Command::new("git");
        add.arg(format!("--git-dir={}", git_dir.display()))
            .arg(format!("--work-tree={}", dir.display()))
            .args(["add", "--all", "--force", "."])
            .env("GIT_INDEX_FILE", &index_file)
            .current_dir(dir);
        Self::run(add, "git add --all --force .")?;

        let mut write_tree = self.command();
        write_tree
            .arg("write-tree")
            .env("GIT_INDEX_FILE", &index_file);
        let tree = String::from_utf8(Self::run(write_tree, "git write-tree")?.stdout)?;
        let tree = tree.trim();

        let parent = match self.try_rev_parse(&format!("refs/heads/{branch}^{{commit}}"))? {
            Some(sha) => Some(sha),
            None => self.try_rev_parse(&format!("refs/remotes/{remote}/{branch}^{{commit}}"))?,
        };
        debug!("publishing tree {tree} to {branch} with parent {parent:?}");

        let mut args = Vec::from(Self::identity_args(identity));
        args.extend(["commit-tree", tree, "-m", message].map(String::from));
        if let Some(parent) = &parent {
            args.push(String::from("-p"));
            args.push(parent.clone());
        }
        let sha = self.git_stdout(&args)?.trim().to_string();
        if sha.is_empty() {
            return Err(anyhow!("git commit-tree produced no commit id"));
        }

        self.git(["update-ref", &format!("refs/heads/{branch}"), &sha])?;
        Ok(GitScmCommit { sha })
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.git(["push", remote, branch])?;
        Ok(())
    }
}
