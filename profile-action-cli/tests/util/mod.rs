// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use profile_action::scm::Identity;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use crate::TestError;

/// A working copy with a bare `origin`, both inside one temporary directory.
pub struct TestRepo {
    _tmp_dir: TempDir,
    pub work: PathBuf,
    pub remote: PathBuf,
}

pub fn human() -> Identity {
    Identity {
        name: String::from("Jane Doe"),
        email: String::from("jane@example.com"),
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(["-c", "commit.gpgsign=false", "-c", "init.defaultBranch=main"])
        .args(args)
        .current_dir(dir)
        .output()?;

    if !output.status.success() {
        return Err(TestError::SubcommandFailed {
            command: format!("git {}", args.join(" ")),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }

    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

impl TestRepo {
    /// Repository on `main` with one pushed commit holding `src/main.ts`, `dist/index.js` and a `.gitignore` for the
    /// build's `result` link.
    pub fn new() -> Result<Self> {
        let tmp_dir = tempfile::Builder::new()
            .prefix("profile-action-test")
            .tempdir()?;
        let work = tmp_dir.path().join("work");
        let remote = tmp_dir.path().join("remote.git");
        fs::create_dir(&work)?;
        fs::create_dir(&remote)?;
        run_git(&remote, &["init", "--bare"])?;
        run_git(&work, &["init"])?;
        run_git(&work, &["remote", "add", "origin", &remote.to_string_lossy()])?;

        let repo = Self {
            _tmp_dir: tmp_dir,
            work,
            remote,
        };
        repo.write(".gitignore", "/result\n")?;
        repo.write("src/main.ts", "export const version = 1;\n")?;
        repo.write("dist/index.js", "stale bundle\n")?;
        repo.commit_as(&human(), "Initial commit")?;
        repo.git(&["push", "-u", "origin", "main"])?;
        Ok(repo)
    }

    pub fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.work, args)
    }

    pub fn remote_git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.remote, args)
    }

    pub fn write(&self, path: &str, content: &str) -> Result<()> {
        let path = self.work.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Stage everything and commit it; returns the new commit id.
    pub fn commit_as(&self, identity: &Identity, message: &str) -> Result<String> {
        self.git(&["add", "--all"])?;
        self.git(&[
            "-c",
            &format!("user.name={}", identity.name),
            "-c",
            &format!("user.email={}", identity.email),
            "commit",
            "-m",
            message,
        ])?;
        self.git(&["rev-parse", "HEAD"])
    }

    pub fn commit_count(&self, revision: &str) -> Result<usize> {
        Ok(self.git(&["rev-list", "--count", revision])?.parse()?)
    }

    pub fn push_event(&self, git_ref: &str, commits: &[&str]) -> Result<PathBuf> {
        let commits = commits
            .iter()
            .map(|id| serde_json::json!({ "id": id }))
            .collect::<Vec<_>>();
        let event = serde_json::json!({ "ref": git_ref, "commits": commits });
        let path = self.work.parent().expect("work has a parent").join("event.json");
        fs::write(&path, serde_json::to_string_pretty(&event)?)?;
        Ok(path)
    }
}
