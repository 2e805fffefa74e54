// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use profile_action::cmd::rebuild_dist::{CommitMode, RebuildOutcome, rebuild_dist};
use profile_action::errors::RebuildDistErrors;
use profile_action::event::PushEvent;
use profile_action::repo_config::RebuildDistConfig;
use profile_action::scm::Identity;
use profile_action::scm::git::GitScm;
use std::fs;
use std::os::unix::fs::PermissionsExt as _;

use crate::util::{TestRepo, human};

/// Bundles `src/main.ts` into a read-only `result/lib/dist/index.js`, the way a Nix store path would hand it over.
const DETERMINISTIC_BUILD: &str = "rm -rf result && mkdir -p result/lib/dist && cp src/main.ts result/lib/dist/index.js && chmod 0444 result/lib/dist/index.js";

/// Like `DETERMINISTIC_BUILD`, but every run yields a different bundle.
const UNSTABLE_BUILD: &str = "rm -rf result && mkdir -p result/lib/dist && cp src/main.ts result/lib/dist/index.js && echo \"// $$ $(date +%s%N)\" >> result/lib/dist/index.js";

fn config(build: &str) -> RebuildDistConfig {
    RebuildDistConfig {
        build_command: vec![String::from("sh"), String::from("-c"), String::from(build)],
        ..RebuildDistConfig::default()
    }
}

fn run(
    repo: &TestRepo,
    git_ref: &str,
    commits: &[&str],
    build: &str,
) -> Result<RebuildOutcome, RebuildDistErrors> {
    let event_path = repo.push_event(git_ref, commits)?;
    let event = PushEvent::from_file(&event_path)?;
    rebuild_dist(
        &repo.work,
        &event,
        &config(build),
        &Identity::bot(),
        &GitScm::new(repo.work.clone()),
    )
}

#[test]
fn main_branch_rebuild_commits_and_pushes() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("src/main.ts", "export const version = 2;\n")?;
    let source_commit = repo.commit_as(&human(), "Bump version")?;
    repo.git(&["push"])?;

    let outcome = run(&repo, "refs/heads/main", &[&source_commit], DETERMINISTIC_BUILD)?;

    assert_eq!(
        outcome,
        RebuildOutcome::Committed {
            branch: String::from("main"),
            mode: CommitMode::NewCommit
        }
    );
    assert_eq!(repo.commit_count("HEAD")?, 3);
    assert_eq!(repo.git(&["rev-parse", "HEAD~1"])?, source_commit);
    assert_eq!(
        repo.git(&["log", "-1", "--format=%an <%ae>|%s"])?,
        "github-actions <actions@yaxi.tech>|Rebuild bundled action from source"
    );
    assert_eq!(
        repo.remote_git(&["rev-parse", "main"])?,
        repo.git(&["rev-parse", "HEAD"])?
    );

    let bundle = repo.work.join("dist/index.js");
    assert_eq!(fs::read_to_string(&bundle)?, "export const version = 2;\n");
    assert_eq!(fs::metadata(&bundle)?.permissions().mode() & 0o777, 0o644);
    assert_eq!(repo.git(&["status", "--porcelain"])?, "");

    // identity is passed per commit, never persisted
    assert!(repo.git(&["config", "--local", "--get", "user.name"]).is_err());
    Ok(())
}

#[test]
fn rebuild_is_idempotent() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("src/main.ts", "export const version = 3;\n")?;
    let source_commit = repo.commit_as(&human(), "Bump version")?;
    repo.git(&["push"])?;

    run(&repo, "refs/heads/main", &[&source_commit], DETERMINISTIC_BUILD)?;
    let count = repo.commit_count("HEAD")?;

    let outcome = run(&repo, "refs/heads/main", &[&source_commit], DETERMINISTIC_BUILD)?;

    assert_eq!(outcome, RebuildOutcome::NoChangesToCommit);
    assert_eq!(repo.commit_count("HEAD")?, count);
    Ok(())
}

#[test]
fn non_source_push_does_nothing() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("README.md", "# profile action\n")?;
    let docs_commit = repo.commit_as(&human(), "Add readme")?;
    repo.git(&["push"])?;

    let outcome = run(&repo, "refs/heads/main", &[&docs_commit], DETERMINISTIC_BUILD)?;

    assert_eq!(outcome, RebuildOutcome::SourceUnchanged);
    assert!(!repo.work.join("result").exists(), "build must not run");
    assert_eq!(repo.commit_count("HEAD")?, 2);
    Ok(())
}

#[test]
fn source_change_earlier_in_range_counts() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("src/main.ts", "export const version = 4;\n")?;
    let first = repo.commit_as(&human(), "Bump version")?;
    repo.write("README.md", "# profile action\n")?;
    let last = repo.commit_as(&human(), "Add readme")?;
    repo.git(&["push"])?;

    let outcome = run(&repo, "refs/heads/main", &[&first, &last], DETERMINISTIC_BUILD)?;

    assert!(matches!(outcome, RebuildOutcome::Committed { .. }));
    Ok(())
}

#[test]
fn empty_push_does_nothing() -> Result<()> {
    let repo = TestRepo::new()?;

    let outcome = run(&repo, "refs/heads/main", &[], DETERMINISTIC_BUILD)?;

    assert_eq!(outcome, RebuildOutcome::NoCommits);
    assert!(!repo.work.join("result").exists());
    assert_eq!(repo.commit_count("HEAD")?, 1);
    Ok(())
}

#[test]
fn feature_branch_amends_bot_commit() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.git(&["checkout", "-b", "feature"])?;
    repo.write("src/main.ts", "export const version = 5;\n")?;
    let source_commit = repo.commit_as(&human(), "Bump version")?;
    repo.git(&["push", "-u", "origin", "feature"])?;

    // the last pushed commit is a human one, so the first rebuild stacks a commit
    let outcome = run(&repo, "refs/heads/feature", &[&source_commit], UNSTABLE_BUILD)?;
    assert_eq!(
        outcome,
        RebuildOutcome::Committed {
            branch: String::from("feature"),
            mode: CommitMode::NewCommit
        }
    );
    assert_eq!(repo.commit_count("HEAD")?, 3);
    let bot_commit = repo.git(&["rev-parse", "HEAD"])?;

    let outcome = run(
        &repo,
        "refs/heads/feature",
        &[&source_commit, &bot_commit],
        UNSTABLE_BUILD,
    )?;
    assert_eq!(
        outcome,
        RebuildOutcome::Committed {
            branch: String::from("feature"),
            mode: CommitMode::Amend
        }
    );
    assert_eq!(repo.commit_count("HEAD")?, 3);
    assert_ne!(repo.git(&["rev-parse", "HEAD"])?, bot_commit);
    assert_eq!(repo.git(&["rev-parse", "HEAD~1"])?, source_commit);
    assert_eq!(
        repo.git(&["log", "-1", "--format=%an <%ae>"])?,
        "github-actions <actions@yaxi.tech>"
    );
    assert_eq!(
        repo.remote_git(&["rev-parse", "feature"])?,
        repo.git(&["rev-parse", "HEAD"])?
    );
    Ok(())
}

#[test]
fn main_branch_never_amends() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("src/main.ts", "export const version = 6;\n")?;
    let source_commit = repo.commit_as(&human(), "Bump version")?;
    repo.git(&["push"])?;

    run(&repo, "refs/heads/main", &[&source_commit], UNSTABLE_BUILD)?;
    let bot_commit = repo.git(&["rev-parse", "HEAD"])?;
    let outcome = run(
        &repo,
        "refs/heads/main",
        &[&source_commit, &bot_commit],
        UNSTABLE_BUILD,
    )?;

    assert_eq!(
        outcome,
        RebuildOutcome::Committed {
            branch: String::from("main"),
            mode: CommitMode::NewCommit
        }
    );
    assert_eq!(repo.commit_count("HEAD")?, 4);
    assert_eq!(repo.git(&["rev-parse", "HEAD~1"])?, bot_commit);
    Ok(())
}

#[test]
fn tag_push_with_source_changes_fails() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("src/main.ts", "export const version = 7;\n")?;
    let source_commit = repo.commit_as(&human(), "Bump version")?;
    repo.git(&["push"])?;

    let result = run(&repo, "refs/tags/v1.0.0", &[&source_commit], DETERMINISTIC_BUILD);

    assert!(matches!(result, Err(RebuildDistErrors::NotOnBranch)));
    assert_eq!(repo.commit_count("HEAD")?, 2);
    assert_eq!(
        repo.remote_git(&["rev-parse", "main"])?,
        source_commit
    );
    Ok(())
}
