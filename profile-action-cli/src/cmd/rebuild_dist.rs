// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Command, ExitCode},
};

use anyhow::anyhow;
use log::{debug, error, info};

use crate::{
    errors::{RebuildDistErrors, SubcommandErrors},
    event::PushEvent,
    repo_config::{RebuildDistConfig, get_repo_config},
    scm::{Identity, Scm, ScmCommit, git::GitScm},
    util::{copy_dir_merge, normalize_permissions},
};

use super::cli::CommonOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Stack a new commit and push normally.
    NewCommit,
    /// Replace the previous bot commit and force-push.
    Amend,
}

impl CommitMode {
    /// Bot rebuilds on a feature branch collapse into one commit; the primary branch keeps every rebuild.
    #[must_use]
    #[allow(clippy::match_same_arms)] // every cell of the table is spelled out
    pub fn decide(on_primary_branch: bool, last_commit_by_bot: bool) -> Self {
        match (on_primary_branch, last_commit_by_bot) {
            (true, true) => CommitMode::NewCommit,
            (true, false) => CommitMode::NewCommit,
            (false, true) => CommitMode::Amend,
            (false, false) => CommitMode::NewCommit,
        }
    }

    #[must_use]
    pub fn force_push(self) -> bool {
        self == CommitMode::Amend
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RebuildOutcome {
    NoCommits,
    SourceUnchanged,
    NoChangesToCommit,
    Committed { branch: String, mode: CommitMode },
}

impl fmt::Display for RebuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuildOutcome::NoCommits => write!(f, "No commits, nothing to do"),
            RebuildOutcome::SourceUnchanged => write!(f, "Source wasn't changed, nothing to do"),
            RebuildOutcome::NoChangesToCommit => write!(f, "No changes to commit"),
            RebuildOutcome::Committed {
                branch,
                mode: CommitMode::NewCommit,
            } => write!(f, "Committed rebuilt bundle to {branch}"),
            RebuildOutcome::Committed {
                branch,
                mode: CommitMode::Amend,
            } => write!(f, "Amended previous rebuild on {branch} and force-pushed"),
        }
    }
}

#[allow(clippy::print_stdout)]
pub fn cli(common_opts: &CommonOptions, event_path: &Path) -> ExitCode {
    let config = match get_repo_config(&common_opts.project_dir, common_opts.override_config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let event = match PushEvent::from_file(event_path) {
        Ok(event) => event,
        Err(e) => {
            error!(
                "{}",
                RebuildDistErrors::UnreadableEvent {
                    path: PathBuf::from(event_path),
                    error: e,
                }
            );
            return ExitCode::FAILURE;
        }
    };

    match rebuild_dist(
        &common_opts.project_dir,
        &event,
        &config.rebuild_dist,
        &config.identity,
        &GitScm::new(common_opts.project_dir.clone()),
    ) {
        Ok(outcome) => {
            println!("{outcome}");
            ExitCode::SUCCESS
        }
        Err(e @ RebuildDistErrors::NotOnBranch) => {
            println!("{e}");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("rebuild failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Rebuild the bundled distribution when a push touched the source tree, and commit the result back to the pushed
/// branch.
pub fn rebuild_dist<Commit: ScmCommit, MyScm: Scm<Commit>>(
    project_dir: &Path,
    event: &PushEvent,
    config: &RebuildDistConfig,
    identity: &Identity,
    scm: &MyScm,
) -> Result<RebuildOutcome, RebuildDistErrors> {
    let branch_name = event.branch_name();

    let (Some(first), Some(last)) = (event.commits.first(), event.commits.last()) else {
        return Ok(RebuildOutcome::NoCommits);
    };

    let last_commit = scm.resolve_commit(&last.id)?;
    let before_first = scm.resolve_commit(&format!("{}~1", first.id))?;
    let changed = scm.get_changed_files(&before_first, &last_commit)?;
    debug!("{} paths changed in pushed range", changed.len());

    if !changed
        .iter()
        .any(|p| p.to_string_lossy().starts_with(&config.source_prefix))
    {
        return Ok(RebuildOutcome::SourceUnchanged);
    }

    run_build(project_dir, &config.build_command)?;

    let build_output = project_dir.join(&config.build_output);
    if !build_output.is_dir() {
        return Err(RebuildDistErrors::MissingBuildOutput(build_output));
    }
    let dist_dir = project_dir.join(&config.dist_dir);
    info!(
        "copying {} into {}",
        build_output.display(),
        dist_dir.display()
    );
    copy_dir_merge(&build_output, &dist_dir)?;
    normalize_permissions(&dist_dir, config.dir_mode, config.file_mode)?;

    if scm.is_working_dir_clean()? {
        return Ok(RebuildOutcome::NoChangesToCommit);
    }
    let Some(branch_name) = branch_name else {
        return Err(RebuildDistErrors::NotOnBranch);
    };

    let last_author = scm.get_commit_author(&last_commit)?;
    let mode = CommitMode::decide(
        branch_name == config.primary_branch,
        last_author == *identity,
    );
    info!(
        "committing as {identity} on {branch_name} ({mode:?}); last commit {} by {last_author}",
        scm.get_commit_identifier(&last_commit)
    );

    scm.stage_path(&config.dist_dir)?;
    scm.commit_all(&config.commit_message, identity, mode == CommitMode::Amend)?;
    scm.push(mode.force_push())?;

    Ok(RebuildOutcome::Committed {
        branch: String::from(branch_name),
        mode,
    })
}

fn run_build(project_dir: &Path, build_command: &[String]) -> Result<(), RebuildDistErrors> {
    let Some((program, args)) = build_command.split_first() else {
        return Err(anyhow!("build command is empty").into());
    };
    let display = build_command.join(" ");
    info!("running build: {display}");

    // Output is inherited so the build log lands in the CI job log.
    let status = Command::new(program)
        .args(args)
        .current_dir(project_dir)
        .status()
        .map_err(|e| SubcommandErrors::UnableToStart {
            command: display.clone(),
            error: e,
        })?;

    if !status.success() {
        return Err(RebuildDistErrors::BuildFailed {
            command: display,
            status,
        });
    }
    Ok(())
}
