// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fs, path::Path, process::ExitCode};

use log::{error, info};

use crate::{
    badge::{CoverageSummary, badge_color, format_coverage, render_badge},
    errors::CoverageBadgeErrors,
    repo_config::{CoverageBadgeConfig, get_repo_config},
    scm::{Identity, Scm, ScmCommit, git::GitScm},
};

use super::cli::CommonOptions;

#[derive(Debug)]
pub struct BadgeOutcome {
    pub coverage: f64,
    pub color: &'static str,
    pub branch: String,
    pub commit_identifier: String,
}

#[allow(clippy::print_stdout)]
pub fn cli(common_opts: &CommonOptions) -> ExitCode {
    let config = match get_repo_config(&common_opts.project_dir, common_opts.override_config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match publish_coverage_badge(
        &common_opts.project_dir,
        &config.coverage_badge,
        &config.identity,
        &GitScm::new(common_opts.project_dir.clone()),
    ) {
        Ok(out) => {
            println!(
                "published coverage badge ({}, {}) to {} as {}",
                format_coverage(out.coverage),
                out.color,
                out.branch,
                out.commit_identifier
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Render the line-coverage badge from the coverage summary and publish it as the sole content of the side branch.
pub fn publish_coverage_badge<Commit: ScmCommit, MyScm: Scm<Commit>>(
    project_dir: &Path,
    config: &CoverageBadgeConfig,
    identity: &Identity,
    scm: &MyScm,
) -> Result<BadgeOutcome, CoverageBadgeErrors> {
    let summary_path = project_dir.join(&config.summary_path);
    let coverage = CoverageSummary::from_file(&summary_path)
        .map_err(|e| CoverageBadgeErrors::UnreadableSummary {
            path: summary_path.clone(),
            error: e,
        })?
        .total_line_coverage();
    let color = badge_color(coverage);
    info!("total line coverage {coverage}, badge color {color}");

    let tmp_dir = tempfile::Builder::new()
        .prefix("profile-action-badge")
        .tempdir()?;
    fs::write(tmp_dir.path().join(&config.file_name), render_badge(coverage))?;

    let publish_err = |e: anyhow::Error| CoverageBadgeErrors::Publish {
        branch: config.branch.clone(),
        error: e,
    };
    let commit = scm
        .commit_directory_to_branch(
            tmp_dir.path(),
            &config.branch,
            &config.remote,
            &config.commit_message,
            identity,
        )
        .map_err(publish_err)?;
    scm.push_branch(&config.remote, &config.branch)
        .map_err(publish_err)?;

    Ok(BadgeOutcome {
        coverage,
        color,
        branch: config.branch.clone(),
        commit_identifier: scm.get_commit_identifier(&commit),
    })
}
