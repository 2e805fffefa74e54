// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::anyhow;
use log::info;

use crate::{
    actions::ActionsRuntime,
    errors::NixProfileErrors,
    nix::{Nix, SystemNix, maybe_add_nixpkgs, nixpkgs_expr_from_flake, run_nix_checked},
};

/// Carries the profile's temporary directory from the main step to the post step, and between repeated uses of the
/// action within one job.
pub const STATE_TMPDIR_VAR: &str = "STATE_NIX_PROFILE_TMPDIR";

const PROFILE_DIR_NAME: &str = ".nix-profile";

#[derive(Debug, PartialEq, Eq)]
pub struct InstalledProfile {
    pub tmp_dir: PathBuf,
    pub profile_dir: PathBuf,
}

pub fn cli(packages: &str, expr: &str, state_tmp_dir: Option<&Path>) -> ExitCode {
    let runtime = ActionsRuntime::from_env();
    let nix = SystemNix::new(runtime.is_debug());
    match install_profile(&nix, &runtime, packages, expr, state_tmp_dir) {
        Ok(profile) => {
            info!("installed into {}", profile.profile_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            runtime.set_failed(&format!("Workflow run failed: {e}"));
            ExitCode::FAILURE
        }
    }
}

/// Split the comma separated `packages` input into trimmed, non-empty entries.
#[must_use]
pub fn parse_packages(packages: &str) -> Vec<&str> {
    packages
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Install the requested packages (or the package set of `expr`) into a per-job profile and put its `bin` on the
/// `PATH` of the following steps.
pub fn install_profile(
    nix: &impl Nix,
    runtime: &ActionsRuntime,
    packages: &str,
    expr: &str,
    state_tmp_dir: Option<&Path>,
) -> Result<InstalledProfile, NixProfileErrors> {
    let expr = expr.trim();
    let packages = parse_packages(packages);
    if expr.is_empty() && packages.is_empty() {
        return Err(anyhow!("one of the `packages` or `expr` inputs must be provided").into());
    }

    let tmp_dir = match state_tmp_dir.filter(|p| !p.as_os_str().is_empty()) {
        Some(existing) => {
            info!("reusing profile directory {}", existing.display());
            existing.to_path_buf()
        }
        None => tempfile::Builder::new()
            .prefix("nix-profile-")
            .tempdir()?
            .keep(),
    };
    let profile_dir = tmp_dir.join(PROFILE_DIR_NAME);

    let mut args = vec![
        String::from("profile"),
        String::from("install"),
        String::from("--profile"),
        profile_dir.to_string_lossy().into_owned(),
    ];
    if expr.is_empty() {
        for package in packages {
            args.push(maybe_add_nixpkgs(nix, package)?);
        }
    } else {
        let nixpkgs = nixpkgs_expr_from_flake(nix)?;
        args.push(String::from("--expr"));
        args.push(format!("let pkgs = {nixpkgs}; in {expr}"));
    }
    run_nix_checked(nix, args)?;

    runtime.add_path(&profile_dir.join("bin"))?;
    runtime.export_variable(STATE_TMPDIR_VAR, &tmp_dir.to_string_lossy())?;

    Ok(InstalledProfile {
        tmp_dir,
        profile_dir,
    })
}
