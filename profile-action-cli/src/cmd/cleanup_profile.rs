// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use log::info;

use crate::{actions::ActionsRuntime, errors::NixProfileErrors};

use super::install_profile::STATE_TMPDIR_VAR;

pub fn cli(state_tmp_dir: Option<&Path>) -> ExitCode {
    let runtime = ActionsRuntime::from_env();
    match cleanup_profile(&runtime, state_tmp_dir) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            runtime.set_failed(&format!("Cleanup failed: {e}"));
            ExitCode::FAILURE
        }
    }
}

/// Delete the profile directory recorded by the install step, if any, and clear the recorded state.
pub fn cleanup_profile(
    runtime: &ActionsRuntime,
    state_tmp_dir: Option<&Path>,
) -> Result<Option<PathBuf>, NixProfileErrors> {
    let Some(tmp_dir) = state_tmp_dir.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(None);
    };

    info!("Deleting {}", tmp_dir.display());
    match fs::remove_dir_all(tmp_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    runtime.export_variable(STATE_TMPDIR_VAR, "")?;

    Ok(Some(tmp_dir.to_path_buf()))
}
