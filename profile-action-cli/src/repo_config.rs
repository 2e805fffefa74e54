// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow};
use serde::Deserialize;

use crate::scm::Identity;

const DEFAULT_CONFIG_PATH: &str = ".config/profile-action.toml";

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct RepoConfig {
    pub rebuild_dist: RebuildDistConfig,
    pub coverage_badge: CoverageBadgeConfig,
    pub identity: Identity,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", default)]
pub struct RebuildDistConfig {
    /// A push only triggers a rebuild when one of its changed paths starts with this prefix.
    pub source_prefix: String,
    pub build_command: Vec<String>,
    /// Where the build command leaves its output, relative to the project directory.
    pub build_output: PathBuf,
    pub dist_dir: PathBuf,
    /// Bot commits on this branch are never amended.
    pub primary_branch: String,
    pub commit_message: String,
    // Build output from the Nix store is read-only; these modes make the copy writable again.
    pub dir_mode: u32,
    pub file_mode: u32,
}

impl Default for RebuildDistConfig {
    fn default() -> Self {
        Self {
            source_prefix: String::from("src/"),
            build_command: vec![String::from("nix"), String::from("build")],
            build_output: PathBuf::from("result/lib/dist"),
            dist_dir: PathBuf::from("dist"),
            primary_branch: String::from("main"),
            commit_message: String::from("Rebuild bundled action from source"),
            dir_mode: 0o755,
            file_mode: 0o644,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", default)]
pub struct CoverageBadgeConfig {
    pub summary_path: PathBuf,
    pub branch: String,
    pub remote: String,
    pub file_name: String,
    pub commit_message: String,
}

impl Default for CoverageBadgeConfig {
    fn default() -> Self {
        Self {
            summary_path: PathBuf::from("coverage/coverage-summary.json"),
            branch: String::from("gh-pages"),
            remote: String::from("origin"),
            file_name: String::from("coverage.svg"),
            commit_message: String::from("Update documentation"),
        }
    }
}

pub fn get_repo_config(project_dir: &Path, override_config: Option<&PathBuf>) -> Result<RepoConfig> {
    let path = match override_config {
        Some(path) => path.clone(),
        None => project_dir.join(DEFAULT_CONFIG_PATH),
    };
    if fs::exists(&path)? {
        Ok(toml::from_str(&fs::read_to_string(&path)?)?)
    } else {
        if let Some(override_config) = override_config {
            return Err(anyhow!(
                "override config path {} could not be opened",
                override_config.display()
            ));
        }
        Ok(RepoConfig::default())
    }
}
