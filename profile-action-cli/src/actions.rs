// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The small part of the GitHub Actions runner protocol that the action needs: appending to the `GITHUB_PATH` and
//! `GITHUB_ENV` files, and workflow commands written to stdout.

use std::{
    env,
    fs::OpenOptions,
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow};
use log::debug;

pub struct ActionsRuntime {
    github_path: Option<PathBuf>,
    github_env: Option<PathBuf>,
    debug: bool,
}

impl ActionsRuntime {
    #[must_use]
    pub fn from_env() -> Self {
        let file_var = |name: &str| {
            env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            github_path: file_var("GITHUB_PATH"),
            github_env: file_var("GITHUB_ENV"),
            debug: env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1"),
        }
    }

    #[must_use]
    pub fn new(github_path: Option<PathBuf>, github_env: Option<PathBuf>, debug: bool) -> Self {
        Self {
            github_path,
            github_env,
            debug,
        }
    }

    /// Whether the runner has step debug logging turned on.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Prepend `dir` to `PATH` for all following steps of the job.
    #[allow(clippy::print_stdout)]
    pub fn add_path(&self, dir: &Path) -> Result<()> {
        match &self.github_path {
            Some(file) => append(file, &format!("{}\n", dir.display())),
            None => {
                println!("::add-path::{}", dir.display());
                Ok(())
            }
        }
    }

    /// Make `name=value` visible to all following steps of the job.
    #[allow(clippy::print_stdout)]
    pub fn export_variable(&self, name: &str, value: &str) -> Result<()> {
        match &self.github_env {
            Some(file) => {
                let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
                if name.contains(&delimiter) || value.contains(&delimiter) {
                    return Err(anyhow!(
                        "unexpected input: name or value contains the delimiter {delimiter}"
                    ));
                }
                append(file, &format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
            }
            None => {
                println!("::set-env name={name}::{value}");
                Ok(())
            }
        }
    }

    /// Report a failure as an error annotation on the step; the caller is responsible for exiting non-zero.
    #[allow(clippy::print_stdout)]
    pub fn set_failed(&self, message: &str) {
        println!("::error::{}", escape_data(message));
    }
}

fn append(file: &Path, content: &str) -> Result<()> {
    debug!("appending to {}: {content:?}", file.display());
    let mut f = OpenOptions::new().append(true).create(true).open(file)?;
    f.write_all(content.as_bytes())?;
    Ok(())
}

fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
