// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubcommandErrors {
    #[error("sub-command '{command:?}' could not be started: {error:?}")]
    UnableToStart {
        command: String,
        error: std::io::Error,
    },

    #[error("sub-command '{command:?}' failed with exit code {status:?} and stderr {stderr:?})")]
    SubcommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("sub-command '{command:?}' had unparseable output; error: {error:?} output: {output:?})")]
    SubcommandOutputParseFailed {
        command: String,
        error: String,
        output: String,
    },
}

#[derive(Error, Debug)]
pub enum RebuildDistErrors {
    #[error("unable to read push event from {path:?}: {error}")]
    UnreadableEvent { path: PathBuf, error: anyhow::Error },

    #[error("Not in a branch, but there are source changes. This is unexpected.")]
    NotOnBranch,

    #[error("build command {command:?} failed with exit code {status:?}")]
    BuildFailed {
        command: String,
        status: std::process::ExitStatus,
    },

    #[error("build output directory {0:?} does not exist after a successful build")]
    MissingBuildOutput(PathBuf),

    #[error(transparent)]
    SubcommandErrors(#[from] SubcommandErrors),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum CoverageBadgeErrors {
    #[error("unable to read coverage summary {path:?}: {error}")]
    UnreadableSummary { path: PathBuf, error: anyhow::Error },

    #[error("unable to publish badge to branch {branch:?}: {error}")]
    Publish { branch: String, error: anyhow::Error },

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum NixProfileErrors {
    #[error("Given flake reference \"{reference}\" is invalid: {stderr}")]
    InvalidFlakeReference { reference: String, stderr: String },

    #[error("Could not find nixpkgs input. You need to provide a (locked) input called nixpkgs.")]
    MissingNixpkgsInput,

    #[error("nix exited with non-zero exit status: {exit_code:?}")]
    NixFailed {
        args: Vec<String>,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    SubcommandErrors(#[from] SubcommandErrors),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
