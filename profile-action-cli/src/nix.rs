// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::process::Command;

use anyhow::Result;
use log::{debug, info};
use serde::Deserialize;

use crate::errors::{NixProfileErrors, SubcommandErrors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NixOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl NixOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

pub trait Nix {
    /// Run `nix` with `args`; a non-zero exit is reported in the output, not as an error.
    fn run(&self, args: &[String]) -> Result<NixOutput>;
}

pub struct SystemNix {
    echo_output: bool,
}

impl SystemNix {
    /// `echo_output` logs nix's stdout and stderr at info level rather than debug.
    #[must_use]
    pub fn new(echo_output: bool) -> Self {
        Self { echo_output }
    }
}

impl Nix for SystemNix {
    fn run(&self, args: &[String]) -> Result<NixOutput> {
        let display = format!("nix {}", args.join(" "));
        debug!("running {display}");
        let output = Command::new("nix")
            .args(args)
            .output()
            .map_err(|e| SubcommandErrors::UnableToStart {
                command: display.clone(),
                error: e,
            })?;

        let out = NixOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        for line in out.stdout.lines().chain(out.stderr.lines()) {
            if self.echo_output {
                info!("{line}");
            } else {
                debug!("{line}");
            }
        }
        Ok(out)
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| String::from(*a)).collect()
}

/// Run nix, treating a non-zero exit as an error.
pub fn run_nix_checked(nix: &impl Nix, args: Vec<String>) -> Result<NixOutput, NixProfileErrors> {
    let out = nix.run(&args)?;
    if !out.success() {
        return Err(NixProfileErrors::NixFailed {
            args,
            exit_code: out.exit_code,
            stderr: out.stderr,
        });
    }
    Ok(out)
}

/// The Nix system double of the runner, eg. `x86_64-linux`.
pub fn determine_system(nix: &impl Nix) -> Result<String, NixProfileErrors> {
    let args = to_args(&[
        "eval",
        "--impure",
        "--json",
        "--expr",
        "builtins.currentSystem",
    ]);
    let out = run_nix_checked(nix, args)?;
    serde_json::from_str::<String>(out.stdout.trim()).map_err(|e| {
        SubcommandErrors::SubcommandOutputParseFailed {
            command: String::from("nix eval --impure --json --expr builtins.currentSystem"),
            error: e.to_string(),
            output: out.stdout.clone(),
        }
        .into()
    })
}

/// Turn a bare package name into a `nixpkgs#` flake reference, leaving anything nix already resolves untouched.
pub fn maybe_add_nixpkgs(nix: &impl Nix, package: &str) -> Result<String, NixProfileErrors> {
    let out = nix.run(&to_args(&["flake", "metadata", package]))?;
    classify_flake_reference(package, &out)
}

fn classify_flake_reference(package: &str, out: &NixOutput) -> Result<String, NixProfileErrors> {
    if out.success() {
        Ok(String::from(package))
    } else if out.stderr.contains("cannot find") {
        info!("Prefixing \"{package}\" with \"nixpkgs#\"");
        Ok(format!("nixpkgs#{package}"))
    } else {
        Err(NixProfileErrors::InvalidFlakeReference {
            reference: String::from(package),
            stderr: out.stderr.clone(),
        })
    }
}

#[derive(Deserialize)]
struct FlakeMetadata {
    locks: Option<FlakeLocks>,
}

#[derive(Deserialize)]
struct FlakeLocks {
    nodes: Option<FlakeNodes>,
}

#[derive(Deserialize)]
struct FlakeNodes {
    nixpkgs: Option<FlakeNode>,
}

#[derive(Deserialize)]
struct FlakeNode {
    locked: Option<LockedGithubInput>,
}

#[derive(Deserialize)]
struct LockedGithubInput {
    owner: String,
    repo: String,
    rev: String,
}

/// A Nix expression evaluating to the package set of the current flake's locked `nixpkgs` input.
pub fn nixpkgs_expr_from_flake(nix: &impl Nix) -> Result<String, NixProfileErrors> {
    let out = run_nix_checked(nix, to_args(&["flake", "metadata", "--json"]))?;
    let metadata: FlakeMetadata =
        serde_json::from_str(&out.stdout).map_err(|e| SubcommandErrors::SubcommandOutputParseFailed {
            command: String::from("nix flake metadata --json"),
            error: e.to_string(),
            output: out.stdout.clone(),
        })?;
    let nixpkgs = metadata
        .locks
        .and_then(|l| l.nodes)
        .and_then(|n| n.nixpkgs)
        .and_then(|n| n.locked)
        .ok_or(NixProfileErrors::MissingNixpkgsInput)?;

    let flake_ref = format!("github:{}/{}/{}", nixpkgs.owner, nixpkgs.repo, nixpkgs.rev);
    let system = determine_system(nix)?;
    Ok(format!(
        "(import (builtins.getFlake(\"{flake_ref}\")) {{ system = \"{system}\"; }})"
    ))
}
