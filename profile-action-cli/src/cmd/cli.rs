// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::set_max_level;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::{fmt::Debug, path::PathBuf, process::ExitCode};

use super::{cleanup_profile, coverage_badge, install_profile, rebuild_dist};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
pub struct CommonOptions {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Working copy of the repository to operate on
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Use a static config file instead of the in-repo .config/profile-action.toml
    #[arg(long, global = true)]
    pub override_config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install Nix packages into a per-job profile and add it to the PATH of later steps
    Install {
        /// Comma separated packages or flake references; bare names are looked up in nixpkgs
        #[arg(long, env = "INPUT_PACKAGES", default_value = "")]
        packages: String,

        /// Nix expression to install, evaluated with `pkgs` bound to the flake's locked nixpkgs input
        #[arg(long, env = "INPUT_EXPR", default_value = "")]
        expr: String,

        /// Profile directory recorded by an earlier install in the same job
        #[arg(long, env = install_profile::STATE_TMPDIR_VAR)]
        state_dir: Option<PathBuf>,
    },

    /// Remove the profile directory created by `install`
    Cleanup {
        /// Profile directory recorded by `install`
        #[arg(long, env = install_profile::STATE_TMPDIR_VAR)]
        state_dir: Option<PathBuf>,
    },

    /// Rebuild the bundled distribution if a push changed the source, and commit it back to the branch
    RebuildDist {
        /// JSON payload of the push event
        #[arg(long, env = "GITHUB_EVENT_PATH")]
        event_path: PathBuf,
    },

    /// Render the line coverage badge and publish it to the static pages branch
    PublishCoverageBadge,
}

pub fn run_cli() -> ExitCode {
    let cli = Cli::parse();
    let _ = TermLogger::init(
        cli.common.verbose.log_level_filter(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
    set_max_level(cli.common.verbose.log_level_filter());

    match &cli.command {
        Commands::Install {
            packages,
            expr,
            state_dir,
        } => install_profile::cli(packages, expr, state_dir.as_deref()),
        Commands::Cleanup { state_dir } => cleanup_profile::cli(state_dir.as_deref()),
        Commands::RebuildDist { event_path } => rebuild_dist::cli(&cli.common, event_path),
        Commands::PublishCoverageBadge => coverage_badge::cli(&cli.common),
    }
}
