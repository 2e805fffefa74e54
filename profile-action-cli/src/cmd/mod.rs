// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod cleanup_profile;
pub mod cli;
pub mod coverage_badge;
pub mod install_profile;
pub mod rebuild_dist;
