// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fs, path::Path};

use anyhow::Result;
use serde::Deserialize;

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// The subset of a GitHub `push` webhook payload that the rebuild step reads.
#[derive(Debug, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Ordered oldest to newest.
    #[serde(default)]
    pub commits: Vec<PushCommit>,
}

#[derive(Debug, Deserialize)]
pub struct PushCommit {
    pub id: String,
    #[serde(default)]
    pub author: Option<PushAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct PushAuthor {
    pub name: String,
    pub email: Option<String>,
}

impl PushEvent {
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// The pushed branch, or `None` when the ref is not a branch (eg. a tag).
    #[must_use]
    pub fn branch_name(&self) -> Option<&str> {
        self.git_ref.strip_prefix(BRANCH_REF_PREFIX)
    }
}
