// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fs, io, os::unix::fs::PermissionsExt as _, path::Path};

/// Recursively copy `src` into `dst`, merging with whatever `dst` already holds.
///
/// Files at the same relative path are replaced; files only present in `dst` are left alone.  A read-only file in
/// `dst` (eg. left behind by an earlier copy out of a read-only store) is made writable before it is overwritten.
pub fn copy_dir_merge(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(&dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        let target = dst.as_ref().join(entry.file_name());
        if ty.is_dir() {
            copy_dir_merge(entry.path(), &target)?;
        } else {
            if let Ok(meta) = fs::symlink_metadata(&target) {
                if meta.is_dir() {
                    fs::remove_dir_all(&target)?;
                } else if meta.permissions().readonly() {
                    let mut perms = meta.permissions();
                    perms.set_mode(perms.mode() | 0o200);
                    fs::set_permissions(&target, perms)?;
                }
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Set every directory at or below `root` to `dir_mode` and every file to `file_mode`.
///
/// Directories are made writable and searchable before they are descended into, so a tree copied out of a
/// read-only store can still be walked.
pub fn normalize_permissions(root: impl AsRef<Path>, dir_mode: u32, file_mode: u32) -> io::Result<()> {
    let root = root.as_ref();
    fs::set_permissions(root, fs::Permissions::from_mode(dir_mode))?;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_dir() {
            normalize_permissions(entry.path(), dir_mode, file_mode)?;
        } else if ty.is_file() {
            fs::set_permissions(entry.path(), fs::Permissions::from_mode(file_mode))?;
        }
    }
    Ok(())
}
