//! Post-move passes: sort-renaming inside category folders and removal of
//! folders left empty under the root.

use crate::file_category::RuleTable;
use crate::file_organizer::{OrganizeError, OrganizeResult, log_event};
use crate::report::{Level, Reporter};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// The name a file gets at 1-based `position` in a sorted folder.
///
/// ```
/// use dirsort::cleanup::sorted_name;
/// use std::ffi::OsStr;
///
/// assert_eq!(sorted_name(1, OsStr::new("a.mp3")), "001_a.mp3");
/// assert_eq!(sorted_name(1234, OsStr::new("b.mp3")), "1234_b.mp3");
/// ```
pub fn sorted_name(position: usize, original: &OsStr) -> OsString {
    let mut name = OsString::from(format!("{:03}_", position));
    name.push(original);
    name
}

/// Prefixes every file directly inside each category folder with its
/// position in file-name order.
///
/// Subdirectories are not touched. Returns the number of files renamed.
pub fn sort_category_files(
    root: &Path,
    rules: &RuleTable,
    reporter: &mut dyn Reporter,
) -> OrganizeResult<usize> {
    let mut renamed = 0;

    for rule in rules {
        let folder = root.join(&rule.name);
        let mut names = Vec::new();
        for entry in read_dir(&folder)? {
            let entry = entry.map_err(|e| OrganizeError::ScanFailed {
                path: folder.clone(),
                source: e,
            })?;
            if entry.path().is_file() {
                names.push(entry.file_name());
            }
        }
        names.sort();

        for (index, name) in names.iter().enumerate() {
            let from = folder.join(name);
            let to = folder.join(sorted_name(index + 1, name));
            fs::rename(&from, &to).map_err(|e| OrganizeError::RenameFailed {
                from: from.clone(),
                to: to.clone(),
                source: e,
            })?;
            renamed += 1;
            log_event(
                reporter,
                Level::Info,
                &format!(
                    "Sorted file {} in folder {} to {}",
                    name.to_string_lossy(),
                    rule.name,
                    to.display()
                ),
            )?;
        }
    }

    Ok(renamed)
}

/// Removes every direct child directory of `root` that has no entries.
///
/// Only one level is inspected, so a category folder that still holds empty
/// year/month folders survives. Symlinks to directories are left alone.
pub fn remove_empty_folders(
    root: &Path,
    reporter: &mut dyn Reporter,
) -> OrganizeResult<Vec<PathBuf>> {
    let mut removed = Vec::new();

    let mut children = Vec::new();
    for entry in read_dir(root)? {
        let entry = entry.map_err(|e| OrganizeError::ScanFailed {
            path: root.to_path_buf(),
            source: e,
        })?;
        let is_dir = entry
            .file_type()
            .map_err(|e| OrganizeError::ScanFailed {
                path: entry.path(),
                source: e,
            })?
            .is_dir();
        if is_dir {
            children.push(entry.path());
        }
    }
    children.sort();

    for path in children {
        if read_dir(&path)?.next().is_some() {
            continue;
        }
        fs::remove_dir(&path).map_err(|e| OrganizeError::DirectoryRemovalFailed {
            path: path.clone(),
            source: e,
        })?;
        log_event(
            reporter,
            Level::Info,
            &format!("Removed empty folder: {}", path.display()),
        )?;
        removed.push(path);
    }

    Ok(removed)
}

fn read_dir(path: &Path) -> OrganizeResult<fs::ReadDir> {
    fs::read_dir(path).map_err(|e| OrganizeError::ScanFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
