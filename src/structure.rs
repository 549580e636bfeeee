/// Creation of the category folder layout.
///
/// One folder per category directly under the root, plus a `Photos/<year>/<month>`
/// tree when the rule table has a `Photos` category. Every step is idempotent.
use crate::file_category::{PHOTOS_CATEGORY, RuleTable};
use crate::file_organizer::{OrganizeError, OrganizeResult, log_event};
use crate::report::{Level, Reporter};
use std::fs;
use std::path::{Path, PathBuf};

/// Years that receive photo folders, newest first.
///
/// ```
/// use dirsort::structure::photo_years;
///
/// assert_eq!(photo_years(2024, 2), vec![2024, 2023, 2022]);
/// assert_eq!(photo_years(2024, 0), vec![2024]);
/// ```
pub fn photo_years(current_year: i32, max_photo_years: u32) -> Vec<i64> {
    let current = i64::from(current_year);
    (0..=i64::from(max_photo_years))
        .map(|offset| current - offset)
        .collect()
}

/// Creates the category folders under `root`.
///
/// Returns the directories that did not exist before the call.
///
/// # Errors
///
/// Fails with [`OrganizeError::DirectoryCreationFailed`] if a directory cannot
/// be created, for example because a regular file already has its name.
pub fn build_structure(
    root: &Path,
    rules: &RuleTable,
    max_photo_years: u32,
    current_year: i32,
    reporter: &mut dyn Reporter,
) -> OrganizeResult<Vec<PathBuf>> {
    let mut created = Vec::new();

    for rule in rules {
        ensure_dir(&root.join(&rule.name), &mut created, reporter)?;
    }

    if rules.has_photos() {
        let photos = root.join(PHOTOS_CATEGORY);
        for year in photo_years(current_year, max_photo_years) {
            let year_dir = photos.join(year.to_string());
            ensure_dir(&year_dir, &mut created, reporter)?;
            for month in 1..=12 {
                ensure_dir(&year_dir.join(format!("{:02}", month)), &mut created, reporter)?;
            }
        }
    }

    Ok(created)
}

fn ensure_dir(
    path: &Path,
    created: &mut Vec<PathBuf>,
    reporter: &mut dyn Reporter,
) -> OrganizeResult<()> {
    if path.is_dir() {
        return log_event(
            reporter,
            Level::Info,
            &format!("Folder already exists: {}", path.display()),
        );
    }

    fs::create_dir_all(path).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    created.push(path.to_path_buf());
    log_event(
        reporter,
        Level::Info,
        &format!("Created folder: {}", path.display()),
    )
}
