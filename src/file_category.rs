/// Category rules: which extensions land in which destination folder.
///
/// A [`RuleTable`] is an ordered list of [`CategoryRule`]s.
/// [`RuleTable::categorize`] returns the first rule in table order that
/// matches. The organizer instead runs one pass per category, so a file whose
/// extension appears in two categories ends up in the later one.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::RuleTable;
/// use std::path::Path;
///
/// let rules = RuleTable::builtin();
/// let rule = rules.categorize(Path::new("holiday.JPG")).unwrap();
/// assert_eq!(rule.name, "Photos");
/// assert!(rules.categorize(Path::new("notes.xyz")).is_none());
/// ```
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the category that also receives year/month bucket folders.
pub const PHOTOS_CATEGORY: &str = "Photos";

/// A destination folder and the extensions routed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Folder name created directly under the root.
    pub name: String,
    /// Lowercase extensions including the leading dot, e.g. `.jpg`.
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl CategoryRule {
    /// Builds a rule, normalizing every extension and dropping repeats.
    ///
    /// Extensions may be given with or without the leading dot and in any case.
    pub fn new<I, S>(name: &str, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            if let Some(ext) = normalize_extension(ext.as_ref())
                && !normalized.contains(&ext)
            {
                normalized.push(ext);
            }
        }
        Self {
            name: name.to_string(),
            extensions: normalized,
        }
    }

    /// Returns true if `ext` (any case, dot optional) belongs to this rule.
    pub fn matches_extension(&self, ext: &str) -> bool {
        normalize_extension(ext).is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Returns true if the file at `path` has an extension in this rule.
    pub fn matches(&self, path: &Path) -> bool {
        file_extension(path).is_some_and(|ext| self.extensions.contains(&ext))
    }
}

/// Lower-cases an extension and ensures it carries a leading dot.
///
/// Returns `None` for blank input.
///
/// ```
/// use dirsort::file_category::normalize_extension;
///
/// assert_eq!(normalize_extension("JPG"), Some(".jpg".to_string()));
/// assert_eq!(normalize_extension(".Mp3"), Some(".mp3".to_string()));
/// assert_eq!(normalize_extension("  "), None);
/// ```
pub fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim();
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with('.') {
        Some(lower)
    } else {
        Some(format!(".{}", lower))
    }
}

/// The lower-cased final extension of `path`, with its leading dot.
///
/// Only the last suffix counts (`backup.tar.gz` yields `.gz`) and dotfiles such
/// as `.bashrc` have no extension.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Ordered collection of category rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<CategoryRule>,
}

impl RuleTable {
    /// Creates a table from rules in the given order.
    ///
    /// A category named more than once is merged into its first occurrence,
    /// keeping that position and appending the new extensions.
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let mut merged: Vec<CategoryRule> = Vec::with_capacity(rules.len());
        for rule in rules {
            let rule = CategoryRule::new(&rule.name, &rule.extensions);
            match merged.iter_mut().find(|existing| existing.name == rule.name) {
                Some(existing) => {
                    for ext in rule.extensions {
                        if !existing.extensions.contains(&ext) {
                            existing.extensions.push(ext);
                        }
                    }
                }
                None => merged.push(rule),
            }
        }
        Self { rules: merged }
    }

    /// The six built-in categories.
    pub fn builtin() -> Self {
        Self::new(vec![
            CategoryRule::new(
                "Documents",
                [
                    ".doc", ".docx", ".pdf", ".txt", ".xls", ".xlsx", ".ppt", ".pptx",
                ],
            ),
            CategoryRule::new(PHOTOS_CATEGORY, [".jpg", ".jpeg", ".png", ".gif"]),
            CategoryRule::new("Videos", [".mp4", ".avi", ".mov", ".mkv"]),
            CategoryRule::new("Music", [".mp3", ".wav", ".flac"]),
            CategoryRule::new(
                "Projects",
                [".py", ".java", ".cpp", ".html", ".css", ".js"],
            ),
            CategoryRule::new("Personal", [".zip", ".rar", ".7z", ".tar", ".gz"]),
        ])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategoryRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Looks up a rule by its exact category name.
    pub fn get(&self, name: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Returns true if the table has a category named exactly `Photos`.
    pub fn has_photos(&self) -> bool {
        self.get(PHOTOS_CATEGORY).is_some()
    }

    /// The first rule, in table order, that claims the file at `path`.
    pub fn categorize(&self, path: &Path) -> Option<&CategoryRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a CategoryRule;
    type IntoIter = std::slice::Iter<'a, CategoryRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
