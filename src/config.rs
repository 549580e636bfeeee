//! Run configuration.
//!
//! Settings come from an optional TOML file and are overridden by command-line
//! flags. [`OrganizerConfig::resolve`] turns the raw file contents into an
//! immutable [`Settings`] value before any filesystem work begins.
//!
//! # Configuration File Format
//!
//! ```toml
//! [options]
//! max_photo_years = 5
//! skip_existing = false
//! detect_duplicates = true
//! sort_files = false
//!
//! [[categories]]
//! name = "Documents"
//! extensions = [".pdf", ".txt"]
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["**/node_modules/**"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! When `categories` is absent the six built-in categories are used.

use crate::file_category::{CategoryRule, RuleTable, normalize_extension};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Name of the per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = ".dirsortrc.toml";

pub const DEFAULT_MAX_PHOTO_YEARS: u32 = 5;

/// Errors that can occur while loading or resolving configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the compiler's reason.
    InvalidRegexPattern { pattern: String, reason: String },
    /// A category name that cannot be used as a folder under the root.
    InvalidCategory { name: String, reason: String },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::InvalidCategory { name, reason } => {
                write!(f, "Invalid category '{}': {}", name, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Raw configuration as read from TOML. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    pub options: OptionsSection,
    pub categories: Vec<CategoryRule>,
    pub filters: FilterRules,
}

/// The `[options]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsSection {
    pub max_photo_years: Option<u32>,
    pub skip_existing: Option<bool>,
    pub detect_duplicates: Option<bool>,
    pub sort_files: Option<bool>,
}

/// Values supplied on the command line. `Some` wins over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_photo_years: Option<u32>,
    pub skip_existing: Option<bool>,
    pub detect_duplicates: Option<bool>,
    pub sort_files: Option<bool>,
}

/// The `[filters]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether files whose name starts with "." are considered. Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides exclude rules.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names, e.g. "Thumbs.db".
    #[serde(default)]
    pub filenames: Vec<String>,
    /// Glob patterns matched against the path relative to the root.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Extensions, dot optional.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl OrganizerConfig {
    /// Loads configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given
    /// 2. `.dirsortrc.toml` in the current directory
    /// 3. `~/.config/dirsort/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, or if any file
    /// that is found cannot be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Produces the immutable settings for one run.
    ///
    /// # Errors
    ///
    /// Fails on unusable category names and on invalid glob or regex filters.
    pub fn resolve(self, overrides: &Overrides) -> Result<Settings, ConfigError> {
        let rules = if self.categories.is_empty() {
            RuleTable::builtin()
        } else {
            for rule in &self.categories {
                validate_category_name(&rule.name)?;
            }
            RuleTable::new(self.categories)
        };

        let options = self.options;
        Ok(Settings {
            rules,
            max_photo_years: overrides
                .max_photo_years
                .or(options.max_photo_years)
                .unwrap_or(DEFAULT_MAX_PHOTO_YEARS),
            skip_existing: overrides
                .skip_existing
                .or(options.skip_existing)
                .unwrap_or(false),
            detect_duplicates: overrides
                .detect_duplicates
                .or(options.detect_duplicates)
                .unwrap_or(true),
            sort_files: overrides.sort_files.or(options.sort_files).unwrap_or(false),
            filters: CompiledFilters::new(self.filters)?,
        })
    }
}

/// Category names become folders directly under the root, so they must be a
/// single normal path component.
fn validate_category_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidCategory {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid("must be a single folder name")),
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rules: RuleTable,
    pub max_photo_years: u32,
    pub skip_existing: bool,
    pub detect_duplicates: bool,
    pub sort_files: bool,
    pub filters: CompiledFilters,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: RuleTable::builtin(),
            max_photo_years: DEFAULT_MAX_PHOTO_YEARS,
            skip_existing: false,
            detect_duplicates: true,
            sort_files: false,
            filters: CompiledFilters::allow_all(),
        }
    }
}

impl Settings {
    /// Human-readable summary shown before asking for confirmation.
    pub fn summary(&self, root: &Path) -> String {
        fn yes_no(flag: bool) -> &'static str {
            if flag { "Yes" } else { "No" }
        }

        let mut summary = String::new();
        let _ = writeln!(summary, "Root Folder: {}", root.display());
        let _ = writeln!(summary, "Maximum Photo Years: {}", self.max_photo_years);
        let _ = writeln!(summary, "Skip Existing Files: {}", yes_no(self.skip_existing));
        let _ = writeln!(
            summary,
            "Detect and Handle Duplicates: {}",
            yes_no(self.detect_duplicates)
        );
        let _ = writeln!(
            summary,
            "Sort Files within Folders: {}",
            yes_no(self.sort_files)
        );
        let _ = writeln!(summary, "File Types:");
        for rule in &self.rules {
            let _ = writeln!(summary, " - {}: {}", rule.name, rule.extensions.join(", "));
        }
        summary
    }
}

/// Filter rules with every pattern pre-compiled.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    /// Filters that let every file through.
    pub fn allow_all() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    pub fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .filter_map(|ext| normalize_extension(ext))
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Decides whether a file may be organized.
    ///
    /// `relative_path` is the file's path relative to the root. Include
    /// patterns win outright; otherwise the hidden-file switch, exact names,
    /// extensions, globs and regexes are checked in that order.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = crate::file_category::file_extension(relative_path)
            && self.exclude_extensions.contains(&ext)
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
