//! dirsort - sort a directory tree into category folders
//!
//! This library builds the category folder layout (including the
//! `Photos/<year>/<month>` buckets), moves files into their category by
//! extension with duplicate detection, optionally renumbers the results, and
//! removes folders left empty. Every event is written to an injected run log.

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod report;
pub mod structure;

pub use config::{ConfigError, OrganizerConfig, Overrides, Settings};
pub use file_category::{CategoryRule, RuleTable};
pub use file_organizer::{
    DuplicateRegistry, NoProgress, OrganizeError, Organizer, Outcome, ProgressSink, RunReport,
};
pub use report::{FileReporter, Level, MemoryReporter, Reporter};

pub use cli::{Cli, run_cli};
