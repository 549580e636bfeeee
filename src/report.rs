//! Run log sinks.
//!
//! Every phase of an organizing run receives a [`Reporter`] and records each
//! event through it: folders created, files moved, duplicates, skips, renames,
//! removed folders and the final total. The file sink writes one line per
//! event in the form `<timestamp> - <LEVEL> - <message>`.

use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Default location of the run log, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "organizer.log";

/// Severity of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for run events.
pub trait Reporter {
    /// Records one event. Errors are fatal to the run that triggered them.
    fn record(&mut self, level: Level, message: &str) -> io::Result<()>;
}

/// Formats a log line, e.g. `2024-05-01 09:30:12,004 - INFO - Created folder: /tmp/x`.
pub fn format_line(timestamp: &DateTime<Local>, level: Level, message: &str) -> String {
    format!(
        "{} - {} - {}",
        timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
        level,
        message
    )
}

/// Append-only log file, opened once per process.
#[derive(Debug)]
pub struct FileReporter {
    path: PathBuf,
    file: File,
}

impl FileReporter {
    /// Opens `path` for appending, creating it if missing.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reporter for FileReporter {
    fn record(&mut self, level: Level, message: &str) -> io::Result<()> {
        writeln!(self.file, "{}", format_line(&Local::now(), level, message))
    }
}

/// Keeps events in memory. Used by tests and by callers that render the log
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: Vec<(Level, String)>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(Level, String)] {
        &self.entries
    }

    /// Messages in the order they were recorded.
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, msg)| msg.as_str()).collect()
    }

    /// Returns true if any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|(_, msg)| msg.contains(needle))
    }

    pub fn count(&self, level: Level) -> usize {
        self.entries.iter().filter(|(l, _)| *l == level).count()
    }
}

impl Reporter for MemoryReporter {
    fn record(&mut self, level: Level, message: &str) -> io::Result<()> {
        self.entries.push((level, message.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_format_line_layout() {
        let ts = Local
            .with_ymd_and_hms(2024, 3, 7, 14, 5, 9)
            .single()
            .expect("unambiguous local time");
        assert_eq!(
            format_line(&ts, Level::Warning, "disk nearly full"),
            "2024-03-07 14:05:09,000 - WARNING - disk nearly full"
        );
    }

    #[test]
    fn test_file_reporter_appends() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log_path = temp_dir.path().join("organizer.log");

        {
            let mut reporter = FileReporter::open(&log_path).expect("Failed to open log");
            reporter.record(Level::Info, "first").unwrap();
        }
        {
            let mut reporter = FileReporter::open(&log_path).expect("Failed to reopen log");
            reporter.record(Level::Error, "second").unwrap();
        }

        let content = std::fs::read_to_string(&log_path).expect("Failed to read log");
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - INFO - first"));
        assert!(lines[1].ends_with(" - ERROR - second"));
    }

    #[test]
    fn test_memory_reporter_counts_levels() {
        let mut reporter = MemoryReporter::new();
        reporter.record(Level::Info, "Moved a").unwrap();
        reporter.record(Level::Info, "Moved b").unwrap();
        reporter.record(Level::Error, "boom").unwrap();

        assert_eq!(reporter.count(Level::Info), 2);
        assert_eq!(reporter.count(Level::Error), 1);
        assert!(reporter.contains("Moved b"));
        assert_eq!(reporter.messages(), vec!["Moved a", "Moved b", "boom"]);
    }
}
