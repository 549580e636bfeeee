/// The organizing run: classification, moves and the surrounding pipeline.
///
/// A run builds the folder structure, then walks the whole tree once per
/// category and moves every matching file to `root/<category>/<file name>`.
/// Afterwards the optional sort pass, the duplicate summary and the empty
/// folder cleanup run, followed by the final totals.
///
/// Any error aborts the run. Work already done stays on disk.
use crate::cleanup::{remove_empty_folders, sort_category_files};
use crate::config::Settings;
use crate::report::{Level, Reporter};
use crate::structure::build_structure;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors that abort an organizing run.
#[derive(Debug)]
pub enum OrganizeError {
    /// Failed to create a category or photo bucket directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to list a directory while scanning.
    ScanFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to move a file to its category directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// Failed to add the sort prefix to a file.
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// Failed to remove an empty folder.
    DirectoryRemovalFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// The run log could not be written.
    LogWriteFailed { source: io::Error },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::ScanFailed { path, source } => {
                write!(f, "Failed to scan {}: {}", path.display(), source)
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::RenameFailed { from, to, source } => {
                write!(
                    f,
                    "Failed to rename {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::DirectoryRemovalFailed { path, source } => {
                write!(
                    f,
                    "Failed to remove directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::LogWriteFailed { source } => write!(f, "Failed to write run log: {}", source),
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DirectoryCreationFailed { source, .. }
            | Self::ScanFailed { source, .. }
            | Self::RenameFailed { source, .. }
            | Self::DirectoryRemovalFailed { source, .. }
            | Self::LogWriteFailed { source } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
        }
    }
}

/// Result type for organizing operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Records an event, turning a failed log write into a run error.
pub(crate) fn log_event(
    reporter: &mut dyn Reporter,
    level: Level,
    message: &str,
) -> OrganizeResult<()> {
    reporter
        .record(level, message)
        .map_err(|source| OrganizeError::LogWriteFailed { source })
}

/// Receives progress while the category passes run.
pub trait ProgressSink {
    /// Called once before the first pass with the number of files in the tree.
    fn start(&mut self, total: u64);
    /// Called once per file visited, for every pass.
    fn tick(&mut self);
    fn finish(&mut self);
}

/// A sink that ignores progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&mut self, _total: u64) {}
    fn tick(&mut self) {}
    fn finish(&mut self) {}
}

/// A file that was moved during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: String,
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Moved file from {} to {}",
            self.source.display(),
            self.destination.display()
        )
    }
}

/// File names whose category destination was already taken, per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateRegistry {
    entries: Vec<DuplicateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    pub category: String,
    pub files: Vec<String>,
}

impl DuplicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `file_name` under `category`, keeping first-seen category order.
    pub fn record(&mut self, category: &str, file_name: &str) {
        match self.entries.iter_mut().find(|e| e.category == category) {
            Some(entry) => entry.files.push(file_name.to_string()),
            None => self.entries.push(DuplicateEntry {
                category: category.to_string(),
                files: vec![file_name.to_string()],
            }),
        }
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.files.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of duplicates across all categories.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.files.len()).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateEntry> {
        self.entries.iter()
    }
}

/// Everything a completed run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub folders_created: Vec<PathBuf>,
    /// Files found in the tree before the first pass.
    pub files_scanned: u64,
    pub files_moved: usize,
    pub moved_by_category: BTreeMap<String, usize>,
    /// Every move in the order it happened. A file moved by two overlapping
    /// categories appears twice.
    pub moves: Vec<MoveRecord>,
    /// Files left in place because skip-existing was set.
    pub skipped: Vec<PathBuf>,
    pub duplicates: DuplicateRegistry,
    pub files_renamed: usize,
    pub folders_removed: Vec<PathBuf>,
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// Confirmation was declined; nothing was touched.
    Cancelled,
    Completed(RunReport),
}

/// What to do with one matching file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDecision {
    /// The destination name is taken; record it and leave the source.
    Duplicate,
    /// The file already sits at its destination.
    AlreadyInPlace,
    /// Move, replacing any existing destination.
    Move,
    /// The destination exists and skip-existing is set.
    Skip,
}

/// Applies the duplicate and skip policy for a single file.
pub fn decide(source: &Path, destination: &Path, settings: &Settings) -> MoveDecision {
    let exists = destination.exists();
    if settings.detect_duplicates && exists {
        MoveDecision::Duplicate
    } else if source == destination {
        MoveDecision::AlreadyInPlace
    } else if !exists || !settings.skip_existing {
        MoveDecision::Move
    } else {
        MoveDecision::Skip
    }
}

/// Moves `source` to `destination`, replacing an existing file there.
///
/// Falls back to copy and delete when the rename crosses filesystems.
pub fn move_file(source: &Path, destination: &Path) -> OrganizeResult<()> {
    let failure = |e: io::Error| OrganizeError::FileMoveFailure {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error: e,
    };

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(source, destination).map_err(failure)
        }
        Err(e) => Err(failure(e)),
    }
}

fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    fs::remove_file(source)
}

/// Every file under `root`, in a stable walk order.
///
/// Symlinks are listed as files unless they point at a directory. They are
/// never followed, so moving one moves the link itself.
fn collect_files(root: &Path) -> OrganizeResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| OrganizeError::ScanFailed {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && !entry.path().is_dir());
        if is_file {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Runs the organizing pipeline on one root directory.
pub struct Organizer<'a> {
    root: PathBuf,
    settings: &'a Settings,
    current_year: i32,
}

impl<'a> Organizer<'a> {
    pub fn new(root: impl Into<PathBuf>, settings: &'a Settings) -> Self {
        Self {
            root: root.into(),
            settings,
            current_year: chrono::Local::now().year(),
        }
    }

    /// Pins the year used for the photo buckets.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Executes the run if `proceed` is true.
    ///
    /// A declined run returns [`Outcome::Cancelled`] without creating,
    /// moving or logging anything. A failed run logs the error once at
    /// ERROR level and returns it; later phases do not run.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::config::Settings;
    /// use dirsort::file_organizer::{NoProgress, Organizer, Outcome};
    /// use dirsort::report::MemoryReporter;
    ///
    /// let settings = Settings::default();
    /// let mut log = MemoryReporter::new();
    /// let outcome = Organizer::new("/home/me/Downloads", &settings)
    ///     .run(true, &mut log, &mut NoProgress)
    ///     .expect("run failed");
    /// if let Outcome::Completed(report) = outcome {
    ///     println!("moved {} files", report.files_moved);
    /// }
    /// ```
    pub fn run(
        &self,
        proceed: bool,
        reporter: &mut dyn Reporter,
        progress: &mut dyn ProgressSink,
    ) -> OrganizeResult<Outcome> {
        if !proceed {
            return Ok(Outcome::Cancelled);
        }

        match self.execute(reporter, progress) {
            Ok(report) => Ok(Outcome::Completed(report)),
            Err(e) => {
                // Keep the run error even if logging it fails.
                let _ = reporter.record(Level::Error, &format!("An error occurred: {}", e));
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        reporter: &mut dyn Reporter,
        progress: &mut dyn ProgressSink,
    ) -> OrganizeResult<RunReport> {
        let settings = self.settings;
        let mut report = RunReport {
            folders_created: build_structure(
                &self.root,
                &settings.rules,
                settings.max_photo_years,
                self.current_year,
                reporter,
            )?,
            ..Default::default()
        };

        self.classify_and_move(reporter, progress, &mut report)?;

        if settings.sort_files {
            report.files_renamed = sort_category_files(&self.root, &settings.rules, reporter)?;
        }

        if !report.duplicates.is_empty() {
            log_event(reporter, Level::Info, "Duplicates found:")?;
            for entry in report.duplicates.iter() {
                log_event(
                    reporter,
                    Level::Info,
                    &format!("In folder '{}': {}", entry.category, entry.files.join(", ")),
                )?;
            }
        }

        report.folders_removed = remove_empty_folders(&self.root, reporter)?;

        log_event(
            reporter,
            Level::Info,
            &format!("Total files moved: {}", report.files_moved),
        )?;
        log_event(reporter, Level::Info, "Files organized successfully!")?;

        Ok(report)
    }

    /// One full walk of the tree per category, in rule table order.
    fn classify_and_move(
        &self,
        reporter: &mut dyn Reporter,
        progress: &mut dyn ProgressSink,
        report: &mut RunReport,
    ) -> OrganizeResult<()> {
        let settings = self.settings;
        report.files_scanned = collect_files(&self.root)?.len() as u64;
        progress.start(report.files_scanned);

        for rule in &settings.rules {
            let category_dir = self.root.join(&rule.name);

            for source in collect_files(&self.root)? {
                progress.tick();

                if !rule.matches(&source) {
                    continue;
                }
                let relative = source.strip_prefix(&self.root).unwrap_or(&source);
                if !settings.filters.should_include(relative) {
                    continue;
                }
                let Some(file_name) = source.file_name() else {
                    continue;
                };
                let display_name = file_name.to_string_lossy();
                let destination = category_dir.join(file_name);

                match decide(&source, &destination, settings) {
                    MoveDecision::Duplicate => {
                        log_event(
                            reporter,
                            Level::Warning,
                            &format!("Duplicate file found: {}", display_name),
                        )?;
                        report.duplicates.record(&rule.name, &display_name);
                    }
                    MoveDecision::AlreadyInPlace => {
                        log_event(
                            reporter,
                            Level::Info,
                            &format!(
                                "File {} is already in {}. Skipping.",
                                display_name,
                                category_dir.display()
                            ),
                        )?;
                    }
                    MoveDecision::Move => {
                        move_file(&source, &destination)?;
                        let record = MoveRecord {
                            source,
                            destination,
                            category: rule.name.clone(),
                        };
                        log_event(reporter, Level::Info, &record.to_string())?;
                        report.files_moved += 1;
                        *report
                            .moved_by_category
                            .entry(record.category.clone())
                            .or_insert(0) += 1;
                        report.moves.push(record);
                    }
                    MoveDecision::Skip => {
                        log_event(
                            reporter,
                            Level::Warning,
                            &format!(
                                "File {} already exists in {}. Skipping.",
                                display_name,
                                category_dir.display()
                            ),
                        )?;
                        report.skipped.push(source);
                    }
                }
            }
        }

        progress.finish();
        Ok(())
    }
}
