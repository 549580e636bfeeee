use chrono::Datelike;
use clap::Parser;
use dirsort::cli::{Cli, run_cli};
use dirsort::config::{OrganizerConfig, Overrides, Settings};
use dirsort::file_category::{CategoryRule, RuleTable};
use dirsort::file_organizer::{NoProgress, Organizer, Outcome, RunReport};
use dirsort::report::MemoryReporter;
/// End-to-end tests for dirsort.
///
/// Test categories:
/// 1. Placement by extension
/// 2. Duplicate and skip policy
/// 3. Idempotence
/// 4. Photo buckets, sorting and cleanup
/// 5. CLI, configuration and the run log
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary root directory with helpers for building and checking trees.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file, including any missing parent directories.
    fn create_file(&self, rel_path: &str, content: &str) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write file");
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    /// All files under the root, sorted.
    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(self.path(), &mut files);
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }

    fn organize(&self, settings: &Settings) -> (RunReport, MemoryReporter) {
        let mut reporter = MemoryReporter::new();
        let outcome = Organizer::new(self.path(), settings)
            .with_current_year(2024)
            .run(true, &mut reporter, &mut NoProgress)
            .expect("Organizing should succeed");
        match outcome {
            Outcome::Completed(report) => (report, reporter),
            Outcome::Cancelled => panic!("run should not be cancelled"),
        }
    }
}

fn settings(detect_duplicates: bool, skip_existing: bool, sort_files: bool) -> Settings {
    Settings {
        detect_duplicates,
        skip_existing,
        sort_files,
        ..Settings::default()
    }
}

fn parse_cli(root: &Path, flags: &[&str], config: &Path, log: &Path) -> Cli {
    let mut args: Vec<OsString> = vec![OsString::from("dirsort"), OsString::from(root)];
    args.extend(flags.iter().map(OsString::from));
    args.push(OsString::from("--config"));
    args.push(OsString::from(config));
    args.push(OsString::from("--log-file"));
    args.push(OsString::from(log));
    Cli::parse_from(args)
}

// ============================================================================
// Test Suite 1: Placement by extension
// ============================================================================

#[test]
fn test_every_builtin_extension_lands_in_its_category() {
    let fixture = TestFixture::new();
    let rules = RuleTable::builtin();
    for rule in &rules {
        for ext in &rule.extensions {
            fixture.create_file(&format!("deep/nested/f{}", ext), ext);
        }
    }

    let (report, _) = fixture.organize(&settings(false, false, false));

    let mut expected = 0;
    for rule in &rules {
        for ext in &rule.extensions {
            fixture.assert_file_exists(&format!("{}/f{}", rule.name, ext));
            fixture.assert_not_exists(&format!("deep/nested/f{}", ext));
            expected += 1;
        }
    }
    assert_eq!(report.files_moved, expected);
}

#[test]
fn test_mixed_case_extensions_and_unknown_files() {
    let fixture = TestFixture::new();
    fixture.create_file("Holiday.JPG", "photo");
    fixture.create_file("inbox/Report.Pdf", "doc");
    fixture.create_file("inbox/notes.xyz", "unknown");
    fixture.create_file("README", "no extension");

    let (report, _) = fixture.organize(&Settings::default());

    fixture.assert_file_exists("Photos/Holiday.JPG");
    fixture.assert_file_exists("Documents/Report.Pdf");
    fixture.assert_file_exists("inbox/notes.xyz");
    fixture.assert_file_exists("README");
    assert_eq!(report.files_moved, 2);
    assert_eq!(report.moved_by_category.get("Photos"), Some(&1));
    assert_eq!(report.moved_by_category.get("Documents"), Some(&1));
}

#[test]
fn test_photos_go_to_flat_folder_not_buckets() {
    let fixture = TestFixture::new();
    fixture.create_file("camera/img_001.jpeg", "jpeg");

    fixture.organize(&Settings::default());

    fixture.assert_file_exists("Photos/img_001.jpeg");
    for month in 1..=12 {
        fixture.assert_not_exists(&format!("Photos/2024/{:02}/img_001.jpeg", month));
    }
}

#[test]
fn test_overlapping_categories_are_reconsidered_by_later_passes() {
    let fixture = TestFixture::new();
    fixture.create_file("page.html", "<html>");
    let settings = Settings {
        rules: RuleTable::new(vec![
            CategoryRule::new("Web", [".html"]),
            CategoryRule::new("Projects", [".html", ".js"]),
        ]),
        ..Settings::default()
    };

    let (report, _) = fixture.organize(&settings);

    fixture.assert_file_exists("Projects/page.html");
    fixture.assert_not_exists("Web");
    assert_eq!(report.files_moved, 2);
}

// ============================================================================
// Test Suite 2: Duplicate and skip policy
// ============================================================================

#[test]
fn test_duplicate_detection_keeps_second_copy_in_place() {
    let fixture = TestFixture::new();
    fixture.create_file("Documents/report.pdf", "original");
    fixture.create_file("downloads/report.pdf", "newer");

    let (report, reporter) = fixture.organize(&settings(true, false, false));

    assert_eq!(fixture.read("Documents/report.pdf"), "original");
    assert_eq!(fixture.read("downloads/report.pdf"), "newer");
    let documents = report.duplicates.get("Documents").expect("duplicates recorded");
    assert!(documents.iter().all(|name| name == "report.pdf"));
    assert!(reporter.contains("Duplicate file found: report.pdf"));
    assert_eq!(report.files_moved, 0);
}

#[test]
fn test_without_detection_second_copy_overwrites() {
    let fixture = TestFixture::new();
    fixture.create_file("Documents/report.pdf", "original");
    fixture.create_file("downloads/report.pdf", "newer");

    let (report, _) = fixture.organize(&settings(false, false, false));

    assert_eq!(fixture.read("Documents/report.pdf"), "newer");
    fixture.assert_not_exists("downloads/report.pdf");
    assert!(report.duplicates.is_empty());
    assert_eq!(report.files_moved, 1);
}

#[test]
fn test_skip_existing_without_detection() {
    let fixture = TestFixture::new();
    fixture.create_file("Music/song.mp3", "original");
    fixture.create_file("phone/song.mp3", "copy");
    fixture.create_file("phone/other.mp3", "other");

    let (report, _) = fixture.organize(&settings(false, true, false));

    assert_eq!(fixture.read("Music/song.mp3"), "original");
    fixture.assert_file_exists("phone/song.mp3");
    fixture.assert_file_exists("Music/other.mp3");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.files_moved, 1);
}

// ============================================================================
// Test Suite 3: Idempotence
// ============================================================================

#[test]
fn test_second_run_moves_nothing() {
    for (detect, skip) in [(true, false), (false, false), (false, true)] {
        let fixture = TestFixture::new();
        fixture.create_file("a/photo.png", "png");
        fixture.create_file("b/report.docx", "docx");
        fixture.create_file("c/d/script.py", "py");
        let settings = settings(detect, skip, false);

        let (first, _) = fixture.organize(&settings);
        let files_after_first = fixture.list_files_recursive();
        let (second, _) = fixture.organize(&settings);

        assert_eq!(first.files_moved, 3);
        assert_eq!(second.files_moved, 0, "detect={} skip={}", detect, skip);
        assert_eq!(files_after_first, fixture.list_files_recursive());
        if detect {
            assert_eq!(second.duplicates.len(), 3);
        }
    }
}

// ============================================================================
// Test Suite 4: Photo buckets, sorting and cleanup
// ============================================================================

#[test]
fn test_photo_year_range() {
    let fixture = TestFixture::new();
    let settings = Settings {
        max_photo_years: 2,
        ..Settings::default()
    };

    let mut reporter = MemoryReporter::new();
    let year = chrono::Local::now().year();
    Organizer::new(fixture.path(), &settings)
        .run(true, &mut reporter, &mut NoProgress)
        .expect("Organizing should succeed");

    let mut years: Vec<_> = fs::read_dir(fixture.path().join("Photos"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    years.sort();
    let mut expected: Vec<_> = (0..=2).map(|o| (year - o).to_string()).collect();
    expected.sort();
    assert_eq!(years, expected);

    for y in &expected {
        for month in 1..=12 {
            fixture.assert_dir_exists(&format!("Photos/{}/{:02}", y, month));
        }
        let count = fs::read_dir(fixture.path().join("Photos").join(y)).unwrap().count();
        assert_eq!(count, 12);
    }
}

#[test]
fn test_sorting_prefixes_category_files() {
    let fixture = TestFixture::new();
    fixture.create_file("b.mp3", "b");
    fixture.create_file("sub/a.mp3", "a");

    let (report, _) = fixture.organize(&settings(true, false, true));

    fixture.assert_file_exists("Music/001_a.mp3");
    fixture.assert_file_exists("Music/002_b.mp3");
    assert_eq!(fixture.read("Music/001_a.mp3"), "a");
    assert_eq!(report.files_renamed, 2);
}

#[test]
fn test_cleanup_removes_only_empty_top_level_folders() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/movie.mp4", "video");
    fs::create_dir_all(fixture.path().join("empty_dir")).unwrap();
    fs::create_dir_all(fixture.path().join("outer/inner")).unwrap();

    let (report, reporter) = fixture.organize(&Settings::default());

    fixture.assert_file_exists("Videos/movie.mp4");
    // Emptied by the move, and never had subfolders.
    fixture.assert_not_exists("inbox");
    fixture.assert_not_exists("empty_dir");
    fixture.assert_not_exists("Music");
    fixture.assert_not_exists("Documents");
    // Only empty photo buckets inside, so it is not empty itself.
    fixture.assert_dir_exists("Photos/2024/03");
    // Nested empty folders are not checked.
    fixture.assert_dir_exists("outer/inner");
    assert!(report.folders_removed.contains(&fixture.path().join("Music")));
    assert!(reporter.contains("Removed empty folder:"));
}

#[test]
fn test_declined_confirmation_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("inbox/song.mp3", "x");
    let settings = Settings::default();
    let before = fixture.list_files_recursive();

    let mut reporter = MemoryReporter::new();
    let outcome = Organizer::new(fixture.path(), &settings)
        .run(false, &mut reporter, &mut NoProgress)
        .unwrap();

    assert!(matches!(outcome, Outcome::Cancelled));
    assert_eq!(before, fixture.list_files_recursive());
    fixture.assert_not_exists("Music");
    fixture.assert_not_exists("Photos");
}

// ============================================================================
// Test Suite 5: CLI, configuration and the run log
// ============================================================================

#[test]
fn test_cli_run_writes_formatted_log() {
    let fixture = TestFixture::new();
    fixture.create_file("docs/guide.txt", "text");
    let aux = TempDir::new().expect("Failed to create temp directory");
    let config_path = aux.path().join("dirsort.toml");
    fs::write(&config_path, "[options]\nmax_photo_years = 0\n").unwrap();
    let log_path = aux.path().join("organizer.log");

    let cli = parse_cli(fixture.path(), &["--yes", "--no-progress"], &config_path, &log_path);
    run_cli(cli).expect("CLI run should succeed");

    fixture.assert_file_exists("Documents/guide.txt");
    let log = fs::read_to_string(&log_path).expect("Failed to read log");
    let line = regex::Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3} - (INFO|WARNING|ERROR) - .+$")
        .unwrap();
    assert!(log.lines().all(|l| line.is_match(l)), "unexpected log:\n{}", log);
    assert!(log.contains(" - INFO - Moved file from "));
    assert!(log.contains(" - INFO - Total files moved: 1"));
    assert!(log.lines().last().unwrap().ends_with("Files organized successfully!"));
}

#[test]
fn test_cli_failure_is_logged_as_error() {
    let fixture = TestFixture::new();
    fixture.create_file("Music", "a file where a folder belongs");
    let aux = TempDir::new().expect("Failed to create temp directory");
    let config_path = aux.path().join("dirsort.toml");
    fs::write(&config_path, "").unwrap();
    let log_path = aux.path().join("organizer.log");

    let cli = parse_cli(fixture.path(), &["-y", "--json"], &config_path, &log_path);
    let result = run_cli(cli);

    assert!(result.is_err());
    let log = fs::read_to_string(&log_path).expect("Failed to read log");
    assert_eq!(log.matches(" - ERROR - An error occurred: ").count(), 1);
    assert!(!log.contains("Total files moved"));
}

#[test]
fn test_custom_categories_from_config() {
    let fixture = TestFixture::new();
    fixture.create_file("book.EPUB", "epub");
    fixture.create_file("photo.jpg", "jpg");

    let settings = OrganizerConfig::from_toml_str(
        r#"
[options]
detect_duplicates = false

[[categories]]
name = "Books"
extensions = ["epub"]
"#,
    )
    .unwrap()
    .resolve(&Overrides::default())
    .unwrap();

    let (report, _) = fixture.organize(&settings);

    fixture.assert_file_exists("Books/book.EPUB");
    // No Photos category, so no buckets and the jpg is untouched.
    fixture.assert_file_exists("photo.jpg");
    fixture.assert_not_exists("Photos");
    assert_eq!(report.files_moved, 1);
}

#[test]
fn test_report_serializes_to_json() {
    let fixture = TestFixture::new();
    fixture.create_file("Documents/cv.pdf", "old");
    fixture.create_file("mail/cv.pdf", "new");
    fixture.create_file("mail/song.flac", "flac");

    let (report, _) = fixture.organize(&Settings::default());
    let json = serde_json::to_value(&report).expect("report should serialize");

    assert_eq!(json["files_moved"], 1);
    assert_eq!(json["moved_by_category"]["Music"], 1);
    assert_eq!(json["duplicates"]["entries"][0]["category"], "Documents");
    assert!(json["folders_removed"].is_array());
}
