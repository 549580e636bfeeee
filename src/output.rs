//! Console output.
//!
//! Colored status lines, the progress bar used during the category passes,
//! and the end-of-run summary. The run log itself goes through
//! [`crate::report::Reporter`]; this module only talks to the terminal.

use crate::file_organizer::{ProgressSink, RunReport};
use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::BTreeMap;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// OutputFormatter::success("Files organized successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates the bar that tracks category passes.
    ///
    /// The length is set later by [`ProgressSink::start`].
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb.set_message("Moving files...");
        pb
    }

    /// A bar that renders nothing, for `--no-progress` and `--json`.
    pub fn hidden_progress_bar() -> ProgressBar {
        ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden())
    }

    /// Prints moved-file counts per category.
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("Documents".to_string(), 15);
    /// counts.insert("Photos".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 23);
    /// ```
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Moved".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));
        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word(*count),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            file_word(total_files),
            width = width
        );
    }

    /// Prints the summary table followed by duplicates, skips, renames and
    /// removed folders.
    pub fn run_report(report: &RunReport) {
        Self::summary_table(&report.moved_by_category, report.files_moved);

        if !report.duplicates.is_empty() {
            Self::header("DUPLICATES");
            for entry in report.duplicates.iter() {
                Self::warning(&format!(
                    "{}: {}",
                    entry.category,
                    entry.files.join(", ")
                ));
            }
        }

        if !report.skipped.is_empty() {
            Self::info(&format!(
                "Skipped {} existing {}",
                report.skipped.len(),
                file_word(report.skipped.len())
            ));
        }

        if report.files_renamed > 0 {
            Self::info(&format!(
                "Renamed {} {} in sorted order",
                report.files_renamed,
                file_word(report.files_renamed)
            ));
        }

        for folder in &report.folders_removed {
            Self::plain(&format!("Removed empty folder: {}", folder.display()));
        }
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

impl ProgressSink for ProgressBar {
    fn start(&mut self, total: u64) {
        self.set_length(total);
        self.set_position(0);
    }

    fn tick(&mut self) {
        self.inc(1);
    }

    fn finish(&mut self) {
        self.finish_with_message("Done");
    }
}
