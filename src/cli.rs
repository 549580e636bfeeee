//! Command-line interface for dirsort.
//!
//! This module owns everything interactive:
//! - argument parsing
//! - configuration loading and flag overrides
//! - the yes/no confirmation prompt
//! - console rendering of the run report
//!
//! The organizing core never reads from the terminal; it only receives the
//! resolved settings and the final go-ahead.

use crate::config::{OrganizerConfig, Overrides, Settings};
use crate::file_organizer::{Organizer, Outcome};
use crate::output::OutputFormatter;
use crate::report::{DEFAULT_LOG_FILE, FileReporter};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Sort a directory tree into category folders by file extension.
#[derive(Debug, Clone, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    /// Root directory to organize.
    pub root: PathBuf,

    /// Configuration file (defaults to .dirsortrc.toml, then ~/.config/dirsort/config.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Append-only run log.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Number of past years that get Photos/<year>/<month> folders.
    #[arg(long, value_name = "YEARS")]
    pub max_photo_years: Option<u32>,

    /// Leave a file in place when its destination name is already taken.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub skip_existing: Option<bool>,

    /// Record files whose destination exists instead of moving them.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub detect_duplicates: Option<bool>,

    /// Prefix files in each category folder with their sorted position.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub sort_files: Option<bool>,

    /// Do not ask for confirmation.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Print the run report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Hide the progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            max_photo_years: self.max_photo_years,
            skip_existing: self.skip_existing,
            detect_duplicates: self.detect_duplicates,
            sort_files: self.sort_files,
        }
    }
}

/// Loads the configuration file and applies command-line overrides.
pub fn resolve_settings(cli: &Cli) -> Result<Settings, String> {
    OrganizerConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?
        .resolve(&cli.overrides())
        .map_err(|e| format!("Error in configuration: {}", e))
}

/// Shows `summary` and asks until the answer is `yes` or `no`.
///
/// End of input counts as `no`.
pub fn confirm_action<R: BufRead, W: Write>(
    summary: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    loop {
        write!(
            output,
            "\nPlease confirm the following actions:\n{}\nProceed with organization? (yes/no): ",
            summary
        )?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        match answer.trim().to_lowercase().as_str() {
            "yes" => return Ok(true),
            "no" => return Ok(false),
            _ => writeln!(output, "Invalid input. Please enter 'yes' or 'no'.")?,
        }
    }
}

/// Runs the application for parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["dirsort", "/home/me/Downloads", "--yes"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let settings = resolve_settings(&cli)?;
    let summary = settings.summary(&cli.root);

    let mut reporter = FileReporter::open(&cli.log_file).map_err(|e| {
        format!(
            "Error opening log file {}: {}",
            cli.log_file.display(),
            e
        )
    })?;

    let proceed = if cli.yes {
        true
    } else {
        let stdin = io::stdin();
        confirm_action(&summary, &mut stdin.lock(), &mut io::stdout())
            .map_err(|e| format!("Error reading confirmation: {}", e))?
    };

    run_organizer(&cli.root, &settings, proceed, &mut reporter, &cli)
}

fn run_organizer(
    root: &Path,
    settings: &Settings,
    proceed: bool,
    reporter: &mut FileReporter,
    cli: &Cli,
) -> Result<(), String> {
    let quiet = cli.json || cli.no_progress;
    if proceed && !cli.json {
        OutputFormatter::info(&format!("Organizing contents of: {}", root.display()));
    }

    let mut progress = if quiet {
        OutputFormatter::hidden_progress_bar()
    } else {
        OutputFormatter::create_progress_bar()
    };

    let outcome = Organizer::new(root, settings)
        .run(proceed, reporter, &mut progress)
        .map_err(|e| {
            format!(
                "{} (details in {})",
                e,
                reporter.path().display()
            )
        })?;

    match outcome {
        Outcome::Cancelled => {
            if !cli.json {
                OutputFormatter::warning("Organization canceled.");
            }
        }
        Outcome::Completed(report) if cli.json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("Error serializing report: {}", e))?;
            println!("{}", json);
        }
        Outcome::Completed(report) => {
            OutputFormatter::run_report(&report);
            OutputFormatter::success("Files organized successfully!");
            OutputFormatter::plain(&format!("Log written to {}", reporter.path().display()));
        }
    }

    Ok(())
}
