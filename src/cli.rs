//! Command-line interface module for imgsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Merging flags with the configuration file
//! - Sort, rename and change-log orchestration
//! - Undo operation handling
//!
//! Fatal setup problems are returned as `Err(message)`. Problems with
//! single images or log lines are printed and never fail the command.

use crate::change_log::{self, ChangeLogWriter, DEFAULT_CHANGE_LOG};
use crate::codec::{Alphabet, Codec};
use crate::config::{Config, SortSettings};
use crate::generator::NameGenerator;
use crate::image_info::{self, ImageDescriptor};
use crate::output::OutputFormatter;
use crate::renamer::{RenameEngine, RenameOutcome, RenameReport};
use crate::sorting::{self, SortMethod};
use crate::undo::UndoManager;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "imgsort", version)]
#[command(about = "Sort images by color or size, optionally renaming them to match")]
pub struct Cli {
    /// The directory containing the images you want to sort
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// The primary sorting method [default: resolution]
    #[arg(short = 'p', long = "primary-sort", value_enum)]
    pub primary: Option<SortMethod>,

    /// The secondary sorting method used to break ties
    #[arg(short = 's', long = "secondary-sort", value_enum)]
    pub secondary: Option<SortMethod>,

    /// Print the result of the sort as a list (the default without --rename)
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    /// Rename the images so their names sort the same way as the images
    #[arg(short = 'r', long = "rename")]
    pub rename: bool,

    /// Save the list of renamed images to a change log
    #[arg(
        short = 'c',
        long = "change-file",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CHANGE_LOG
    )]
    pub change_file: Option<PathBuf>,

    /// Undo the renames recorded in a change log; ignores sorting and filters
    #[arg(
        long,
        value_name = "CHANGE_LOG_FILE",
        conflicts_with_all = ["rename", "change_file", "include", "exclude", "dry_run"]
    )]
    pub undo: Option<PathBuf>,

    /// Only consider files whose whole name matches this regex
    #[arg(long, value_name = "REGEX")]
    pub include: Option<String>,

    /// Ignore files whose whole name matches this regex
    #[arg(long, value_name = "REGEX")]
    pub exclude: Option<String>,

    /// Reverse the sort order
    #[arg(short = 'v', long = "reversed")]
    pub reversed: bool,

    /// Show the renames that would happen without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// First counter value used for new names
    #[arg(long, value_name = "N")]
    pub start: Option<u64>,

    /// Gap between consecutive counter values (0 means 1, sign is ignored)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub step: Option<i64>,

    /// Minimum number of symbols in the encoded counter
    #[arg(long, value_name = "N")]
    pub pad_width: Option<usize>,

    /// Alphabet used to encode the counter
    #[arg(long, value_enum)]
    pub alphabet: Option<Alphabet>,

    /// Listing format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Configuration file (defaults to .imgsortrc.toml or ~/.config/imgsort/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity; repeat for more detail
    #[arg(long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// How the sorted list is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One name (or `old -> new` pair) per line.
    #[default]
    Text,
    /// The sorted image descriptors as a JSON array.
    Json,
}

/// Options for a sort (and optional rename) run. Unset values fall back to
/// the configuration file.
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    pub primary: Option<SortMethod>,
    pub secondary: Option<SortMethod>,
    pub reverse: bool,
    pub list: bool,
    pub rename: bool,
    pub dry_run: bool,
    pub change_log: Option<PathBuf>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub start: Option<u64>,
    pub step: Option<i64>,
    pub pad_width: Option<usize>,
    pub alphabet: Option<Alphabet>,
    pub format: OutputFormat,
    pub config_path: Option<PathBuf>,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone)]
pub enum SortCommand {
    /// Sort the images of a directory, optionally renaming them.
    Sort(SortOptions),
    /// Reverse the renames recorded in a change log.
    Undo {
        /// Path of the change log.
        change_log: PathBuf,
    },
}

impl Cli {
    /// Converts parsed arguments into a command.
    pub fn into_command(self) -> SortCommand {
        if let Some(change_log) = self.undo {
            return SortCommand::Undo { change_log };
        }
        SortCommand::Sort(SortOptions {
            primary: self.primary,
            secondary: self.secondary,
            reverse: self.reversed,
            list: self.list,
            rename: self.rename,
            dry_run: self.dry_run,
            change_log: self.change_file,
            include: self.include,
            exclude: self.exclude,
            start: self.start,
            step: self.step,
            pad_width: self.pad_width,
            alphabet: self.alphabet,
            format: self.format,
            config_path: self.config,
        })
    }
}

/// Runs the CLI application with the given command and directory path.
///
/// # Examples
///
/// ```no_run
/// use imgsort::cli::{run_cli, SortCommand, SortOptions};
/// use std::path::Path;
///
/// let result = run_cli(SortCommand::Sort(SortOptions::default()), Path::new("photos"));
/// match result {
///     Ok(()) => println!("Operation completed successfully"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(command: SortCommand, dir_path: &Path) -> Result<(), String> {
    match command {
        SortCommand::Sort(options) => sort_directory(&options, dir_path),
        SortCommand::Undo { change_log } => undo_renames(&change_log, dir_path),
    }
}

/// Resolved settings for one run: config file values overridden by flags.
fn merge_settings(options: &SortOptions, config: &Config) -> SortSettings {
    let defaults = &config.sort;
    SortSettings {
        primary: options.primary.unwrap_or(defaults.primary),
        secondary: options.secondary.or(defaults.secondary),
        reverse: options.reverse || defaults.reverse,
        start: options.start.unwrap_or(defaults.start),
        step: options.step.unwrap_or(defaults.step),
        pad_width: options.pad_width.unwrap_or(defaults.pad_width),
        alphabet: options.alphabet.unwrap_or(defaults.alphabet),
    }
}

/// Sorts the images in a directory and optionally renames them.
///
/// This function:
/// 1. Loads configuration and compiles the filters
/// 2. Opens the change log, if one was requested, before touching any file
/// 3. Finds and loads every image, with a progress bar
/// 4. Sorts them by the primary and secondary methods
/// 5. Renames them (or plans the renames for a dry run)
/// 6. Writes the change log and prints the listing and summary
pub fn sort_directory(options: &SortOptions, base_path: &Path) -> Result<(), String> {
    if !base_path.is_dir() {
        return Err(format!("{} is not a directory", base_path.display()));
    }

    let config = Config::load(options.config_path.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let settings = merge_settings(options, &config);

    let mut rules = config.filters.clone();
    rules.include.regex.extend(options.include.iter().cloned());
    rules.exclude.regex.extend(options.exclude.iter().cloned());
    let filters = rules
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let renaming = options.rename && !options.dry_run;
    let mut change_log = match &options.change_log {
        Some(path) if renaming => Some(
            ChangeLogWriter::create(path)
                .map_err(|e| format!("Could not write the change history file: {}", e))?,
        ),
        Some(_) => {
            OutputFormatter::warning("A change log is only written when renaming; ignoring it.");
            None
        }
        None => None,
    };

    let with_color = settings.primary.needs_color()
        || settings.secondary.is_some_and(SortMethod::needs_color);

    let candidates = image_info::list_candidates(base_path, &filters).map_err(|e| e.to_string())?;
    let progress = OutputFormatter::create_progress_bar(candidates.len() as u64);
    progress.set_message("scanning");
    let mut images =
        image_info::load_images(base_path, &candidates, with_color, |_| progress.inc(1));
    progress.finish_and_clear();

    sorting::sort_images(
        &mut images,
        settings.primary,
        settings.secondary,
        settings.reverse,
    );

    let report = if options.rename {
        let generator = NameGenerator::with_codec(
            settings.start,
            settings.step,
            Codec::new(settings.alphabet),
            settings.pad_width,
        );
        let report = RenameEngine::new(base_path, generator)
            .dry_run(options.dry_run)
            .rename_images(&mut images);
        Some(report)
    } else {
        None
    };

    if let Some(writer) = change_log.as_mut() {
        writer
            .write_images(&images)
            .map_err(|e| format!("Could not write the change history file! Aborting. {}", e))?;
    }
    if let Some(writer) = change_log {
        let path = writer.path().to_path_buf();
        let written = writer
            .finish()
            .map_err(|e| format!("Could not write the change history file! Aborting. {}", e))?;
        OutputFormatter::info(&format!(
            "Change log with {} entries saved to {}",
            written,
            path.display()
        ));
    }

    if options.list || !options.rename {
        print_listing(&images, report.as_ref(), options.format)?;
    }

    if let Some(report) = &report {
        print_rename_summary(report, options.dry_run, images.len());
    }

    Ok(())
}

fn print_listing(
    images: &[ImageDescriptor],
    report: Option<&RenameReport>,
    format: OutputFormat,
) -> Result<(), String> {
    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(images)
            .map_err(|e| format!("JSON serialization failed: {}", e))?;
        OutputFormatter::plain(&json);
        return Ok(());
    }

    match report {
        Some(report) if report.outcomes.iter().any(|o| matches!(o, RenameOutcome::Planned { .. })) => {
            for outcome in &report.outcomes {
                let line = match outcome {
                    RenameOutcome::Planned { from, to } | RenameOutcome::Renamed { from, to } => {
                        change_log::RenameRecord::new(from.as_str(), to.as_str()).to_line()
                    }
                    RenameOutcome::Failed { file, .. } => change_log::escape_name(file),
                };
                OutputFormatter::plain(&line);
            }
        }
        Some(_) => {
            for image in images {
                let record =
                    change_log::RenameRecord::new(image.original_or_current(), image.file_name.as_str());
                OutputFormatter::plain(&record.to_line());
            }
        }
        None => {
            for image in images {
                OutputFormatter::plain(&change_log::escape_name(&image.file_name));
            }
        }
    }
    Ok(())
}

fn print_rename_summary(report: &RenameReport, dry_run: bool, total: usize) {
    for (file, reason) in report.failures() {
        OutputFormatter::error(&format!("Could not rename {}: {}", file, reason));
    }

    if dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "{} of {} images would be renamed. No files were modified.",
            report.renamed_count(),
            total
        ));
        return;
    }

    let failed = report.failures().count();
    OutputFormatter::summary_table(&[
        ("Images", total),
        ("Renamed", report.renamed_count()),
        ("Failed", failed),
    ]);
    if failed == 0 {
        OutputFormatter::success("Rename complete!");
    } else {
        OutputFormatter::warning("Some images could not be renamed. Please review errors above.");
    }
}

/// Undoes the renames recorded in a change log.
///
/// Malformed lines and failed renames are reported as warnings; only an
/// unopenable log or a missing directory is an error.
fn undo_renames(change_log: &Path, base_path: &Path) -> Result<(), String> {
    OutputFormatter::info(&format!(
        "Undoing changes from {} in {}",
        change_log.display(),
        base_path.display()
    ));

    let report = UndoManager::undo(change_log, base_path).map_err(|e| e.to_string())?;

    for warning in &report.warnings {
        OutputFormatter::warning(&warning.to_string());
    }

    OutputFormatter::summary_table(&[
        ("Restored", report.restored_files),
        ("Skipped", report.warnings.len()),
    ]);
    if report.is_complete_success() {
        OutputFormatter::success("Undo complete!");
    } else {
        OutputFormatter::warning("Undo finished with warnings.");
    }

    Ok(())
}
