//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output. Listings go to
//! stdout so they can be piped; status lines, warnings and progress go to
//! stderr.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for directory scans
/// - Summary tables with counts
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use imgsort::output::OutputFormatter;
    /// OutputFormatter::success("Renamed 12 images");
    /// ```
    pub fn success(message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        eprintln!("{}", message.cyan());
    }

    /// Prints a listing line to stdout without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        eprintln!("\n{}", header.bold());
    }

    /// Creates and returns a progress bar for scanning `total` files.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use imgsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a two-column summary table of labelled counts.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use imgsort::output::OutputFormatter;
    /// OutputFormatter::summary_table(&[("Renamed", 8), ("Failed", 1)]);
    /// ```
    pub fn summary_table(rows: &[(&str, usize)]) {
        Self::header("SUMMARY");

        let label_width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(6);

        eprintln!("{}", "-".repeat(label_width + 10));
        for (label, count) in rows {
            let count = if *count == 0 {
                count.to_string().normal()
            } else if label.eq_ignore_ascii_case("failed") || label.eq_ignore_ascii_case("skipped")
            {
                count.to_string().red()
            } else {
                count.to_string().green()
            };
            eprintln!("{:<width$} | {}", label, count, width = label_width);
        }
        eprintln!("{}", "-".repeat(label_width + 10));
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        eprintln!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
