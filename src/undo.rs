/// Undo functionality for reverting a rename batch.
///
/// This module reads a change log written by a rename run and moves every
/// renamed file back to the name it had before. Problems with single lines
/// never stop the run; only a log that cannot be opened is fatal.
use crate::change_log::{self, ChangeLogError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Errors that prevent an undo run from starting.
#[derive(Debug)]
pub enum UndoError {
    /// The directory the renames happened in does not exist.
    InvalidBasePath(PathBuf),
    /// The change log could not be opened.
    LogUnavailable(ChangeLogError),
}

impl std::fmt::Display for UndoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBasePath(path) => {
                write!(f, "Invalid base path {}: not a directory", path.display())
            }
            Self::LogUnavailable(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for UndoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::LogUnavailable(e) => Some(e),
            Self::InvalidBasePath(_) => None,
        }
    }
}

impl From<ChangeLogError> for UndoError {
    fn from(e: ChangeLogError) -> Self {
        Self::LogUnavailable(e)
    }
}

/// A line of the change log that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoWarning {
    /// The line does not match `<token> -> <token>`.
    MalformedLine { line_number: usize, line: String },
    /// The line is valid but the file could not be renamed back.
    RenameFailed {
        line_number: usize,
        original: String,
        current: String,
        reason: String,
    },
    /// The line could not be read (e.g. it is not valid UTF-8).
    UnreadableLine { line_number: usize, reason: String },
}

impl std::fmt::Display for UndoWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedLine { line_number, line } => {
                write!(f, "Line {} is not a valid file change: {}", line_number, line)
            }
            Self::RenameFailed {
                line_number,
                original,
                current,
                reason,
            } => write!(
                f,
                "Line {}: could not rename {} back to {}: {}",
                line_number, current, original, reason
            ),
            Self::UnreadableLine {
                line_number,
                reason,
            } => write!(f, "Line {} could not be read: {}", line_number, reason),
        }
    }
}

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Lines that were skipped, in file order.
    pub warnings: Vec<UndoWarning>,
}

impl UndoReport {
    /// Returns the total number of lines processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.warnings.len()
    }

    /// Returns true if every line was restored.
    pub fn is_complete_success(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Manages undo operations for rename batches.
pub struct UndoManager;

impl UndoManager {
    /// Reverses the renames recorded in the change log at `log_path`.
    ///
    /// Names in the log are relative to `base_path`. Each line goes through
    /// validation and then a rename; a line failing either step becomes a
    /// warning and the next line is read. The whole log is always processed.
    ///
    /// # Edge Cases Handled
    ///
    /// * **Malformed line**: warning with its 1-based line number
    /// * **Renamed file missing**: warning naming both files
    /// * **Original name taken**: warning, the existing file is not overwritten
    /// * **Replay**: running the same log twice only produces warnings
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use imgsort::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("change_history.txt"), Path::new("photos")) {
    ///     Ok(report) => println!("Restored {} files", report.restored_files),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(log_path: &Path, base_path: &Path) -> Result<UndoReport, UndoError> {
        if !base_path.is_dir() {
            return Err(UndoError::InvalidBasePath(base_path.to_path_buf()));
        }

        let lines = change_log::open_change_log(log_path)?;
        let mut report = UndoReport::default();

        for (index, line) in lines.enumerate() {
            let line_number = index + 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Line {} of {} unreadable: {}", line_number, log_path.display(), e);
                    report.warnings.push(UndoWarning::UnreadableLine {
                        line_number,
                        reason: e.to_string(),
                    });
                    if e.kind() == ErrorKind::InvalidData {
                        continue;
                    }
                    break;
                }
            };

            let stripped = change_log::strip_trailing_whitespace(&line);
            let Some(record) = change_log::parse_line(stripped) else {
                log::warn!("Line {} wasn't a valid file change", line_number);
                report.warnings.push(UndoWarning::MalformedLine {
                    line_number,
                    line: stripped.to_string(),
                });
                continue;
            };

            match Self::restore_file(base_path, &record.old_name, &record.new_name) {
                Ok(()) => {
                    log::debug!("Restored {} -> {}", record.new_name, record.old_name);
                    report.restored_files += 1;
                }
                Err(reason) => {
                    log::warn!(
                        "Could not rename {} to {}: {}",
                        record.new_name,
                        record.old_name,
                        reason
                    );
                    report.warnings.push(UndoWarning::RenameFailed {
                        line_number,
                        original: record.old_name,
                        current: record.new_name,
                        reason,
                    });
                }
            }
        }

        Ok(report)
    }

    /// Moves `current` back to `original`, refusing to replace an existing file.
    fn restore_file(base_path: &Path, original: &str, current: &str) -> Result<(), String> {
        let original_path = base_path.join(original);
        let current_path = base_path.join(current);

        if original_path.symlink_metadata().is_ok() {
            return Err(format!("{} already exists", original));
        }

        fs::rename(&current_path, &original_path).map_err(|e| e.to_string())
    }
}
