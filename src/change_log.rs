//! Change log: one `old -> new` record per line.
//!
//! Whitespace inside a name is escaped with a backslash (`my photo.jpg`
//! becomes `my\ photo.jpg`), as is a backslash itself, so the only unescaped spaces on a line are the
//! ones around the `->` separator. Every valid line matches
//! `<token> -> <token>`, where a token is a run of non-whitespace characters
//! or backslash-escaped characters.
//!
//! # Examples
//!
//! ```
//! use imgsort::change_log::{RenameRecord, parse_line};
//!
//! let record = RenameRecord::new("my photo.jpg", "1000_640x480.jpeg");
//! assert_eq!(record.to_line(), r"my\ photo.jpg -> 1000_640x480.jpeg");
//! assert_eq!(parse_line(&record.to_line()), Some(record));
//! ```

use crate::image_info::ImageDescriptor;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Separator between the old and the new name.
pub const SEPARATOR: &str = " -> ";

/// Default change log filename.
pub const DEFAULT_CHANGE_LOG: &str = "change_history.txt";

/// Errors that can occur while writing or opening a change log.
#[derive(Debug)]
pub enum ChangeLogError {
    /// The log file could not be opened or created.
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Writing to the log file failed.
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ChangeLogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenFailed { path, source } => {
                write!(f, "Could not open change log {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "Could not write change log {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ChangeLogError {}

/// A single performed rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    /// Name before the rename.
    pub old_name: String,
    /// Name after the rename.
    pub new_name: String,
}

impl RenameRecord {
    pub fn new(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    /// The record for a renamed image, or `None` if it kept its name.
    pub fn from_image(image: &ImageDescriptor) -> Option<Self> {
        if !image.is_renamed() {
            return None;
        }
        Some(Self::new(image.original_or_current(), image.file_name.as_str()))
    }

    /// Formats the record as an escaped log line, without a newline.
    pub fn to_line(&self) -> String {
        format!(
            "{}{}{}",
            escape_name(&self.old_name),
            SEPARATOR,
            escape_name(&self.new_name)
        )
    }
}

/// Escapes every whitespace character and every backslash in `name` with a
/// backslash.
pub fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_whitespace() || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Reverses [`escape_name`]. A backslash followed by anything other than
/// whitespace or another backslash is kept as is.
pub fn unescape_name(token: &str) -> String {
    let mut name = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && (next.is_whitespace() || next == '\\')
        {
            name.push(next);
            chars.next();
            continue;
        }
        name.push(c);
    }
    name
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:\\.|\S)+ -> (?:\\.|\S)+$").expect("change log pattern is valid")
    })
}

/// Removes trailing whitespace that is not escaped by a backslash.
pub fn strip_trailing_whitespace(line: &str) -> &str {
    let mut end = line.len();
    while let Some(c) = line[..end].chars().next_back() {
        if !c.is_whitespace() {
            break;
        }
        let before = &line[..end - c.len_utf8()];
        let backslashes = before.bytes().rev().take_while(|&b| b == b'\\').count();
        if backslashes % 2 == 1 {
            break;
        }
        end -= c.len_utf8();
    }
    &line[..end]
}

/// Whether `line` matches `<token> -> <token>`.
pub fn is_valid_line(line: &str) -> bool {
    line_pattern().is_match(line)
}

/// Parses a stripped log line into a record, or `None` if it is malformed.
pub fn parse_line(line: &str) -> Option<RenameRecord> {
    if !is_valid_line(line) {
        return None;
    }
    let split = find_separator(line)?;
    let old = &line[..split];
    let new = &line[split + SEPARATOR.len()..];
    Some(RenameRecord::new(unescape_name(old), unescape_name(new)))
}

/// Byte offset of the first separator not preceded by an escaping backslash.
fn find_separator(line: &str) -> Option<usize> {
    let mut chars = line.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if line[i..].starts_with(SEPARATOR) {
            return Some(i);
        }
    }
    None
}

/// Writes rename records to a change log file.
///
/// The file is created on [`ChangeLogWriter::create`], so an unwritable
/// destination is reported before any rename happens.
pub struct ChangeLogWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl ChangeLogWriter {
    /// Creates (or truncates) the log file at `path`.
    pub fn create(path: &Path) -> Result<Self, ChangeLogError> {
        let file = File::create(path).map_err(|e| ChangeLogError::OpenFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record.
    pub fn write_record(&mut self, record: &RenameRecord) -> Result<(), ChangeLogError> {
        writeln!(self.writer, "{}", record.to_line()).map_err(|e| ChangeLogError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })?;
        self.written += 1;
        Ok(())
    }

    /// Appends a record for every renamed image, in order.
    pub fn write_images(&mut self, images: &[ImageDescriptor]) -> Result<(), ChangeLogError> {
        for record in images.iter().filter_map(RenameRecord::from_image) {
            self.write_record(&record)?;
        }
        Ok(())
    }

    /// Flushes the file and returns the number of records written.
    pub fn finish(mut self) -> Result<usize, ChangeLogError> {
        self.writer
            .flush()
            .map_err(|e| ChangeLogError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(self.written)
    }
}

/// Writes a change log for `images` to `path` in one go.
pub fn write_change_log(path: &Path, images: &[ImageDescriptor]) -> Result<usize, ChangeLogError> {
    let mut writer = ChangeLogWriter::create(path)?;
    writer.write_images(images)?;
    writer.finish()
}

/// Opens a change log for line-by-line reading.
pub fn open_change_log(path: &Path) -> Result<Lines<BufReader<File>>, ChangeLogError> {
    let file = File::open(path).map_err(|e| ChangeLogError::OpenFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(BufReader::new(file).lines())
}
