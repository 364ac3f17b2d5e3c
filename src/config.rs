//! Configuration: sort defaults and file filtering rules.
//!
//! Configuration is loaded from a TOML file and merged with command-line
//! flags by the CLI. Filtering supports several strategies:
//! - Regex include rules (a file must fully match one of them, if any are given)
//! - Hidden-file switch
//! - Exact filename matching
//! - File extension matching
//! - Glob pattern matching
//! - Regex exclude rules (full match)
//!
//! # Configuration File Format
//!
//! ```toml
//! [sort]
//! primary = "resolution"
//! secondary = "hue"
//! reverse = false
//! start = 46656
//! step = 5
//! pad_width = 4
//! alphabet = "base36"
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.include]
//! regex = [".*\\.jpg"]
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.tmp"]
//! extensions = ["bak"]
//! regex = ["draft_.*"]
//! ```

use crate::codec::Alphabet;
use crate::sorting::SortMethod;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".imgsortrc.toml";

/// First four-symbol base-36 value, so default names start at "1000".
pub const DEFAULT_START: u64 = 36 * 36 * 36;

/// Gap left between consecutive names.
pub const DEFAULT_STEP: i64 = 5;

/// Errors that can occur during configuration loading and filtering.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sort: SortSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Defaults for sorting and renaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortSettings {
    #[serde(default = "default_primary")]
    pub primary: SortMethod,
    #[serde(default)]
    pub secondary: Option<SortMethod>,
    #[serde(default)]
    pub reverse: bool,
    /// First counter value handed to the name generator.
    #[serde(default = "default_start")]
    pub start: u64,
    /// Counter increment; zero and negative values are normalized.
    #[serde(default = "default_step")]
    pub step: i64,
    /// Minimum number of symbols in the encoded counter.
    #[serde(default = "default_pad_width")]
    pub pad_width: usize,
    #[serde(default)]
    pub alphabet: Alphabet,
}

fn default_primary() -> SortMethod {
    SortMethod::Resolution
}

fn default_start() -> u64 {
    DEFAULT_START
}

fn default_step() -> i64 {
    DEFAULT_STEP
}

fn default_pad_width() -> usize {
    4
}

impl Default for SortSettings {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            secondary: None,
            reverse: false,
            start: default_start(),
            step: default_step(),
            pad_width: default_pad_width(),
            alphabet: Alphabet::default(),
        }
    }
}

/// File filter rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to consider hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub include: IncludeRules,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules a file must satisfy to be considered at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Regexes matched against the whole filename. When non-empty, files
    /// matching none of them are dropped.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for excluding files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "bak"), case-insensitive.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regexes matched against the whole filename.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.imgsortrc.toml` in the current directory
    /// 3. Look for `~/.config/imgsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("imgsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        log::debug!("Loaded configuration from {}", path.display());

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

impl FilterRules {
    /// Compile rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    include_regexes: Vec<Regex>,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            include_regexes: compile_full_match(&rules.include.regex)?,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes: compile_full_match(&rules.exclude.regex)?,
        })
    }

    /// Check if a file should be considered for sorting.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Include regexes - if any are set and none matches, exclude
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Exclude regexes - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.include_regexes.is_empty()
            && !self.include_regexes.iter().any(|re| re.is_match(&file_name))
        {
            return false;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }

        !self.exclude_regexes.iter().any(|re| re.is_match(&file_name))
    }
}

/// Compiles each pattern anchored at both ends so it must match the whole filename.
fn compile_full_match(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            // Validate the pattern on its own first so the error names what the user wrote.
            Regex::new(pattern)
                .and_then(|_| Regex::new(&format!("^(?:{})$", pattern)))
                .map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
        })
        .collect()
}
