//! imgsort - sort images by color or size and rename them to match
//!
//! This library provides an order-preserving, collision-free renaming
//! scheme (a Base-N codec plus a name generator), a rename engine that
//! records what it did in a plain-text change log, and an undo engine that
//! replays such a log in reverse. Image discovery, sorting, configuration
//! and CLI glue sit on top.

pub mod change_log;
pub mod cli;
pub mod codec;
pub mod config;
pub mod generator;
pub mod image_info;
pub mod output;
pub mod renamer;
pub mod sorting;
pub mod undo;

pub use change_log::{ChangeLogError, ChangeLogWriter, RenameRecord};
pub use codec::{Alphabet, Codec, CodecError};
pub use config::{CompiledFilters, Config, ConfigError, FilterRules};
pub use generator::NameGenerator;
pub use image_info::{DiscoveryError, ImageDescriptor};
pub use renamer::{RenameEngine, RenameOutcome, RenameReport};
pub use sorting::SortMethod;
pub use undo::{UndoError, UndoManager, UndoReport, UndoWarning};

pub use cli::{Cli, SortCommand, SortOptions, run_cli};
