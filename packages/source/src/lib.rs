#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Raw source loading.
//!
//! Reads the station registry, population table and geometry table into
//! [`RawTable`]s with column-by-name access. No business logic happens
//! here beyond checking that the configured columns exist.

pub mod loader;
pub mod parsing;
pub mod progress;

use std::path::PathBuf;

pub use loader::{RawTable, SourceLoader, SourcePaths, SourceTables};

/// Errors that can occur while loading a source file.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file is missing or unreadable.
    #[error("Source unavailable: {path}: {source}")]
    SourceUnavailable {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The header row lacks one or more configured columns.
    #[error("Source {path} is missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// Path of the file.
        path: PathBuf,
        /// Names of the missing columns.
        columns: Vec<String>,
    },

    /// The file is not valid delimited text.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Path of the file.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The configured encoding label is not recognised.
    #[error("Unknown text encoding: '{label}'")]
    UnknownEncoding {
        /// The configured label.
        label: String,
    },

    /// The configured delimiter is not a single-byte character.
    #[error("Unsupported delimiter: '{delimiter}'")]
    UnsupportedDelimiter {
        /// The configured delimiter.
        delimiter: char,
    },
}
