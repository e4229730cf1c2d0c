//! Canonical error type for PDB parsing, writing, and configuration loading.
//!
//! Only whole-file conditions surface here. Chain-level and residue-level anomalies are
//! recorded as [`Diagnostic`](super::diagnostics::Diagnostic) entries and never abort a parse.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing PDB data.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper around operating-system level I/O failures.
    ///
    /// Includes both filesystem and stream sources, optionally carrying the file path for
    /// richer error messages.
    #[error(
        "I/O error for {path_desc}: {source}",
        path_desc = PathDisplay(path)
    )]
    Io {
        /// Path to the file involved in the failed operation, if any.
        path: Option<PathBuf>,
        /// Underlying error emitted by the standard library.
        #[source]
        source: std::io::Error,
    },

    /// Indicates that an input could not be parsed into the expected record.
    #[error(
        "failed to parse {format} {path_desc}: {details} (line {line_number})",
        path_desc = PathDisplay(path)
    )]
    Parse {
        /// Name of the textual format (e.g., `"PDB"`, `"TOML"`).
        format: &'static str,
        /// Path to the offending file, if known.
        path: Option<PathBuf>,
        /// One-based line number where parsing failed, `0` when unknown.
        line_number: usize,
        /// Human-readable description of what went wrong.
        details: String,
    },

    /// A record family required for reconciliation never appeared in the input.
    #[error(
        "no {record} records found in {path_desc}",
        path_desc = PathDisplay(path)
    )]
    MissingRecords {
        /// Record name, `"SEQRES"` or `"ATOM"`.
        record: &'static str,
        path: Option<PathBuf>,
    },

    /// Every chain was rejected during validation.
    #[error(
        "no valid protein chains remain after {stage} validation in {path_desc}",
        path_desc = PathDisplay(path)
    )]
    NoValidChains {
        /// Validation stage that rejected the last chain (`"SEQRES"` or `"ATOM"`).
        stage: &'static str,
        path: Option<PathBuf>,
    },

    /// A parser option is out of range.
    #[error("invalid parser configuration: {details}")]
    InvalidConfig { details: String },
}

impl Error {
    /// Constructs an [`Error::Io`] variant from a standard I/O error.
    ///
    /// # Arguments
    ///
    /// * `source` - The original `std::io::Error` emitted by the OS or runtime.
    /// * `path` - Optional file path associated with the operation.
    ///
    /// # Returns
    ///
    /// A ready-to-use `Error` that preserves the source error for chaining.
    pub fn from_io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { path, source }
    }

    /// Builds a [`Error::Parse`] variant with consistent messaging.
    ///
    /// # Arguments
    ///
    /// * `format` - Name of the textual format being parsed.
    /// * `path` - Optional path pointing to the input file.
    /// * `line_number` - Line where the failure occurred (1-indexed).
    /// * `details` - Additional context about the parsing problem.
    pub fn parse(
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::Parse {
            format,
            path,
            line_number,
            details: details.into(),
        }
    }

    pub fn missing_records(record: &'static str) -> Self {
        Self::MissingRecords { record, path: None }
    }

    pub fn no_valid_chains(stage: &'static str) -> Self {
        Self::NoValidChains { stage, path: None }
    }

    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            details: details.into(),
        }
    }

    /// Attaches a file path to variants that carry one, leaving others untouched.
    pub fn with_path(self, new_path: impl Into<PathBuf>) -> Self {
        let new_path = Some(new_path.into());
        match self {
            Self::Io { source, .. } => Self::Io {
                path: new_path,
                source,
            },
            Self::Parse {
                format,
                line_number,
                details,
                ..
            } => Self::Parse {
                format,
                path: new_path,
                line_number,
                details,
            },
            Self::MissingRecords { record, .. } => Self::MissingRecords {
                record,
                path: new_path,
            },
            Self::NoValidChains { stage, .. } => Self::NoValidChains {
                stage,
                path: new_path,
            },
            other => other,
        }
    }
}

/// Lightweight formatter for optional paths used in error messages.
///
/// When a path is present it prints `file '<path>'`; otherwise it emits `stream source` so
/// error messages remain grammatically consistent.
struct PathDisplay<'a>(&'a Option<PathBuf>);

impl<'a> fmt::Display for PathDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "file '{}'", p.display()),
            None => write!(f, "stream source"),
        }
    }
}
