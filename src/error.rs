//! Error handling for site lookup, path resolution and parsing.
//!
//! One error type covers malformed input (identifiers, directory names,
//! specifiers, templates), resolution failures (missing or ambiguous sites,
//! missing files) and opaque parser failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoundDbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid site ID: '{id}'")]
    InvalidIdentifier { id: String },

    #[error("Invalid data directory name: '{name}'")]
    InvalidDirectoryName { name: String },

    #[error("Invalid site specifier: {reason}")]
    InvalidSpecifier { reason: String },

    #[error("Invalid path template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("No data directory found for {unit}{site} in {year}")]
    SiteNotFound {
        unit: String,
        site: String,
        year: String,
    },

    #[error("Multiple data directories found for {unit}{site} in {year}: {paths:?}")]
    DuplicateSite {
        unit: String,
        site: String,
        year: String,
        paths: Vec<PathBuf>,
    },

    #[error("{path} does not exist")]
    FileNotFound { path: PathBuf },

    #[error("Failed to parse {path}: {reason}")]
    ParseFailure { path: PathBuf, reason: String },

    #[error("Unknown accessor '{name}'. Available accessors: {available}")]
    UnknownAccessor { name: String, available: String },

    #[error("Interrupted: {reason}")]
    Interrupted { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SoundDbError {
    pub fn invalid_identifier(id: impl Into<String>) -> Self {
        Self::InvalidIdentifier { id: id.into() }
    }

    pub fn invalid_directory_name(name: impl Into<String>) -> Self {
        Self::InvalidDirectoryName { name: name.into() }
    }

    pub fn invalid_specifier(reason: impl Into<String>) -> Self {
        Self::InvalidSpecifier {
            reason: reason.into(),
        }
    }

    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }

    pub fn parse_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error must abort bulk iteration instead of skipping a site
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

pub type Result<T> = std::result::Result<T, SoundDbError>;
