//! Core data structures shared by the index, resolver and accessors.
//!
//! Defines the structured site key, resolved path results, parser options,
//! per-site parser output and the aggregated result of a bulk read.

use crate::error::{Result, SoundDbError};
use crate::identifier::{decode_site_id, validate_segments};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Structured form of a site identifier: unit code, site code and year
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteKey {
    pub unit: String,
    pub site: String,
    pub year: String,
}

impl SiteKey {
    /// Create a key, validating the 4/4/4-digit segment shapes
    pub fn new(
        unit: impl Into<String>,
        site: impl Into<String>,
        year: impl Into<String>,
    ) -> Result<Self> {
        let key = Self {
            unit: unit.into(),
            site: site.into(),
            year: year.into(),
        };
        validate_segments(&key.unit, &key.site, &key.year)?;
        Ok(key)
    }

    /// The 12-character `UNITSITEYEAR` identifier
    pub fn site_id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.unit, self.site, self.year)
    }
}

impl FromStr for SiteKey {
    type Err = SoundDbError;

    fn from_str(s: &str) -> Result<Self> {
        decode_site_id(s)
    }
}

/// Concrete location of one data type for one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Resolved {
    /// A single existing file
    File(PathBuf),
    /// Sorted glob matches; may be empty
    Files(Vec<PathBuf>),
}

impl Resolved {
    /// All resolved paths, in order
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Resolved::File(path) => std::slice::from_ref(path),
            Resolved::Files(paths) => paths,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths().is_empty()
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        match self {
            Resolved::File(path) => vec![path],
            Resolved::Files(paths) => paths,
        }
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::File(path) => write!(f, "{}", path.display()),
            Resolved::Files(paths) => {
                let shown: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "[{}]", shown.join(", "))
            }
        }
    }
}

/// Keyword-style options forwarded to custom resolvers and parsers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    values: BTreeMap<String, String>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an option
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parse an option as an unsigned integer
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        self.get(key)
            .map(|raw| {
                raw.trim().parse::<usize>().map_err(|_| {
                    SoundDbError::configuration(format!(
                        "Option '{}' must be a non-negative integer, got '{}'",
                        key, raw
                    ))
                })
            })
            .transpose()
    }

    /// Parse a comma-separated option into trimmed, non-empty items
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|raw| {
            raw.split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for ParseOptions {
    type Err = SoundDbError;

    /// Parse `key=value` pairs separated by semicolons
    fn from_str(s: &str) -> Result<Self> {
        let mut options = ParseOptions::new();
        for pair in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                SoundDbError::configuration(format!(
                    "Parser option '{}' is not in key=value form",
                    pair
                ))
            })?;
            options.insert(key.trim(), value.trim());
        }
        Ok(options)
    }
}

/// Output of one parser invocation for one site
#[derive(Debug, Clone)]
pub enum SiteData {
    Table(DataFrame),
    Files(Vec<PathBuf>),
}

impl SiteData {
    pub fn as_table(&self) -> Option<&DataFrame> {
        match self {
            SiteData::Table(df) => Some(df),
            SiteData::Files(_) => None,
        }
    }

    pub fn as_files(&self) -> Option<&[PathBuf]> {
        match self {
            SiteData::Files(files) => Some(files),
            SiteData::Table(_) => None,
        }
    }

    /// Row count for tables, file count for listings
    pub fn len(&self) -> usize {
        match self {
            SiteData::Table(df) => df.height(),
            SiteData::Files(files) => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of reading many sites at once
#[derive(Debug, Clone)]
pub enum Collected {
    /// All per-site tables stacked, led by `site_id` and `row` columns
    Table(DataFrame),
    /// Per-site results in input order, when they could not be stacked
    BySite(Vec<(SiteKey, SiteData)>),
}

impl Collected {
    pub fn as_table(&self) -> Option<&DataFrame> {
        match self {
            Collected::Table(df) => Some(df),
            Collected::BySite(_) => None,
        }
    }

    /// Number of sites contributing to this result
    pub fn site_count(&self) -> usize {
        match self {
            Collected::Table(df) => df
                .column(crate::constants::SITE_ID_COLUMN)
                .and_then(|c| c.as_materialized_series().n_unique())
                .unwrap_or(0),
            Collected::BySite(results) => results.len(),
        }
    }
}

/// One site addressed in any of the accepted forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteSpecifier {
    /// `UNITSITEYEAR` identifier, resolved through the index
    Id(String),
    /// Data directory path; the key is decoded from its name
    Directory(PathBuf),
    /// Structured key, resolved through the index
    Key(SiteKey),
    /// Data directory with its key given explicitly
    DirectoryKey(PathBuf, SiteKey),
}

impl SiteSpecifier {
    /// Build a specifier from 1, 3 or 4 string parts
    ///
    /// A single part is a data directory if it is an absolute path, and a
    /// site ID otherwise. Three parts are `unit site year`; four parts are
    /// `directory unit site year`.
    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> Result<Self> {
        match parts {
            [single] => Ok(Self::parse(single.as_ref())),
            [unit, site, year] => Ok(Self::Key(SiteKey::new(
                unit.as_ref(),
                site.as_ref(),
                year.as_ref(),
            )?)),
            [dir, unit, site, year] => Ok(Self::DirectoryKey(
                PathBuf::from(dir.as_ref()),
                SiteKey::new(unit.as_ref(), site.as_ref(), year.as_ref())?,
            )),
            other => Err(SoundDbError::invalid_specifier(format!(
                "expected a site ID, a data directory, (unit, site, year) or \
                 (directory, unit, site, year); got {} parts",
                other.len()
            ))),
        }
    }

    /// Interpret a single string as a directory path or a site ID
    pub fn parse(value: &str) -> Self {
        let path = Path::new(value);
        if path.is_absolute() {
            Self::Directory(path.to_path_buf())
        } else {
            Self::Id(value.to_string())
        }
    }
}

impl From<SiteKey> for SiteSpecifier {
    fn from(key: SiteKey) -> Self {
        Self::Key(key)
    }
}

impl From<&str> for SiteSpecifier {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}
