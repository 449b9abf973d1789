//! Directory index mapping site keys to data directories
//!
//! The index scans the immediate children of a raw data root once and maps
//! each `(unit, site, year)` decoded from a directory name to that
//! directory's absolute path. Entries that do not follow the naming
//! convention are skipped. A missing or unreadable root is not an error:
//! the index stays empty and a warning is recorded, so failures surface
//! per lookup instead of at startup.

use crate::error::{Result, SoundDbError};
use crate::identifier::{decode_data_dir_name, decode_site_id};
use crate::models::SiteKey;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lifecycle of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndexState {
    Unbuilt,
    Building,
    Ready,
}

/// Non-fatal problems found while building the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IndexWarning {
    /// The root does not exist (the drive may be disconnected)
    RootNotFound { root: PathBuf },
    /// The root exists but cannot be listed
    PermissionDenied { root: PathBuf },
    /// Listing the root failed for another reason
    Unreadable { root: PathBuf, reason: String },
    /// The root was listed but held no data directories
    NoDataDirectories { root: PathBuf },
    /// Several directories decode to the same site key
    DuplicateSite { key: SiteKey, paths: Vec<PathBuf> },
}

impl fmt::Display for IndexWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexWarning::RootNotFound { root } => write!(
                f,
                "Raw data directory \"{}\" not found (the drive may be disconnected). \
                 Most data-accessing functions will fail.",
                root.display()
            ),
            IndexWarning::PermissionDenied { root } => write!(
                f,
                "Permission denied to access data directory \"{}\". \
                 Most data-accessing functions will fail.",
                root.display()
            ),
            IndexWarning::Unreadable { root, reason } => write!(
                f,
                "Could not read data directory \"{}\": {}",
                root.display(),
                reason
            ),
            IndexWarning::NoDataDirectories { root } => write!(
                f,
                "No site data directories found in {}. \
                 Check if this is really the correct path to the raw data directory.",
                root.display()
            ),
            IndexWarning::DuplicateSite { key, paths } => {
                let shown: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(
                    f,
                    "Multiple data directories for {}: {}. Lookups for this site will fail.",
                    key,
                    shown.join(", ")
                )
            }
        }
    }
}

/// Lookup table from site key to data directory
#[derive(Debug, Clone)]
pub struct DirectoryIndex {
    root: Option<PathBuf>,
    entries: BTreeMap<SiteKey, PathBuf>,
    duplicates: BTreeMap<SiteKey, Vec<PathBuf>>,
    warnings: Vec<IndexWarning>,
    state: IndexState,
}

impl Default for DirectoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryIndex {
    /// Create an empty, unbuilt index
    pub fn new() -> Self {
        Self {
            root: None,
            entries: BTreeMap::new(),
            duplicates: BTreeMap::new(),
            warnings: Vec::new(),
            state: IndexState::Unbuilt,
        }
    }

    /// Create an index and scan `root`
    pub fn build(root: impl AsRef<Path>) -> Self {
        let mut index = Self::new();
        index.rebuild(root);
        index
    }

    /// Discard all entries and scan `root` again
    ///
    /// Returns the warnings produced by this scan.
    pub fn rebuild(&mut self, root: impl AsRef<Path>) -> &[IndexWarning] {
        let root = root.as_ref();
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

        self.state = IndexState::Building;
        self.entries.clear();
        self.duplicates.clear();
        self.warnings.clear();

        info!("Building site directory index from: {}", root.display());
        self.scan(&root);

        for warning in &self.warnings {
            warn!("{}", warning);
        }
        info!(
            "Indexed {} data directories ({} ambiguous)",
            self.entries.len(),
            self.duplicates.len()
        );

        self.root = Some(root);
        self.state = IndexState::Ready;
        &self.warnings
    }

    fn scan(&mut self, root: &Path) {
        let dir = match std::fs::read_dir(root) {
            Ok(dir) => dir,
            Err(e) => {
                self.warnings.push(match e.kind() {
                    ErrorKind::NotFound => IndexWarning::RootNotFound {
                        root: root.to_path_buf(),
                    },
                    ErrorKind::PermissionDenied => IndexWarning::PermissionDenied {
                        root: root.to_path_buf(),
                    },
                    _ => IndexWarning::Unreadable {
                        root: root.to_path_buf(),
                        reason: e.to_string(),
                    },
                });
                return;
            }
        };

        for entry in dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", root.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                debug!("Skipping non UTF-8 directory name: {}", path.display());
                continue;
            };

            match decode_data_dir_name(&name) {
                Ok(decoded) => self.insert(decoded.key, path),
                Err(_) => debug!("Skipping directory not named as site data: {}", name),
            }
        }

        for (key, paths) in self.duplicates.iter_mut() {
            paths.sort();
            self.warnings.push(IndexWarning::DuplicateSite {
                key: key.clone(),
                paths: paths.clone(),
            });
        }

        if self.entries.is_empty() && self.duplicates.is_empty() {
            self.warnings.push(IndexWarning::NoDataDirectories {
                root: root.to_path_buf(),
            });
        }
    }

    fn insert(&mut self, key: SiteKey, path: PathBuf) {
        if let Some(paths) = self.duplicates.get_mut(&key) {
            paths.push(path);
        } else if let Some(existing) = self.entries.remove(&key) {
            self.duplicates.insert(key, vec![existing, path]);
        } else {
            self.entries.insert(key, path);
        }
    }

    /// Path to the data directory for a site key
    pub fn lookup(&self, key: &SiteKey) -> Result<&Path> {
        if let Some(paths) = self.duplicates.get(key) {
            return Err(SoundDbError::DuplicateSite {
                unit: key.unit.clone(),
                site: key.site.clone(),
                year: key.year.clone(),
                paths: paths.clone(),
            });
        }

        self.entries
            .get(key)
            .map(PathBuf::as_path)
            .ok_or_else(|| SoundDbError::SiteNotFound {
                unit: key.unit.clone(),
                site: key.site.clone(),
                year: key.year.clone(),
            })
    }

    /// Path to the data directory for a site ID string
    pub fn lookup_id(&self, id: &str) -> Result<(PathBuf, SiteKey)> {
        let key = decode_site_id(id)?;
        let dir = self.lookup(&key)?.to_path_buf();
        Ok((dir, key))
    }

    /// Data directories for the given site IDs, in input order
    ///
    /// Invalid or unknown IDs are skipped; with `quiet` off each skip is
    /// logged.
    pub fn data_dirs<'a, I, S>(
        &'a self,
        sites: I,
        quiet: bool,
    ) -> impl Iterator<Item = (PathBuf, SiteKey)> + 'a
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: 'a,
        S: AsRef<str>,
    {
        sites
            .into_iter()
            .filter_map(move |id| match self.lookup_id(id.as_ref()) {
                Ok(found) => Some(found),
                Err(e) => {
                    if !quiet {
                        warn!("{}, skipping", e);
                    }
                    None
                }
            })
    }

    /// All unambiguous entries, sorted by key
    pub fn entries(&self) -> impl Iterator<Item = (&SiteKey, &Path)> {
        self.entries.iter().map(|(k, v)| (k, v.as_path()))
    }

    /// Site keys claimed by more than one directory
    pub fn duplicates(&self) -> &BTreeMap<SiteKey, Vec<PathBuf>> {
        &self.duplicates
    }

    pub fn contains(&self, key: &SiteKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Root scanned by the last build, if any
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    /// Warnings from the last build
    pub fn warnings(&self) -> &[IndexWarning] {
        &self.warnings
    }
}
