//! Sound DB Library
//!
//! Query-like access to a hierarchy of acoustic monitoring data directories,
//! organised by unit, site and year. Callers name a data type and a set of
//! sites; the library finds the files and returns parsed tables.
//!
//! This library provides tools for:
//! - Encoding and decoding site identifiers (`DENAUPST2015`) and data
//!   directory names (`2015 DENAUPST Upper Station`)
//! - Indexing every data directory under a raw data root
//! - Resolving per-site file locations from path templates and globs
//! - Reading one data type across many sites with per-site failure isolation
//! - Merging site metadata with derived data
//!
//! ```no_run
//! use sound_db::{AccessOptions, SoundDb, SoundDbConfig};
//!
//! # fn main() -> sound_db::Result<()> {
//! let db = SoundDb::open(SoundDbConfig::default().with_raw_data_root("/data/raw"));
//! let levels = db.read("nvspl", ["DENAUPST2015", "DENATEKL2015"], &AccessOptions::default())?;
//! println!("{} sites", levels.site_count());
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod config;
pub mod constants;
pub mod error;
pub mod identifier;
pub mod index;
pub mod metadata;
pub mod models;
pub mod parsers;
pub mod registry;
pub mod resolver;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use accessor::{
    AccessOptions, Accessor, CancellationToken, SiteIter, SiteOutcome, SiteRecord, SkippedSite,
};
pub use config::SoundDbConfig;
pub use error::{Result, SoundDbError};
pub use identifier::{decode_data_dir_name, decode_site_id, encode_data_dir_name, encode_site_id};
pub use index::{DirectoryIndex, IndexState, IndexWarning};
pub use models::{Collected, ParseOptions, Resolved, SiteData, SiteKey, SiteSpecifier};
pub use registry::AccessorRegistry;
pub use resolver::PathTemplate;

use std::path::Path;
use tracing::info;

/// Directory index, accessor registry and configuration for one raw data root
#[derive(Debug)]
pub struct SoundDb {
    config: SoundDbConfig,
    index: DirectoryIndex,
    registry: AccessorRegistry,
}

impl SoundDb {
    /// Index the configured root with the standard accessors
    ///
    /// A missing or unreadable root leaves the index empty; see
    /// [`DirectoryIndex::warnings`].
    pub fn open(config: SoundDbConfig) -> Self {
        Self::with_registry(config, AccessorRegistry::standard())
    }

    pub fn with_registry(config: SoundDbConfig, registry: AccessorRegistry) -> Self {
        let index = DirectoryIndex::build(&config.raw_data_root);
        info!(
            "Opened {} with {} sites and {} accessors",
            config.raw_data_root.display(),
            index.len(),
            registry.len()
        );
        Self {
            config,
            index,
            registry,
        }
    }

    pub fn config(&self) -> &SoundDbConfig {
        &self.config
    }

    pub fn index(&self) -> &DirectoryIndex {
        &self.index
    }

    pub fn registry(&self) -> &AccessorRegistry {
        &self.registry
    }

    /// Re-index under a new root
    pub fn rebuild_index(&mut self, root: impl AsRef<Path>) -> &[IndexWarning] {
        self.config.raw_data_root = root.as_ref().to_path_buf();
        self.index.rebuild(root)
    }

    pub fn accessor(&self, name: &str) -> Result<&Accessor> {
        self.registry.get(name)
    }

    /// Read one data type for many sites, stacked into a table when possible
    pub fn read<I, S>(&self, accessor: &str, sites: I, options: &AccessOptions) -> Result<Collected>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.accessor(accessor)?
            .collect_all(&self.index, sites, options)
    }

    /// Resolved paths of one data type for many sites
    ///
    /// Sites that fail to resolve are left out; cancellation is an error.
    pub fn paths<I, S>(
        &self,
        accessor: &str,
        sites: I,
        options: &AccessOptions,
    ) -> Result<Vec<(Resolved, SiteKey)>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut iter = self.accessor(accessor)?.paths(&self.index, sites, options);
        let resolved = iter.by_ref().collect();
        iter.into_result()?;
        Ok(resolved)
    }

    /// Read one data type for exactly one site
    pub fn access(
        &self,
        accessor: &str,
        site: &SiteSpecifier,
        options: &ParseOptions,
    ) -> Result<SiteData> {
        self.accessor(accessor)?.access(&self.index, site, options)
    }

    /// Merged metadata from the configured tables
    pub fn metadata(&self) -> Result<polars::prelude::DataFrame> {
        match (&self.config.metadata_path, &self.config.derived_data_path) {
            (Some(metadata), Some(derived)) => metadata::load_metadata(metadata, derived),
            _ => Err(SoundDbError::configuration(
                "metadata_path and derived_data_path are not configured",
            )),
        }
    }
}
