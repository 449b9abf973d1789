//! Accessor registry
//!
//! The registry is built once at startup and is read-only afterwards.
//! [`AccessorRegistry::standard`] holds the data types found in every
//! site's data directory.

use crate::accessor::Accessor;
use crate::constants::{
    AUDIO_DIR, NVSPL_DIR, PARTIAL_NVSPL_DIR, PHOTOS_DIR, SPL_ANALYSIS_DIR, WAV_ANALYSIS_DIR,
};
use crate::error::{Result, SoundDbError};
use crate::models::{ParseOptions, Resolved, SiteKey};
use crate::parsers::list_files;
use crate::parsers::table::{TableFormat, parse_many, parse_single};
use crate::resolver::{PathTemplate, glob_sorted};
use glob::Pattern;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Named accessors available to the application
#[derive(Debug, Clone, Default)]
pub struct AccessorRegistry {
    accessors: BTreeMap<String, Accessor>,
}

/// Builder for [`AccessorRegistry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    accessors: BTreeMap<String, Accessor>,
}

impl RegistryBuilder {
    /// Add an accessor, replacing any earlier one with the same name
    pub fn register(mut self, accessor: Accessor) -> Self {
        if let Some(previous) = self.accessors.insert(accessor.name().to_string(), accessor) {
            warn!("Accessor '{}' registered twice, keeping the later one", previous.name());
        }
        self
    }

    pub fn build(self) -> AccessorRegistry {
        AccessorRegistry {
            accessors: self.accessors,
        }
    }
}

impl AccessorRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry of the standard acoustic monitoring data types
    pub fn standard() -> Self {
        Self::builder()
            .register(Accessor::new(
                "nvspl",
                "Hourly NVSPL sound pressure level files",
                parse_many(TableFormat::comma()),
                format!("{}/NVSPL_{{unit}}{{site}}*.txt", NVSPL_DIR),
            ))
            .register(Accessor::new(
                "partial_nvspl",
                "NVSPL files from partial recording days",
                parse_many(TableFormat::comma()),
                format!("{}/NVSPL_{{unit}}{{site}}*.txt", PARTIAL_NVSPL_DIR),
            ))
            .register(spl_table("srcid", "SRCID", "Noise source identification"))
            .register(spl_table("loudevents", "LOUDEVENTS", "Loud event detections"))
            .register(spl_table("dailypa", "DAILYPA", "Daily percent time audible"))
            .register(spl_table("metrics", "METRICS", "Acoustic summary metrics"))
            .register(Accessor::new(
                "audibility",
                "Audibility tables from WAV listening sessions",
                parse_single(TableFormat::tab()),
                PathTemplate::custom(resolve_audibility),
            ))
            .register(Accessor::new(
                "audio",
                "Audio recordings",
                list_files,
                format!("{}/*", AUDIO_DIR),
            ))
            .register(Accessor::new(
                "photos",
                "Site photographs",
                list_files,
                format!("{}/*", PHOTOS_DIR),
            ))
            .build()
    }

    /// Accessor by name
    pub fn get(&self, name: &str) -> Result<&Accessor> {
        self.accessors
            .get(name)
            .ok_or_else(|| SoundDbError::UnknownAccessor {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.accessors.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Accessor> {
        self.accessors.values()
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

/// Tab-delimited table in the SPL analysis folder
fn spl_table(name: &str, prefix: &str, description: &str) -> Accessor {
    Accessor::new(
        name,
        description,
        parse_single(TableFormat::tab()),
        format!("{}/{}_{{unit}}{{site}}.txt", SPL_ANALYSIS_DIR, prefix),
    )
}

/// Audibility tables live in the WAV analysis folder, either directly or in
/// one subfolder per analyst. The `analyst` option restricts the search to
/// that analyst's subfolder.
fn resolve_audibility(directory: &Path, key: &SiteKey, options: &ParseOptions) -> Result<Resolved> {
    let wav_dir = directory.join(WAV_ANALYSIS_DIR);
    if !wav_dir.is_dir() {
        return Err(SoundDbError::FileNotFound { path: wav_dir });
    }

    let file_pattern = format!("AUDIBILITY_{}{}*.txt", key.unit, key.site);

    let mut matches = match options.get("analyst") {
        Some(analyst) => glob_sorted(
            &wav_dir,
            &format!("{}/{}", Pattern::escape(analyst), file_pattern),
        )?,
        None => {
            let mut found = glob_sorted(&wav_dir, &file_pattern)?;
            found.extend(glob_sorted(&wav_dir, &format!("*/{}", file_pattern))?);
            found
        }
    };
    matches.sort();
    matches.dedup();

    if matches.is_empty() {
        return Err(SoundDbError::FileNotFound {
            path: wav_dir.join(file_pattern),
        });
    }

    Ok(Resolved::Files(matches))
}
