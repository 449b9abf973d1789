//! File listings for data types that are not parsed (audio, photos)

use crate::error::Result;
use crate::models::{ParseOptions, Resolved, SiteData};

/// List the regular files among the resolved paths
///
/// The `extension` option keeps only files with that extension
/// (case-insensitive, without the dot).
pub fn list_files(resolved: &Resolved, options: &ParseOptions) -> Result<SiteData> {
    let extension = options.get("extension").map(|e| e.trim_start_matches('.').to_lowercase());

    let files = resolved
        .paths()
        .iter()
        .filter(|path| path.is_file())
        .filter(|path| match &extension {
            Some(wanted) => path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().to_lowercase() == *wanted),
            None => true,
        })
        .cloned()
        .collect();

    Ok(SiteData::Files(files))
}
