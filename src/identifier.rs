//! Site identifier and data directory name codec.
//!
//! Site IDs are 12 characters, `UNITSITEYEAR` (e.g. `DENAUPST2015`).
//! Data directories are named `YEAR UNITSITE <title>`
//! (e.g. `2014 GAARNWAL North Walker Lake`).

use crate::error::{Result, SoundDbError};
use crate::models::SiteKey;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static SITE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_]{4})([A-Za-z0-9_]{4})([0-9]{4})$").expect("valid site ID regex")
});

static DATA_DIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4}) ([A-Za-z0-9_]{4})([A-Za-z0-9_]{4})(?: (.*))?$")
        .expect("valid data directory regex")
});

static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{4}$").expect("valid segment regex"));

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("valid year regex"));

/// Decoded data directory name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDirName {
    pub key: SiteKey,
    pub title: String,
}

/// Split a site ID into unit, site and year
pub fn decode_site_id(id: &str) -> Result<SiteKey> {
    let caps = SITE_ID_RE
        .captures(id)
        .ok_or_else(|| SoundDbError::invalid_identifier(id))?;

    Ok(SiteKey {
        unit: caps[1].to_string(),
        site: caps[2].to_string(),
        year: caps[3].to_string(),
    })
}

/// Format unit, site and year into a site ID
///
/// Segments are validated, so a malformed unit or year cannot produce an
/// identifier that decodes to something else.
pub fn encode_site_id(unit: &str, site: &str, year: &str) -> Result<String> {
    validate_segments(unit, site, year)?;
    Ok(format!("{}{}{}", unit, site, year))
}

/// Check the unit/site/year shapes shared by both naming conventions
pub(crate) fn validate_segments(unit: &str, site: &str, year: &str) -> Result<()> {
    if SEGMENT_RE.is_match(unit) && SEGMENT_RE.is_match(site) && YEAR_RE.is_match(year) {
        Ok(())
    } else {
        Err(SoundDbError::invalid_identifier(format!(
            "{}{}{}",
            unit, site, year
        )))
    }
}

/// Decode a data directory name such as `2015 DENAUPST Upper Station`
pub fn decode_data_dir_name(name: &str) -> Result<DataDirName> {
    let caps = DATA_DIR_RE
        .captures(name)
        .ok_or_else(|| SoundDbError::invalid_directory_name(name))?;

    Ok(DataDirName {
        key: SiteKey {
            unit: caps[2].to_string(),
            site: caps[3].to_string(),
            year: caps[1].to_string(),
        },
        title: caps.get(4).map_or(String::new(), |m| m.as_str().to_string()),
    })
}

/// Decode the final component of a data directory path
pub fn decode_data_dir(path: &Path) -> Result<DataDirName> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SoundDbError::invalid_directory_name(path.display().to_string()))?;
    decode_data_dir_name(name)
}

/// Format the name of a data directory, e.g. `2014 DENABACK Backside Lake`
pub fn encode_data_dir_name(unit: &str, site: &str, year: &str, title: &str) -> String {
    format!("{} {}{} {}", year, unit, site, title)
}
