//! Application constants for sound-db
//!
//! Directory layout of a site's data directory, column names added by
//! aggregation, and configuration defaults.

// =============================================================================
// Data Directory Layout
// =============================================================================

/// Raw data folders within each site's data directory
pub const NVSPL_DIR: &str = "01 DATA/NVSPL";
pub const PARTIAL_NVSPL_DIR: &str = "01 DATA/PartialDays_NVSPL";
pub const AUDIO_DIR: &str = "01 DATA/AUDIO";
pub const PHOTOS_DIR: &str = "01 DATA/PHOTOS";

/// Analysis output folders within each site's data directory
pub const SPL_ANALYSIS_DIR: &str = "02 ANALYSIS/SPL Analysis";
pub const WAV_ANALYSIS_DIR: &str = "02 ANALYSIS/WAV Analysis";

/// Marker that turns a path template into a glob pattern
pub const WILDCARD: char = '*';

// =============================================================================
// Aggregated Table Columns
// =============================================================================

/// Outermost index column of a combined multi-site table
pub const SITE_ID_COLUMN: &str = "site_id";

/// Row index within the originating site's table
pub const ROW_COLUMN: &str = "row";

/// Originating file of rows read from multi-file data types
pub const SOURCE_FILE_COLUMN: &str = "source_file";

// =============================================================================
// Configuration Defaults
// =============================================================================

/// Environment variable overriding the raw data root directory
pub const ROOT_ENV_VAR: &str = "SOUND_DB_ROOT";

/// Application directory name under the user data directory
pub const APP_DIR_NAME: &str = "sound-db";

/// Default raw data folder name under the application directory
pub const DEFAULT_RAW_DATA_DIR_NAME: &str = "raw-data";

/// Rows sampled for CSV schema inference
pub const SCHEMA_INFERENCE_ROWS: usize = 1000;

/// Rows shown when printing tables in human-readable form
pub const DEFAULT_PREVIEW_ROWS: usize = 10;
