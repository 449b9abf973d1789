//! Delimited text table parsing
//!
//! Acoustic monitoring outputs are plain delimited text: NVSPL hourly files
//! are comma-separated with a header row, SPL analysis outputs (SRCID,
//! LOUDEVENTS, DAILYPA, METRICS) are tab-separated. Both are read with the
//! polars CSV reader.
//!
//! Recognized options:
//! - `n_rows` - read at most this many rows per file
//! - `skip_rows` - skip this many lines before the header
//! - `columns` - comma-separated projection applied after reading
//! - `separator` - single-character separator override (`tab` for `\t`)

use crate::constants::{SCHEMA_INFERENCE_ROWS, SOURCE_FILE_COLUMN};
use crate::error::{Result, SoundDbError};
use crate::models::{ParseOptions, Resolved, SiteData};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Layout of a delimited text file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFormat {
    pub separator: u8,
    pub has_header: bool,
    pub skip_rows: usize,
}

impl TableFormat {
    /// Comma-separated with a header row
    pub const fn comma() -> Self {
        Self {
            separator: b',',
            has_header: true,
            skip_rows: 0,
        }
    }

    /// Tab-separated with a header row
    pub const fn tab() -> Self {
        Self {
            separator: b'\t',
            has_header: true,
            skip_rows: 0,
        }
    }

    /// Apply `separator` and `skip_rows` overrides from parser options
    pub fn with_overrides(mut self, options: &ParseOptions) -> Result<Self> {
        if let Some(raw) = options.get("separator") {
            self.separator = match raw {
                "tab" | "\\t" | "\t" => b'\t',
                single if single.len() == 1 => single.as_bytes()[0],
                other => {
                    return Err(SoundDbError::configuration(format!(
                        "Option 'separator' must be a single character, got '{}'",
                        other
                    )));
                }
            };
        }
        if let Some(skip_rows) = options.get_usize("skip_rows")? {
            self.skip_rows = skip_rows;
        }
        Ok(self)
    }
}

/// Read one delimited file into a DataFrame
pub fn read_table(path: &Path, format: TableFormat, options: &ParseOptions) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(SoundDbError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let format = format.with_overrides(options)?;
    let n_rows = options.get_usize("n_rows")?;

    debug!(
        "Reading table {} (separator {:?}, skip_rows {})",
        path.display(),
        format.separator as char,
        format.skip_rows
    );

    let df = CsvReadOptions::default()
        .with_has_header(format.has_header)
        .with_skip_rows(format.skip_rows)
        .with_n_rows(n_rows)
        .with_infer_schema_length(Some(SCHEMA_INFERENCE_ROWS))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(format.separator)
                .with_truncate_ragged_lines(true),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| SoundDbError::parse_failure(path, e.to_string()))?;

    project(df, options).map_err(|e| match e {
        SoundDbError::Polars(inner) => SoundDbError::parse_failure(path, inner.to_string()),
        other => other,
    })
}

/// Read several delimited files into one DataFrame
///
/// Rows keep the file they came from in a `source_file` column. Files are
/// combined with [`concat_tables`].
pub fn read_tables(
    paths: &[PathBuf],
    format: TableFormat,
    options: &ParseOptions,
) -> Result<DataFrame> {
    let first = paths
        .first()
        .ok_or_else(|| SoundDbError::parse_failure(PathBuf::new(), "no files to read"))?;

    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        let mut df = read_table(path, format, options)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sources = Series::new(SOURCE_FILE_COLUMN.into(), vec![source; df.height()]);
        df.with_column(sources)
            .map_err(|e| SoundDbError::parse_failure(path, e.to_string()))?;
        frames.push(df);
    }

    if frames.len() == 1 {
        return Ok(frames.remove(0));
    }

    concat_tables(frames).map_err(|e| SoundDbError::parse_failure(first, e.to_string()))
}

/// Stack tables row-wise, unioning their columns
///
/// Columns missing from a table are filled with nulls, and a column whose
/// dtype differs between tables is cast to the common supertype (an hour of
/// whole-number levels read as `Int64` joins the `Float64` hours).
pub fn concat_tables(frames: Vec<DataFrame>) -> PolarsResult<DataFrame> {
    let lazy_frames: Vec<LazyFrame> = frames.into_iter().map(|df| df.lazy()).collect();
    concat_lf_diagonal(
        lazy_frames,
        UnionArgs {
            rechunk: true,
            to_supertypes: true,
            ..Default::default()
        },
    )?
    .collect()
}

/// Keep only the columns listed in the `columns` option
fn project(df: DataFrame, options: &ParseOptions) -> Result<DataFrame> {
    match options.get_list("columns") {
        Some(columns) if !columns.is_empty() => Ok(df.select(columns)?),
        _ => Ok(df),
    }
}

/// Parser for data types stored as a single delimited file per site
pub fn parse_single(
    format: TableFormat,
) -> impl Fn(&Resolved, &ParseOptions) -> Result<SiteData> + Send + Sync + 'static {
    move |resolved, options| match resolved {
        Resolved::File(path) => Ok(SiteData::Table(read_table(path, format, options)?)),
        Resolved::Files(paths) => Ok(SiteData::Table(read_tables(paths, format, options)?)),
    }
}

/// Parser for data types split over many files per site
pub fn parse_many(
    format: TableFormat,
) -> impl Fn(&Resolved, &ParseOptions) -> Result<SiteData> + Send + Sync + 'static {
    move |resolved, options| {
        Ok(SiteData::Table(read_tables(
            resolved.paths(),
            format,
            options,
        )?))
    }
}
