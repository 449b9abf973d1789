//! Site metadata merged with derived data
//!
//! Two spreadsheets describe the monitoring sites: a hand-maintained
//! metadata table and a derived-data table computed from the recordings.
//! Both are keyed by unit, site and year but disagree on column naming.
//! [`merge_metadata`] brings them into one table:
//!
//! - column names are lowercased
//! - `park` becomes `unit`, `site` becomes `title`, then `code` becomes `site`
//! - whitespace is stripped from string values
//! - rows are full-outer joined on `(unit, site, year)`
//! - where both tables have a column, metadata values win and derived values
//!   fill the gaps
//! - a leading `site_id` column holds `UNITSITEYEAR`
//! - numeric columns holding only 0 and 1 become boolean

use crate::constants::SITE_ID_COLUMN;
use crate::error::{Result, SoundDbError};
use crate::identifier::encode_site_id;
use crate::models::ParseOptions;
use crate::parsers::table::{TableFormat, read_table};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// Join key columns
pub const KEY_COLUMNS: [&str; 3] = ["unit", "site", "year"];

/// Suffix given to derived-data columns that overlap with metadata
const DERIVED_SUFFIX: &str = "_derived";

/// Renames applied in order after lowercasing
const RENAMES: [(&str, &str); 3] = [("park", "unit"), ("site", "title"), ("code", "site")];

/// Read both tables as CSV and merge them
pub fn load_metadata(metadata_csv: &Path, derived_csv: &Path) -> Result<DataFrame> {
    info!(
        "Loading site metadata from {} and {}",
        metadata_csv.display(),
        derived_csv.display()
    );

    let metadata = read_table(metadata_csv, TableFormat::comma(), &ParseOptions::new())?;
    let derived = read_table(derived_csv, TableFormat::comma(), &ParseOptions::new())?;
    merge_metadata(metadata, derived)
}

/// Merge metadata with derived data
pub fn merge_metadata(metadata: DataFrame, derived: DataFrame) -> Result<DataFrame> {
    let metadata = normalize(metadata)?;
    let derived = normalize(derived)?;

    let overlapping: Vec<String> = metadata
        .get_column_names()
        .into_iter()
        .filter(|name| !KEY_COLUMNS.contains(&name.as_str()))
        .filter(|name| derived.column(name.as_str()).is_ok())
        .map(|name| name.to_string())
        .collect();
    debug!("Columns present in both tables: {:?}", overlapping);

    let keys: Vec<Expr> = KEY_COLUMNS.iter().map(|name| col(*name)).collect();
    let joined = metadata
        .lazy()
        .join(
            derived.lazy(),
            keys.clone(),
            keys,
            JoinArgs::new(JoinType::Full)
                .with_coalesce(JoinCoalesce::CoalesceColumns)
                .with_suffix(Some(DERIVED_SUFFIX.into())),
        )
        .with_columns(
            overlapping
                .iter()
                .map(|name| {
                    let derived_name = format!("{}{}", name, DERIVED_SUFFIX);
                    when(col(name.as_str()).is_null())
                        .then(col(derived_name.as_str()))
                        .otherwise(col(name.as_str()))
                        .alias(name.as_str())
                })
                .collect::<Vec<_>>(),
        )
        .collect()?;

    let derived_copies: Vec<String> = overlapping
        .iter()
        .map(|name| format!("{}{}", name, DERIVED_SUFFIX))
        .collect();
    let mut merged = joined.drop_many(derived_copies);

    let ids = site_id_column(&merged)?;
    merged.insert_column(0, ids)?;

    let merged = convert_flag_columns(merged)?;
    info!(
        "Merged metadata: {} sites, {} columns",
        merged.height(),
        merged.width()
    );
    Ok(merged)
}

/// Lowercase, rename, strip whitespace and stringify the join keys
fn normalize(mut df: DataFrame) -> Result<DataFrame> {
    let lowered: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_lowercase())
        .collect();
    df.set_column_names(lowered)?;

    for (from, to) in RENAMES {
        if df.column(from).is_ok() {
            df.rename(from, to.into())?;
        }
    }

    for key in KEY_COLUMNS {
        if df.column(key).is_err() {
            return Err(SoundDbError::configuration(format!(
                "Metadata table has no '{}' column",
                key
            )));
        }
    }

    let string_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|column| column.dtype() == &DataType::String)
        .map(|column| column.name().to_string())
        .collect();
    for name in string_columns {
        let stripped: StringChunked = df
            .column(&name)?
            .str()?
            .into_iter()
            .map(|value| value.map(str::trim))
            .collect();
        df.with_column(stripped.with_name(name.as_str().into()).into_series())?;
    }

    for key in KEY_COLUMNS {
        let as_string = df.column(key)?.cast(&DataType::String)?;
        df.with_column(as_string)?;
    }

    Ok(df)
}

/// `UNITSITEYEAR` for each row, null where the key is incomplete or invalid
fn site_id_column(df: &DataFrame) -> Result<Series> {
    let units = df.column("unit")?.str()?;
    let sites = df.column("site")?.str()?;
    let years = df.column("year")?.str()?;

    let ids: StringChunked = units
        .into_iter()
        .zip(sites)
        .zip(years)
        .map(|((unit, site), year)| match (unit, site, year) {
            (Some(unit), Some(site), Some(year)) => encode_site_id(unit, site, year).ok(),
            _ => None,
        })
        .collect();

    Ok(ids.with_name(SITE_ID_COLUMN.into()).into_series())
}

/// Numeric columns whose non-null values are exactly {0, 1} become boolean
fn convert_flag_columns(mut df: DataFrame) -> Result<DataFrame> {
    let candidates: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|column| is_numeric(column.dtype()))
        .map(|column| column.name().to_string())
        .collect();

    for name in candidates {
        let values = df.column(&name)?.cast(&DataType::Float64)?;
        let seen: BTreeSet<u64> = values
            .f64()?
            .into_iter()
            .flatten()
            .map(f64::to_bits)
            .collect();

        if seen == BTreeSet::from([0f64.to_bits(), 1f64.to_bits()]) {
            debug!("Treating column '{}' as boolean", name);
            let flags = values.cast(&DataType::Boolean)?;
            df.with_column(flags)?;
        }
    }

    Ok(df)
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}
