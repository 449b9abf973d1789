//! Stacking per-site results into one table

use super::SiteRecord;
use crate::constants::{ROW_COLUMN, SITE_ID_COLUMN};
use crate::models::{Collected, SiteData, SiteKey};
use crate::parsers::concat_tables;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Key each record by site, in first-seen order
///
/// A site read twice keeps its position and takes the later data.
pub fn by_site<I>(records: I) -> Vec<(SiteKey, SiteData)>
where
    I: IntoIterator<Item = SiteRecord>,
{
    let mut results: Vec<(SiteKey, SiteData)> = Vec::new();
    let mut positions: HashMap<SiteKey, usize> = HashMap::new();
    for record in records {
        match positions.get(&record.key) {
            Some(&position) => results[position].1 = record.data,
            None => {
                positions.insert(record.key.clone(), results.len());
                results.push((record.key, record.data));
            }
        }
    }
    results
}

/// Stack per-site tables into one, led by `site_id` and `row` columns
///
/// Tables are stacked with [`concat_tables`], so differing columns and
/// int/float mismatches are unified. Falls back to the per-site results, in
/// input order, if any result is a file listing or a column cannot be cast
/// to a common type.
pub fn combine(results: Vec<(SiteKey, SiteData)>) -> Collected {
    if results.is_empty() {
        return Collected::BySite(results);
    }

    match stack(&results) {
        Ok(df) => Collected::Table(df),
        Err(e) => {
            debug!("Returning per-site results: {}", e);
            Collected::BySite(results)
        }
    }
}

fn stack(results: &[(SiteKey, SiteData)]) -> PolarsResult<DataFrame> {
    let mut tagged = Vec::with_capacity(results.len());

    for (key, data) in results {
        let df = match data {
            SiteData::Table(df) => df,
            SiteData::Files(_) => {
                return Err(PolarsError::InvalidOperation(
                    format!("{} is a file listing", key).into(),
                ));
            }
        };
        tagged.push(tag(df, key)?);
    }

    concat_tables(tagged)
}

/// Prefix a site's table with its identifier and original row index
fn tag(df: &DataFrame, key: &SiteKey) -> PolarsResult<DataFrame> {
    let mut tagged = df.with_row_index(ROW_COLUMN.into(), None)?;
    let ids = Series::new(SITE_ID_COLUMN.into(), vec![key.site_id(); df.height()]);
    tagged.insert_column(0, ids)?;
    Ok(tagged)
}
