//! Per-file-type parsers
//!
//! A parser turns the resolved path(s) for one site into [`SiteData`].
//! Parsers receive the same [`ParseOptions`] as custom resolvers and must
//! ignore options they do not understand.
//!
//! - [`table`] - delimited text tables read with polars
//! - [`listing`] - plain file listings (audio, photos)

pub mod listing;
pub mod table;

use crate::error::Result;
use crate::models::{ParseOptions, Resolved, SiteData};

pub use listing::list_files;
pub use table::{TableFormat, concat_tables, read_table, read_tables};

/// Parser signature shared by all accessors
pub type ParseFn = dyn Fn(&Resolved, &ParseOptions) -> Result<SiteData> + Send + Sync;
