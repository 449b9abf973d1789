//! Accessors: one named data type, located and parsed across many sites
//!
//! An [`Accessor`] binds a parser to a [`PathTemplate`]. Given a
//! [`DirectoryIndex`] it can:
//!
//! - [`Accessor::iter`] - lazily parse each requested site, skipping sites
//!   that fail (best effort)
//! - [`Accessor::collect_all`] - drain `iter` into one combined table, or a
//!   per-site mapping when the results cannot be stacked
//! - [`Accessor::paths`] - resolve file paths without parsing
//! - [`Accessor::access`] - read exactly one site, propagating every error
//!
//! Per-site failures in bulk operations never abort the sequence; the only
//! fatal condition is a cancelled [`CancellationToken`].

mod combine;
mod iter;

#[cfg(test)]
mod tests;

pub use combine::{by_site, combine};
pub use iter::{PathIter, SiteIter, SiteOutcome, SiteRecord, SkippedSite};
pub use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::identifier::{decode_data_dir, decode_site_id};
use crate::index::DirectoryIndex;
use crate::models::{Collected, ParseOptions, Resolved, SiteData, SiteKey, SiteSpecifier};
use crate::parsers::ParseFn;
use crate::resolver::PathTemplate;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Options for bulk operations
#[derive(Debug, Clone)]
pub struct AccessOptions {
    /// Suppress per-site diagnostics
    pub quiet: bool,
    /// Options forwarded to resolvers and parsers
    pub parse: ParseOptions,
    /// Cancelled on user interrupt (Ctrl-C); checked before each site
    pub cancellation_token: Option<CancellationToken>,
}

impl Default for AccessOptions {
    fn default() -> Self {
        Self {
            quiet: true,
            parse: ParseOptions::new(),
            cancellation_token: None,
        }
    }
}

impl AccessOptions {
    pub fn verbose(mut self) -> Self {
        self.quiet = false;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    pub fn with_cancellation_token(mut self, cancellation_token: CancellationToken) -> Self {
        self.cancellation_token = Some(cancellation_token);
        self
    }

    fn interrupted(&self) -> bool {
        self.cancellation_token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// A named binding of parser and path template for one data type
#[derive(Clone)]
pub struct Accessor {
    name: String,
    description: String,
    parser: Arc<ParseFn>,
    template: PathTemplate,
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("name", &self.name)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl Accessor {
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parser: F,
        template: impl Into<PathTemplate>,
    ) -> Self
    where
        F: Fn(&Resolved, &ParseOptions) -> Result<SiteData> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parser: Arc::new(parser),
            template: template.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Resolve this data type's file path(s) within one data directory
    pub fn resolve(
        &self,
        directory: &Path,
        key: &SiteKey,
        options: &ParseOptions,
    ) -> Result<Resolved> {
        self.template.resolve(directory, key, options)
    }

    /// Run the bound parser on already resolved paths
    pub fn parse(&self, resolved: &Resolved, options: &ParseOptions) -> Result<SiteData> {
        (self.parser)(resolved, options)
    }

    /// Resolve and parse one site whose directory is known
    pub fn load(&self, directory: &Path, key: &SiteKey, options: &ParseOptions) -> Result<SiteData> {
        let resolved = self.resolve(directory, key, options)?;
        debug!("{}: parsing {} for {}", self.name, resolved, key);
        self.parse(&resolved, options)
    }

    /// Lazily read each site, in input order, skipping failures
    pub fn iter<'a, I, S>(
        &'a self,
        index: &'a DirectoryIndex,
        sites: I,
        options: &'a AccessOptions,
    ) -> SiteIter<'a, I::IntoIter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SiteIter::new(self, index, sites.into_iter(), options)
    }

    /// Read all sites and stack the results into one table if possible
    ///
    /// Fails only when interrupted.
    pub fn collect_all<I, S>(
        &self,
        index: &DirectoryIndex,
        sites: I,
        options: &AccessOptions,
    ) -> Result<Collected>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.collect_all_with(index, sites, options, |_| {})
    }

    /// [`Accessor::collect_all`], calling `on_outcome` after each site is attempted
    pub fn collect_all_with<I, S, F>(
        &self,
        index: &DirectoryIndex,
        sites: I,
        options: &AccessOptions,
        mut on_outcome: F,
    ) -> Result<Collected>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&SiteOutcome<'_>),
    {
        let mut iter = self.iter(index, sites, options);
        let mut records = Vec::new();
        while let Some(outcome) = iter.next_outcome() {
            on_outcome(&outcome);
            if let SiteOutcome::Loaded(record) = outcome {
                records.push(record);
            }
        }
        iter.into_result()?;
        Ok(combine(by_site(records)))
    }

    /// Lazily resolve each site's path(s) without parsing
    ///
    /// Stops early when cancelled; check [`PathIter::into_result`].
    pub fn paths<'a, I, S>(
        &'a self,
        index: &'a DirectoryIndex,
        sites: I,
        options: &'a AccessOptions,
    ) -> PathIter<'a, I::IntoIter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        PathIter::new(self, index, sites.into_iter(), options)
    }

    /// Read exactly one site; every failure is returned to the caller
    pub fn access(
        &self,
        index: &DirectoryIndex,
        site: &SiteSpecifier,
        options: &ParseOptions,
    ) -> Result<SiteData> {
        let (directory, key) = locate(index, site)?;
        self.load(&directory, &key, options)
    }
}

/// Data directory and key for a single-site specifier
pub fn locate(index: &DirectoryIndex, site: &SiteSpecifier) -> Result<(PathBuf, SiteKey)> {
    match site {
        SiteSpecifier::Id(id) => {
            let key = decode_site_id(id)?;
            let directory = index.lookup(&key)?.to_path_buf();
            Ok((directory, key))
        }
        SiteSpecifier::Directory(directory) => {
            let decoded = decode_data_dir(directory)?;
            Ok((directory.clone(), decoded.key))
        }
        SiteSpecifier::Key(key) => {
            let directory = index.lookup(key)?.to_path_buf();
            Ok((directory, key.clone()))
        }
        SiteSpecifier::DirectoryKey(directory, key) => Ok((directory.clone(), key.clone())),
    }
}
