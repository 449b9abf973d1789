//! Lazy per-site iteration with failure isolation

use super::{AccessOptions, Accessor};
use crate::error::{Result, SoundDbError};
use crate::index::DirectoryIndex;
use crate::models::{Resolved, SiteData, SiteKey};
use tracing::warn;

/// One successfully read site
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub key: SiteKey,
    pub data: SiteData,
}

/// A site that was requested but could not be read
#[derive(Debug)]
pub struct SkippedSite {
    /// The identifier as given by the caller
    pub site: String,
    pub error: SoundDbError,
}

/// Result of attempting one site
///
/// A skipped site is already recorded in the iterator's skip log.
#[derive(Debug)]
pub enum SiteOutcome<'a> {
    Loaded(SiteRecord),
    Skipped(&'a SkippedSite),
}

/// Iterator over sites that were read successfully
///
/// Failed sites are recorded and available through [`SiteIter::skipped`].
/// Iteration ends early once the cancellation token is cancelled; check
/// [`SiteIter::interrupted`] or call [`SiteIter::into_result`] afterwards.
pub struct SiteIter<'a, I> {
    accessor: &'a Accessor,
    index: &'a DirectoryIndex,
    sites: I,
    options: &'a AccessOptions,
    skipped: Vec<SkippedSite>,
    interrupted: bool,
}

impl<'a, I, S> SiteIter<'a, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    pub(super) fn new(
        accessor: &'a Accessor,
        index: &'a DirectoryIndex,
        sites: I,
        options: &'a AccessOptions,
    ) -> Self {
        Self {
            accessor,
            index,
            sites,
            options,
            skipped: Vec::new(),
            interrupted: false,
        }
    }

    /// Attempt the next site, reporting failures instead of skipping them
    ///
    /// Failures are logged (unless quiet) and appended to the skip log.
    /// Returns `None` when the input is exhausted or an interrupt was seen.
    pub fn next_outcome(&mut self) -> Option<SiteOutcome<'_>> {
        if self.interrupted {
            return None;
        }
        if self.options.interrupted() {
            self.interrupted = true;
            return None;
        }

        let site = self.sites.next()?;
        let site = site.as_ref();

        match self.read_site(site) {
            Ok(record) => Some(SiteOutcome::Loaded(record)),
            Err(e) if e.is_fatal() => {
                self.interrupted = true;
                None
            }
            Err(error) => {
                if !self.options.quiet {
                    warn!("{}: skipping {}: {}", self.accessor.name(), site, error);
                }
                self.skipped.push(SkippedSite {
                    site: site.to_string(),
                    error,
                });
                self.skipped.last().map(SiteOutcome::Skipped)
            }
        }
    }

    fn read_site(&self, site: &str) -> Result<SiteRecord> {
        let (directory, key) = self.index.lookup_id(site)?;
        let data = self
            .accessor
            .load(&directory, &key, &self.options.parse)?;
        Ok(SiteRecord { key, data })
    }

    /// Sites skipped so far
    pub fn skipped(&self) -> &[SkippedSite] {
        &self.skipped
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Finish iteration, returning the skip log or `Interrupted`
    pub fn into_result(self) -> Result<Vec<SkippedSite>> {
        if self.interrupted {
            return Err(SoundDbError::Interrupted {
                reason: format!(
                    "stopped while reading '{}' after user interrupt",
                    self.accessor.name()
                ),
            });
        }
        Ok(self.skipped)
    }
}

impl<I, S> Iterator for SiteIter<'_, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = SiteRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let SiteOutcome::Loaded(record) = self.next_outcome()? {
                return Some(record);
            }
        }
    }
}

/// Iterator over resolved paths, skipping sites that fail to resolve
///
/// Like [`SiteIter`], iteration ends early once the cancellation token is
/// cancelled and [`PathIter::into_result`] reports it.
pub struct PathIter<'a, I> {
    accessor: &'a Accessor,
    index: &'a DirectoryIndex,
    sites: I,
    options: &'a AccessOptions,
    interrupted: bool,
}

impl<'a, I> PathIter<'a, I> {
    pub(super) fn new(
        accessor: &'a Accessor,
        index: &'a DirectoryIndex,
        sites: I,
        options: &'a AccessOptions,
    ) -> Self {
        Self {
            accessor,
            index,
            sites,
            options,
            interrupted: false,
        }
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Finish iteration, failing with `Interrupted` if it was cut short
    pub fn into_result(self) -> Result<()> {
        if self.interrupted {
            return Err(SoundDbError::Interrupted {
                reason: format!(
                    "stopped while resolving '{}' after user interrupt",
                    self.accessor.name()
                ),
            });
        }
        Ok(())
    }
}

impl<I, S> Iterator for PathIter<'_, I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = (Resolved, SiteKey);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.interrupted {
                return None;
            }
            if self.options.interrupted() {
                self.interrupted = true;
                return None;
            }

            let site = self.sites.next()?;
            let resolved = self
                .index
                .lookup_id(site.as_ref())
                .and_then(|(directory, key)| {
                    self.accessor
                        .resolve(&directory, &key, &self.options.parse)
                        .map(|resolved| (resolved, key))
                });

            if let Ok(found) = resolved {
                return Some(found);
            }
        }
    }
}
