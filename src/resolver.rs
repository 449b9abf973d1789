//! Path resolution from templates to concrete files
//!
//! A path template is relative to a site's data directory and may contain
//! `{unit}`, `{site}` and `{year}` placeholders. Templates containing `*`
//! are globbed and yield a sorted, possibly empty, list of matches; plain
//! templates must name an existing file. Data types whose location cannot
//! be expressed as a substitution supply a resolver function instead.

use crate::constants::WILDCARD;
use crate::error::{Result, SoundDbError};
use crate::models::{ParseOptions, Resolved, SiteKey};
use glob::{MatchOptions, Pattern};
use std::fmt;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Custom resolver: data directory, site key and options to path(s)
pub type ResolveFn = dyn Fn(&Path, &SiteKey, &ParseOptions) -> Result<Resolved> + Send + Sync;

/// Where one data type lives within a data directory
#[derive(Clone)]
pub enum PathTemplate {
    /// Format pattern relative to the data directory
    Pattern(String),
    /// Function computing the path(s) for a site
    Custom(Arc<ResolveFn>),
}

impl fmt::Debug for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathTemplate::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            PathTemplate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathTemplate::Pattern(pattern) => f.write_str(pattern),
            PathTemplate::Custom(_) => f.write_str("<custom resolver>"),
        }
    }
}

impl From<&str> for PathTemplate {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

impl From<String> for PathTemplate {
    fn from(pattern: String) -> Self {
        Self::Pattern(pattern)
    }
}

impl PathTemplate {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }

    pub fn custom<F>(resolver: F) -> Self
    where
        F: Fn(&Path, &SiteKey, &ParseOptions) -> Result<Resolved> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(resolver))
    }

    /// Resolve this template for one site
    pub fn resolve(
        &self,
        directory: &Path,
        key: &SiteKey,
        options: &ParseOptions,
    ) -> Result<Resolved> {
        match self {
            PathTemplate::Pattern(pattern) => resolve(directory, key, pattern),
            PathTemplate::Custom(resolver) => resolver(directory, key, options),
        }
    }
}

/// Substitute `{unit}`, `{site}` and `{year}` into a template
///
/// `{{` and `}}` produce literal braces; any other placeholder is an error.
pub fn fill_template(template: &str, key: &SiteKey) -> Result<String> {
    let mut filled = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                filled.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(SoundDbError::invalid_template(
                                template,
                                "unterminated placeholder",
                            ));
                        }
                    }
                }
                match name.as_str() {
                    "unit" => filled.push_str(&key.unit),
                    "site" => filled.push_str(&key.site),
                    "year" => filled.push_str(&key.year),
                    other => {
                        return Err(SoundDbError::invalid_template(
                            template,
                            format!("unknown placeholder '{{{}}}'", other),
                        ));
                    }
                }
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                filled.push('}');
            }
            '}' => {
                return Err(SoundDbError::invalid_template(
                    template,
                    "single '}' encountered",
                ));
            }
            _ => filled.push(c),
        }
    }

    Ok(filled)
}

/// Resolve a template against one site's data directory
pub fn resolve(directory: &Path, key: &SiteKey, template: &str) -> Result<Resolved> {
    let relative = fill_template(template, key)?;

    if relative.contains(WILDCARD) {
        let matches = glob_sorted(directory, &relative)?;
        debug!(
            "Resolved {} for {} to {} file(s)",
            relative,
            key,
            matches.len()
        );
        return Ok(Resolved::Files(matches));
    }

    let path = directory.join(&relative);
    if !path.exists() {
        return Err(SoundDbError::FileNotFound { path });
    }

    debug!("Resolved {} for {} to {}", relative, key, path.display());
    Ok(Resolved::File(path))
}

/// Glob `pattern` beneath `directory`, returning sorted matches
///
/// The directory itself is matched literally; only `pattern` is treated as
/// a glob. `*` does not cross path separators or match hidden files.
pub fn glob_sorted(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let dir_str = directory.to_str().ok_or_else(|| {
        SoundDbError::invalid_template(pattern, "data directory path is not valid UTF-8")
    })?;

    let full_pattern = format!(
        "{}{}{}",
        Pattern::escape(dir_str.trim_end_matches(['/', '\\'])),
        MAIN_SEPARATOR,
        pattern
    );

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let mut matches = Vec::new();
    for entry in glob::glob_with(&full_pattern, options)? {
        match entry {
            Ok(path) => matches.push(path),
            Err(e) => debug!("Skipping unreadable glob match: {}", e),
        }
    }
    matches.sort();
    Ok(matches)
}
