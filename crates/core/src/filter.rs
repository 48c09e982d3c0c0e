//! Include/exclude filename filtering
//!
//! Patterns are shell globs (`*`, `?`, `[...]`) matched against the file
//! name only, never the full path. They are compiled with the gitignore
//! matcher, so the gitignore-only forms are rejected up front: a leading `!`
//! (negation), a leading `#` (comment) and any `/` (directory anchoring).
//! Escape a literal leading `!` or `#` with a backslash.

use crate::error::{Result, RotateError};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Outcome of filtering one file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Accepted,
    /// Matched the exclude list (wins over the include list)
    Excluded,
    /// The include list is non-empty and nothing in it matched
    NotIncluded,
}

/// Compiled include and exclude lists
#[derive(Debug, Clone, Default)]
pub struct FilenameFilter {
    include: Option<Gitignore>,
    exclude: Option<Gitignore>,
}

impl FilenameFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: build_matcher(include)?,
            exclude: build_matcher(exclude)?,
        })
    }

    pub fn verdict(&self, file_name: &str) -> FilterVerdict {
        if let Some(ref exclude) = self.exclude {
            if exclude.matched(file_name, false).is_ignore() {
                return FilterVerdict::Excluded;
            }
        }

        if let Some(ref include) = self.include {
            if !include.matched(file_name, false).is_ignore() {
                return FilterVerdict::NotIncluded;
            }
        }

        FilterVerdict::Accepted
    }

    pub fn accepts(&self, file_name: &str) -> bool {
        self.verdict(file_name) == FilterVerdict::Accepted
    }
}

fn build_matcher(patterns: &[String]) -> Result<Option<Gitignore>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GitignoreBuilder::new("");
    for pattern in patterns {
        check_shell_glob(pattern)?;
        builder
            .add_line(None, pattern)
            .map_err(|source| RotateError::InvalidFilenamePattern {
                pattern: pattern.clone(),
                source,
            })?;
    }

    builder
        .build()
        .map(Some)
        .map_err(|source| RotateError::InvalidFilenamePattern {
            pattern: patterns.join(" "),
            source,
        })
}

fn check_shell_glob(pattern: &str) -> Result<()> {
    let reason = if pattern.starts_with('!') {
        "negated patterns are not supported"
    } else if pattern.starts_with('#') {
        "a leading '#' would turn the pattern into a comment"
    } else if pattern.contains('/') {
        "patterns match file names, which never contain '/'"
    } else {
        return Ok(());
    };
    Err(RotateError::UnsupportedFilenamePattern {
        pattern: pattern.to_string(),
        reason,
    })
}
