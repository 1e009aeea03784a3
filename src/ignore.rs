//! File and directory ignore pattern handling for scanned trees.
//! This module processes .filegenignore files to exclude specific paths
//! from scanning, similar to .gitignore functionality.

use crate::constants::{DEFAULT_IGNORE_PATTERNS, IGNORE_FILE};
use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use std::{fs::read_to_string, path::Path};

fn add_pattern(builder: &mut GlobSetBuilder, pattern: &str) -> Result<()> {
    builder.add(Glob::new(pattern).map_err(|e| {
        Error::IgnoreError(format!("{IGNORE_FILE} loading failed: {e}"))
    })?);
    Ok(())
}

/// Reads the .filegenignore file of a scan root into a set of glob patterns.
///
/// # Arguments
/// * `root` - Directory that is about to be scanned
///
/// # Returns
/// * `Result<GlobSet>` - Compiled patterns, matched against paths relative to `root`
///
/// # Notes
/// - The default patterns (VCS metadata, the ignore file, config files) always apply
/// - Each non-empty line that does not start with `#` is a separate glob pattern
/// - Invalid patterns result in an IgnoreError
///
/// # Example
/// ```ignore
/// # Contents of .filegenignore:
/// *.pyc
/// __pycache__
/// ```
pub fn parse_ignore_file<P: AsRef<Path>>(root: P) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in DEFAULT_IGNORE_PATTERNS {
        add_pattern(&mut builder, pattern)?;
    }

    let ignore_path = root.as_ref().join(IGNORE_FILE);
    if let Ok(contents) = read_to_string(&ignore_path) {
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            add_pattern(&mut builder, line)?;
        }
    } else {
        debug!("{IGNORE_FILE} does not exist");
    }

    builder
        .build()
        .map_err(|e| Error::IgnoreError(format!("{IGNORE_FILE} loading failed: {e}")))
}
