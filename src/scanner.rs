//! Directory scanning.
//!
//! The scanner walks an existing template tree, mirrors it in memory and feeds
//! every name and template file into the session's [`ScanContext`].

use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use log::{debug, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::collector::TemplateScanner;
use crate::constants::TEMPLATE_SUFFIX;
use crate::context::ScanContext;
use crate::error::{Error, Result};
use crate::names::NameScanner;

/// In-memory mirror of a scanned directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Directory {
        name: String,
        path: PathBuf,
        children: Vec<Entry>,
    },
    File {
        name: String,
        path: PathBuf,
        /// Raw content; template source is kept untranslated.
        content: String,
        is_template: bool,
    },
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Directory { name, .. } | Entry::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Entry::Directory { path, .. } | Entry::File { path, .. } => path,
        }
    }

    pub fn children(&self) -> &[Entry] {
        match self {
            Entry::Directory { children, .. } => children,
            Entry::File { .. } => &[],
        }
    }
}

/// What happened to one scanned path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Directory,
    Template,
    Plain,
    Ignored,
    /// The path could not be read and is missing from the mirror tree.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Per-entry outcomes of a scan session, in visiting order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub entries: Vec<EntryReport>,
}

impl ScanReport {
    fn record(&mut self, path: &Path, outcome: Outcome) {
        self.entries.push(EntryReport {
            path: path.to_path_buf(),
            outcome,
        });
    }

    /// Paths that were skipped, with their reasons.
    pub fn skipped(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            Outcome::Skipped { reason } => Some((e.path.as_path(), reason.as_str())),
            _ => None,
        })
    }

    /// Outcome recorded for `path`, if it was visited.
    pub fn outcome_of(&self, path: &Path) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| &e.outcome)
    }
}

/// Checks if a file name carries the template suffix.
pub fn is_template_file(name: &str) -> bool {
    name.ends_with(TEMPLATE_SUFFIX)
}

/// Walks template trees and aggregates what they need into one scan context.
#[derive(Debug)]
pub struct Scanner {
    context: ScanContext,
    names: NameScanner,
    templates: TemplateScanner,
    ignore: GlobSet,
    report: ScanReport,
}

impl Scanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            context: ScanContext::new(),
            names: NameScanner::new()?,
            templates: TemplateScanner::new(),
            ignore: GlobSet::empty(),
            report: ScanReport::default(),
        })
    }

    /// Uses `ignore` to exclude paths; patterns match paths relative to the scan root.
    pub fn with_ignore(mut self, ignore: GlobSet) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn context(&self) -> &ScanContext {
        &self.context
    }

    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    pub fn into_parts(self) -> (ScanContext, ScanReport) {
        (self.context, self.report)
    }

    /// Scans the tree under `root` and returns its mirror.
    ///
    /// The root's own name is not tokenized. The finished mirror is also appended to
    /// the context's `roots`.
    ///
    /// # Errors
    /// * `Error::ScanRootError` if `root` is not a directory
    pub fn scan<P: AsRef<Path>>(&mut self, root: P) -> Result<&Entry> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::ScanRootError {
                root: root.display().to_string(),
            });
        }
        debug!("Scanning {}", root.display());

        let children = self.branch_directory(root, root)?;
        self.report.record(root, Outcome::Directory);
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.context.roots.push(Entry::Directory {
            name,
            path: root.to_path_buf(),
            children,
        });

        let last = self.context.roots.len() - 1;
        Ok(&self.context.roots[last])
    }

    fn is_ignored(&self, root: &Path, path: &Path) -> bool {
        path.strip_prefix(root)
            .map(|relative| self.ignore.is_match(relative))
            .unwrap_or(false)
    }

    fn branch_directory(&mut self, root: &Path, dir: &Path) -> Result<Vec<Entry>> {
        let mut children = Vec::new();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for item in walker {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    warn!("Skipping {}: {e}", path.display());
                    self.report.record(&path, Outcome::Skipped { reason: e.to_string() });
                    continue;
                }
            };
            let path = item.path();
            if self.is_ignored(root, path) {
                debug!("Ignoring {}", path.display());
                self.report.record(path, Outcome::Ignored);
                continue;
            }

            let name = item.file_name().to_string_lossy().into_owned();
            let tokens = self.names.scan(&name, &mut self.context);
            debug!("{} -> tokens {:?}", path.display(), tokens);

            if item.file_type().is_dir() {
                let subtree = self.branch_directory(root, path)?;
                self.report.record(path, Outcome::Directory);
                children.push(Entry::Directory {
                    name,
                    path: path.to_path_buf(),
                    children: subtree,
                });
            } else if let Some(entry) = self.scan_file(name, path)? {
                children.push(entry);
            }
        }
        Ok(children)
    }

    fn scan_file(&mut self, name: String, path: &Path) -> Result<Option<Entry>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                self.report.record(path, Outcome::Skipped { reason: e.to_string() });
                return Ok(None);
            }
        };

        let is_template = is_template_file(&name);
        if is_template {
            if let Err(e) = self.templates.scan(&content, &mut self.context) {
                warn!("Skipping template {}: {e}", path.display());
                self.report.record(path, Outcome::Skipped { reason: e.to_string() });
                return Ok(None);
            }
            self.report.record(path, Outcome::Template);
        } else {
            self.report.record(path, Outcome::Plain);
        }

        Ok(Some(Entry::File {
            name,
            path: path.to_path_buf(),
            content,
            is_template,
        }))
    }
}
