//! Aggregated results of one scan session.

use indexmap::{IndexMap, IndexSet};

use crate::scanner::Entry;

/// State shared by the scanning stages of one session.
///
/// A `Scanner` owns exactly one context and passes it by reference to the name and
/// template scanners; it must not be shared between concurrent scans.
#[derive(Debug, Default)]
pub struct ScanContext {
    /// Every variable name found in names and template expressions. Only grows.
    pub identifiers: IndexSet<String>,
    /// Exact scanned name to the placeholder tokens it carries, in order.
    pub name_tokens: IndexMap<String, Vec<String>>,
    /// Source of every template expression, in document order, with duplicates.
    pub expression_sources: Vec<String>,
    /// One mirror tree per `Scanner::scan` call.
    pub roots: Vec<Entry>,
}

impl ScanContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens recorded for `name`; empty when the name was never scanned.
    pub fn tokens_of(&self, name: &str) -> &[String] {
        self.name_tokens.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
