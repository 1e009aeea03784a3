//! Placeholder tokens in file and directory names.
//!
//! A name such as `+package+_+module+.py` carries the tokens `package` and `module`.
//! Tokens are delimited by `+` on both sides and never nest.

use regex::Regex;

use crate::constants::TOKEN_PATTERN;
use crate::context::ScanContext;
use crate::error::Result;

/// A piece of a name: literal text or a placeholder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart<'a> {
    Literal(&'a str),
    Token(&'a str),
}

/// Extracts placeholder tokens from names.
#[derive(Debug, Clone)]
pub struct NameScanner {
    rx: Regex,
}

impl NameScanner {
    /// Creates a scanner for the `+token+` syntax.
    pub fn new() -> Result<Self> {
        Self::with_pattern(TOKEN_PATTERN)
    }

    /// Creates a scanner from a pattern whose first group captures the token.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        Ok(Self {
            rx: Regex::new(pattern)?,
        })
    }

    /// Extracts the tokens of `name` left to right and records them in `context`.
    ///
    /// Every token joins the global identifier set; the ordered list, duplicates
    /// included, is stored under the exact `name`.
    pub fn scan(&self, name: &str, context: &mut ScanContext) -> Vec<String> {
        let tokens: Vec<String> = self
            .rx
            .captures_iter(name)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect();
        context.identifiers.extend(tokens.iter().cloned());
        context.name_tokens.insert(name.to_string(), tokens.clone());
        tokens
    }

    /// Splits `name` into literal text and tokens, in order.
    pub fn split<'a>(&self, name: &'a str) -> Vec<NamePart<'a>> {
        let mut parts = Vec::new();
        let mut last = 0;
        for cap in self.rx.captures_iter(name) {
            let (Some(whole), Some(token)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            if whole.start() > last {
                parts.push(NamePart::Literal(&name[last..whole.start()]));
            }
            parts.push(NamePart::Token(token.as_str()));
            last = whole.end();
        }
        if last < name.len() {
            parts.push(NamePart::Literal(&name[last..]));
        }
        parts
    }
}
