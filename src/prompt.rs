//! Interactive resolution of variable values.
//! Generators built in-process ask for their values through a [`Prompter`],
//! either on the terminal or from a prepared set of answers.

use crate::error::{Error, Result};
use dialoguer::Input;
use indexmap::IndexMap;

/// Resolves the value of a named variable.
pub trait Prompter {
    /// Returns the value for `name`.
    ///
    /// # Arguments
    /// * `name` - Variable name
    /// * `description` - Text shown instead of the name, if any
    /// * `default` - Value used when no answer is given
    fn resolve(&self, name: &str, description: Option<&str>, default: Option<&str>)
        -> Result<String>;
}

/// Asks on the terminal with dialoguer.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn resolve(
        &self,
        name: &str,
        description: Option<&str>,
        default: Option<&str>,
    ) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(description.unwrap_or(name));
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input
            .interact_text()
            .map_err(|e| Error::PromptError(format!("{name}: {e}")))
    }
}

/// Answers from a fixed map, falling back to the default.
#[derive(Debug, Default, Clone)]
pub struct StaticPrompter {
    answers: IndexMap<String, String>,
}

impl StaticPrompter {
    pub fn new<I, K, V>(answers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            answers: answers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Prompter for StaticPrompter {
    fn resolve(
        &self,
        name: &str,
        _description: Option<&str>,
        default: Option<&str>,
    ) -> Result<String> {
        self.answers
            .get(name)
            .cloned()
            .or_else(|| default.map(str::to_string))
            .ok_or_else(|| Error::PromptError(format!("no value for '{name}'")))
    }
}
