//! Configuration handling for scanned template trees.
//! An optional `filegen.json`, `filegen.yml` or `filegen.yaml` in the scan root
//! describes how synthesized programs should ask for each variable.

use crate::constants::CONFIG_FILES;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// How a variable is presented when its value is asked for.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Variable {
    /// Prompt text shown instead of the bare variable name.
    #[serde(default)]
    pub description: Option<String>,
    /// Value used when the answer is left empty.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl Variable {
    /// The default rendered as text; scalars only.
    pub fn default_text(&self) -> Option<String> {
        match self.default.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Scan-root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub variables: IndexMap<String, Variable>,
}

impl Config {
    /// Settings for `name`, if configured.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }
}

/// Loads configuration content from a directory, trying multiple file formats.
///
/// # Arguments
/// * `dir` - Directory that may contain a configuration file
/// * `config_files` - List of configuration files to try
///
/// # Returns
/// * `Result<Option<String>>` - Contents of the first found configuration file
pub fn load_config<P: AsRef<Path>>(dir: P, config_files: &[&str]) -> Result<Option<String>> {
    for file in config_files {
        let config_path = dir.as_ref().join(file);
        if config_path.exists() {
            debug!("Loading configuration from {}", config_path.display());
            return Ok(Some(std::fs::read_to_string(&config_path)?));
        }
    }
    debug!("No configuration file found (tried: {})", config_files.join(", "));
    Ok(None)
}

/// Parses configuration content, trying JSON first and YAML second.
///
/// # Errors
/// * `Error::ConfigError` if the content is neither valid JSON nor valid YAML,
///   or does not match the expected schema
pub fn parse_config(content: &str) -> Result<Config> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let raw: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration format: {e}")))?,
    };
    if raw.is_null() {
        return Ok(Config::default());
    }
    serde_json::from_value(raw).map_err(|e| Error::ConfigError(format!("Invalid schema: {e}")))
}

/// Returns the configuration of a scan root; a missing file yields the default.
pub fn get_config<P: AsRef<Path>>(dir: P) -> Result<Config> {
    match load_config(dir, &CONFIG_FILES)? {
        Some(content) => parse_config(&content),
        None => Ok(Config::default()),
    }
}
