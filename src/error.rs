//! Error handling for the filegen toolkit.
//! Defines custom error types and results used throughout the crate.

use std::io;
use thiserror::Error;

/// Custom error types for filegen operations.
///
/// This enum represents all possible errors that can occur while scanning
/// template trees, translating templates and materializing generated files.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// A template file could not be parsed.
    #[error("Template error at line {line}: {message}.")]
    TemplateError { line: usize, message: String },

    /// A template file failed to parse; wraps the error with the file it came from.
    #[error("Failed to scan template '{path}': {source}")]
    TemplateFileError {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// An embedded expression is not valid expression syntax.
    #[error("Expression error in '{source_text}': {message}.")]
    ExpressionError { source_text: String, message: String },

    /// Control lines of a template do not open and close in pairs.
    #[error("Unbalanced control block: {0}.")]
    UnbalancedBlockError(String),

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// Represents errors in processing .filegenignore files
    #[error("Ignore file error: {0}.")]
    IgnoreError(String),

    /// A built-in or configured regular expression failed to compile.
    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    /// Interactive value resolution failed or had no answer.
    #[error("Prompt error: {0}.")]
    PromptError(String),

    /// The scan root is missing or is not a directory.
    #[error("Scan root '{root}' is not a directory.")]
    ScanRootError { root: String },

    /// Rendering the program shell failed.
    #[error("Render error: {0}")]
    MinijinjaError(#[from] minijinja::Error),

    /// Writing into an in-memory file failed.
    #[error("Format error: {0}.")]
    FormatError(#[from] std::fmt::Error),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
