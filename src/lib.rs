//! filegen is a scaffolding toolkit.
//! It scans a directory whose names carry `+placeholder+` tokens and whose `*.tmpl`
//! files carry template source, and synthesizes a standalone generator program that
//! recreates the tree with those values asked for at run time. A small builder API
//! describes generated trees from Rust code as well.

/// Command-line interface module for the filegen binary and applications
pub mod cli;

/// Python source building blocks: indented blocks, string literals, identifiers
pub mod codegen;

/// Free-variable collection for template expressions
pub mod collector;

/// Configuration handling for scanned trees
/// Supports JSON and YAML formats (filegen.json, filegen.yml, filegen.yaml)
pub mod config;

/// Common constants
pub mod constants;

/// Aggregated results of one scan session
pub mod context;

/// Error types and handling for filegen
pub mod error;

/// File and directory ignore patterns
/// Processes .filegenignore files to exclude specific paths
pub mod ignore;

/// Logging setup for the filegen binary and applications
pub mod logger;

/// Placeholder tokens in file and directory names
pub mod names;

/// User input and interaction handling
pub mod prompt;

/// Rendering of the generator program shell
pub mod renderer;

/// Directory scanning and the in-memory mirror tree
pub mod scanner;

/// Generator program synthesis
/// Combines scanning and template translation into one program
pub mod synthesizer;

/// Template and Python expression parsing
pub mod syntax;

/// Translation of parsed templates into generator statements
pub mod walker;

/// In-process tree description
pub mod builder;

/// Writers for described trees: printing, directories, packages
pub mod writer;

/// Command-line wrapper for in-process generators
pub mod app;
