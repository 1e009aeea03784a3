//! Command-line interface implementation for filegen.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#;

/// Command-line arguments of the `filegen` binary.
#[derive(Parser, Debug)]
#[command(author, version, about = "filegen: turn a template tree into a generator program", long_about = None)]
pub struct Args {
    /// Directory whose names and *.tmpl files describe the tree to generate
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Write the generated program to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the scan report as JSON to stderr
    #[arg(long)]
    pub report: bool,
}

/// What [`crate::app::Application`] does with a described tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Create directories and files under ROOT
    Files,
    /// Like `files`, with a package marker in every directory
    Package,
    /// Print the paths of the tree
    Tree,
    /// Scan ROOT and print a generator program for it
    Program,
    /// Print the paths of the tree with a preview of every file
    #[default]
    Print,
}

/// Command-line arguments of programs built on [`crate::app::Application`].
#[derive(Parser, Debug)]
#[command(about = "Generate a file tree", long_about = None)]
pub struct AppArgs {
    #[arg(long, value_enum, default_value_t = Mode::Print)]
    pub mode: Mode,

    /// Output root (the scanned directory in `program` mode)
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_or_help<P: Parser + CommandFactory>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = P::command().help_template(HELP_TEMPLATE).print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    parse_or_help()
}

/// Parses the command line of an [`crate::app::Application`].
pub fn get_app_args() -> AppArgs {
    parse_or_help()
}
