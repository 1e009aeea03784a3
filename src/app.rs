//! Command-line wrapper for in-process generators.
//!
//! A generator is a function building a [`Filegen`] tree, asking for values through
//! a [`Prompter`]. [`Application::run`] parses the command line and hands the tree
//! to the writer selected by `--mode`.

use std::io;
use std::path::Path;

use log::debug;

use crate::builder::Filegen;
use crate::cli::{get_app_args, AppArgs, Mode};
use crate::error::{default_error_handler, Result};
use crate::logger::init_logger;
use crate::prompt::{DialoguerPrompter, Prompter};
use crate::synthesizer::generate_program;
use crate::writer::{DirectoryMaker, Emitter, PackageMaker, TreePrinter};

pub struct Application {
    prompter: Box<dyn Prompter>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// An application asking on the terminal.
    pub fn new() -> Self {
        Self::with_prompter(Box::new(DialoguerPrompter::new()))
    }

    pub fn with_prompter(prompter: Box<dyn Prompter>) -> Self {
        Self { prompter }
    }

    /// Runs `gen` with the process arguments; errors end the process with status 1.
    pub fn run<F>(&self, gen: F)
    where
        F: FnOnce(&dyn Prompter, &Path) -> Result<Filegen>,
    {
        let args = get_app_args();
        init_logger(args.verbose);
        if let Err(err) = self.run_with(args, gen) {
            default_error_handler(err);
        }
    }

    /// Runs `gen` with already parsed arguments.
    pub fn run_with<F>(&self, args: AppArgs, gen: F) -> Result<()>
    where
        F: FnOnce(&dyn Prompter, &Path) -> Result<Filegen>,
    {
        debug!("Running in {:?} mode for {}", args.mode, args.root.display());
        if args.mode == Mode::Program {
            let report = generate_program(&args.root, &mut io::stdout().lock())?;
            for (path, reason) in report.skipped() {
                debug!("Skipped {}: {reason}", path.display());
            }
            return Ok(());
        }

        let fg = gen(&*self.prompter, &args.root)?;
        let emitter: Box<dyn Emitter> = match args.mode {
            Mode::Files => Box::new(DirectoryMaker),
            Mode::Package => Box::new(PackageMaker),
            Mode::Tree => Box::new(TreePrinter::paths_only()),
            Mode::Print | Mode::Program => Box::new(TreePrinter::default()),
        };
        emitter.emit(fg.root())
    }
}
