//! filegen's command-line entry point.
//! Scans a template tree and writes the generator program for it.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;
use filegen::{
    cli::{get_args, Args},
    logger::init_logger,
    synthesizer::generate_program,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let report = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            let report = generate_program(&args.root, &mut out)?;
            out.flush()?;
            report
        }
        None => generate_program(&args.root, &mut io::stdout().lock())?,
    };

    if args.report {
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }
    if let Some(path) = &args.output {
        log::info!("Generator program written to {}", path.display());
    }
    Ok(())
}
