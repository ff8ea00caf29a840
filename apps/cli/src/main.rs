//! texbuilder CLI — assemble multi-file LaTeX projects.
//!
//! Wraps every section folder with its macros and subsections and writes a
//! single `compiled.tex` ready for the typesetting toolchain.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
