//! compose-graph CLI entry point.
//!
//! Parses arguments, sets up logging, runs the render, and converts any
//! failure into a user-friendly error before exiting non-zero.

use anyhow::Result;
use clap::Parser;
use compose_graph::cli::Cli;
use compose_graph::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
