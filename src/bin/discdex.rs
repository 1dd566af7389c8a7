//! discdex CLI Binary
//!
//! Command-line interface for the disc image catalog.

use anyhow::Context;
use clap::Parser;
use discdex::config::ConfigLoader;
use discdex::logging::init_logging;
use discdex::tooling::cli::{Cli, CliContext};
use std::process;

fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = ConfigLoader::load(cli.config.as_deref()).context("Error loading configuration")?;

    let logging = cli.logging_config(&config.logging);
    init_logging(Some(&logging)).context("Error initializing logging")?;

    let context = CliContext::from_config(config).context("Error opening catalog")?;
    Ok(context.execute(&cli.command)?)
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
