//! CLI entry point for the wave function collapse tile generator

use clap::Parser;
use log::error;
use std::process::ExitCode;
use wavetile::io::cli::{Cli, FileProcessor};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut processor = FileProcessor::new(cli);
    match processor.process() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
