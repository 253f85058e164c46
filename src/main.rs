use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod acquisition;
mod cli;
mod config;
mod documents;
mod error;
mod fits;
mod lock;
mod paths;
mod render;
mod resource;
mod runner;
mod templates;
mod workflow;

use cli::RunArgs;

fn main() -> ExitCode {
    let args = RunArgs::parse();
    init_tracing(args.verbose);

    // The pipeline owns the working directory; it is gone by the time an
    // error comes back here, so exiting with the mapped code is safe.
    match workflow::run_pipeline(&args) {
        Ok(summary) => {
            if args.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(text) => println!("{text}"),
                    Err(err) => {
                        tracing::error!(error = %err, "failed to serialize run summary");
                        return ExitCode::from(error::EXIT_INPUT_ERROR);
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(error::exit_code_for(&err))
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}
