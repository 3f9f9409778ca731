use std::process::ExitCode;

use clap::Parser;
use pipecheck::cli::{self, Args};

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = pipecheck::logging::init(args.verbose) {
        eprintln!("warning: {:#}", err);
    }

    cli::run(&args)
}
