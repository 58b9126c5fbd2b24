use std::process::ExitCode;

use clap::Parser;

use memerist::cli::{self, CliArgs};
use memerist::logger;

fn main() -> ExitCode {
    logger::init();
    let args = CliArgs::parse();
    cli::run(args)
}
