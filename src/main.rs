mod args;
mod rla;

use clap::Parser;
use env_logger::Env;
use log::debug;
use snafu::prelude::*;

use crate::args::Args;
use crate::rla::RlaResult;

fn run(args: &Args) -> RlaResult<()> {
    match args.input_type.as_deref() {
        None | Some("audit") => {
            let config_path = match &args.config {
                Some(p) => p,
                None => whatever!("The audit description must be provided with --config"),
            };
            rla::run_audit(config_path, &args.reference, &args.out, args.risk_limit)
        }
        Some("ballots") => {
            let input_path = match &args.input {
                Some(p) => p,
                None => whatever!("The ballots must be provided with --input"),
            };
            rla::run_interpretation(input_path, &args.out)
        }
        Some(x) => whatever!("Unknown input type {:?}", x),
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();
    debug!("main: args: {:?}", args);

    if let Err(e) = run(&args) {
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
