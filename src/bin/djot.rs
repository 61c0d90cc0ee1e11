//! Djot CLI entry point: parse the arguments, run the pipeline, and turn
//! any I/O failure into a one-line stderr message and a nonzero exit.

use clap::Parser;
use djotters::cli::{run, Args};

fn main() {
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("djot: {err}");
        std::process::exit(1);
    }
}
