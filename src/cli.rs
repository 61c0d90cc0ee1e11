//! CLI argument parsing and the file I/O this binary performs around the
//! pure parse/render pipeline. `run` is the only place that touches the
//! filesystem; everything it calls into is a pure function over strings.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use clap::Parser;

use crate::error::DjotError;

#[derive(Parser, Debug)]
#[command(version, about = "Parse and render Djot documents to HTML", long_about = None)]
pub struct Args {
    /// Input path. Omitted or `-` reads from stdin.
    #[arg(long)]
    pub from: Option<String>,

    /// Output path. Omitted or `-` writes to stdout.
    #[arg(long)]
    pub to: Option<String>,

    /// Allow overwriting an existing output file.
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

fn read_input(from: &Option<String>) -> Result<String, DjotError> {
    match from.as_deref() {
        None | Some("-") | Some("") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).map_err(|_| DjotError::Read("<stdin>".to_string()))?;
            Ok(buf)
        }
        Some(path) => fs::read_to_string(path).map_err(|_| DjotError::Read(path.to_string())),
    }
}

fn write_output(to: &Option<String>, overwrite: bool, rendered: &str) -> Result<(), DjotError> {
    match to.as_deref() {
        None | Some("-") | Some("") => {
            print!("{rendered}");
            io::stdout().flush().map_err(|_| DjotError::Write("<stdout>".to_string()))
        }
        Some(path) => {
            if !overwrite && Path::new(path).exists() {
                return Err(DjotError::OutputExists(path.to_string()));
            }
            fs::write(path, rendered).map_err(|_| DjotError::Write(path.to_string()))
        }
    }
}

/// Read the document named by `args.from`, parse and render it to HTML, and
/// write the result to `args.to`.
pub fn run(args: Args) -> Result<(), DjotError> {
    let document = read_input(&args.from)?;
    let forest = crate::ast::parse(&document);
    let rendered = crate::render::render(&forest, "html");
    write_output(&args.to, args.overwrite, &rendered)
}
