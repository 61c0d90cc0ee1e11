//! Error handling for the CLI's I/O boundary. Parsing and rendering
//! themselves never fail (malformed input degrades to literal text); the
//! only failures this crate surfaces are reading/writing the filesystem.

/// Unified CLI error type.
#[derive(Debug)]
pub enum DjotError {
    /// Reading the input document failed.
    Read(String),
    /// Writing the rendered output failed.
    Write(String),
    /// `--overwrite false` and the output path already exists.
    OutputExists(String),
}

impl std::fmt::Display for DjotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DjotError::Read(path) => write!(f, "failed to read input: {path}"),
            DjotError::Write(path) => write!(f, "failed to write output: {path}"),
            DjotError::OutputExists(path) => write!(f, "output file already exists: {path}"),
        }
    }
}

impl std::error::Error for DjotError {}
