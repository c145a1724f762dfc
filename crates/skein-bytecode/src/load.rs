//! Loading compiled programs from disk.

use std::path::{Path, PathBuf};

use prost::Message;

use crate::program::Program;

/// Errors arising while loading a compiled program.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The program file could not be read.
    #[error("reading program file: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents are not a valid program message.
    #[error("decoding program: {0}")]
    Decode(#[from] prost::DecodeError),
}

impl Program {
    /// Decodes a program from a compiled `.yarnc` blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Program, LoadError> {
        Ok(Program::decode(bytes)?)
    }
}

/// Reads and decodes a compiled program file.
pub fn load_program_file(path: impl AsRef<Path>) -> Result<Program, LoadError> {
    let bytes = std::fs::read(path)?;
    Program::from_bytes(&bytes)
}

/// The conventional string table path for a program path:
/// `foo/bar.yarnc` becomes `foo/bar-Lines.csv`.
pub fn string_table_path(program_path: impl AsRef<Path>) -> PathBuf {
    sibling(program_path.as_ref(), ".yarnc", "-Lines.csv")
}

/// The conventional metadata table path for a string table path:
/// `foo/bar-Lines.csv` becomes `foo/bar-Metadata.csv`.
pub fn metadata_table_path(table_path: impl AsRef<Path>) -> PathBuf {
    sibling(table_path.as_ref(), "-Lines.csv", "-Metadata.csv")
}

fn sibling(path: &Path, strip: &str, append: &str) -> PathBuf {
    let s = path.to_string_lossy();
    let base = s.strip_suffix(strip).unwrap_or(&s);
    PathBuf::from(format!("{base}{append}"))
}
