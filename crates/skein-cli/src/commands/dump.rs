//! The `dump` subcommand: program disassembly.

use std::path::Path;

use anyhow::{Context, Result};
use skein_bytecode::{format_program_string, load_program_file};

pub fn dump(program_path: &Path) -> Result<()> {
    let program = load_program_file(program_path)
        .with_context(|| format!("loading program {}", program_path.display()))?;
    print!("{}", format_program_string(&program));
    Ok(())
}
