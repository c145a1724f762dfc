//! The `verify` subcommand: static program validation.

use std::path::Path;

use anyhow::{Context, Result};
use skein_bytecode::{load_program_file, verify_program};

pub fn verify(program_path: &Path) -> Result<()> {
    let program = load_program_file(program_path)
        .with_context(|| format!("loading program {}", program_path.display()))?;
    verify_program(&program)
        .with_context(|| format!("verifying program {}", program_path.display()))?;
    println!(
        "{}: {} nodes, ok",
        program_path.display(),
        program.nodes.len()
    );
    Ok(())
}
