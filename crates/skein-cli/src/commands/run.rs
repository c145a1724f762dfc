//! The `run` subcommand: a terminal dialogue player.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use skein_bytecode::{load_program_file, string_table_path};
use skein_markup::{load_string_table_file, StringTable};
use skein_runtime::{
    DialogueHandler, DialogueOption, Line, MemoryVariableStorage, VariableStorage,
    VirtualMachine, VmError, VmResult,
};

pub fn run(program_path: &Path, strings: Option<PathBuf>, start: &str, lang: &str) -> Result<()> {
    let program = load_program_file(program_path)
        .with_context(|| format!("loading program {}", program_path.display()))?;
    let strings_path = strings.unwrap_or_else(|| string_table_path(program_path));
    let table = load_string_table_file(&strings_path, lang)
        .with_context(|| format!("loading string table {}", strings_path.display()))?;

    let vars: Arc<dyn VariableStorage> = Arc::new(MemoryVariableStorage::new());
    let mut vm = VirtualMachine::new(Arc::new(program), vars);
    let mut handler = TerminalHandler { table };
    vm.run(&mut handler, start)?;
    Ok(())
}

/// Plays lines and options on the terminal.
struct TerminalHandler {
    table: StringTable,
}

impl TerminalHandler {
    fn render(&self, line: &Line) -> VmResult<String> {
        self.table
            .render(line)
            .map(|rendered| rendered.text().to_string())
            .map_err(|err| VmError::Handler(err.to_string()))
    }
}

impl DialogueHandler for TerminalHandler {
    fn line(&mut self, line: &Line) -> VmResult {
        println!("{}", self.render(line)?);
        print!("(Press ENTER to continue)");
        let _ = std::io::stdout().flush();
        let mut buf = String::new();
        let _ = std::io::stdin().lock().read_line(&mut buf);
        // Move to the first column, go up a line, and erase it (removing
        // the press-ENTER prompt).
        print!("\r\x1b[A\x1b[2K");
        Ok(())
    }

    fn options(&mut self, options: &[DialogueOption]) -> VmResult<usize> {
        println!("Choose:");
        for option in options {
            let text = self.render(&option.line)?;
            if option.is_available {
                println!("{}: {}", option.id + 1, text);
            } else {
                println!("{}: {} (unavailable)", option.id + 1, text);
            }
        }
        loop {
            print!("Enter the number corresponding to your choice: ");
            let _ = std::io::stdout().flush();
            let mut buf = String::new();
            if std::io::stdin().lock().read_line(&mut buf).is_err() {
                continue;
            }
            match buf.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => continue,
            }
        }
    }
}
