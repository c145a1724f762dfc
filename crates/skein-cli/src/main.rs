//! skein command line tool
//!
//! Plays compiled dialogue programs in the terminal and disassembles them
//! for inspection.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "skein")]
#[command(about = "Dialogue runtime tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a compiled program as a text game in the terminal
    Run {
        /// Compiled program file (e.g. Example.yarnc)
        #[arg(long)]
        program: PathBuf,
        /// String table file; defaults to the program's -Lines.csv sibling
        #[arg(long)]
        strings: Option<PathBuf>,
        /// Name of the node to start from
        #[arg(long, default_value = "Start")]
        start: String,
        /// BCP 47 language tag for rendering
        #[arg(long, default_value = "en")]
        lang: String,
    },

    /// Disassemble a compiled program
    Dump {
        /// Compiled program file
        program: PathBuf,
    },

    /// Statically verify a compiled program
    Verify {
        /// Compiled program file
        program: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "trace" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            program,
            strings,
            start,
            lang,
        } => commands::run::run(&program, strings, &start, &lang),
        Commands::Dump { program } => commands::dump::dump(&program),
        Commands::Verify { program } => commands::verify::verify(&program),
    }
}
