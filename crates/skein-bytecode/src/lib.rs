//! Data model for compiled dialogue programs
//!
//! This crate provides the wire-compatible program representation consumed by
//! the virtual machine in `skein-runtime`:
//! - Protobuf message types for programs, nodes, instructions, and operands
//! - File loading for `.yarnc` program blobs
//! - Static verification of decoded programs
//! - Fluent builders for assembling programs in code
//! - A disassembler for human inspection of programs
//!
//! A program is a collection of named nodes. Each node is an ordered list of
//! instructions together with a label table mapping label names to absolute
//! instruction indices within that node.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod builder;
mod debug;
mod load;
mod program;
mod verify;

pub use builder::{NodeBuilder, ProgramBuilder};
pub use debug::{format_instruction, format_program, format_program_string};
pub use load::{
    load_program_file, metadata_table_path, string_table_path, LoadError,
};
pub use program::{operand, Instruction, Node, Opcode, Operand, Program};
pub use verify::{verify_program, VerifyError};
