//! Virtual machine for compiled dialogue programs
//!
//! This crate executes the bytecode model from `skein-bytecode`:
//! - Dynamically typed values with target-directed conversions
//! - Concurrency-safe variable storage
//! - A function library with registration-time signatures
//! - A stack machine with a node-scoped label/jump model
//! - A cooperative handshake with the embedding application, delivered
//!   through the [`DialogueHandler`] trait
//! - An async adapter that pauses the machine at every event until the
//!   embedder continues it
//!
//! The machine is single-threaded and synchronous: it suspends only inside
//! handler callbacks. Run it on a dedicated thread with [`AsyncAdapter`] as
//! the handler to get event-then-continue semantics instead.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod async_adapter;
mod builtins;
mod convert;
mod dialogue;
mod error;
mod funcs;
mod value;
mod vars;
mod vm;

pub use async_adapter::{AdapterState, AsyncAdapter};
pub use convert::operand_to_int;
pub use dialogue::{
    AsyncDialogueHandler, DialogueHandler, DialogueOption, Line, NoopAsyncDialogueHandler,
    NoopDialogueHandler,
};
pub use error::{VmError, VmResult};
pub use funcs::{FuncMap, Function, ParamKind};
pub use value::Value;
pub use vars::{MemoryVariableStorage, VariableStorage};
pub use vm::VirtualMachine;

/// The variable name prefix used to record node visits.
///
/// `visited("x")` and `visited_count("x")` read the variable
/// `$Yarn.Internal.Visiting.x`. Compiled programs that track visits write
/// these variables themselves; the prefix must not change or those programs
/// stop working.
pub const VISIT_VARIABLE_PREFIX: &str = "$Yarn.Internal.Visiting.";
