//! Error types for the virtual machine.

use crate::async_adapter::AdapterState;

/// VM execution result.
pub type VmResult<T = ()> = Result<T, VmError>;

/// Errors surfaced by the virtual machine and its adapters.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// The program is missing or has no nodes.
    #[error("missing or empty program")]
    MissingProgram,

    /// A node name was not found in the program.
    #[error("node {0:?} not found")]
    NodeNotFound(String),

    /// A jump target was not in the current node's label table.
    #[error("label {label:?} not found in node {node:?}")]
    LabelNotFound {
        /// The missing label.
        label: String,
        /// The node whose label table was searched.
        node: String,
    },

    /// The program popped or peeked an empty stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// A stack value or operand had the wrong type.
    #[error("wrong type [{got} != {want}]")]
    WrongType {
        /// The type that was required.
        want: &'static str,
        /// The type that was found.
        got: &'static str,
    },

    /// A value could not be converted to the requested type.
    #[error("value of type {from} not convertible to {to}")]
    NotConvertible {
        /// The source type name.
        from: &'static str,
        /// The conversion target.
        to: &'static str,
    },

    /// An instruction requires an operand that was absent or empty.
    #[error("nil operand")]
    NilOperand,

    /// An instruction carried an opcode outside the instruction set.
    #[error("invalid opcode {0}")]
    InvalidOpcode(i32),

    /// The program called a function that is not in the library.
    #[error("function {0:?} not found")]
    FunctionNotFound(String),

    /// The program called a function with the wrong number or types of
    /// arguments.
    #[error("arg mismatch: {0}")]
    FunctionArgMismatch(String),

    /// SHOW_OPTIONS ran with an empty options buffer.
    #[error("no options were added")]
    NoOptions,

    /// The handler chose an option outside the delivered batch.
    #[error("selected option {index} out of bounds [0, {count})")]
    InvalidOption {
        /// The chosen index.
        index: usize,
        /// The number of options delivered.
        count: usize,
    },

    /// The async adapter was asked for a transition its current state does
    /// not allow.
    #[error("VM is {got}, so cannot transition from {want} to {next}")]
    StateMismatch {
        /// The state the adapter was actually in.
        got: AdapterState,
        /// The state the transition requires.
        want: AdapterState,
        /// The state the transition would have produced.
        next: AdapterState,
    },

    /// The async adapter cannot stop the machine because it already
    /// stopped.
    #[error("VM already stopped or stopping")]
    AlreadyStopped,

    /// Clean-stop sentinel. Ends the run without being a failure; node and
    /// dialogue completion events still fire. Handlers may return it to
    /// stop the machine the same way the STOP instruction does.
    #[error("stop")]
    Stop,

    /// An error from deeper in the machine, wrapped with the node, program
    /// counter, and instruction where it happened.
    #[error("{node} {pc:06} {instruction}: {source}")]
    Trace {
        /// The node that was executing.
        node: String,
        /// The program counter within the node.
        pc: usize,
        /// The disassembled instruction.
        instruction: String,
        /// The underlying error.
        source: Box<VmError>,
    },

    /// A failure originating in the embedder's handler.
    #[error("handler: {0}")]
    Handler(String),
}

impl VmError {
    /// Whether this error is the clean-stop sentinel, seen through any
    /// [`VmError::Trace`] context wrapping.
    pub fn is_stop(&self) -> bool {
        match self {
            VmError::Stop => true,
            VmError::Trace { source, .. } => source.is_stop(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_stop_sees_through_context() {
        assert!(VmError::Stop.is_stop());
        let wrapped = VmError::Trace {
            node: "Start".to_string(),
            pc: 3,
            instruction: "STOP".to_string(),
            source: Box::new(VmError::Stop),
        };
        assert!(wrapped.is_stop());
        assert!(!VmError::StackUnderflow.is_stop());
    }

    #[test]
    fn test_trace_display_includes_location() {
        let err = VmError::Trace {
            node: "Start".to_string(),
            pc: 12,
            instruction: "POP".to_string(),
            source: Box::new(VmError::StackUnderflow),
        };
        assert_eq!(err.to_string(), "Start 000012 POP: stack underflow");
    }
}
