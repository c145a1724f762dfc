//! Wire-format message types for compiled dialogue programs.
//!
//! These structs are hand-written `prost` derives matching the compiler's
//! protobuf schema, so compiled `.yarnc` blobs decode directly into them
//! without a protoc build step. Field tags are load-bearing; do not renumber.

use std::collections::HashMap;

/// A complete compiled dialogue program.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Program {
    /// The name of the program.
    #[prost(string, tag = "1")]
    pub name: String,

    /// All nodes in the program, keyed by node name.
    #[prost(map = "string, message", tag = "2")]
    pub nodes: HashMap<String, Node>,

    /// Initial values for variables, keyed by variable name. Variable
    /// storage shadows these once a variable has been written.
    #[prost(map = "string, message", tag = "3")]
    pub initial_values: HashMap<String, Operand>,
}

/// A named unit of dialogue bytecode, analogous to a function.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Node {
    /// The name of this node.
    #[prost(string, tag = "1")]
    pub name: String,

    /// The instructions of this node, in execution order.
    #[prost(message, repeated, tag = "2")]
    pub instructions: Vec<Instruction>,

    /// Jump table: label name to absolute instruction index within this
    /// node. Labels never resolve across nodes.
    #[prost(map = "string, int32", tag = "3")]
    pub labels: HashMap<String, i32>,

    /// Tags associated with this node.
    #[prost(string, repeated, tag = "4")]
    pub tags: Vec<String>,

    /// The string table entry holding the node's original source text, if
    /// the compiler recorded one.
    #[prost(string, tag = "5")]
    pub source_text_string_id: String,
}

/// A single instruction: an opcode plus its operands.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Instruction {
    /// The operation this instruction performs.
    #[prost(enumeration = "Opcode", tag = "1")]
    pub opcode: i32,

    /// The operands, if any, that this instruction uses.
    #[prost(message, repeated, tag = "2")]
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Decodes the stored opcode, or `None` if the wire value is not a
    /// known opcode.
    pub fn opcode_checked(&self) -> Option<Opcode> {
        Opcode::try_from(self.opcode).ok()
    }
}

/// The instruction set, in wire order.
///
/// Numeric operands are stored as floats on the wire even where they are
/// used as integers (argument counts, substitution counts).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Opcode {
    /// Jumps to a named position in the node.
    /// opA = string: label name.
    JumpTo = 0,
    /// Peeks a string from the stack and jumps to that named position in
    /// the node. No operands.
    Jump = 1,
    /// Delivers a line to the handler.
    /// opA = string: line ID; opB = float: substitution count (optional).
    RunLine = 2,
    /// Delivers a command to the handler.
    /// opA = string: command text; opB = float: substitution count
    /// (optional).
    RunCommand = 3,
    /// Adds an entry to the pending options buffer (see ShowOptions).
    /// opA = string: line ID; opB = string: destination node; opC = float:
    /// substitution count; opD = bool: whether a condition bool should be
    /// popped (optional operands from opC).
    AddOption = 4,
    /// Delivers the pending options to the handler, then clears the
    /// buffer. The chosen option's destination node is pushed. No operands.
    ShowOptions = 5,
    /// Pushes a string onto the stack. opA = string.
    PushString = 6,
    /// Pushes a number onto the stack. opA = float.
    PushFloat = 7,
    /// Pushes a bool onto the stack. opA = bool.
    PushBool = 8,
    /// Pushes a null value onto the stack. No operands.
    PushNull = 9,
    /// Jumps to the named position if the top of stack, converted to bool,
    /// is false. Peeks; does not pop. opA = string: label name.
    JumpIfFalse = 10,
    /// Discards the top of the stack. No operands.
    Pop = 11,
    /// Calls a named function. The argument count is on top of the stack,
    /// above the arguments themselves. opA = string: function name.
    CallFunc = 12,
    /// Pushes the value of a variable, its program initial value, or null.
    /// opA = string: variable name.
    PushVariable = 13,
    /// Stores the top of the stack (without popping) in the named
    /// variable. opA = string: variable name.
    StoreVariable = 14,
    /// Stops execution of the program. No operands.
    Stop = 15,
    /// Pops a string and runs the node with that name. No operands.
    RunNode = 16,
}

impl Opcode {
    /// The wire-format name of this opcode, as used in disassembly.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::JumpTo => "JUMP_TO",
            Opcode::Jump => "JUMP",
            Opcode::RunLine => "RUN_LINE",
            Opcode::RunCommand => "RUN_COMMAND",
            Opcode::AddOption => "ADD_OPTION",
            Opcode::ShowOptions => "SHOW_OPTIONS",
            Opcode::PushString => "PUSH_STRING",
            Opcode::PushFloat => "PUSH_FLOAT",
            Opcode::PushBool => "PUSH_BOOL",
            Opcode::PushNull => "PUSH_NULL",
            Opcode::JumpIfFalse => "JUMP_IF_FALSE",
            Opcode::Pop => "POP",
            Opcode::CallFunc => "CALL_FUNC",
            Opcode::PushVariable => "PUSH_VARIABLE",
            Opcode::StoreVariable => "STORE_VARIABLE",
            Opcode::Stop => "STOP",
            Opcode::RunNode => "RUN_NODE",
        }
    }
}

/// A value used by an instruction or as a variable's initial value.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Operand {
    /// The payload. A missing payload is a malformed program.
    #[prost(oneof = "operand::Value", tags = "1, 2, 3")]
    pub value: Option<operand::Value>,
}

/// Nested types for [`Operand`].
pub mod operand {
    /// The payload of an operand.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        /// A string.
        #[prost(string, tag = "1")]
        StringValue(String),
        /// A boolean.
        #[prost(bool, tag = "2")]
        BoolValue(bool),
        /// A floating point number. Also used for integer quantities.
        #[prost(float, tag = "3")]
        FloatValue(f32),
    }
}

impl Operand {
    /// Builds a string operand.
    pub fn string(s: impl Into<String>) -> Self {
        Operand {
            value: Some(operand::Value::StringValue(s.into())),
        }
    }

    /// Builds a bool operand.
    pub fn bool(b: bool) -> Self {
        Operand {
            value: Some(operand::Value::BoolValue(b)),
        }
    }

    /// Builds a float operand.
    pub fn float(f: f32) -> Self {
        Operand {
            value: Some(operand::Value::FloatValue(f)),
        }
    }

    /// The string payload, if this is a string operand.
    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            Some(operand::Value::StringValue(s)) => Some(s),
            _ => None,
        }
    }

    /// The bool payload, if this is a bool operand.
    pub fn bool_value(&self) -> Option<bool> {
        match &self.value {
            Some(operand::Value::BoolValue(b)) => Some(*b),
            _ => None,
        }
    }

    /// The float payload, if this is a float operand.
    pub fn float_value(&self) -> Option<f32> {
        match &self.value {
            Some(operand::Value::FloatValue(f)) => Some(*f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_operand_accessors() {
        assert_eq!(Operand::string("x").string_value(), Some("x"));
        assert_eq!(Operand::string("x").float_value(), None);
        assert_eq!(Operand::bool(true).bool_value(), Some(true));
        assert_eq!(Operand::float(2.5).float_value(), Some(2.5));
    }

    #[test]
    fn test_opcode_round_trip() {
        for code in 0..=16 {
            let op = Opcode::try_from(code).expect("valid opcode");
            assert_eq!(op as i32, code);
        }
        assert!(Opcode::try_from(17).is_err());
    }

    #[test]
    fn test_program_encode_decode() {
        let mut program = Program {
            name: "test".to_string(),
            ..Default::default()
        };
        let mut node = Node {
            name: "Start".to_string(),
            ..Default::default()
        };
        node.instructions.push(Instruction {
            opcode: Opcode::RunLine as i32,
            operands: vec![Operand::string("line:0")],
        });
        node.labels.insert("end".to_string(), 0);
        program.nodes.insert("Start".to_string(), node);
        program
            .initial_values
            .insert("$gold".to_string(), Operand::float(10.0));

        let bytes = program.encode_to_vec();
        let decoded = Program::decode(bytes.as_slice()).expect("decode");
        assert_eq!(decoded, program);
        assert_eq!(
            decoded.nodes["Start"].instructions[0].opcode_checked(),
            Some(Opcode::RunLine)
        );
    }
}
