//! Program verification.
//!
//! A decoded program can be structurally valid protobuf and still be
//! garbage: unknown opcodes, operands of the wrong shape, labels pointing
//! past the end of a node. [`verify_program`] checks the static properties
//! the virtual machine otherwise discovers mid-run, so embedders can
//! reject a bad program at load time.

use crate::program::{operand, Instruction, Node, Opcode, Operand, Program};

/// Program verification errors.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// An instruction carried an opcode outside the instruction set.
    #[error("invalid opcode {opcode} at {node}:{index}")]
    InvalidOpcode {
        /// The wire value.
        opcode: i32,
        /// The node containing the instruction.
        node: String,
        /// The instruction index within the node.
        index: usize,
    },

    /// An instruction is missing an operand its opcode requires.
    #[error("{opcode} at {node}:{index} is missing operand {operand}")]
    MissingOperand {
        /// The opcode name.
        opcode: &'static str,
        /// The node containing the instruction.
        node: String,
        /// The instruction index within the node.
        index: usize,
        /// Which operand (0-based) is missing.
        operand: usize,
    },

    /// An operand has the wrong payload type for its opcode.
    #[error("{opcode} at {node}:{index} operand {operand} must be a {want}")]
    WrongOperandType {
        /// The opcode name.
        opcode: &'static str,
        /// The node containing the instruction.
        node: String,
        /// The instruction index within the node.
        index: usize,
        /// Which operand (0-based) has the wrong type.
        operand: usize,
        /// The required payload type.
        want: &'static str,
    },

    /// A label maps to an instruction index outside its node.
    #[error("label {label:?} in node {node:?} targets {target}, past the last instruction ({len})")]
    LabelOutOfRange {
        /// The label name.
        label: String,
        /// The node whose label table is invalid.
        node: String,
        /// The label's target index.
        target: i64,
        /// The node's instruction count.
        len: usize,
    },

    /// A jump names a label the node does not define.
    #[error("{opcode} at {node}:{index} jumps to unknown label {label:?}")]
    UnknownLabel {
        /// The opcode name.
        opcode: &'static str,
        /// The node containing the jump.
        node: String,
        /// The instruction index within the node.
        index: usize,
        /// The missing label.
        label: String,
    },

    /// A node's map key disagrees with its name field.
    #[error("node keyed {key:?} is named {name:?}")]
    NameMismatch {
        /// The key in the program's node map.
        key: String,
        /// The node's own name field.
        name: String,
    },
}

/// The operand shape an opcode requires: required payload types, then
/// optional payload types.
fn operand_shape(opcode: Opcode) -> (&'static [OperandKind], &'static [OperandKind]) {
    use OperandKind::*;
    match opcode {
        Opcode::JumpTo => (&[Str], &[]),
        Opcode::Jump => (&[], &[]),
        Opcode::RunLine => (&[Str], &[Float]),
        Opcode::RunCommand => (&[Str], &[Float]),
        Opcode::AddOption => (&[Str, Str], &[Float, Bool]),
        Opcode::ShowOptions => (&[], &[]),
        Opcode::PushString => (&[Str], &[]),
        Opcode::PushFloat => (&[Float], &[]),
        Opcode::PushBool => (&[Bool], &[]),
        Opcode::PushNull => (&[], &[]),
        Opcode::JumpIfFalse => (&[Str], &[]),
        Opcode::Pop => (&[], &[]),
        Opcode::CallFunc => (&[Str], &[]),
        Opcode::PushVariable => (&[Str], &[]),
        Opcode::StoreVariable => (&[Str], &[]),
        Opcode::Stop => (&[], &[]),
        Opcode::RunNode => (&[], &[]),
    }
}

#[derive(Clone, Copy)]
enum OperandKind {
    Str,
    Bool,
    Float,
}

impl OperandKind {
    fn name(self) -> &'static str {
        match self {
            OperandKind::Str => "string",
            OperandKind::Bool => "bool",
            OperandKind::Float => "float",
        }
    }

    fn matches(self, operand: &Operand) -> bool {
        matches!(
            (self, &operand.value),
            (OperandKind::Str, Some(operand::Value::StringValue(_)))
                | (OperandKind::Bool, Some(operand::Value::BoolValue(_)))
                | (OperandKind::Float, Some(operand::Value::FloatValue(_)))
        )
    }
}

/// Checks every node of a program for static validity.
pub fn verify_program(program: &Program) -> Result<(), VerifyError> {
    for (key, node) in &program.nodes {
        if !node.name.is_empty() && node.name != *key {
            return Err(VerifyError::NameMismatch {
                key: key.clone(),
                name: node.name.clone(),
            });
        }
        verify_node(key, node)?;
    }
    Ok(())
}

fn verify_node(name: &str, node: &Node) -> Result<(), VerifyError> {
    for (label, target) in &node.labels {
        // A label may sit at the instruction count: jumping there ends
        // the node.
        if *target < 0 || *target as usize > node.instructions.len() {
            return Err(VerifyError::LabelOutOfRange {
                label: label.clone(),
                node: name.to_string(),
                target: *target as i64,
                len: node.instructions.len(),
            });
        }
    }
    for (index, inst) in node.instructions.iter().enumerate() {
        verify_instruction(name, node, index, inst)?;
    }
    Ok(())
}

fn verify_instruction(
    name: &str,
    node: &Node,
    index: usize,
    inst: &Instruction,
) -> Result<(), VerifyError> {
    let opcode = inst.opcode_checked().ok_or(VerifyError::InvalidOpcode {
        opcode: inst.opcode,
        node: name.to_string(),
        index,
    })?;

    let (required, optional) = operand_shape(opcode);
    for (i, kind) in required.iter().enumerate() {
        let operand = inst.operands.get(i).ok_or(VerifyError::MissingOperand {
            opcode: opcode.name(),
            node: name.to_string(),
            index,
            operand: i,
        })?;
        if !kind.matches(operand) {
            return Err(VerifyError::WrongOperandType {
                opcode: opcode.name(),
                node: name.to_string(),
                index,
                operand: i,
                want: kind.name(),
            });
        }
    }
    for (i, kind) in optional.iter().enumerate() {
        let i = required.len() + i;
        if let Some(operand) = inst.operands.get(i) {
            if !kind.matches(operand) {
                return Err(VerifyError::WrongOperandType {
                    opcode: opcode.name(),
                    node: name.to_string(),
                    index,
                    operand: i,
                    want: kind.name(),
                });
            }
        }
    }

    // Static jump targets must resolve now; JUMP reads its label from the
    // stack, so it can only be checked at run time.
    if matches!(opcode, Opcode::JumpTo | Opcode::JumpIfFalse) {
        let label = inst.operands[0]
            .string_value()
            .expect("checked above: operand 0 is a string");
        if !node.labels.contains_key(label) {
            return Err(VerifyError::UnknownLabel {
                opcode: opcode.name(),
                node: name.to_string(),
                index,
                label: label.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NodeBuilder;

    fn program_with(node: Node) -> Program {
        let mut program = Program::default();
        program.nodes.insert(node.name.clone(), node);
        program
    }

    #[test]
    fn test_valid_program_passes() {
        let node = NodeBuilder::new("Start")
            .push_bool(true)
            .jump_if_false("end")
            .run_line("line:hi")
            .label("end")
            .stop()
            .build();
        verify_program(&program_with(node)).expect("valid");
    }

    #[test]
    fn test_unknown_opcode() {
        let mut node = NodeBuilder::new("Start").build();
        node.instructions.push(Instruction {
            opcode: 99,
            operands: vec![],
        });
        assert!(matches!(
            verify_program(&program_with(node)),
            Err(VerifyError::InvalidOpcode { opcode: 99, .. })
        ));
    }

    #[test]
    fn test_missing_operand() {
        let mut node = NodeBuilder::new("Start").build();
        node.instructions.push(Instruction {
            opcode: Opcode::PushString as i32,
            operands: vec![],
        });
        assert!(matches!(
            verify_program(&program_with(node)),
            Err(VerifyError::MissingOperand { operand: 0, .. })
        ));
    }

    #[test]
    fn test_wrong_operand_type() {
        let mut node = NodeBuilder::new("Start").build();
        node.instructions.push(Instruction {
            opcode: Opcode::PushFloat as i32,
            operands: vec![Operand::string("not a float")],
        });
        assert!(matches!(
            verify_program(&program_with(node)),
            Err(VerifyError::WrongOperandType { want: "float", .. })
        ));
    }

    #[test]
    fn test_label_out_of_range() {
        let mut node = NodeBuilder::new("Start").stop().build();
        node.labels.insert("beyond".to_string(), 5);
        assert!(matches!(
            verify_program(&program_with(node)),
            Err(VerifyError::LabelOutOfRange { target: 5, .. })
        ));
    }

    #[test]
    fn test_unknown_jump_label() {
        let mut node = NodeBuilder::new("Start").build();
        node.instructions.push(Instruction {
            opcode: Opcode::JumpTo as i32,
            operands: vec![Operand::string("nowhere")],
        });
        assert!(matches!(
            verify_program(&program_with(node)),
            Err(VerifyError::UnknownLabel { label, .. }) if label == "nowhere"
        ));
    }

    #[test]
    fn test_name_mismatch() {
        let node = NodeBuilder::new("Inner").stop().build();
        let mut program = Program::default();
        program.nodes.insert("Outer".to_string(), node);
        assert!(matches!(
            verify_program(&program),
            Err(VerifyError::NameMismatch { .. })
        ));
    }
}
