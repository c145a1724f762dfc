//! Human-readable disassembly of instructions and programs.
//!
//! Output is intended for debugging only and is not a stable interchange
//! format, but [`format_instruction`] is stable for a given opcode and
//! operand list so it can be embedded in error context and trace logs.

use std::fmt::Write;

use crate::program::{operand, Instruction, Opcode, Program};

/// Formats a single instruction: the opcode name followed by its operands.
///
/// Float operands print as integers except for `PUSH_FLOAT`, since every
/// other use of a float operand is an integer quantity (argument or
/// substitution counts, label indices).
pub fn format_instruction(inst: &Instruction) -> String {
    let mut out = String::new();
    match inst.opcode_checked() {
        Some(op) => out.push_str(op.name()),
        None => {
            let _ = write!(out, "INVALID({})", inst.opcode);
        }
    }
    for op in &inst.operands {
        match &op.value {
            Some(operand::Value::BoolValue(b)) => {
                let _ = write!(out, " {b}");
            }
            Some(operand::Value::FloatValue(f)) => {
                if inst.opcode_checked() == Some(Opcode::PushFloat) {
                    let _ = write!(out, " {f:.6}");
                } else {
                    let _ = write!(out, " {}", *f as i64);
                }
            }
            Some(operand::Value::StringValue(s)) => {
                let _ = write!(out, " {s:?}");
            }
            None => out.push_str(" <nil>"),
        }
    }
    out
}

/// Writes a disassembly of the whole program.
///
/// Labels are printed in a right-aligned gutter sized to the longest label
/// anywhere in the program, so instruction columns line up across nodes.
/// Nodes are emitted in name order to keep the output deterministic.
pub fn format_program(w: &mut impl Write, program: &Program) -> std::fmt::Result {
    let label_width = program
        .nodes
        .values()
        .flat_map(|n| n.labels.keys())
        .map(|l| l.len())
        .max()
        .unwrap_or(0);
    let no_label = " ".repeat(label_width + 2);

    let mut names: Vec<&String> = program.nodes.keys().collect();
    names.sort();

    for name in names {
        let node = &program.nodes[name];

        // Reverse label table for this node.
        let mut labels = std::collections::HashMap::new();
        for (label, addr) in &node.labels {
            labels.insert(*addr as usize, label.as_str());
        }

        writeln!(w, "{no_label}--- {name} tags:{:?} ---", node.tags)?;
        if !node.source_text_string_id.is_empty() {
            writeln!(
                w,
                "{no_label}source text string id: {:?}",
                node.source_text_string_id
            )?;
        }
        for (n, inst) in node.instructions.iter().enumerate() {
            match labels.get(&n) {
                Some(label) => write!(w, "{label:>label_width$}: ")?,
                None => write!(w, "{no_label}")?,
            }
            writeln!(w, "{n:06} {}", format_instruction(inst))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Disassembles the whole program into a string.
pub fn format_program_string(program: &Program) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = format_program(&mut out, program);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Node, Operand};

    fn inst(opcode: Opcode, operands: Vec<Operand>) -> Instruction {
        Instruction {
            opcode: opcode as i32,
            operands,
        }
    }

    #[test]
    fn test_format_instruction_operand_shapes() {
        assert_eq!(
            format_instruction(&inst(
                Opcode::RunLine,
                vec![Operand::string("line:hi"), Operand::float(2.0)],
            )),
            "RUN_LINE \"line:hi\" 2"
        );
        assert_eq!(
            format_instruction(&inst(Opcode::PushFloat, vec![Operand::float(1.5)])),
            "PUSH_FLOAT 1.500000"
        );
        assert_eq!(
            format_instruction(&inst(Opcode::PushBool, vec![Operand::bool(true)])),
            "PUSH_BOOL true"
        );
        assert_eq!(format_instruction(&inst(Opcode::Stop, vec![])), "STOP");
    }

    #[test]
    fn test_format_instruction_is_stable() {
        let i = inst(Opcode::JumpTo, vec![Operand::string("end")]);
        assert_eq!(format_instruction(&i), format_instruction(&i));
    }

    #[test]
    fn test_format_program_label_gutter() {
        let mut node = Node {
            name: "Start".to_string(),
            ..Default::default()
        };
        node.instructions = vec![
            inst(Opcode::PushBool, vec![Operand::bool(false)]),
            inst(Opcode::JumpIfFalse, vec![Operand::string("skip")]),
            inst(Opcode::Stop, vec![]),
        ];
        node.labels.insert("skip".to_string(), 2);
        let mut program = Program::default();
        program.nodes.insert("Start".to_string(), node);

        let text = format_program_string(&program);
        assert!(text.contains("--- Start"));
        assert!(text.contains("skip: 000002 STOP"));
        assert!(text.contains("000001 JUMP_IF_FALSE \"skip\""));
    }
}
