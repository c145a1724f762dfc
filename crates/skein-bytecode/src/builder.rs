//! Fluent construction of programs in code.
//!
//! The compiler normally produces programs, but tests, tools, and
//! embedders that generate dialogue at run time want to assemble them
//! directly. [`NodeBuilder`] emits instructions with one method per
//! opcode and records labels at the current instruction index;
//! [`ProgramBuilder`] collects nodes and initial values.
//!
//! ```
//! use skein_bytecode::{NodeBuilder, ProgramBuilder};
//!
//! let program = ProgramBuilder::new("demo")
//!     .node(
//!         NodeBuilder::new("Start")
//!             .push_bool(true)
//!             .jump_if_false("end")
//!             .run_line("line:hello")
//!             .label("end")
//!             .stop(),
//!     )
//!     .build();
//! assert_eq!(program.nodes["Start"].instructions.len(), 4);
//! ```

use crate::program::{Instruction, Node, Opcode, Operand, Program};

/// Builds a [`Program`] from nodes and initial values.
#[derive(Default)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    /// Starts a program with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        ProgramBuilder {
            program: Program {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    /// Records an initial value for a variable.
    pub fn initial_value(mut self, name: impl Into<String>, value: Operand) -> Self {
        self.program.initial_values.insert(name.into(), value);
        self
    }

    /// Adds a node.
    pub fn node(mut self, builder: NodeBuilder) -> Self {
        let node = builder.build();
        self.program.nodes.insert(node.name.clone(), node);
        self
    }

    /// Finishes the program.
    pub fn build(self) -> Program {
        self.program
    }
}

/// Builds a [`Node`] instruction by instruction.
pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    /// Starts a node with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        NodeBuilder {
            node: Node {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    /// Adds a node tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.node.tags.push(tag.into());
        self
    }

    /// Records a label at the current instruction index. Emit the labelled
    /// instruction immediately after.
    pub fn label(mut self, name: impl Into<String>) -> Self {
        let here = self.node.instructions.len() as i32;
        self.node.labels.insert(name.into(), here);
        self
    }

    fn emit(mut self, opcode: Opcode, operands: Vec<Operand>) -> Self {
        self.node.instructions.push(Instruction {
            opcode: opcode as i32,
            operands,
        });
        self
    }

    /// JUMP_TO: jump to a label in this node.
    pub fn jump_to(self, label: impl Into<String>) -> Self {
        self.emit(Opcode::JumpTo, vec![Operand::string(label.into())])
    }

    /// JUMP: jump to the label named by the top of the stack.
    pub fn jump(self) -> Self {
        self.emit(Opcode::Jump, vec![])
    }

    /// RUN_LINE without substitutions.
    pub fn run_line(self, id: impl Into<String>) -> Self {
        self.emit(Opcode::RunLine, vec![Operand::string(id.into())])
    }

    /// RUN_LINE popping `count` substitution values from the stack.
    pub fn run_line_with_substitutions(self, id: impl Into<String>, count: usize) -> Self {
        self.emit(
            Opcode::RunLine,
            vec![Operand::string(id.into()), Operand::float(count as f32)],
        )
    }

    /// RUN_COMMAND without substitutions.
    pub fn run_command(self, text: impl Into<String>) -> Self {
        self.emit(Opcode::RunCommand, vec![Operand::string(text.into())])
    }

    /// RUN_COMMAND popping `count` values to interpolate into `{i}`
    /// tokens.
    pub fn run_command_with_substitutions(self, text: impl Into<String>, count: usize) -> Self {
        self.emit(
            Opcode::RunCommand,
            vec![Operand::string(text.into()), Operand::float(count as f32)],
        )
    }

    /// ADD_OPTION with no substitutions or condition.
    pub fn add_option(
        self,
        line_id: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        self.emit(
            Opcode::AddOption,
            vec![
                Operand::string(line_id.into()),
                Operand::string(destination.into()),
            ],
        )
    }

    /// ADD_OPTION with a substitution count and, when `has_condition`, an
    /// availability bool popped from the stack.
    pub fn add_option_with(
        self,
        line_id: impl Into<String>,
        destination: impl Into<String>,
        substitutions: usize,
        has_condition: bool,
    ) -> Self {
        self.emit(
            Opcode::AddOption,
            vec![
                Operand::string(line_id.into()),
                Operand::string(destination.into()),
                Operand::float(substitutions as f32),
                Operand::bool(has_condition),
            ],
        )
    }

    /// SHOW_OPTIONS.
    pub fn show_options(self) -> Self {
        self.emit(Opcode::ShowOptions, vec![])
    }

    /// PUSH_STRING.
    pub fn push_string(self, value: impl Into<String>) -> Self {
        self.emit(Opcode::PushString, vec![Operand::string(value.into())])
    }

    /// PUSH_FLOAT.
    pub fn push_float(self, value: f32) -> Self {
        self.emit(Opcode::PushFloat, vec![Operand::float(value)])
    }

    /// PUSH_BOOL.
    pub fn push_bool(self, value: bool) -> Self {
        self.emit(Opcode::PushBool, vec![Operand::bool(value)])
    }

    /// PUSH_NULL.
    pub fn push_null(self) -> Self {
        self.emit(Opcode::PushNull, vec![])
    }

    /// JUMP_IF_FALSE to a label in this node.
    pub fn jump_if_false(self, label: impl Into<String>) -> Self {
        self.emit(Opcode::JumpIfFalse, vec![Operand::string(label.into())])
    }

    /// POP.
    pub fn pop(self) -> Self {
        self.emit(Opcode::Pop, vec![])
    }

    /// CALL_FUNC. The argument count and arguments must already be on the
    /// stack (arguments first, count on top).
    pub fn call_func(self, name: impl Into<String>) -> Self {
        self.emit(Opcode::CallFunc, vec![Operand::string(name.into())])
    }

    /// PUSH_VARIABLE.
    pub fn push_variable(self, name: impl Into<String>) -> Self {
        self.emit(Opcode::PushVariable, vec![Operand::string(name.into())])
    }

    /// STORE_VARIABLE (peeks; pair with [`pop`] to consume the value).
    ///
    /// [`pop`]: NodeBuilder::pop
    pub fn store_variable(self, name: impl Into<String>) -> Self {
        self.emit(Opcode::StoreVariable, vec![Operand::string(name.into())])
    }

    /// STOP.
    pub fn stop(self) -> Self {
        self.emit(Opcode::Stop, vec![])
    }

    /// RUN_NODE: run the node named by the popped top of the stack.
    pub fn run_node(self) -> Self {
        self.emit(Opcode::RunNode, vec![])
    }

    /// Finishes the node.
    pub fn build(self) -> Node {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::verify_program;

    #[test]
    fn test_labels_point_at_next_instruction() {
        let node = NodeBuilder::new("Start")
            .jump_to("skip")
            .run_line("line:never")
            .label("skip")
            .stop()
            .build();
        assert_eq!(node.labels["skip"], 2);
        assert_eq!(node.instructions.len(), 3);
    }

    #[test]
    fn test_built_programs_verify() {
        let program = ProgramBuilder::new("demo")
            .initial_value("$gold", Operand::float(10.0))
            .node(
                NodeBuilder::new("Start")
                    .tag("intro")
                    .push_string("Cave")
                    .push_float(1.0)
                    .call_func("visited_count")
                    .pop()
                    .add_option_with("line:go", "End", 0, false)
                    .show_options()
                    .run_node(),
            )
            .node(NodeBuilder::new("End").run_line("line:bye").stop())
            .build();
        verify_program(&program).expect("built program verifies");
        assert_eq!(program.initial_values["$gold"], Operand::float(10.0));
        assert_eq!(program.nodes["Start"].tags, vec!["intro"]);
    }

    #[test]
    fn test_substitution_counts_are_float_operands() {
        let node = NodeBuilder::new("Start")
            .push_string("world")
            .run_line_with_substitutions("line:greet", 1)
            .build();
        assert_eq!(node.instructions[1].operands[1], Operand::float(1.0));
    }
}
