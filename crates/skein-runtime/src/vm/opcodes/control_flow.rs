//! Control flow handlers: JUMP_TO, JUMP, JUMP_IF_FALSE, STOP (handled
//! inline in dispatch), RUN_NODE.

use skein_bytecode::Operand;

use crate::dialogue::DialogueHandler;
use crate::error::VmResult;
use crate::vm::{op_string, VirtualMachine};

impl VirtualMachine {
    /// Jumps to a named position in the node.
    /// opA = string: label name.
    pub(crate) fn exec_jump_to(&mut self, operands: &[Operand]) -> VmResult {
        let label = op_string(operands, 0)?.to_string();
        self.jump_to_label(&label)
    }

    /// Peeks a string from the stack and jumps to that named position in
    /// the node. Does not pop.
    pub(crate) fn exec_jump(&mut self) -> VmResult {
        let label = self.state()?.peek_string()?;
        self.jump_to_label(&label)
    }

    /// Jumps to the named position if the top of the stack, converted to
    /// bool, is false. Peeks; does not pop.
    /// opA = string: label name.
    pub(crate) fn exec_jump_if_false(&mut self, operands: &[Operand]) -> VmResult {
        if self.state()?.peek()?.to_bool() {
            self.state_mut()?.pc += 1;
            return Ok(());
        }
        let label = op_string(operands, 0)?.to_string();
        self.jump_to_label(&label)
    }

    /// Pops a string and runs the node with that name.
    pub(crate) fn exec_run_node(&mut self, handler: &mut dyn DialogueHandler) -> VmResult {
        let node = self.state_mut()?.pop_string()?;
        self.set_node(handler, &node)
    }
}
