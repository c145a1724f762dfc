//! Content delivery handlers: RUN_LINE, RUN_COMMAND, ADD_OPTION,
//! SHOW_OPTIONS.

use skein_bytecode::Operand;

use crate::convert::operand_to_int;
use crate::dialogue::{DialogueHandler, DialogueOption, Line};
use crate::error::{VmError, VmResult};
use crate::vm::{op_string, VirtualMachine};

impl VirtualMachine {
    /// Delivers a line to the handler.
    /// opA = string: line ID; opB = float: number of stack values to pop
    /// as substitutions (optional).
    pub(crate) fn exec_run_line(
        &mut self,
        handler: &mut dyn DialogueHandler,
        operands: &[Operand],
    ) -> VmResult {
        let id = op_string(operands, 0)?.to_string();
        let substitutions = if operands.len() > 1 {
            let n = operand_to_int(operands.get(1))?;
            self.state_mut()?.pop_n_strings(n)?
        } else {
            Vec::new()
        };
        let line = Line { id, substitutions };
        handler.line(&line)?;
        self.state_mut()?.pc += 1;
        Ok(())
    }

    /// Delivers a command to the handler, interpolating popped values into
    /// `{i}` tokens. The program counter is advanced before the callback
    /// so the handler may select a different node.
    /// opA = string: command text; opB = float: substitution count
    /// (optional).
    pub(crate) fn exec_run_command(
        &mut self,
        handler: &mut dyn DialogueHandler,
        operands: &[Operand],
    ) -> VmResult {
        let mut command = op_string(operands, 0)?.to_string();
        if operands.len() > 1 {
            let n = operand_to_int(operands.get(1))?;
            let substitutions = self.state_mut()?.pop_n_strings(n)?;
            for (i, sub) in substitutions.iter().enumerate() {
                command = command.replace(&format!("{{{i}}}"), sub);
            }
        }
        self.state_mut()?.pc += 1;
        handler.command(self, &command)?;
        Ok(())
    }

    /// Appends an option to the pending buffer.
    /// opA = string: line ID; opB = string: destination node; opC = float:
    /// substitution count; opD = bool: whether an availability condition
    /// should be popped.
    pub(crate) fn exec_add_option(&mut self, operands: &[Operand]) -> VmResult {
        let line_id = op_string(operands, 0)?.to_string();
        let destination = op_string(operands, 1)?.to_string();
        let substitutions = if operands.len() > 2 {
            let n = operand_to_int(operands.get(2))?;
            self.state_mut()?.pop_n_strings(n)?
        } else {
            Vec::new()
        };
        let mut is_available = true;
        if operands.len() > 3 && operands[3].bool_value() == Some(true) {
            // The condition result is on the stack beneath the
            // substitutions.
            is_available = self.state_mut()?.pop_bool()?;
        }
        let state = self.state_mut()?;
        let id = state.options.len();
        state.options.push(DialogueOption {
            id,
            line: Line {
                id: line_id,
                substitutions,
            },
            destination_node: destination,
            is_available,
        });
        state.pc += 1;
        Ok(())
    }

    /// Delivers the pending options and pushes the chosen option's
    /// destination node. The buffer is cleared exactly once, here.
    /// An empty buffer ends the dialogue and is an error in the program.
    pub(crate) fn exec_show_options(&mut self, handler: &mut dyn DialogueHandler) -> VmResult {
        if self.state()?.options.is_empty() {
            // The machine stops in place of delivering an empty batch.
            let _ = handler.dialogue_complete();
            return Err(VmError::NoOptions);
        }
        let index = handler.options(&self.state()?.options)?;
        let state = self.state_mut()?;
        if index >= state.options.len() {
            return Err(VmError::InvalidOption {
                index,
                count: state.options.len(),
            });
        }
        let destination = state.options[index].destination_node.clone();
        state.push(destination);
        state.options.clear();
        state.pc += 1;
        Ok(())
    }
}
