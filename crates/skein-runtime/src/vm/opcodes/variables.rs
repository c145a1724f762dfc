//! Variable handlers: PUSH_VARIABLE, STORE_VARIABLE.

use skein_bytecode::Operand;

use crate::convert::operand_to_value;
use crate::error::VmResult;
use crate::value::Value;
use crate::vm::{op_string, VirtualMachine};

impl VirtualMachine {
    /// Pushes the value of a variable. Storage shadows the program's
    /// initial values; a name known to neither pushes null.
    /// opA = string: variable name.
    pub(crate) fn exec_push_variable(&mut self, operands: &[Operand]) -> VmResult {
        let name = op_string(operands, 0)?;
        let value = match self.vars.get_value(name) {
            Some(value) => value,
            None => self
                .program
                .initial_values
                .get(name)
                .map(operand_to_value)
                .unwrap_or(Value::Null),
        };
        let state = self.state_mut()?;
        state.push(value);
        state.pc += 1;
        Ok(())
    }

    /// Stores the top of the stack in the named variable. Peeks; the value
    /// stays available for a subsequent consumer.
    /// opA = string: variable name.
    pub(crate) fn exec_store_variable(&mut self, operands: &[Operand]) -> VmResult {
        let name = op_string(operands, 0)?.to_string();
        let value = self.state()?.peek()?.clone();
        self.vars.set_value(&name, value);
        self.state_mut()?.pc += 1;
        Ok(())
    }
}
