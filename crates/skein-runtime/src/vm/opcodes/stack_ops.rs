//! Stack manipulation handlers: PUSH_STRING, PUSH_FLOAT, PUSH_BOOL,
//! PUSH_NULL, POP.

use skein_bytecode::Operand;

use crate::error::{VmError, VmResult};
use crate::value::Value;
use crate::vm::{op_string, VirtualMachine};

impl VirtualMachine {
    /// Pushes a string operand.
    pub(crate) fn exec_push_string(&mut self, operands: &[Operand]) -> VmResult {
        let s = op_string(operands, 0)?.to_string();
        let state = self.state_mut()?;
        state.push(s);
        state.pc += 1;
        Ok(())
    }

    /// Pushes a float operand.
    pub(crate) fn exec_push_float(&mut self, operands: &[Operand]) -> VmResult {
        let f = operands
            .first()
            .and_then(Operand::float_value)
            .ok_or(VmError::NilOperand)?;
        let state = self.state_mut()?;
        state.push(f);
        state.pc += 1;
        Ok(())
    }

    /// Pushes a bool operand.
    pub(crate) fn exec_push_bool(&mut self, operands: &[Operand]) -> VmResult {
        let b = operands
            .first()
            .and_then(Operand::bool_value)
            .ok_or(VmError::NilOperand)?;
        let state = self.state_mut()?;
        state.push(b);
        state.pc += 1;
        Ok(())
    }

    /// Pushes null.
    pub(crate) fn exec_push_null(&mut self) -> VmResult {
        let state = self.state_mut()?;
        state.push(Value::Null);
        state.pc += 1;
        Ok(())
    }

    /// Discards the top of the stack.
    pub(crate) fn exec_pop(&mut self) -> VmResult {
        let state = self.state_mut()?;
        state.pop()?;
        state.pc += 1;
        Ok(())
    }
}
