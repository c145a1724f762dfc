//! CALL_FUNC: function invocation with argument conversion.

use skein_bytecode::Operand;

use crate::error::{VmError, VmResult};
use crate::vm::{op_string, VirtualMachine};

impl VirtualMachine {
    /// Calls a named function from the library.
    ///
    /// The compiler leaves the argument count on top of the stack, above
    /// the arguments themselves. Arguments are converted to the declared
    /// parameter kinds; a returned value (if any) is pushed. The program
    /// counter advances before invocation.
    /// opA = string: function name.
    pub(crate) fn exec_call_func(&mut self, operands: &[Operand]) -> VmResult {
        let name = op_string(operands, 0)?;
        let function = self
            .library
            .get(name)
            .cloned()
            .ok_or_else(|| VmError::FunctionNotFound(name.to_string()))?;

        let argc_value = self.state_mut()?.pop()?;
        let argc = usize::try_from(argc_value.to_int()?).map_err(|_| {
            VmError::FunctionArgMismatch("negative argument count".to_string())
        })?;
        function.check_arity(argc)?;

        let raw_args = self.state_mut()?.pop_n(argc)?;
        let args = function.convert_args(raw_args)?;

        self.state_mut()?.pc += 1;
        if let Some(result) = function.invoke(&args)? {
            self.state_mut()?.push(result);
        }
        Ok(())
    }
}
