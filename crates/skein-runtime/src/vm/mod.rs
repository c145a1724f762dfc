//! The virtual machine.
//!
//! A [`VirtualMachine`] executes one node of a compiled program at a time,
//! delivering lines, commands, and options to a [`DialogueHandler`]. The
//! handler is not owned by the machine; [`VirtualMachine::run`] and
//! [`VirtualMachine::set_node`] borrow it for the duration of the call,
//! which is what allows a command callback to legally call back into the
//! machine.

mod opcodes;
mod state;

use std::sync::Arc;

use skein_bytecode::{format_instruction, Instruction, Opcode, Operand, Program};
use tracing::trace;

use crate::builtins::default_func_map;
use crate::dialogue::DialogueHandler;
use crate::error::{VmError, VmResult};
use crate::funcs::FuncMap;
use crate::vars::VariableStorage;
use state::ExecState;

/// The dialogue virtual machine.
pub struct VirtualMachine {
    pub(crate) program: Arc<Program>,
    pub(crate) vars: Arc<dyn VariableStorage>,
    user_funcs: FuncMap,
    /// Default library merged with the embedder's functions. Rebuilt at
    /// the start of every run.
    pub(crate) library: FuncMap,
    pub(crate) state: Option<ExecState>,
}

impl VirtualMachine {
    /// Creates a machine for a program, with variables in `vars`.
    pub fn new(program: Arc<Program>, vars: Arc<dyn VariableStorage>) -> Self {
        VirtualMachine {
            program,
            vars,
            user_funcs: FuncMap::new(),
            library: FuncMap::new(),
            state: None,
        }
    }

    /// Adds embedder-defined functions. Entries override same-named
    /// defaults.
    pub fn with_functions(mut self, funcs: FuncMap) -> Self {
        self.user_funcs = funcs;
        self
    }

    /// The program being executed.
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// The variable storage backing this machine.
    pub fn vars(&self) -> &Arc<dyn VariableStorage> {
        &self.vars
    }

    /// The name of the currently selected node, if any.
    pub fn current_node(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.node.name.as_str())
    }

    /// Executes the program from `start_node` until it stops or falls off
    /// the end of a node.
    ///
    /// Exactly one `dialogue_complete` is delivered per successful run,
    /// and every `node_start` is paired with a `node_complete`. A
    /// [`VmError::Stop`] from any handler callback ends the run cleanly;
    /// any other handler or execution error aborts the run and is
    /// returned with the node, program counter, and instruction where it
    /// happened.
    pub fn run(&mut self, handler: &mut dyn DialogueHandler, start_node: &str) -> VmResult {
        if self.program.nodes.is_empty() {
            return Err(VmError::MissingProgram);
        }
        // Fresh default library per run; embedder entries override.
        self.library = default_func_map(&self.vars);
        self.library.merge(self.user_funcs.clone());

        self.state = None;
        self.set_node(handler, start_node)?;
        self.run_loop(handler)?;

        let node_name = self
            .state
            .as_ref()
            .map(|s| s.node.name.clone())
            .unwrap_or_default();
        if let Err(err) = handler.node_complete(&node_name) {
            if !err.is_stop() {
                return Err(err);
            }
        }
        if let Err(err) = handler.dialogue_complete() {
            if !err.is_stop() {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Selects a node to begin executing.
    ///
    /// If another node is currently selected, `node_complete` fires for it
    /// first. The execution state is replaced, then `node_start` and
    /// `prepare_for_lines` (with every line ID a RUN_LINE or ADD_OPTION in
    /// the node could deliver) fire for the new node. Passing the current
    /// node is one way to restart it.
    pub fn set_node(&mut self, handler: &mut dyn DialogueHandler, name: &str) -> VmResult {
        if self.program.nodes.is_empty() {
            return Err(VmError::MissingProgram);
        }
        let node = self
            .program
            .nodes
            .get(name)
            .ok_or_else(|| VmError::NodeNotFound(name.to_string()))?;
        let node = Arc::new(node.clone());

        if let Some(prev) = &self.state {
            let prev_name = prev.node.name.clone();
            handler.node_complete(&prev_name)?;
        }

        self.state = Some(ExecState::new(Arc::clone(&node)));
        handler.node_start(name)?;

        let line_ids: Vec<String> = node
            .instructions
            .iter()
            .filter(|inst| {
                matches!(inst.opcode_checked(), Some(Opcode::RunLine | Opcode::AddOption))
            })
            .filter_map(|inst| inst.operands.first())
            .filter_map(|op| op.string_value())
            .map(String::from)
            .collect();
        handler.prepare_for_lines(&line_ids)?;
        Ok(())
    }

    fn run_loop(&mut self, handler: &mut dyn DialogueHandler) -> VmResult {
        loop {
            let node = Arc::clone(&self.state()?.node);
            let pc = self.state()?.pc;
            if pc >= node.instructions.len() {
                return Ok(());
            }
            let inst = &node.instructions[pc];
            if tracing::enabled!(tracing::Level::TRACE) {
                let state = self.state()?;
                trace!(
                    node = %node.name,
                    pc,
                    instruction = %format_instruction(inst),
                    stack = ?state.stack,
                    options = ?state.options,
                    "execute"
                );
            }
            match self.execute(inst, handler) {
                Ok(()) => {}
                Err(err) if err.is_stop() => return Ok(()),
                Err(err) => {
                    return Err(VmError::Trace {
                        node: node.name.clone(),
                        pc,
                        instruction: format_instruction(inst),
                        source: Box::new(err),
                    })
                }
            }
        }
    }

    fn execute(&mut self, inst: &Instruction, handler: &mut dyn DialogueHandler) -> VmResult {
        let opcode = inst
            .opcode_checked()
            .ok_or(VmError::InvalidOpcode(inst.opcode))?;
        let ops = &inst.operands;
        match opcode {
            Opcode::JumpTo => self.exec_jump_to(ops),
            Opcode::Jump => self.exec_jump(),
            Opcode::RunLine => self.exec_run_line(handler, ops),
            Opcode::RunCommand => self.exec_run_command(handler, ops),
            Opcode::AddOption => self.exec_add_option(ops),
            Opcode::ShowOptions => self.exec_show_options(handler),
            Opcode::PushString => self.exec_push_string(ops),
            Opcode::PushFloat => self.exec_push_float(ops),
            Opcode::PushBool => self.exec_push_bool(ops),
            Opcode::PushNull => self.exec_push_null(),
            Opcode::JumpIfFalse => self.exec_jump_if_false(ops),
            Opcode::Pop => self.exec_pop(),
            Opcode::CallFunc => self.exec_call_func(ops),
            Opcode::PushVariable => self.exec_push_variable(ops),
            Opcode::StoreVariable => self.exec_store_variable(ops),
            Opcode::Stop => Err(VmError::Stop),
            Opcode::RunNode => self.exec_run_node(handler),
        }
    }

    pub(crate) fn state(&self) -> VmResult<&ExecState> {
        self.state.as_ref().ok_or(VmError::MissingProgram)
    }

    pub(crate) fn state_mut(&mut self) -> VmResult<&mut ExecState> {
        self.state.as_mut().ok_or(VmError::MissingProgram)
    }

    /// Jumps to a label in the current node; the program counter lands on
    /// the labelled instruction without advancing past it.
    pub(crate) fn jump_to_label(&mut self, label: &str) -> VmResult {
        let state = self.state_mut()?;
        let pc = state
            .node
            .labels
            .get(label)
            .copied()
            .ok_or_else(|| VmError::LabelNotFound {
                label: label.to_string(),
                node: state.node.name.clone(),
            })?;
        state.pc = pc.max(0) as usize;
        Ok(())
    }
}

/// Reads a required string operand.
pub(crate) fn op_string(operands: &[Operand], index: usize) -> VmResult<&str> {
    operands
        .get(index)
        .and_then(Operand::string_value)
        .ok_or(VmError::NilOperand)
}
