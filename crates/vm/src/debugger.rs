//! Stepping debugger controller.
//!
//! A thin layer over [`VM`]: every mutation goes through the engine's own
//! operations, and every query reflects the state after the last completed
//! operation.

use std::io::{Read, Write};

use xvm_common::{Instruction, Program, Value};

use crate::error::RuntimeError;
use crate::execute::{Flow, RunReport};
use crate::machine::{Bindings, VM};
use crate::persist::PersistError;

/// One caller frame as seen from the debugger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// Function that made the call.
    pub function: String,
    /// Index of the CALL instruction in that function.
    pub return_pc: usize,
}

/// Interactive controller for one VM.
pub struct Debugger {
    vm: VM,
}

impl Debugger {
    pub fn new(vm: VM) -> Self {
        Self { vm }
    }

    /// Read-only view of the engine.
    pub fn vm(&self) -> &VM {
        &self.vm
    }

    pub fn into_vm(self) -> VM {
        self.vm
    }

    /// Load a program. Returns the entry point's instruction count.
    pub fn load(&mut self, program: Program) -> Result<usize, RuntimeError> {
        self.vm.load(program)?;
        Ok(self.vm.code().len())
    }

    /// Execute exactly one instruction.
    pub fn step(&mut self) -> Result<Instruction, RuntimeError> {
        self.vm.step()
    }

    /// Execute one instruction, running any CALL to completion.
    pub fn next(&mut self) -> Result<Instruction, RuntimeError> {
        self.vm.step_over()
    }

    /// Clear the breakpoint flag and run until the next breakpoint or the end.
    pub fn run(&mut self) -> Result<RunReport, RuntimeError> {
        self.run_for(None)
    }

    /// Like [`Debugger::run`] with an optional instruction budget.
    pub fn run_for(&mut self, budget: Option<usize>) -> Result<RunReport, RuntimeError> {
        self.vm.clear_breakpoint();
        self.vm.run_for(budget)
    }

    /// Execute an ad-hoc instruction against the current state.
    ///
    /// A RET or jump that leaves a callee at its end returns to the caller
    /// right away, as a step would.
    pub fn exec(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        let flow = self.vm.execute(instr)?;
        self.vm.unwind_fallthrough();
        Ok(flow)
    }

    /// The whole stack, or its top `last` values. `None` if the stack holds
    /// fewer than `last` values.
    pub fn stack(&self, last: Option<usize>) -> Option<&[Value]> {
        let stack = self.vm.stack();
        match last {
            None => Some(stack),
            Some(n) if n <= stack.len() => Some(&stack[stack.len() - n..]),
            Some(_) => None,
        }
    }

    pub fn variables(&self) -> &Bindings {
        self.vm.variables()
    }

    /// Look up one variable of the current frame.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.vm.variables().get(name)
    }

    /// Caller frames, outermost first.
    pub fn frames(&self) -> Vec<FrameInfo> {
        self.vm
            .frames()
            .iter()
            .map(|frame| FrameInfo {
                function: frame.function.clone(),
                return_pc: frame.return_pc,
            })
            .collect()
    }

    pub fn depth(&self) -> usize {
        self.vm.call_depth()
    }

    pub fn pc(&self) -> usize {
        self.vm.pc()
    }

    pub fn function(&self) -> &str {
        self.vm.function()
    }

    pub fn is_loaded(&self) -> bool {
        self.vm.is_loaded()
    }

    pub fn is_finished(&self) -> bool {
        self.vm.is_finished()
    }

    pub fn is_breakpoint_hit(&self) -> bool {
        self.vm.is_breakpoint_hit()
    }

    pub fn save_stack<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        self.vm.save_stack(writer)
    }

    pub fn restore_stack<R: Read>(&mut self, reader: R) -> Result<(), PersistError> {
        self.vm.restore_stack(reader)
    }

    pub fn save_variables<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        self.vm.save_variables(writer)
    }

    pub fn restore_variables<R: Read>(&mut self, reader: R) -> Result<(), PersistError> {
        self.vm.restore_variables(reader)
    }
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new(VM::default())
    }
}
