//! XVM virtual machine: executes function tables of stack instructions.
//!
//! The VM is a stack-based machine with:
//! - An operand stack of integers, floats and text
//! - Per-frame variable bindings, saved and restored across CALL
//! - A per-function label table for JMP / CJMP
//! - A breakpoint flag that stops a run and waits for the controller
//!
//! # Usage
//!
//! ```
//! use xvm_common::{Instruction, Opcode, Program, Value};
//! use xvm_vm::{run, NoInput, Transcript};
//!
//! let program = Program::with_entry(vec![
//!     Instruction::with_arg(Opcode::LoadConst, 10),
//!     Instruction::with_arg(Opcode::LoadConst, 3),
//!     Instruction::op(Opcode::Sub),
//!     Instruction::op(Opcode::Print),
//! ]);
//!
//! let out = Transcript::new();
//! run(program, NoInput, out.clone()).unwrap();
//! assert_eq!(out.values(), vec![Value::from(7)]);
//! ```

pub mod debugger;
pub mod error;
pub mod execute;
pub mod io;
pub mod machine;
mod numeric;
pub mod persist;

pub use debugger::{Debugger, FrameInfo};
pub use error::RuntimeError;
pub use execute::{Flow, RunReport, StopReason};
pub use io::{Discard, Input, InputKind, NoInput, Output, ScriptedInput, Transcript};
pub use machine::{Limits, VM};
pub use persist::PersistError;

use xvm_common::Program;

/// Load a program and run it to completion.
///
/// Breakpoints are ignored: each one is cleared and execution resumes.
/// Returns the finished VM so the caller can inspect its final state.
///
/// # Errors
///
/// Returns [`RuntimeError`] if the program has no entry point or an
/// instruction fails.
pub fn run(
    program: Program,
    input: impl Input + 'static,
    output: impl Output + 'static,
) -> Result<VM, RuntimeError> {
    let mut vm = VM::new(input, output);
    vm.load(program)?;
    while vm.run()?.stop != StopReason::Completed {
        vm.clear_breakpoint();
    }
    Ok(vm)
}
