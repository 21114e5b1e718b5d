//! CLI command implementations.
//!
//! Each command reports its own errors on stderr and returns the process
//! exit code on failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;
use xvm_common::Program;
use xvm_vm::{Limits, StopReason, VM};

use crate::io::{LineInput, Printer, SharedReader, SharedWriter};
use crate::shell::Shell;
use crate::source::{is_assembly, read_program};

/// Input, load or assembly failure.
pub const EXIT_INPUT: i32 = 1;
/// An instruction failed at runtime.
pub const EXIT_RUNTIME: i32 = 3;
/// The step limit ran out before the program finished.
pub const EXIT_STEP_LIMIT: i32 = 4;

fn load(path: &Path) -> Result<Program, i32> {
    read_program(path).map_err(|e| {
        eprintln!("error: {e}");
        EXIT_INPUT
    })
}

/// Run a program to completion on stdin/stdout.
///
/// Breakpoints are logged and resumed.
pub fn run(path: &Path, limits: Limits, step_limit: Option<usize>) -> Result<(), i32> {
    let program = load(path)?;

    let input = SharedReader::new(io::stdin().lock());
    let output = SharedWriter::new(io::stdout());
    let mut vm = VM::with_limits(LineInput::new(input), Printer::new(output), limits);
    vm.load(program).map_err(|e| {
        eprintln!("error: {e}");
        EXIT_INPUT
    })?;

    let mut executed = 0;
    loop {
        let budget = step_limit.map(|limit| limit.saturating_sub(executed));
        let report = vm.run_for(budget).map_err(|e| {
            eprintln!("runtime error: {e}");
            eprintln!("  at pc {} in {}", vm.pc(), vm.function());
            EXIT_RUNTIME
        })?;
        executed += report.executed;

        match report.stop {
            StopReason::Completed => return Ok(()),
            StopReason::Breakpoint => {
                info!(pc = vm.pc(), function = vm.function(), "breakpoint, resuming");
                vm.clear_breakpoint();
            }
            StopReason::Paused => {
                eprintln!(
                    "error: step limit of {executed} reached at pc {} in {}",
                    vm.pc(),
                    vm.function()
                );
                return Err(EXIT_STEP_LIMIT);
            }
        }
    }
}

/// Start the interactive debugger, optionally with a program loaded.
pub fn debug(path: Option<&Path>, limits: Limits) -> Result<(), i32> {
    let input = SharedReader::new(io::stdin().lock());
    let output = SharedWriter::new(io::stdout());
    let mut shell = Shell::new(input, output, limits);

    let session = match path {
        Some(path) => shell
            .load(&path.display().to_string())
            .and_then(|()| shell.run()),
        None => shell.run(),
    };
    session.map_err(|e| {
        eprintln!("error: {e}");
        EXIT_INPUT
    })
}

/// Assemble a .xasm text file to a JSON function table.
pub fn assemble(input: &Path, output: Option<&Path>) -> Result<(), i32> {
    if !is_assembly(input) {
        eprintln!("error: expected a .xasm file, got '{}'", input.display());
        return Err(EXIT_INPUT);
    }
    let output: PathBuf = output.map_or_else(|| input.with_extension("json"), Path::to_path_buf);

    let program = load(input)?;
    let json = program.to_json().map_err(|e| {
        eprintln!("error: {e}");
        EXIT_INPUT
    })?;

    fs::write(&output, json + "\n").map_err(|e| {
        eprintln!("error: cannot write '{}': {e}", output.display());
        EXIT_INPUT
    })?;

    eprintln!(
        "assembled {} instructions in {} functions -> {}",
        program.len(),
        program.functions.len(),
        output.display()
    );
    Ok(())
}

/// Print the canonical assembly text of a program.
pub fn disassemble(input: &Path) -> Result<(), i32> {
    let program = load(input)?;
    print!("{}", xvm_assembler::disassemble(&program));
    Ok(())
}
