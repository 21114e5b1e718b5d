//! Interactive debugger shell.
//!
//! One command per line. Every command prints its outcome; errors are
//! reported and the session continues with the VM state as it was before
//! the failing instruction.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use xvm_assembler::{assemble_line, instruction_line};
use xvm_common::Value;
use xvm_vm::{Debugger, Limits, StopReason, VM};

use crate::io::{LineInput, Printer, SharedReader, SharedWriter};
use crate::source::read_program;

pub const PROMPT: &str = "debugger> ";

const INTRO: &str = "Welcome to the XVM debugger. Type help or ? to list commands.";

const HELP: &[(&str, &str)] = &[
    ("load <file>", "load a .json or .xasm program"),
    ("step", "execute one instruction"),
    ("next", "execute one instruction, running calls to completion"),
    ("run [n]", "run to the next breakpoint or the end, at most n instructions"),
    ("stack [n]", "show the stack, or its top n values"),
    ("memory", "show the variables of the current frame"),
    ("print <var>", "show one variable"),
    ("frame", "show the active function, call stack and variables"),
    ("exec <OPCODE> [arg]", "execute one instruction against the current state"),
    ("save stack|memory <file>", "write the stack or variables to a file"),
    ("restore stack|memory <file>", "read the stack or variables from a file"),
    ("exit", "leave the debugger"),
];

/// Whether the session continues after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Stack,
    Memory,
}

pub struct Shell<R, W> {
    debugger: Debugger,
    input: SharedReader<R>,
    out: SharedWriter<W>,
}

impl<R: BufRead + 'static, W: Write + 'static> Shell<R, W> {
    /// Create a shell whose program reads from `input` and prints to `out`,
    /// the same handles the shell itself uses.
    pub fn new(input: SharedReader<R>, out: SharedWriter<W>, limits: Limits) -> Self {
        let vm = VM::with_limits(
            LineInput::new(input.clone()),
            Printer::new(out.clone()),
            limits,
        );
        Self {
            debugger: Debugger::new(vm),
            input,
            out,
        }
    }

    pub fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    /// Read and execute commands until `exit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.out, "{INTRO}")?;
        loop {
            write!(self.out, "{PROMPT}")?;
            self.out.flush()?;
            let Some(line) = self.input.read_line()? else {
                writeln!(self.out)?;
                return self.execute("exit").map(drop);
            };
            if self.execute(&line)? == Control::Exit {
                return Ok(());
            }
        }
    }

    /// Execute one command line.
    pub fn execute(&mut self, line: &str) -> io::Result<Control> {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "exit" | "quit" => {
                writeln!(self.out, "Exiting...")?;
                return Ok(Control::Exit);
            }
            "help" | "?" => self.help()?,
            "load" => self.load(arg)?,
            "step" => self.step(false)?,
            "next" => self.step(true)?,
            "run" => self.run_program(arg)?,
            "stack" => self.stack(arg)?,
            "memory" => self.memory()?,
            "print" => self.print(arg)?,
            "frame" => self.frame()?,
            "exec" => self.exec(arg)?,
            "save" => self.persist(arg, true)?,
            "restore" => self.persist(arg, false)?,
            _ => writeln!(self.out, "[default handler] You entered: '{line}'")?,
        }
        Ok(Control::Continue)
    }

    /// Load a program file, reporting the entry point's length.
    pub fn load(&mut self, path: &str) -> io::Result<()> {
        if path.is_empty() {
            return writeln!(self.out, "Usage: load <file_path>");
        }
        let loaded = read_program(Path::new(path))
            .map_err(|e| e.to_string())
            .and_then(|program| self.debugger.load(program).map_err(|e| e.to_string()));
        match loaded {
            Ok(count) => {
                writeln!(self.out, "Loaded code from {path}")?;
                writeln!(self.out, "Program counter reset to 0, {count} instructions loaded.")
            }
            Err(e) => writeln!(self.out, "Error loading code: {e}"),
        }
    }

    fn help(&mut self) -> io::Result<()> {
        writeln!(self.out, "Commands:")?;
        for (usage, summary) in HELP {
            writeln!(self.out, "  {usage:<30} {summary}")?;
        }
        Ok(())
    }

    fn require_code(&mut self) -> io::Result<bool> {
        if !self.debugger.is_loaded() {
            writeln!(self.out, "No code loaded. Use 'load <file>' first.")?;
            return Ok(false);
        }
        Ok(true)
    }

    fn step(&mut self, over: bool) -> io::Result<()> {
        if !self.require_code()? {
            return Ok(());
        }
        let result = if over {
            self.debugger.next()
        } else {
            self.debugger.step()
        };
        match result {
            Ok(instr) => {
                writeln!(self.out, "Executed: {}", instruction_line(&instr))?;
                writeln!(
                    self.out,
                    "PC: {}, Function: {}",
                    self.debugger.pc(),
                    self.debugger.function()
                )?;
                if self.debugger.is_breakpoint_hit() {
                    writeln!(self.out, "Hit breakpoint at PC {}", self.debugger.pc())?;
                }
                Ok(())
            }
            Err(e) => writeln!(self.out, "Error: {e}"),
        }
    }

    fn run_program(&mut self, arg: &str) -> io::Result<()> {
        let budget = match arg {
            "" => None,
            n => match n.parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => return writeln!(self.out, "Usage: run [n] where n is a non-negative integer."),
            },
        };
        if !self.require_code()? {
            return Ok(());
        }

        let report = match self.debugger.run_for(budget) {
            Ok(report) => report,
            Err(e) => {
                writeln!(self.out, "Error: {e}")?;
                return writeln!(
                    self.out,
                    "Stopped at PC {}, Function: {}",
                    self.debugger.pc(),
                    self.debugger.function()
                );
            }
        };

        let pc = self.debugger.pc();
        match report.stop {
            StopReason::Completed => writeln!(
                self.out,
                "Program execution completed. Executed {} instructions.",
                report.executed
            ),
            StopReason::Breakpoint => {
                writeln!(self.out, "Hit breakpoint at PC {pc}")?;
                writeln!(
                    self.out,
                    "Executed {} instructions, stopped at breakpoint at PC {pc}",
                    report.executed
                )
            }
            StopReason::Paused => writeln!(
                self.out,
                "Executed {} instructions, stopped at PC {pc}",
                report.executed
            ),
        }
    }

    fn stack(&mut self, arg: &str) -> io::Result<()> {
        let last = match arg {
            "" => None,
            n => match n.parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => return writeln!(self.out, "Usage: stack [n] where n is a non-negative integer."),
            },
        };
        match self.debugger.stack(last) {
            Some(values) => writeln!(self.out, "{}", list(values)),
            None => writeln!(
                self.out,
                "Stack has only {} elements.",
                self.debugger.vm().stack().len()
            ),
        }
    }

    fn memory(&mut self) -> io::Result<()> {
        let variables = self.debugger.variables();
        if variables.is_empty() {
            return writeln!(self.out, "No variables stored.");
        }
        writeln!(self.out, "Variables:")?;
        for (name, value) in variables {
            writeln!(self.out, "{name}: {value}")?;
        }
        Ok(())
    }

    fn print(&mut self, name: &str) -> io::Result<()> {
        if name.is_empty() {
            return writeln!(self.out, "Usage: print <var_name>");
        }
        match self.debugger.variable(name) {
            Some(value) => writeln!(self.out, "{name} = {value}"),
            None => writeln!(self.out, "Variable '{name}' not found."),
        }
    }

    fn frame(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "Function: {}, PC: {}, Depth: {}",
            self.debugger.function(),
            self.debugger.pc(),
            self.debugger.depth()
        )?;
        for (level, frame) in self.debugger.frames().iter().enumerate() {
            writeln!(
                self.out,
                "  #{level} {} (called from PC {})",
                frame.function, frame.return_pc
            )?;
        }
        if self.debugger.variables().is_empty() {
            return writeln!(self.out, "No variables in current frame.");
        }
        self.memory()
    }

    fn exec(&mut self, text: &str) -> io::Result<()> {
        let instr = match assemble_line(text) {
            Ok(Some(instr)) => instr,
            Ok(None) => return writeln!(self.out, "No operation provided."),
            Err(e) => return writeln!(self.out, "Error: {e}"),
        };
        match self.debugger.exec(&instr) {
            Ok(_) => writeln!(self.out, "Executed: {}", instruction_line(&instr)),
            Err(e) => writeln!(self.out, "Error: {e}"),
        }
    }

    fn persist(&mut self, arg: &str, save: bool) -> io::Result<()> {
        let verb = if save { "save" } else { "restore" };
        let parsed = arg.split_once(char::is_whitespace).and_then(|(what, path)| {
            let target = match what {
                "stack" => Target::Stack,
                "memory" => Target::Memory,
                _ => return None,
            };
            Some((target, path.trim()))
        });
        let Some((target, path)) = parsed.filter(|(_, path)| !path.is_empty()) else {
            return writeln!(self.out, "Usage: {verb} stack|memory <file>");
        };

        let result = if save {
            File::create(path).map_err(Into::into).and_then(|file| {
                let writer = BufWriter::new(file);
                match target {
                    Target::Stack => self.debugger.save_stack(writer),
                    Target::Memory => self.debugger.save_variables(writer),
                }
            })
        } else {
            File::open(path).map_err(Into::into).and_then(|file| {
                let reader = BufReader::new(file);
                match target {
                    Target::Stack => self.debugger.restore_stack(reader),
                    Target::Memory => self.debugger.restore_variables(reader),
                }
            })
        };

        let what = match target {
            Target::Stack => "stack",
            Target::Memory => "memory",
        };
        match (result, save) {
            (Ok(()), true) => writeln!(self.out, "Saved {what} to {path}"),
            (Ok(()), false) => writeln!(self.out, "Restored {what} from {path}"),
            (Err(e), _) => writeln!(self.out, "Error: {e}"),
        }
    }
}

fn list(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(Value::to_literal).collect();
    format!("[{}]", items.join(", "))
}
