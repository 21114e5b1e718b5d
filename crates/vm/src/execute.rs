//! Opcode dispatch, the fetch-execute cycle, and control transfer.

use std::cmp::Ordering;

use tracing::{debug, trace};
use xvm_common::{Instruction, Opcode, Value};

use crate::error::RuntimeError;
use crate::io::InputKind;
use crate::machine::{CallFrame, VM};
use crate::numeric::{self, NumError};

/// What an executed instruction did to the program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The counter was left alone; the caller advances it.
    Continue,
    /// The instruction set the counter itself (jump, call, return).
    Transfer,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The entry-level function ran off its end or returned.
    Completed,
    /// A BREAKPOINT instruction set the breakpoint flag.
    Breakpoint,
    /// The step budget ran out mid-program.
    Paused,
}

/// Outcome of [`VM::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Instructions executed, not counting the BREAKPOINT that stopped the run.
    pub executed: usize,
    pub stop: StopReason,
}

type BinaryOp = fn(&Value, &Value) -> Result<Value, NumError>;
type UnaryOp = fn(&Value) -> Result<Value, NumError>;

impl VM {
    /// Execute a single instruction against the current state.
    ///
    /// Non-control opcodes leave the program counter alone. A failing
    /// instruction leaves the state as it was: operands are inspected
    /// before anything is popped.
    pub fn execute(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        let opcode = instr.opcode;
        if !instr.has_valid_arity() {
            return Err(RuntimeError::Arity {
                opcode,
                expected: opcode.arity(),
                found: instr.operands.len(),
            });
        }

        match opcode {
            Opcode::LoadConst => {
                let value = instr.operands[0].clone();
                self.push(value)?;
            }
            Opcode::LoadVar => {
                let name = name_operand(instr)?;
                let value = self
                    .variables
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))?;
                self.push(value)?;
            }
            Opcode::StoreVar => {
                let name = name_operand(instr)?;
                let value = self.pop(opcode)?;
                self.variables.insert(name.to_string(), value);
            }

            Opcode::Add => self.binary(opcode, numeric::add)?,
            Opcode::Sub => self.binary(opcode, numeric::sub)?,
            Opcode::Mul => self.binary(opcode, numeric::mul)?,
            Opcode::Div => self.binary(opcode, numeric::div)?,
            Opcode::Mod => self.binary(opcode, numeric::rem)?,
            Opcode::Exp => self.unary(opcode, numeric::exp)?,
            Opcode::Sqrt => self.unary(opcode, numeric::sqrt)?,
            Opcode::Neg => self.unary(opcode, numeric::neg)?,

            Opcode::Eq => self.binary(opcode, |a, b| Ok(flag(numeric::equals(a, b))))?,
            Opcode::Neq => self.binary(opcode, |a, b| Ok(flag(!numeric::equals(a, b))))?,
            Opcode::Gt => self.comparison(opcode, |o| o == Ordering::Greater)?,
            Opcode::Lt => self.comparison(opcode, |o| o == Ordering::Less)?,
            Opcode::Ge => self.comparison(opcode, |o| o != Ordering::Less)?,
            Opcode::Le => self.comparison(opcode, |o| o != Ordering::Greater)?,

            Opcode::Print => {
                let value = self.pop(opcode)?;
                self.output.write(&value);
            }
            Opcode::InputString => self.input(opcode, InputKind::Text)?,
            Opcode::InputNumber => self.input(opcode, InputKind::Number)?,

            Opcode::Label => {
                name_operand(instr)?;
            }
            Opcode::Jmp => {
                self.pc = self.resolve_label(name_operand(instr)?)?;
                return Ok(Flow::Transfer);
            }
            Opcode::Cjmp => {
                let target = self.resolve_label(name_operand(instr)?)?;
                let [cond] = self.peek::<1>(opcode)?;
                let taken = numeric::truthy(cond).map_err(|e| tag(opcode, e))?;
                self.stack.pop();
                if taken {
                    self.pc = target;
                    return Ok(Flow::Transfer);
                }
            }
            Opcode::Call => {
                self.call()?;
                return Ok(Flow::Transfer);
            }
            Opcode::Ret => {
                self.ret();
                return Ok(Flow::Transfer);
            }

            Opcode::Breakpoint => self.breakpoint_hit = true,
        }

        Ok(Flow::Continue)
    }

    /// Fetch, execute and advance for one program position.
    ///
    /// Functions that ran off their end return implicitly to one past their
    /// call site, both before the fetch and after the step. Returns the
    /// executed instruction.
    pub fn step(&mut self) -> Result<Instruction, RuntimeError> {
        if !self.is_loaded() {
            return Err(RuntimeError::NoCodeLoaded);
        }
        self.unwind_fallthrough();
        let instr = self
            .current()
            .cloned()
            .ok_or(RuntimeError::ProgramFinished)?;

        trace!(function = %self.function, pc = self.pc, %instr, "step");

        if self.execute(&instr)? == Flow::Continue {
            self.pc += 1;
        }
        self.unwind_fallthrough();
        Ok(instr)
    }

    /// Step until the program finishes or a breakpoint is hit.
    ///
    /// A breakpoint flag that is already set stops the run before anything
    /// executes; the controller clears it to resume.
    pub fn run(&mut self) -> Result<RunReport, RuntimeError> {
        self.run_for(None)
    }

    /// Like [`VM::run`], but stop with [`StopReason::Paused`] after
    /// `budget` instructions.
    pub fn run_for(&mut self, budget: Option<usize>) -> Result<RunReport, RuntimeError> {
        if !self.is_loaded() {
            return Err(RuntimeError::NoCodeLoaded);
        }

        self.unwind_fallthrough();
        let mut executed = 0;
        let stop = loop {
            if self.breakpoint_hit {
                debug!(function = %self.function, pc = self.pc, "stopped at breakpoint");
                break StopReason::Breakpoint;
            }
            if self.is_finished() {
                break StopReason::Completed;
            }
            if budget.is_some_and(|limit| executed >= limit) {
                break StopReason::Paused;
            }
            self.step()?;
            if !self.breakpoint_hit {
                executed += 1;
            }
        };

        Ok(RunReport { executed, stop })
    }

    /// Step over a CALL: run the callee and everything it calls, stopping
    /// one past the call site. Any other instruction is a plain step.
    pub fn step_over(&mut self) -> Result<Instruction, RuntimeError> {
        let is_call = self
            .current()
            .is_some_and(|instr| instr.opcode == Opcode::Call);
        if !is_call {
            return self.step();
        }

        let depth = self.call_stack.len();
        let instr = self.step()?;
        while self.call_stack.len() > depth && !self.is_finished() {
            self.step()?;
        }
        Ok(instr)
    }

    // ---- Control transfer ----

    fn resolve_label(&self, name: &str) -> Result<usize, RuntimeError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| RuntimeError::UndefinedLabel(name.to_string()))
    }

    /// CALL: everything is validated before the frame is pushed.
    fn call(&mut self) -> Result<(), RuntimeError> {
        let program = self.program.as_ref().ok_or(RuntimeError::NoCodeLoaded)?;
        let [top] = self.peek::<1>(Opcode::Call)?;
        let name = top.as_str().ok_or_else(|| RuntimeError::TypeMismatch {
            opcode: Opcode::Call,
            detail: format!("function name must be text, got {}", top.kind()),
        })?;
        if program.get(name).is_none() {
            return Err(RuntimeError::UndefinedFunction(name.to_string()));
        }
        if self.call_stack.len() >= self.limits.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.limits.max_call_depth,
            });
        }
        let name = name.to_string();
        self.stack.pop();

        debug!(caller = %self.function, callee = %name, depth = self.call_stack.len() + 1, "call");

        self.call_stack.push(CallFrame {
            function: std::mem::take(&mut self.function),
            return_pc: self.pc,
            variables: std::mem::take(&mut self.variables),
            labels: std::mem::take(&mut self.labels),
        });
        self.enter(&name);
        self.pc = 0;
        Ok(())
    }

    /// RET: back to the caller, or to the terminal position at top level.
    fn ret(&mut self) {
        match self.call_stack.pop() {
            Some(frame) => {
                debug!(callee = %self.function, caller = %frame.function, "return");
                self.restore(frame);
            }
            None => self.pc = self.code().len(),
        }
    }

    fn restore(&mut self, frame: CallFrame) {
        self.function = frame.function;
        self.variables = frame.variables;
        self.labels = frame.labels;
        self.pc = frame.return_pc + 1;
    }

    /// Implicit returns for functions that ran off their end.
    pub(crate) fn unwind_fallthrough(&mut self) {
        while self.pc >= self.code().len() {
            let Some(frame) = self.call_stack.pop() else {
                break;
            };
            debug!(callee = %self.function, caller = %frame.function, "implicit return");
            self.restore(frame);
        }
    }

    // ---- Operand helpers ----

    fn binary(&mut self, opcode: Opcode, op: BinaryOp) -> Result<(), RuntimeError> {
        let [a, b] = self.peek::<2>(opcode)?;
        let result = op(a, b).map_err(|e| tag(opcode, e))?;
        self.stack.truncate(self.stack.len() - 2);
        self.stack.push(result);
        Ok(())
    }

    fn unary(&mut self, opcode: Opcode, op: UnaryOp) -> Result<(), RuntimeError> {
        let [a] = self.peek::<1>(opcode)?;
        let result = op(a).map_err(|e| tag(opcode, e))?;
        self.stack.pop();
        self.stack.push(result);
        Ok(())
    }

    fn comparison(&mut self, opcode: Opcode, test: fn(Ordering) -> bool) -> Result<(), RuntimeError> {
        let [a, b] = self.peek::<2>(opcode)?;
        let ordering = numeric::compare(a, b).map_err(|e| tag(opcode, e))?;
        self.stack.truncate(self.stack.len() - 2);
        self.stack.push(flag(test(ordering)));
        Ok(())
    }

    fn input(&mut self, opcode: Opcode, kind: InputKind) -> Result<(), RuntimeError> {
        self.ensure_room()?;
        let value = self.input.read(kind).map_err(RuntimeError::Input)?;
        let accepted = match kind {
            InputKind::Text => matches!(value, Value::Str(_)),
            InputKind::Number => value.is_number(),
        };
        if !accepted {
            return Err(RuntimeError::TypeMismatch {
                opcode,
                detail: format!("input source produced {}", value.kind()),
            });
        }
        self.stack.push(value);
        Ok(())
    }
}

fn flag(b: bool) -> Value {
    Value::from(if b { 1 } else { 0 })
}

fn tag(opcode: Opcode, e: NumError) -> RuntimeError {
    match e {
        NumError::Type(detail) => RuntimeError::TypeMismatch { opcode, detail },
        NumError::Arith(reason) => RuntimeError::Arithmetic { opcode, reason },
    }
}

fn name_operand(instr: &Instruction) -> Result<&str, RuntimeError> {
    let operand = &instr.operands[0];
    operand.as_str().ok_or_else(|| RuntimeError::TypeMismatch {
        opcode: instr.opcode,
        detail: format!("name must be text, got {}", operand.kind()),
    })
}
