//! VM state management: stack, bindings, call stack, label table.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use xvm_common::{Instruction, Opcode, Program, Value, ENTRY_POINT};

use crate::error::RuntimeError;
use crate::io::{Discard, Input, NoInput, Output};

/// Default maximum operand stack depth.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 1 << 16;

/// Default maximum number of nested calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Variable bindings of one frame.
pub type Bindings = BTreeMap<String, Value>;

/// Label name to the index of its LABEL instruction.
pub type LabelTable = HashMap<String, usize>;

/// Resource limits for one VM instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Values the operand stack may hold.
    pub max_stack_depth: usize,
    /// Frames the call stack may hold.
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Saved caller context, pushed at CALL and restored at return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// Function that executed the CALL.
    pub function: String,
    /// Index of the CALL instruction in the caller.
    pub return_pc: usize,
    /// Caller's variable bindings.
    pub variables: Bindings,
    /// Caller's label table.
    pub labels: LabelTable,
}

/// The XVM virtual machine.
///
/// One instance owns one program's entire runtime state. Instances share
/// nothing; run independent programs on independent VMs.
pub struct VM {
    /// The loaded function table.
    pub(crate) program: Option<Program>,
    pub(crate) limits: Limits,
    pub(crate) input: Box<dyn Input>,
    pub(crate) output: Box<dyn Output>,
    /// Operand stack.
    pub(crate) stack: Vec<Value>,
    /// Bindings of the active frame.
    pub(crate) variables: Bindings,
    /// Program counter (index into the active function).
    pub(crate) pc: usize,
    /// Name of the active function.
    pub(crate) function: String,
    /// Labels of the active function.
    pub(crate) labels: LabelTable,
    /// Saved caller frames, innermost last.
    pub(crate) call_stack: Vec<CallFrame>,
    /// Set by BREAKPOINT; cleared only by the driving controller.
    pub(crate) breakpoint_hit: bool,
}

impl Default for VM {
    fn default() -> Self {
        Self::new(NoInput, Discard)
    }
}

impl VM {
    /// Create a VM reading from `input` and printing to `output`.
    pub fn new(input: impl Input + 'static, output: impl Output + 'static) -> Self {
        Self::with_limits(input, output, Limits::default())
    }

    /// Create a VM with explicit resource limits.
    pub fn with_limits(
        input: impl Input + 'static,
        output: impl Output + 'static,
        limits: Limits,
    ) -> Self {
        Self {
            program: None,
            limits,
            input: Box::new(input),
            output: Box::new(output),
            stack: Vec::new(),
            variables: Bindings::new(),
            pc: 0,
            function: ENTRY_POINT.to_string(),
            labels: LabelTable::new(),
            call_stack: Vec::new(),
            breakpoint_hit: false,
        }
    }

    /// Load a function table and point execution at its entry point.
    ///
    /// Resets the program counter, call stack and breakpoint flag. The
    /// operand stack and variable bindings are kept.
    pub fn load(&mut self, program: Program) -> Result<(), RuntimeError> {
        let labels = match program.entry() {
            Some(entry) => scan_labels(entry),
            None => return Err(RuntimeError::MissingEntryPoint(ENTRY_POINT)),
        };

        debug!(
            functions = program.functions.len(),
            instructions = program.len(),
            "program loaded"
        );

        self.program = Some(program);
        self.function = ENTRY_POINT.to_string();
        self.labels = labels;
        self.pc = 0;
        self.call_stack.clear();
        self.breakpoint_hit = false;
        Ok(())
    }

    /// True once a program has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.program.is_some()
    }

    /// The loaded program.
    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Instructions of the active function.
    pub fn code(&self) -> &[Instruction] {
        self.program
            .as_ref()
            .and_then(|p| p.get(&self.function))
            .unwrap_or(&[])
    }

    /// The instruction the next step would execute.
    pub fn current(&self) -> Option<&Instruction> {
        self.code().get(self.pc)
    }

    /// True when the program counter is past the end of the entry-level
    /// function and no caller remains.
    pub fn is_finished(&self) -> bool {
        self.is_loaded() && self.pc >= self.code().len() && self.call_stack.is_empty()
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Name of the active function.
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn variables(&self) -> &Bindings {
        &self.variables
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Saved caller frames, outermost first.
    pub fn frames(&self) -> &[CallFrame] {
        &self.call_stack
    }

    /// Number of unreturned calls.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn is_breakpoint_hit(&self) -> bool {
        self.breakpoint_hit
    }

    pub fn clear_breakpoint(&mut self) {
        self.breakpoint_hit = false;
    }

    /// Push a value onto the stack, checking for overflow.
    pub(crate) fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        self.ensure_room()?;
        self.stack.push(value);
        Ok(())
    }

    /// Fail if one more value would overflow the stack.
    pub(crate) fn ensure_room(&self) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.limits.max_stack_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.limits.max_stack_depth,
            });
        }
        Ok(())
    }

    /// Pop a value from the stack.
    pub(crate) fn pop(&mut self, opcode: Opcode) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { opcode })
    }

    /// Borrow the top `N` values without popping, deepest first.
    pub(crate) fn peek<const N: usize>(&self, opcode: Opcode) -> Result<[&Value; N], RuntimeError> {
        let len = self.stack.len();
        if len < N {
            return Err(RuntimeError::StackUnderflow { opcode });
        }
        Ok(std::array::from_fn(|i| &self.stack[len - N + i]))
    }

    /// Switch the active function, rebuilding its label table.
    pub(crate) fn enter(&mut self, function: &str) {
        self.function = function.to_string();
        self.labels = scan_labels(self.code());
    }
}

/// Build a label table by scanning for LABEL instructions in order.
///
/// The first definition of a name wins. Instructions whose operand is not a
/// text name are skipped here; executing them reports the mismatch.
pub fn scan_labels(code: &[Instruction]) -> LabelTable {
    let mut labels = LabelTable::new();
    for (index, instr) in code.iter().enumerate() {
        if instr.opcode != Opcode::Label {
            continue;
        }
        if let Some(name) = instr.arg().and_then(Value::as_str) {
            labels.entry(name.to_string()).or_insert(index);
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str) -> Instruction {
        Instruction::with_arg(Opcode::Label, name)
    }

    #[test]
    fn scan_labels_records_label_positions() {
        let code = vec![
            Instruction::op(Opcode::Ret),
            label("a"),
            Instruction::op(Opcode::Add),
            label("b"),
        ];
        let labels = scan_labels(&code);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels["a"], 1);
        assert_eq!(labels["b"], 3);
    }

    #[test]
    fn scan_labels_first_definition_wins() {
        let code = vec![label("x"), label("x")];
        assert_eq!(scan_labels(&code)["x"], 0);
    }

    #[test]
    fn new_vm_is_empty() {
        let vm = VM::default();
        assert!(!vm.is_loaded());
        assert!(!vm.is_finished());
        assert_eq!(vm.pc(), 0);
        assert!(vm.stack().is_empty());
        assert_eq!(vm.call_depth(), 0);
        assert_eq!(vm.limits(), Limits::default());
    }

    #[test]
    fn load_requires_entry_point() {
        let mut vm = VM::default();
        let program = Program::default().function("main", vec![]);
        assert_eq!(
            vm.load(program),
            Err(RuntimeError::MissingEntryPoint(ENTRY_POINT))
        );
        assert!(!vm.is_loaded());
    }

    #[test]
    fn load_keeps_stack_and_variables() {
        let mut vm = VM::default();
        vm.stack.push(Value::from(1));
        vm.variables.insert("x".to_string(), Value::from(2));
        vm.breakpoint_hit = true;
        vm.pc = 7;

        vm.load(Program::with_entry(vec![label("top")])).unwrap();

        assert_eq!(vm.stack(), &[Value::from(1)]);
        assert_eq!(vm.variables()["x"], Value::from(2));
        assert_eq!(vm.pc(), 0);
        assert!(!vm.is_breakpoint_hit());
        assert_eq!(vm.labels()["top"], 0);
        assert_eq!(vm.function(), ENTRY_POINT);
    }

    #[test]
    fn peek_does_not_pop() {
        let mut vm = VM::default();
        vm.stack = vec![Value::from(1), Value::from(2), Value::from(3)];
        let [a, b] = vm.peek::<2>(Opcode::Add).unwrap();
        assert_eq!((a, b), (&Value::from(2), &Value::from(3)));
        assert_eq!(vm.stack().len(), 3);
        assert_eq!(
            vm.peek::<4>(Opcode::Add),
            Err(RuntimeError::StackUnderflow { opcode: Opcode::Add })
        );
    }

    #[test]
    fn push_respects_limit() {
        let limits = Limits {
            max_stack_depth: 1,
            ..Limits::default()
        };
        let mut vm = VM::with_limits(NoInput, Discard, limits);
        vm.push(Value::from(1)).unwrap();
        assert_eq!(
            vm.push(Value::from(2)),
            Err(RuntimeError::StackOverflow { limit: 1 })
        );
    }
}
