//! Opcode definitions for the XVM instruction set.

use std::fmt;
use std::str::FromStr;

use crate::error::LoadError;

/// Identifies the operation to perform.
///
/// The set is closed: every opcode has a fixed arity and the VM dispatches
/// on it with an exhaustive `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Constants & variables
    /// Push the literal operand.
    LoadConst,
    /// Push the value bound to the named variable.
    LoadVar,
    /// Pop top of stack and bind it to the named variable.
    StoreVar,

    // Arithmetic
    /// Pop two values, push (second_popped + first_popped).
    Add,
    /// Pop two values, push (second_popped - first_popped).
    Sub,
    /// Pop two values, push their product.
    Mul,
    /// Pop two values, push (second_popped / first_popped).
    Div,
    /// Pop two values, push (second_popped mod first_popped).
    Mod,
    /// Pop one value, push e raised to it.
    Exp,
    /// Pop one value, push its square root.
    Sqrt,
    /// Pop one value, push its negation.
    Neg,

    // Comparison: push 1 or 0 for (second_popped <op> first_popped)
    /// Equal.
    Eq,
    /// Not equal.
    Neq,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal.
    Ge,
    /// Less than or equal.
    Le,

    // I/O
    /// Pop one value and send it to the output sink.
    Print,
    /// Push a text value read from the input source.
    InputString,
    /// Push a numeric value read from the input source.
    InputNumber,

    // Control flow
    /// Jump target. No-op at execution time.
    Label,
    /// Unconditional jump to a label of the active function.
    Jmp,
    /// Pop condition; jump to the label if it is non-zero.
    Cjmp,
    /// Pop a function name and call it.
    Call,
    /// Return to the caller, or finish the program at top level.
    Ret,

    // Debugging
    /// Set the breakpoint-hit flag.
    Breakpoint,
}

/// All valid opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 26] = [
    Opcode::LoadConst,
    Opcode::LoadVar,
    Opcode::StoreVar,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Exp,
    Opcode::Sqrt,
    Opcode::Neg,
    Opcode::Eq,
    Opcode::Neq,
    Opcode::Gt,
    Opcode::Lt,
    Opcode::Ge,
    Opcode::Le,
    Opcode::Print,
    Opcode::InputString,
    Opcode::InputNumber,
    Opcode::Label,
    Opcode::Jmp,
    Opcode::Cjmp,
    Opcode::Call,
    Opcode::Ret,
    Opcode::Breakpoint,
];

impl Opcode {
    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::LoadConst => "LOAD_CONST",
            Opcode::LoadVar => "LOAD_VAR",
            Opcode::StoreVar => "STORE_VAR",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Exp => "EXP",
            Opcode::Sqrt => "SQRT",
            Opcode::Neg => "NEG",
            Opcode::Eq => "EQ",
            Opcode::Neq => "NEQ",
            Opcode::Gt => "GT",
            Opcode::Lt => "LT",
            Opcode::Ge => "GE",
            Opcode::Le => "LE",
            Opcode::Print => "PRINT",
            Opcode::InputString => "INPUT_STRING",
            Opcode::InputNumber => "INPUT_NUMBER",
            Opcode::Label => "LABEL",
            Opcode::Jmp => "JMP",
            Opcode::Cjmp => "CJMP",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Breakpoint => "BREAKPOINT",
        }
    }

    /// Number of operands this opcode takes.
    pub fn arity(&self) -> usize {
        match self {
            Opcode::LoadConst
            | Opcode::LoadVar
            | Opcode::StoreVar
            | Opcode::Label
            | Opcode::Jmp
            | Opcode::Cjmp => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Opcode {
    type Err = LoadError;

    /// Mnemonics are matched exactly (upper case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic() == s)
            .copied()
            .ok_or_else(|| LoadError::UnknownOpcode(s.to_string()))
    }
}
