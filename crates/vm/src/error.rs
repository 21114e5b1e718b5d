//! Runtime errors for the XVM.
//!
//! Every error is fatal to the instruction that raised it. The VM leaves
//! its state as it was before that instruction, so an interactive host can
//! report the error and carry on.

use thiserror::Error;
use xvm_common::Opcode;

/// Errors that occur during program execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Operand count does not match the opcode's arity.
    #[error("{opcode} expects {expected} operand(s), got {found}")]
    Arity {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    /// Pop on an empty (or too shallow) stack.
    #[error("stack underflow in {opcode}")]
    StackUnderflow { opcode: Opcode },

    /// LOAD_VAR on a name with no binding in the current frame.
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    /// JMP/CJMP to a label not defined in the active function.
    #[error("undefined label '{0}'")]
    UndefinedLabel(String),

    /// CALL of a name absent from the function table.
    #[error("undefined function '{0}'")]
    UndefinedFunction(String),

    /// An operand or stack value has the wrong kind for the operation.
    #[error("type mismatch in {opcode}: {detail}")]
    TypeMismatch { opcode: Opcode, detail: String },

    /// Division by zero, domain error, or a non-finite float result.
    #[error("arithmetic error in {opcode}: {reason}")]
    Arithmetic {
        opcode: Opcode,
        reason: &'static str,
    },

    /// The loaded function table has no entry point.
    #[error("missing entry point function '{0}'")]
    MissingEntryPoint(&'static str),

    /// Stepping or calling before any program was loaded.
    #[error("no code loaded")]
    NoCodeLoaded,

    /// Stepping past the end of the program.
    #[error("program finished")]
    ProgramFinished,

    /// Operand stack exceeded the configured depth.
    #[error("stack overflow (limit {limit})")]
    StackOverflow { limit: usize },

    /// Call stack exceeded the configured depth.
    #[error("call depth exceeded (limit {limit})")]
    CallDepthExceeded { limit: usize },

    /// The input source failed.
    #[error("input error: {0}")]
    Input(String),
}
