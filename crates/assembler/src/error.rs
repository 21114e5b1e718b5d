//! Error types for the XVM assembler.

use thiserror::Error;

/// Errors produced while assembling text into a function table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// An unrecognized opcode mnemonic was encountered.
    #[error("line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    /// An opcode did not have enough arguments.
    #[error("line {line}: {opcode} expects {expected} argument(s)")]
    MissingArgument {
        line: usize,
        opcode: &'static str,
        expected: usize,
    },

    /// A token appeared where it was not expected.
    #[error("line {line}: unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },

    /// A quoted literal was not closed before the end of the line.
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    /// A backslash escape other than `\"`, `\\`, `\n`, `\t`.
    #[error("line {line}: invalid escape '\\{escape}'")]
    InvalidEscape { line: usize, escape: char },

    /// A function header with no name.
    #[error("line {line}: empty function name")]
    EmptyFunctionName { line: usize },

    /// A function header naming the entry point.
    #[error("line {line}: function name '{name}' is reserved")]
    ReservedFunctionName { line: usize, name: String },

    /// A second header for a function already defined.
    #[error("line {line}: duplicate function '{name}'")]
    DuplicateFunction { line: usize, name: String },
}
