//! Load errors for XVM function tables.

use thiserror::Error;

/// Errors that occur while building a function table from its JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The document is not valid JSON or not shaped like a function table.
    #[error("malformed program: {0}")]
    Json(String),

    /// An `op` field names no known opcode.
    #[error("unknown opcode '{0}'")]
    UnknownOpcode(String),

    /// A one-operand opcode has no `arg`.
    #[error("{function}[{index}]: {opcode} requires an argument")]
    MissingArgument {
        function: String,
        index: usize,
        opcode: &'static str,
    },

    /// A zero-operand opcode carries an `arg`.
    #[error("{function}[{index}]: {opcode} takes no argument")]
    UnexpectedArgument {
        function: String,
        index: usize,
        opcode: &'static str,
    },

    /// An `arg` is not an integer, float or string.
    #[error("{function}[{index}]: invalid argument {found}")]
    InvalidOperand {
        function: String,
        index: usize,
        found: String,
    },

    /// The reserved entry-point function is absent.
    #[error("missing entry point function '{0}'")]
    MissingEntryPoint(&'static str),
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Json(e.to_string())
    }
}
