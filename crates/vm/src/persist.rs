//! Saving and restoring the operand stack and variable bindings.
//!
//! Both are written as JSON. Integers keep their full precision and stay
//! distinct from floats, so a restore reproduces exactly what was saved.

use std::io::{Read, Write};

use thiserror::Error;
use xvm_common::Value;

use crate::machine::{Bindings, VM};

/// Errors from saving or restoring runtime state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid state data: {0}")]
    Format(#[from] serde_json::Error),

    /// The saved stack is deeper than this VM allows.
    #[error("saved stack holds {found} values (limit {limit})")]
    StackTooDeep { found: usize, limit: usize },
}

impl VM {
    pub fn save_stack<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        serde_json::to_writer(writer, &self.stack)?;
        Ok(())
    }

    /// Replace the operand stack with a saved one.
    pub fn restore_stack<R: Read>(&mut self, reader: R) -> Result<(), PersistError> {
        let stack: Vec<Value> = serde_json::from_reader(reader)?;
        if stack.len() > self.limits.max_stack_depth {
            return Err(PersistError::StackTooDeep {
                found: stack.len(),
                limit: self.limits.max_stack_depth,
            });
        }
        self.stack = stack;
        Ok(())
    }

    pub fn save_variables<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        serde_json::to_writer(writer, &self.variables)?;
        Ok(())
    }

    /// Replace the current frame's bindings with saved ones.
    pub fn restore_variables<R: Read>(&mut self, reader: R) -> Result<(), PersistError> {
        let variables: Bindings = serde_json::from_reader(reader)?;
        self.variables = variables;
        Ok(())
    }
}
