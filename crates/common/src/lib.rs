//! XVM common types.
//!
//! This crate provides the foundational data structures for the XVM
//! instruction set:
//!
//! - [`Opcode`]: the closed set of 26 opcodes
//! - [`Instruction`]: an opcode plus its operands
//! - [`Value`]: runtime values (arbitrary-precision integers, floats, text)
//! - [`Program`]: the function table, with its JSON form
//! - [`LoadError`]: errors from building a function table
//!
//! The entry-point function is named by [`ENTRY_POINT`].

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod value;

// Re-export commonly used types at the crate root.
pub use error::LoadError;
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use program::{Program, ENTRY_POINT};
pub use value::Value;
