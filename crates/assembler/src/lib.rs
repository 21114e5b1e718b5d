//! XVM assembler: line-oriented text ↔ function table translation.
//!
//! One instruction per line, `OPCODE [arg]`. A `#name` line starts a new
//! function; lines before the first header are the entry point.
//!
//! # Usage
//!
//! ```
//! use xvm_assembler::{assemble, disassemble};
//!
//! let text = "LOAD_CONST 5\nLOAD_CONST \"double\"\nCALL\nPRINT\n\n#double\nLOAD_CONST 2\nMUL\nRET\n";
//! let program = assemble(text).unwrap();
//! assert_eq!(program.functions.len(), 2);
//! assert_eq!(disassemble(&program), text);
//! ```
//!
//! # Roundtrip Guarantee
//!
//! `assemble(disassemble(program)) == program` holds for programs whose
//! function names are single words. The disassembler outputs canonical
//! text; the assembler also accepts comments, indentation, lowercase
//! mnemonics and quoted names.

pub mod error;

mod disassembler;
mod lexer;
mod parser;

pub use disassembler::instruction_line;
pub use error::AsmError;

use std::collections::btree_map::Entry;

use lexer::tokenize_line;
use parser::{parse_instruction, parse_line, Line};
use xvm_common::{Instruction, Program, ENTRY_POINT};

/// Assemble text into a function table.
///
/// The result always contains the entry point, even when empty.
/// Returns the first error encountered.
pub fn assemble(text: &str) -> Result<Program, AsmError> {
    let mut program = Program::with_entry(Vec::new());
    let mut current = ENTRY_POINT.to_string();

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let tokens = tokenize_line(line, line_num)?;
        match parse_line(&tokens, line_num)? {
            None => {}
            Some(Line::Header(name)) => {
                match program.functions.entry(name.clone()) {
                    Entry::Occupied(_) => {
                        return Err(AsmError::DuplicateFunction {
                            line: line_num,
                            name,
                        })
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(Vec::new());
                    }
                }
                current = name;
            }
            Some(Line::Instruction(instr)) => {
                program
                    .functions
                    .entry(current.clone())
                    .or_default()
                    .push(instr);
            }
        }
    }

    Ok(program)
}

/// Parse a single instruction line, leaving arity to the executor.
///
/// Returns `Ok(None)` for a blank or comment-only line. Function headers
/// are not accepted here.
pub fn assemble_line(text: &str) -> Result<Option<Instruction>, AsmError> {
    let tokens = tokenize_line(text, 1)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    parse_instruction(&tokens, 1).map(Some)
}

/// Disassemble a function table into canonical assembly text.
pub fn disassemble(program: &Program) -> String {
    disassembler::disassemble(program)
}
