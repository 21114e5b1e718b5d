//! Disassembler: function table → canonical assembly text.
//!
//! Output format: entry-point code first with no header, then each other
//! function under a `#name` header in name order, separated by a blank
//! line. One instruction per line, no indentation, no comments.

use xvm_common::{Instruction, Opcode, Program, Value, ENTRY_POINT};

use crate::parser::parse_literal;

/// Disassemble a program into canonical assembly text.
///
/// Reassembles to an identical function table for every program whose
/// function names are single words.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();

    if let Some(entry) = program.entry() {
        write_body(&mut out, entry);
    }

    for (name, code) in &program.functions {
        if name == ENTRY_POINT {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push('#');
        out.push_str(name);
        out.push('\n');
        write_body(&mut out, code);
    }

    out
}

fn write_body(out: &mut String, code: &[Instruction]) {
    for instr in code {
        out.push_str(&instruction_line(instr));
        out.push('\n');
    }
}

/// Render one instruction as a line of assembly, without the newline.
pub fn instruction_line(instr: &Instruction) -> String {
    let mut line = instr.opcode.mnemonic().to_string();
    for value in &instr.operands {
        line.push(' ');
        line.push_str(&operand_text(instr.opcode, value));
    }
    line
}

/// Names are written bare when they reparse as the same text; constants
/// and anything ambiguous are quoted.
fn operand_text(opcode: Opcode, value: &Value) -> String {
    match value {
        Value::Str(s) if opcode != Opcode::LoadConst && is_bare_name(s) => s.clone(),
        _ => value.to_literal(),
    }
}

fn is_bare_name(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('#')
        && !s.chars().any(|c| c.is_whitespace() || c == ';' || c == '"')
        && !s.contains("//")
        && parse_literal(s) == Value::from(s)
}
