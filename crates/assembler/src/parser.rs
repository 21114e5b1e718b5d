//! Parser for XVM assembly tokens → instructions and function headers.

use num_bigint::BigInt;
use xvm_common::{Instruction, Opcode, Value, ENTRY_POINT};

use crate::error::AsmError;
use crate::lexer::Token;

/// Result of parsing a single assembly line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line {
    /// `#name`: the following instructions belong to `name`.
    Header(String),
    Instruction(Instruction),
}

/// Interpret a bare word as a literal: integer, then float, then text.
///
/// A float needs a decimal point or exponent and a numeric lead character,
/// so names such as `inf` or `e` stay text.
pub(crate) fn parse_literal(word: &str) -> Value {
    if let Ok(n) = word.parse::<BigInt>() {
        return Value::Int(n);
    }
    let numeric_lead = word
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if numeric_lead && word.contains(['.', 'e', 'E']) {
        if let Ok(x) = word.parse::<f64>() {
            if x.is_finite() {
                return Value::Float(x);
            }
        }
    }
    Value::Str(word.to_string())
}

fn operand(token: &Token) -> Value {
    match token {
        Token::Word(w) => parse_literal(w),
        Token::Text(s) => Value::Str(s.clone()),
    }
}

fn token_text(token: &Token) -> String {
    match token {
        Token::Word(w) => w.clone(),
        Token::Text(s) => Value::Str(s.clone()).to_literal(),
    }
}

fn parse_header(name: &str, rest: &[Token], line_num: usize) -> Result<Line, AsmError> {
    if let Some(extra) = rest.first() {
        return Err(AsmError::UnexpectedToken {
            line: line_num,
            token: token_text(extra),
        });
    }
    if name.is_empty() {
        return Err(AsmError::EmptyFunctionName { line: line_num });
    }
    if name == ENTRY_POINT {
        return Err(AsmError::ReservedFunctionName {
            line: line_num,
            name: name.to_string(),
        });
    }
    Ok(Line::Header(name.to_string()))
}

/// Parse an instruction without checking its operand count.
pub(crate) fn parse_instruction(tokens: &[Token], line_num: usize) -> Result<Instruction, AsmError> {
    let mnemonic = match &tokens[0] {
        Token::Word(w) => w,
        Token::Text(_) => {
            return Err(AsmError::UnexpectedToken {
                line: line_num,
                token: token_text(&tokens[0]),
            })
        }
    };

    let opcode: Opcode = mnemonic
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| AsmError::UnknownOpcode {
            line: line_num,
            token: mnemonic.clone(),
        })?;

    Ok(Instruction::new(opcode, tokens[1..].iter().map(operand).collect()))
}

/// Parse one tokenized line.
///
/// Returns `Ok(None)` for blank lines (empty token list).
pub(crate) fn parse_line(tokens: &[Token], line_num: usize) -> Result<Option<Line>, AsmError> {
    let Some(first) = tokens.first() else {
        return Ok(None);
    };

    if let Token::Word(w) = first {
        if let Some(name) = w.strip_prefix('#') {
            return parse_header(name, &tokens[1..], line_num).map(Some);
        }
    }

    let instr = parse_instruction(tokens, line_num)?;
    let expected = instr.opcode.arity();
    if instr.operands.len() < expected {
        return Err(AsmError::MissingArgument {
            line: line_num,
            opcode: instr.opcode.mnemonic(),
            expected,
        });
    }
    if instr.operands.len() > expected {
        return Err(AsmError::UnexpectedToken {
            line: line_num,
            token: token_text(&tokens[1 + expected]),
        });
    }
    Ok(Some(Line::Instruction(instr)))
}
