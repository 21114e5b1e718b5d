//! Tokenizer for XVM assembly text.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::AsmError;

/// A single token from an assembly line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// A bare word: mnemonic, number, name, or `#header`.
    Word(String),
    /// A quoted text literal, escapes already resolved.
    Text(String),
}

/// Tokenize a single line of assembly text.
///
/// Returns an empty Vec for blank lines and comment-only lines.
/// Comments start with `;` or `//` outside a quoted literal and extend to
/// end of line.
pub(crate) fn tokenize_line(line: &str, line_num: usize) -> Result<Vec<Token>, AsmError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if starts_comment(&chars) {
            break;
        }
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '"' => {
                chars.next();
                tokens.push(Token::Text(quoted(&mut chars, line_num)?));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '"' || starts_comment(&chars) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    Ok(tokens)
}

fn starts_comment(chars: &Peekable<Chars<'_>>) -> bool {
    let mut ahead = chars.clone();
    match ahead.next() {
        Some(';') => true,
        Some('/') => ahead.next() == Some('/'),
        _ => false,
    }
}

/// Read the rest of a quoted literal; the opening quote is consumed.
fn quoted(chars: &mut impl Iterator<Item = char>, line_num: usize) -> Result<String, AsmError> {
    let mut text = String::new();
    loop {
        match chars.next() {
            None => return Err(AsmError::UnterminatedString { line: line_num }),
            Some('"') => return Ok(text),
            Some('\\') => match chars.next() {
                Some('"') => text.push('"'),
                Some('\\') => text.push('\\'),
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some(other) => {
                    return Err(AsmError::InvalidEscape {
                        line: line_num,
                        escape: other,
                    })
                }
                None => return Err(AsmError::UnterminatedString { line: line_num }),
            },
            Some(c) => text.push(c),
        }
    }
}
