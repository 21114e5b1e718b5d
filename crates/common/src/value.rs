//! Runtime value representation for the XVM.
//!
//! Values are what live on the operand stack, in variable bindings, and
//! in instruction operands (literals and names).

use std::fmt;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// Runtime value representation.
///
/// Integers are arbitrary precision. Floats are never NaN or infinite in
/// a running program: the VM rejects operations that would produce them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Arbitrary-precision signed integer.
    Int(BigInt),
    /// IEEE 754 64-bit float.
    Float(f64),
    /// UTF-8 text.
    Str(String),
}

// Floats compare bitwise so that `Value` can implement `Eq`. This is
// structural equality for tables and tests; numeric equality between an
// integer and a float is the EQ opcode's business, not this impl's.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Build a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Short lower-case name of this value's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "text",
        }
    }

    /// Returns the text if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// True for integers and floats.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Render as an assembly literal: text is quoted and escaped, floats
    /// always carry a decimal point or exponent so they reparse as floats.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(x) => format!("{x:?}"),
            Value::Str(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('"');
                for c in s.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        c => out.push(c),
                    }
                }
                out.push('"');
                out
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(BigInt::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(BigInt::from(n))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
