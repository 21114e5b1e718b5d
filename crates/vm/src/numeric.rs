//! Value arithmetic and comparison.
//!
//! Integer ∘ integer stays an arbitrary-precision integer. A float on
//! either side promotes both operands to `f64`. Integer division and
//! remainder round toward negative infinity, so the remainder takes the
//! sign of the divisor. Float results must be finite.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use xvm_common::Value;

/// Failure of a value operation, before it is tagged with an opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NumError {
    Type(String),
    Arith(&'static str),
}

type NumResult<T> = Result<T, NumError>;

enum Operands<'a> {
    Ints(&'a BigInt, &'a BigInt),
    Floats(f64, f64),
    Texts(&'a str, &'a str),
}

fn to_float(n: &BigInt) -> NumResult<f64> {
    n.to_f64()
        .filter(|x| x.is_finite())
        .ok_or(NumError::Arith("integer too large to convert to float"))
}

fn finite(x: f64) -> NumResult<Value> {
    if x.is_nan() {
        Err(NumError::Arith("result is not a number"))
    } else if x.is_infinite() {
        Err(NumError::Arith("float overflow"))
    } else {
        Ok(Value::Float(x))
    }
}

fn mismatch(verb: &str, a: &Value, b: &Value) -> NumError {
    NumError::Type(format!("cannot {verb} {} and {}", a.kind(), b.kind()))
}

fn operands<'a>(verb: &str, a: &'a Value, b: &'a Value) -> NumResult<Operands<'a>> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Operands::Ints(x, y)),
        (Value::Float(x), Value::Float(y)) => Ok(Operands::Floats(*x, *y)),
        (Value::Int(x), Value::Float(y)) => Ok(Operands::Floats(to_float(x)?, *y)),
        (Value::Float(x), Value::Int(y)) => Ok(Operands::Floats(*x, to_float(y)?)),
        (Value::Str(x), Value::Str(y)) => Ok(Operands::Texts(x, y)),
        _ => Err(mismatch(verb, a, b)),
    }
}

pub(crate) fn add(a: &Value, b: &Value) -> NumResult<Value> {
    match operands("add", a, b)? {
        Operands::Ints(x, y) => Ok(Value::Int(x + y)),
        Operands::Floats(x, y) => finite(x + y),
        Operands::Texts(x, y) => Ok(Value::Str(format!("{x}{y}"))),
    }
}

pub(crate) fn sub(a: &Value, b: &Value) -> NumResult<Value> {
    match operands("subtract", a, b)? {
        Operands::Ints(x, y) => Ok(Value::Int(x - y)),
        Operands::Floats(x, y) => finite(x - y),
        Operands::Texts(..) => Err(mismatch("subtract", a, b)),
    }
}

pub(crate) fn mul(a: &Value, b: &Value) -> NumResult<Value> {
    match operands("multiply", a, b)? {
        Operands::Ints(x, y) => Ok(Value::Int(x * y)),
        Operands::Floats(x, y) => finite(x * y),
        Operands::Texts(..) => Err(mismatch("multiply", a, b)),
    }
}

pub(crate) fn div(a: &Value, b: &Value) -> NumResult<Value> {
    match operands("divide", a, b)? {
        Operands::Ints(_, y) if y.is_zero() => Err(NumError::Arith("division by zero")),
        Operands::Ints(x, y) => {
            let quotient = x / y;
            let remainder = x % y;
            if !remainder.is_zero() && remainder.is_negative() != y.is_negative() {
                Ok(Value::Int(quotient - 1))
            } else {
                Ok(Value::Int(quotient))
            }
        }
        Operands::Floats(_, y) if y == 0.0 => Err(NumError::Arith("division by zero")),
        Operands::Floats(x, y) => finite(x / y),
        Operands::Texts(..) => Err(mismatch("divide", a, b)),
    }
}

pub(crate) fn rem(a: &Value, b: &Value) -> NumResult<Value> {
    match operands("take remainder of", a, b)? {
        Operands::Ints(_, y) if y.is_zero() => Err(NumError::Arith("modulo by zero")),
        Operands::Ints(x, y) => {
            let remainder = x % y;
            if !remainder.is_zero() && remainder.is_negative() != y.is_negative() {
                Ok(Value::Int(remainder + y))
            } else {
                Ok(Value::Int(remainder))
            }
        }
        Operands::Floats(_, y) if y == 0.0 => Err(NumError::Arith("modulo by zero")),
        Operands::Floats(x, y) => {
            let remainder = x % y;
            if remainder != 0.0 && (remainder < 0.0) != (y < 0.0) {
                finite(remainder + y)
            } else {
                finite(remainder)
            }
        }
        Operands::Texts(..) => Err(mismatch("take remainder of", a, b)),
    }
}

fn unary_float(verb: &str, a: &Value) -> NumResult<f64> {
    match a {
        Value::Int(n) => to_float(n),
        Value::Float(x) => Ok(*x),
        Value::Str(_) => Err(NumError::Type(format!("cannot {verb} text"))),
    }
}

pub(crate) fn neg(a: &Value) -> NumResult<Value> {
    match a {
        Value::Int(n) => Ok(Value::Int(-n)),
        Value::Float(x) => Ok(Value::Float(-x)),
        Value::Str(_) => Err(NumError::Type("cannot negate text".to_string())),
    }
}

pub(crate) fn exp(a: &Value) -> NumResult<Value> {
    finite(unary_float("exponentiate", a)?.exp())
}

pub(crate) fn sqrt(a: &Value) -> NumResult<Value> {
    let x = unary_float("take square root of", a)?;
    if x < 0.0 {
        return Err(NumError::Arith("square root of negative number"));
    }
    finite(x.sqrt())
}

/// Numeric equality across integer/float; text by content. A number never
/// equals a text.
pub(crate) fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Str(_), _) | (_, Value::Str(_)) => false,
        _ => float_order(a, b) == Some(Ordering::Equal),
    }
}

// Integers too large for f64 convert to infinity, which still orders
// correctly against every finite float.
fn float_order(a: &Value, b: &Value) -> Option<Ordering> {
    let as_f64 = |v: &Value| match v {
        Value::Int(n) => n.to_f64(),
        Value::Float(x) => Some(*x),
        Value::Str(_) => None,
    };
    as_f64(a)?.partial_cmp(&as_f64(b)?)
}

/// Ordering for GT/LT/GE/LE.
pub(crate) fn compare(a: &Value, b: &Value) -> NumResult<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Str(_), _) | (_, Value::Str(_)) => Err(mismatch("compare", a, b)),
        _ => float_order(a, b).ok_or(NumError::Arith("unordered float comparison")),
    }
}

/// Condition test for CJMP: any non-zero number.
pub(crate) fn truthy(v: &Value) -> NumResult<bool> {
    match v {
        Value::Int(n) => Ok(!n.is_zero()),
        Value::Float(x) => Ok(*x != 0.0),
        Value::Str(_) => Err(NumError::Type("condition must be a number, got text".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::from(n)
    }

    #[test]
    fn integer_arithmetic_stays_integer() {
        assert_eq!(add(&int(2), &int(3)), Ok(int(5)));
        assert_eq!(sub(&int(10), &int(3)), Ok(int(7)));
        assert_eq!(mul(&int(-4), &int(3)), Ok(int(-12)));
    }

    #[test]
    fn mixed_arithmetic_promotes() {
        assert_eq!(add(&int(1), &Value::from(0.5)), Ok(Value::from(1.5)));
        assert_eq!(mul(&Value::from(2.0), &int(3)), Ok(Value::from(6.0)));
    }

    #[test]
    fn integer_division_floors() {
        assert_eq!(div(&int(7), &int(2)), Ok(int(3)));
        assert_eq!(div(&int(-7), &int(2)), Ok(int(-4)));
        assert_eq!(div(&int(7), &int(-2)), Ok(int(-4)));
        assert_eq!(div(&int(-8), &int(2)), Ok(int(-4)));
    }

    #[test]
    fn integer_remainder_follows_divisor_sign() {
        assert_eq!(rem(&int(7), &int(3)), Ok(int(1)));
        assert_eq!(rem(&int(-7), &int(3)), Ok(int(2)));
        assert_eq!(rem(&int(7), &int(-3)), Ok(int(-2)));
        assert_eq!(rem(&int(-3), &int(2)), Ok(int(1)));
    }

    #[test]
    fn float_division_and_remainder() {
        assert_eq!(div(&Value::from(1.0), &int(4)), Ok(Value::from(0.25)));
        assert_eq!(rem(&Value::from(-1.5), &Value::from(1.0)), Ok(Value::from(0.5)));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            div(&int(1), &int(0)),
            Err(NumError::Arith("division by zero"))
        );
        assert_eq!(
            div(&Value::from(1.0), &Value::from(0.0)),
            Err(NumError::Arith("division by zero"))
        );
        assert_eq!(rem(&int(1), &int(0)), Err(NumError::Arith("modulo by zero")));
    }

    #[test]
    fn text_concatenation_only_for_add() {
        assert_eq!(
            add(&Value::from("ab"), &Value::from("cd")),
            Ok(Value::from("abcd"))
        );
        assert!(matches!(
            sub(&Value::from("ab"), &Value::from("cd")),
            Err(NumError::Type(_))
        ));
        assert_eq!(
            add(&int(1), &Value::from("x")),
            Err(NumError::Type("cannot add integer and text".to_string()))
        );
    }

    #[test]
    fn float_overflow_is_arithmetic_error() {
        assert_eq!(
            mul(&Value::from(1e300), &Value::from(1e300)),
            Err(NumError::Arith("float overflow"))
        );
        assert_eq!(exp(&int(1000)), Err(NumError::Arith("float overflow")));
    }

    #[test]
    fn unary_operations() {
        assert_eq!(neg(&int(5)), Ok(int(-5)));
        assert_eq!(neg(&Value::from(2.5)), Ok(Value::from(-2.5)));
        assert_eq!(sqrt(&int(16)), Ok(Value::from(4.0)));
        assert_eq!(exp(&int(0)), Ok(Value::from(1.0)));
        assert_eq!(
            sqrt(&int(-1)),
            Err(NumError::Arith("square root of negative number"))
        );
        assert!(matches!(neg(&Value::from("x")), Err(NumError::Type(_))));
    }

    #[test]
    fn equality_rules() {
        assert!(equals(&int(1), &Value::from(1.0)));
        assert!(equals(&Value::from("a"), &Value::from("a")));
        assert!(!equals(&int(1), &Value::from("1")));
        assert!(!equals(&int(1), &int(2)));
    }

    #[test]
    fn ordering_rules() {
        assert_eq!(compare(&int(2), &int(10)), Ok(Ordering::Less));
        assert_eq!(compare(&Value::from(2.5), &int(2)), Ok(Ordering::Greater));
        assert_eq!(
            compare(&Value::from("apple"), &Value::from("banana")),
            Ok(Ordering::Less)
        );
        assert!(matches!(
            compare(&int(1), &Value::from("1")),
            Err(NumError::Type(_))
        ));
    }

    #[test]
    fn huge_integers_compare_with_floats() {
        let huge = Value::Int(BigInt::from(1) << 2000);
        assert_eq!(compare(&huge, &Value::from(1e300)), Ok(Ordering::Greater));
        assert!(matches!(
            add(&huge, &Value::from(1.0)),
            Err(NumError::Arith(_))
        ));
    }

    #[test]
    fn truthiness() {
        assert_eq!(truthy(&int(1)), Ok(true));
        assert_eq!(truthy(&int(0)), Ok(false));
        assert_eq!(truthy(&Value::from(0.0)), Ok(false));
        assert_eq!(truthy(&int(-3)), Ok(true));
        assert!(truthy(&Value::from("1")).is_err());
    }
}
