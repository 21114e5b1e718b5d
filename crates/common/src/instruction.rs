//! Instructions: an opcode plus its operands.

use std::fmt;

use crate::opcode::Opcode;
use crate::value::Value;

/// A single XVM instruction.
///
/// Operands are literals (LOAD_CONST) or names (variables, labels).
/// Construction does not check arity; the loader and the VM do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Operands, in order.
    pub operands: Vec<Value>,
}

impl Instruction {
    /// Create a new instruction.
    pub fn new(opcode: Opcode, operands: Vec<Value>) -> Self {
        Self { opcode, operands }
    }

    /// An instruction with no operands.
    pub fn op(opcode: Opcode) -> Self {
        Self::new(opcode, Vec::new())
    }

    /// An instruction with one operand.
    pub fn with_arg(opcode: Opcode, arg: impl Into<Value>) -> Self {
        Self::new(opcode, vec![arg.into()])
    }

    /// The single operand, if there is exactly one.
    pub fn arg(&self) -> Option<&Value> {
        match self.operands.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// True if the operand count matches the opcode's arity.
    pub fn has_valid_arity(&self) -> bool {
        self.operands.len() == self.opcode.arity()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for operand in &self.operands {
            write!(f, " {}", operand.to_literal())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_operands() {
        assert_eq!(Instruction::op(Opcode::Add).to_string(), "ADD");
    }

    #[test]
    fn display_with_text_operand() {
        assert_eq!(
            Instruction::with_arg(Opcode::LoadConst, "fact").to_string(),
            "LOAD_CONST \"fact\""
        );
    }

    #[test]
    fn display_with_numbers() {
        assert_eq!(
            Instruction::with_arg(Opcode::LoadConst, 10).to_string(),
            "LOAD_CONST 10"
        );
        assert_eq!(
            Instruction::with_arg(Opcode::LoadConst, 1.5).to_string(),
            "LOAD_CONST 1.5"
        );
    }

    #[test]
    fn arg_requires_exactly_one() {
        assert_eq!(Instruction::op(Opcode::Ret).arg(), None);
        assert_eq!(
            Instruction::with_arg(Opcode::Jmp, "loop").arg(),
            Some(&Value::from("loop"))
        );
        let two = Instruction::new(Opcode::Jmp, vec![Value::from(1), Value::from(2)]);
        assert_eq!(two.arg(), None);
    }

    #[test]
    fn arity_check() {
        assert!(Instruction::op(Opcode::Add).has_valid_arity());
        assert!(!Instruction::with_arg(Opcode::Add, 1).has_valid_arity());
        assert!(!Instruction::op(Opcode::StoreVar).has_valid_arity());
    }
}
