//! Function tables and their JSON form.
//!
//! A program is a mapping from function name to instruction sequence. The
//! JSON form is an object keyed by function name whose values are lists of
//! `{"op": "<MNEMONIC>", "arg": <literal>}` descriptors:
//!
//! ```text
//! {
//!   "$entrypoint$": [
//!     {"op": "LOAD_CONST", "arg": 10},
//!     {"op": "PRINT"},
//!     {"op": "RET"}
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use num_bigint::BigInt;
use serde::Deserialize;

use crate::error::LoadError;
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::value::Value;

/// Reserved name of the function where execution begins.
///
/// The `$` delimiters keep it out of the space of names the assembler
/// accepts as function headers.
pub const ENTRY_POINT: &str = "$entrypoint$";

/// An XVM program: named instruction sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// Function name to instruction sequence.
    pub functions: BTreeMap<String, Vec<Instruction>>,
}

#[derive(Deserialize)]
struct RawInstruction {
    op: String,
    #[serde(default)]
    arg: Option<serde_json::Value>,
}

impl Program {
    /// Create a program from a function map. No validation is performed.
    pub fn new(functions: BTreeMap<String, Vec<Instruction>>) -> Self {
        Self { functions }
    }

    /// A program consisting only of an entry point.
    pub fn with_entry(instructions: Vec<Instruction>) -> Self {
        let mut functions = BTreeMap::new();
        functions.insert(ENTRY_POINT.to_string(), instructions);
        Self { functions }
    }

    /// Add (or replace) a function. Builder style.
    pub fn function(mut self, name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        self.functions.insert(name.into(), instructions);
        self
    }

    /// Look up a function's instructions.
    pub fn get(&self, name: &str) -> Option<&[Instruction]> {
        self.functions.get(name).map(Vec::as_slice)
    }

    /// The entry point's instructions, if present.
    pub fn entry(&self) -> Option<&[Instruction]> {
        self.get(ENTRY_POINT)
    }

    /// Total number of instructions across all functions.
    pub fn len(&self) -> usize {
        self.functions.values().map(Vec::len).sum()
    }

    /// Returns true if no function has any instruction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse the JSON form of a function table.
    ///
    /// Zero-arity opcodes must omit `arg` and one-arity opcodes must carry
    /// it. Integers of any size are kept exact.
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        let raw: BTreeMap<String, Vec<RawInstruction>> = serde_json::from_str(text)?;

        let mut functions = BTreeMap::new();
        for (name, raw_instrs) in raw {
            let mut instructions = Vec::with_capacity(raw_instrs.len());
            for (index, raw_instr) in raw_instrs.into_iter().enumerate() {
                instructions.push(decode_instruction(&name, index, raw_instr)?);
            }
            functions.insert(name, instructions);
        }

        if !functions.contains_key(ENTRY_POINT) {
            return Err(LoadError::MissingEntryPoint(ENTRY_POINT));
        }

        Ok(Self { functions })
    }

    /// Serialize to the JSON form accepted by [`Program::from_json`].
    pub fn to_json(&self) -> Result<String, LoadError> {
        let mut root = serde_json::Map::new();
        for (name, instructions) in &self.functions {
            let mut list = Vec::with_capacity(instructions.len());
            for (index, instr) in instructions.iter().enumerate() {
                let mut obj = serde_json::Map::new();
                obj.insert(
                    "op".to_string(),
                    serde_json::Value::from(instr.opcode.mnemonic()),
                );
                if let Some(arg) = instr.operands.first() {
                    obj.insert("arg".to_string(), encode_literal(name, index, arg)?);
                }
                list.push(serde_json::Value::Object(obj));
            }
            root.insert(name.clone(), serde_json::Value::Array(list));
        }
        Ok(serde_json::to_string_pretty(&serde_json::Value::Object(root))?)
    }
}

fn decode_instruction(
    function: &str,
    index: usize,
    raw: RawInstruction,
) -> Result<Instruction, LoadError> {
    let opcode: Opcode = raw.op.parse()?;

    match (opcode.arity(), raw.arg) {
        (0, None) => Ok(Instruction::op(opcode)),
        (0, Some(_)) => Err(LoadError::UnexpectedArgument {
            function: function.to_string(),
            index,
            opcode: opcode.mnemonic(),
        }),
        (_, None) => Err(LoadError::MissingArgument {
            function: function.to_string(),
            index,
            opcode: opcode.mnemonic(),
        }),
        (_, Some(arg)) => {
            let value = decode_literal(&arg).ok_or_else(|| LoadError::InvalidOperand {
                function: function.to_string(),
                index,
                found: arg.to_string(),
            })?;
            Ok(Instruction::with_arg(opcode, value))
        }
    }
}

fn decode_literal(arg: &serde_json::Value) -> Option<Value> {
    match arg {
        serde_json::Value::String(s) => Some(Value::Str(s.clone())),
        serde_json::Value::Number(n) => {
            // The textual form is exact for integers beyond 64 bits.
            if let Ok(int) = n.to_string().parse::<BigInt>() {
                return Some(Value::Int(int));
            }
            n.as_f64().filter(|x| x.is_finite()).map(Value::Float)
        }
        _ => None,
    }
}

fn encode_literal(function: &str, index: usize, arg: &Value) -> Result<serde_json::Value, LoadError> {
    let invalid = || LoadError::InvalidOperand {
        function: function.to_string(),
        index,
        found: arg.to_literal(),
    };
    match arg {
        Value::Str(s) => Ok(serde_json::Value::from(s.as_str())),
        Value::Int(n) => n
            .to_string()
            .parse::<serde_json::Number>()
            .map(serde_json::Value::Number)
            .map_err(|_| invalid()),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .ok_or_else(invalid),
    }
}
