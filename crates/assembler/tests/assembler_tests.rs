//! Integration tests for the XVM assembler.
//!
//! Tests cover:
//! - The sample programs (assemble, execute)
//! - Roundtrip properties (disassemble → assemble, assemble → disassemble → assemble)
//! - Error cases with line numbers

use num_bigint::BigInt;
use xvm_assembler::{assemble, assemble_line, disassemble, instruction_line, AsmError};
use xvm_common::{Instruction, Opcode, Program, Value, ENTRY_POINT};
use xvm_vm::{run, Debugger, NoInput, ScriptedInput, StopReason, Transcript, VM};

const FAST_POW: &str = include_str!("../../../tests/programs/fast_pow.xasm");
const BREAKPOINT: &str = include_str!("../../../tests/programs/breakpoint.xasm");
const FACTORIAL_JSON: &str = include_str!("../../../tests/programs/factorial.json");

fn run_fast_pow(base: i64, exponent: i64) -> Vec<Value> {
    let program = assemble(FAST_POW).unwrap();
    let out = Transcript::new();
    run(
        program,
        ScriptedInput::new([Value::from(base), Value::from(exponent)]),
        out.clone(),
    )
    .unwrap();
    out.values()
}

// ---- Sample programs ----

#[test]
fn fast_pow_assembles_into_two_functions() {
    let program = assemble(FAST_POW).unwrap();
    assert_eq!(program.functions.len(), 2);
    assert_eq!(program.entry().map(<[Instruction]>::len), Some(11));
    assert!(program.get("pow").is_some());
}

#[test]
fn fast_pow_results() {
    assert_eq!(run_fast_pow(2, 10), vec![Value::from(1024)]);
    assert_eq!(run_fast_pow(-2, 3), vec![Value::from(-8)]);
    assert_eq!(run_fast_pow(5, 0), vec![Value::from(1)]);
    let big: BigInt = "1267650600228229401496703205376".parse().unwrap();
    assert_eq!(run_fast_pow(2, 100), vec![Value::Int(big)]);
}

#[test]
fn breakpoint_program_under_debugger() {
    let out = Transcript::new();
    let mut dbg = Debugger::new(VM::new(NoInput, out.clone()));
    assert_eq!(dbg.load(assemble(BREAKPOINT).unwrap()).unwrap(), 6);

    let first = dbg.run().unwrap();
    assert_eq!((first.executed, first.stop), (1, StopReason::Breakpoint));
    let second = dbg.run().unwrap();
    assert_eq!(second.stop, StopReason::Completed);
    assert_eq!(out.values(), vec![Value::from(10)]);
}

#[test]
fn json_and_text_forms_agree() {
    let from_json = Program::from_json(FACTORIAL_JSON).unwrap();
    let text = disassemble(&from_json);
    assert_eq!(assemble(&text).unwrap(), from_json);

    let out = Transcript::new();
    run(from_json, NoInput, out.clone()).unwrap();
    let expected: BigInt = "15511210043330985984000000".parse().unwrap();
    assert_eq!(out.values(), vec![Value::Int(expected)]);
}

// ---- Roundtrip ----

#[test]
fn roundtrip_sample_programs() {
    for source in [FAST_POW, BREAKPOINT] {
        let first = assemble(source).unwrap();
        let canonical = disassemble(&first);
        let second = assemble(&canonical).unwrap();
        assert_eq!(first, second);
        // Canonical text is a fixed point.
        assert_eq!(disassemble(&second), canonical);
    }
}

#[test]
fn roundtrip_literal_kinds() {
    let program = Program::with_entry(vec![
        Instruction::with_arg(Opcode::LoadConst, 7),
        Instruction::with_arg(Opcode::LoadConst, 7.0),
        Instruction::with_arg(Opcode::LoadConst, "7"),
        Instruction::with_arg(Opcode::LoadConst, 1.5e300),
        Instruction::with_arg(Opcode::LoadConst, "tab\tquote\"slash\\newline\n"),
        Instruction::with_arg(Opcode::LoadConst, ""),
        Instruction::with_arg(Opcode::StoreVar, "semi;colon"),
        Instruction::with_arg(Opcode::LoadConst, Value::Int(BigInt::from(-1) << 200)),
    ]);
    assert_eq!(assemble(&disassemble(&program)).unwrap(), program);
}

#[test]
fn non_canonical_input_normalizes() {
    let loose = "  load_const   \"x\"  ; a comment\n\n\tstore_var \"y\"\n";
    let program = assemble(loose).unwrap();
    assert_eq!(disassemble(&program), "LOAD_CONST \"x\"\nSTORE_VAR y\n");
}

#[test]
fn instruction_line_matches_disassembly() {
    let instr = Instruction::with_arg(Opcode::Cjmp, "body");
    assert_eq!(instruction_line(&instr), "CJMP body");
    assert_eq!(assemble_line(&instruction_line(&instr)).unwrap(), Some(instr));
}

// ---- Errors ----

#[test]
fn reserved_entry_point_header() {
    let err = assemble(&format!("RET\n#{ENTRY_POINT}\nRET\n")).unwrap_err();
    assert_eq!(
        err,
        AsmError::ReservedFunctionName {
            line: 2,
            name: ENTRY_POINT.to_string()
        }
    );
}

#[test]
fn missing_argument_reports_line() {
    let err = assemble("LOAD_CONST 1\n#f\nJMP\n").unwrap_err();
    assert_eq!(
        err,
        AsmError::MissingArgument {
            line: 3,
            opcode: "JMP",
            expected: 1
        }
    );
}

#[test]
fn unterminated_string_reports_line() {
    let err = assemble("PRINT\nLOAD_CONST \"oops\n").unwrap_err();
    assert_eq!(err, AsmError::UnterminatedString { line: 2 });
}

#[test]
fn error_messages_are_readable() {
    let err = assemble("HALT\n").unwrap_err();
    assert_eq!(err.to_string(), "line 1: unknown opcode 'HALT'");
}
