//! Debugger controller tests: stepping, running, and inspection.

use xvm_common::{Instruction, Opcode, Program, Value, ENTRY_POINT};
use xvm_vm::{Debugger, FrameInfo, NoInput, RuntimeError, StopReason, Transcript, VM};

fn op(opcode: Opcode) -> Instruction {
    Instruction::op(opcode)
}

fn push(value: impl Into<Value>) -> Instruction {
    Instruction::with_arg(Opcode::LoadConst, value)
}

/// LOAD_CONST 10; BREAKPOINT; STORE_VAR x; LOAD_VAR x; PRINT; RET
fn breakpoint_program() -> Program {
    Program::with_entry(vec![
        push(10),
        op(Opcode::Breakpoint),
        Instruction::with_arg(Opcode::StoreVar, "x"),
        Instruction::with_arg(Opcode::LoadVar, "x"),
        op(Opcode::Print),
        op(Opcode::Ret),
    ])
}

/// Entry calls "outer", which calls "inner".
fn nested_program() -> Program {
    Program::with_entry(vec![push("outer"), op(Opcode::Call), push("after")])
        .function("outer", vec![push(1), push("inner"), op(Opcode::Call), op(Opcode::Ret)])
        .function("inner", vec![push(2), op(Opcode::Breakpoint), op(Opcode::Ret)])
}

fn debugger_with_output() -> (Debugger, Transcript) {
    let out = Transcript::new();
    (Debugger::new(VM::new(NoInput, out.clone())), out)
}

#[test]
fn load_reports_entry_length() {
    let mut dbg = Debugger::default();
    assert!(!dbg.is_loaded());
    assert_eq!(dbg.load(breakpoint_program()).unwrap(), 6);
    assert!(dbg.is_loaded());
    assert_eq!(dbg.pc(), 0);
    assert_eq!(dbg.function(), ENTRY_POINT);
}

#[test]
fn step_step_reaches_pc_two() {
    let mut dbg = Debugger::default();
    dbg.load(breakpoint_program()).unwrap();

    assert_eq!(dbg.step().unwrap(), push(10));
    assert_eq!(dbg.pc(), 1);
    assert_eq!(dbg.step().unwrap(), op(Opcode::Breakpoint));
    assert_eq!(dbg.pc(), 2);
    assert!(dbg.is_breakpoint_hit());
}

#[test]
fn run_stops_at_breakpoint_then_completes() {
    let (mut dbg, out) = debugger_with_output();
    dbg.load(breakpoint_program()).unwrap();

    let first = dbg.run().unwrap();
    assert_eq!(first.executed, 1);
    assert_eq!(first.stop, StopReason::Breakpoint);
    assert_eq!(dbg.pc(), 2);
    assert!(out.values().is_empty());

    let second = dbg.run().unwrap();
    assert_eq!(second.stop, StopReason::Completed);
    assert_eq!(out.values(), vec![Value::from(10)]);
    assert!(dbg.is_finished());
}

#[test]
fn run_after_stepping_onto_breakpoint_resumes() {
    let (mut dbg, out) = debugger_with_output();
    dbg.load(breakpoint_program()).unwrap();
    dbg.step().unwrap();
    dbg.step().unwrap();

    let report = dbg.run().unwrap();
    assert_eq!(report.stop, StopReason::Completed);
    assert_eq!(report.executed, 4);
    assert_eq!(out.last(), Some(Value::from(10)));
}

#[test]
fn stack_snapshot_truncation() {
    let mut dbg = Debugger::default();
    dbg.load(Program::with_entry(vec![push(1), push(2), push(3)])).unwrap();
    dbg.run().unwrap();

    assert_eq!(dbg.stack(None).unwrap().len(), 3);
    assert_eq!(dbg.stack(Some(2)).unwrap(), &[Value::from(2), Value::from(3)]);
    assert_eq!(dbg.stack(Some(0)).unwrap(), &[] as &[Value]);
    assert_eq!(dbg.stack(Some(4)), None);
}

#[test]
fn frames_describe_callers() {
    let mut dbg = Debugger::default();
    dbg.load(nested_program()).unwrap();
    let report = dbg.run().unwrap();
    assert_eq!(report.stop, StopReason::Breakpoint);

    assert_eq!(dbg.function(), "inner");
    assert_eq!(dbg.depth(), 2);
    assert_eq!(
        dbg.frames(),
        vec![
            FrameInfo {
                function: ENTRY_POINT.to_string(),
                return_pc: 1
            },
            FrameInfo {
                function: "outer".to_string(),
                return_pc: 2
            },
        ]
    );
}

#[test]
fn next_steps_over_nested_calls() {
    let mut dbg = Debugger::default();
    dbg.load(nested_program()).unwrap();
    dbg.next().unwrap();
    assert_eq!(dbg.next().unwrap(), op(Opcode::Call));
    assert_eq!(dbg.pc(), 2);
    assert_eq!(dbg.depth(), 0);
    assert_eq!(dbg.function(), ENTRY_POINT);
    assert_eq!(dbg.stack(None).unwrap(), &[Value::from(1), Value::from(2)]);
}

#[test]
fn exec_runs_against_current_state() {
    let mut dbg = Debugger::default();
    dbg.load(Program::with_entry(vec![push(6)])).unwrap();
    dbg.step().unwrap();

    dbg.exec(&push(7)).unwrap();
    dbg.exec(&op(Opcode::Mul)).unwrap();
    dbg.exec(&Instruction::with_arg(Opcode::StoreVar, "answer")).unwrap();

    assert_eq!(dbg.variable("answer"), Some(&Value::from(42)));
    assert!(dbg.stack(None).unwrap().is_empty());
    assert_eq!(dbg.pc(), 1);
}

#[test]
fn exec_ret_unwinds_through_finished_callers() {
    let (mut dbg, out) = debugger_with_output();
    // "middle" ends on its CALL, so returning from "leaf" leaves it at its end.
    let program = Program::with_entry(vec![
        push(7),
        push("middle"),
        op(Opcode::Call),
        op(Opcode::Print),
    ])
    .function("middle", vec![push("leaf"), op(Opcode::Call)])
    .function("leaf", vec![op(Opcode::Breakpoint), op(Opcode::Ret)]);
    dbg.load(program).unwrap();

    assert_eq!(dbg.run().unwrap().stop, StopReason::Breakpoint);
    assert_eq!(dbg.function(), "leaf");
    assert_eq!(dbg.depth(), 2);

    dbg.exec(&op(Opcode::Ret)).unwrap();
    assert_eq!(dbg.function(), ENTRY_POINT);
    assert_eq!(dbg.pc(), 3);
    assert_eq!(dbg.depth(), 0);

    let report = dbg.run().unwrap();
    assert_eq!(report.stop, StopReason::Completed);
    assert_eq!(out.values(), vec![Value::from(7)]);
    assert!(dbg.is_finished());
}

#[test]
fn step_returns_from_callee_left_at_its_end() {
    let mut vm = VM::default();
    vm.load(
        Program::with_entry(vec![push("middle"), op(Opcode::Call), push(5)])
            .function("middle", vec![push("leaf"), op(Opcode::Call)])
            .function("leaf", vec![op(Opcode::Breakpoint), op(Opcode::Ret)]),
    )
    .unwrap();
    assert_eq!(vm.run().unwrap().stop, StopReason::Breakpoint);

    // A bare RET leaves "middle" at its end with its frame still pending.
    vm.execute(&op(Opcode::Ret)).unwrap();
    assert_eq!(vm.function(), "middle");
    assert_eq!(vm.call_depth(), 1);
    assert!(!vm.is_finished());

    assert_eq!(vm.step().unwrap(), push(5));
    assert_eq!(vm.function(), ENTRY_POINT);
    assert_eq!(vm.stack(), &[Value::from(5)]);
    assert!(vm.is_finished());
}

#[test]
fn errors_are_reported_and_state_kept() {
    let mut dbg = Debugger::default();
    dbg.load(Program::with_entry(vec![push(1), op(Opcode::Add), push(2)])).unwrap();
    dbg.step().unwrap();

    assert_eq!(
        dbg.step(),
        Err(RuntimeError::StackUnderflow { opcode: Opcode::Add })
    );
    assert_eq!(dbg.pc(), 1);
    assert_eq!(dbg.stack(None).unwrap(), &[Value::from(1)]);

    assert!(dbg.exec(&op(Opcode::Sub)).is_err());
    assert_eq!(dbg.stack(None).unwrap(), &[Value::from(1)]);
}

#[test]
fn commands_before_load() {
    let mut dbg = Debugger::default();
    assert_eq!(dbg.step(), Err(RuntimeError::NoCodeLoaded));
    assert_eq!(dbg.next(), Err(RuntimeError::NoCodeLoaded));
    assert_eq!(dbg.run(), Err(RuntimeError::NoCodeLoaded));
    assert!(dbg.variables().is_empty());
}

#[test]
fn save_and_restore_state() {
    let mut dbg = Debugger::default();
    dbg.load(Program::with_entry(vec![
        push(3),
        Instruction::with_arg(Opcode::StoreVar, "n"),
        push("kept"),
    ]))
    .unwrap();
    dbg.run().unwrap();

    let mut stack = Vec::new();
    let mut memory = Vec::new();
    dbg.save_stack(&mut stack).unwrap();
    dbg.save_variables(&mut memory).unwrap();

    let mut fresh = Debugger::default();
    fresh.restore_stack(stack.as_slice()).unwrap();
    fresh.restore_variables(memory.as_slice()).unwrap();
    assert_eq!(fresh.stack(None), dbg.stack(None));
    assert_eq!(fresh.variables(), dbg.variables());
}
