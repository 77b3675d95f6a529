use crate::instruction::{Instruction, InstructionKind, Label, Variable};
use crate::interpreter::{ExecutionState, HaltReason, Interpreter, VariableChange};
use crate::program::Program;
use crate::tests::support::*;

#[test]
fn test_addition() {
    let program = compile(&addition());
    let result = program.execute(&[3, 2]);
    assert_eq!(result.y, 5);
    assert_eq!(result.cycles, 16);
    assert_eq!(result.halt_reason, Some(HaltReason::Finished));
    assert_eq!(result.debug_pointer, None);
    assert_eq!(
        result.variables,
        vec![(Variable::Input(1), 3), (Variable::Input(2), 0)]
    );
}

#[test]
fn test_missing_and_extra_inputs() {
    let program = compile(&addition());
    assert_eq!(program.execute(&[7]).y, 7);
    assert_eq!(program.execute(&[]).y, 0);

    // unreferenced inputs are still bound and reported
    let result = program.execute(&[1, 1, 9]);
    assert_eq!(result.y, 2);
    assert_eq!(result.value(Variable::Input(3)), Some(9));
}

#[test]
fn test_empty_program_finishes_at_once() {
    let program = Program::new("empty", Vec::new());
    let result = program.execute(&[1]);
    assert_eq!(result.cycles, 0);
    assert_eq!(result.y, 0);
    assert_eq!(result.halt_reason, Some(HaltReason::Finished));
}

#[test]
fn test_increase_saturates() {
    let program = Program::new(
        "max",
        vec![Instruction::new(InstructionKind::Increase { variable: Variable::Input(1) })],
    );
    let result = program.execute(&[u64::MAX]);
    assert_eq!(result.value(Variable::Input(1)), Some(u64::MAX));
}

#[test]
fn test_step_by_step() {
    let program = compile(&addition());
    let mut state = ExecutionState::new(&program, &[3, 2]);
    let mut interpreter = Interpreter::new(&program, &mut state);

    assert!(interpreter.step());
    assert_eq!(interpreter.state().pointer(), 1);
    assert_eq!(interpreter.state().value(Variable::Output), 3);
    assert_eq!(interpreter.state().cycles(), 4);

    assert_eq!(interpreter.run(), HaltReason::Finished);
    assert!(!interpreter.step());
    assert!(state.is_finished());
    assert_eq!(state.pointer(), program.len());
}

#[test]
fn test_run_until_always_moves() {
    let program = compile(&addition());
    let mut state = ExecutionState::new(&program, &[3, 2]);

    // the condition already holds, but one step is taken anyway
    Interpreter::new(&program, &mut state).run_until(|_| true);
    assert_eq!(state.pointer(), 1);

    Interpreter::new(&program, &mut state).run_until(|s| s.pointer() == 4);
    assert_eq!(state.pointer(), 4);
    assert_eq!(state.value(Variable::Output), 4);
}

#[test]
fn test_budget() {
    let program = compile(&addition());

    let starved = program.execute_with_budget(&[3, 2], 0);
    assert_eq!(starved.halt_reason, Some(HaltReason::InsufficientResources));
    assert_eq!(starved.cycles, 0);

    // the budget is checked before each step, so the last step may overshoot it
    let cut = program.execute_with_budget(&[3, 2], 5);
    assert_eq!(cut.halt_reason, Some(HaltReason::InsufficientResources));
    assert_eq!(cut.cycles, 6);

    let exact = program.execute_with_budget(&[3, 2], 16);
    assert_eq!(exact.halt_reason, Some(HaltReason::Finished));
    assert_eq!(exact, program.execute(&[3, 2]));
}

#[test]
fn test_history_records_reversible_deltas() {
    let program = compile(&addition());
    let mut state = ExecutionState::new(&program, &[3, 2]).with_history();
    let initial = state.clone();

    Interpreter::new(&program, &mut state).run();
    assert_eq!(state.history().len(), 10);

    let first = state.history()[0];
    assert_eq!(
        first.variable,
        Some(VariableChange { variable: Variable::Output, old: 0, new: 3 })
    );
    assert_eq!(first.pointer, (0, 1));
    assert_eq!(first.cycles, (0, 4));

    // the final jump to EXIT lands one past the end
    let last = *state.history().last().unwrap();
    assert_eq!(last.variable, None);
    assert_eq!(last.pointer, (1, program.len()));

    while state.undo().is_ok() {}
    assert_eq!(state.pointer(), initial.pointer());
    assert_eq!(state.cycles(), 0);
    assert_eq!(
        state.variables().collect::<Vec<_>>(),
        initial.variables().collect::<Vec<_>>()
    );
}

#[test]
fn test_undo_without_history() {
    let program = compile(&addition());
    let mut state = ExecutionState::new(&program, &[1, 1]);
    Interpreter::new(&program, &mut state).step();
    assert!(state.undo().is_err());
    assert!(state.history().is_empty());
}

#[test]
fn test_jump_to_exit_from_the_middle() {
    let program = Program::checked(
        "early",
        vec![
            Instruction::new(InstructionKind::JumpNotZero { variable: Variable::Input(1), target: Label::Exit }),
            Instruction::new(InstructionKind::Increase { variable: Variable::Output }),
        ],
    )
    .unwrap();

    assert_eq!(program.execute(&[1]).y, 0);
    assert_eq!(program.execute(&[1]).cycles, 2);
    assert_eq!(program.execute(&[0]).y, 1);
    assert_eq!(program.execute(&[0]).cycles, 3);
}

#[test]
fn test_quotation_does_not_leak_callee_state() {
    let program = compile(&repeated_double());
    let result = program.execute(&[3, 2]);
    assert_eq!(result.y, 12);
    // only the caller's own variables are reported
    let names: Vec<String> = result.variables.iter().map(|(v, _)| v.to_string()).collect();
    assert_eq!(names, vec!["x1", "x2", "z1", "z2"]);
    assert_eq!(result.value(Variable::Input(2)), Some(2));
}
