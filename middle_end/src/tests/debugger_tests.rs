use super::support::*;
use crate::debugger::{DebugSession, SessionState};
use crate::error::EngineError;
use crate::instruction::Variable;
use crate::interpreter::{HaltReason, RunResult};
use crate::program::Program;
use front_end::document::ProgramDocument;

fn session() -> DebugSession {
    DebugSession::new(compile(&addition()), vec![3, 2])
}

#[test]
fn test_breakpoint_trace() {
    let mut session = session();
    assert_eq!(session.status(), SessionState::Idle);

    let first = session.start([3]).unwrap();
    assert_eq!(first.halt_reason, None);
    assert_eq!(first.debug_pointer, Some(3));
    assert_eq!(first.y, 3);
    assert_eq!(first.value(Variable::Input(2)), Some(1));
    assert_eq!(first.cycles, 7);
    assert_eq!(session.status(), SessionState::PausedAtBreakpoint);

    // resuming from a breakpoint moves past it before checking again
    let second = session.resume().unwrap();
    assert_eq!(second.debug_pointer, Some(3));
    assert_eq!(second.y, 4);
    assert_eq!(second.value(Variable::Input(2)), Some(0));
    assert_eq!(second.cycles, 12);

    let last = session.resume().unwrap();
    assert_eq!(last.halt_reason, Some(HaltReason::Finished));
    assert_eq!(last.debug_pointer, None);
    assert_eq!(last.y, 5);
    assert_eq!(last.cycles, 16);
    assert_eq!(session.status(), SessionState::Finished);
    assert!(!session.is_live());
}

#[test]
fn test_debugging_matches_a_plain_run() {
    let program = compile(&repeated_double());
    let mut session = DebugSession::new(program.clone(), vec![3, 2]);
    // #4 is the call to Plus inside the loop
    let mut result = session.start([0, 3]).unwrap();
    let mut pauses = 0;
    while session.is_live() {
        pauses += 1;
        result = session.resume().unwrap();
    }
    assert_eq!(pauses, 4);
    assert_eq!(result, program.execute(&[3, 2]));
}

/// Step to the end, undoing and redoing every step that leaves the session live
fn step_with_undo(program: &Program, input: &[u64]) -> RunResult {
    let mut session = DebugSession::new(program.clone(), input.to_vec());
    let mut result = session.start([0]).unwrap();
    while session.is_live() {
        let before = session.snapshot();
        let after = session.step_over().unwrap();
        if session.is_live() {
            assert_eq!(session.step_back().unwrap(), before);
            assert_eq!(session.step_over().unwrap(), after);
        }
        result = after;
    }
    result
}

#[test]
fn test_mixed_kinds_fixture() {
    let program = compile(&mixed_kinds());
    assert_eq!(program.execute(&[3, 2]).y, 5);
    assert_eq!(program.execute(&[2, 5]).y, 6);
    assert_eq!(program.execute(&[1, 0]).y, 0);
    assert_eq!(program.execute(&[3, 0]).y, 1);
    assert_eq!(program.max_expansion_level(), 4);
}

#[test]
fn test_stepping_with_undo_matches_execute_at_every_level() {
    let cases: Vec<(ProgramDocument, Vec<Vec<u64>>)> = vec![
        (addition(), vec![vec![3, 2], vec![0, 0]]),
        (repeated_double(), vec![vec![2, 3], vec![0, 4]]),
        (nested_calls(), vec![vec![3]]),
        (jump_on_successor(), vec![vec![4, 3], vec![4, 4]]),
        (mixed_kinds(), vec![vec![3, 2], vec![2, 5], vec![1, 0], vec![3, 0]]),
    ];

    for (document, inputs) in cases {
        let program = compile(&document);
        for level in 0..=program.max_expansion_level() {
            let expanded = program.expand(level);
            for input in &inputs {
                let stepped = step_with_undo(&expanded, input);
                assert_eq!(
                    stepped,
                    expanded.execute(input),
                    "{} at level {} on {:?}",
                    document.name,
                    level,
                    input
                );
                assert_eq!(stepped.y, program.execute(input).y);
            }
        }
    }
}

#[test]
fn test_breakpoint_on_first_instruction_pauses_immediately() {
    let mut session = session();
    let result = session.start([0]).unwrap();
    assert_eq!(result.debug_pointer, Some(0));
    assert_eq!(result.cycles, 0);
    assert_eq!(session.status(), SessionState::PausedAtBreakpoint);
    assert!(session.state().history().is_empty());
}

#[test]
fn test_stop_keeps_cycles_spent() {
    let mut session = session();
    session.start([2]).unwrap();
    let stopped = session.stop().unwrap();
    assert_eq!(stopped.halt_reason, Some(HaltReason::StoppedManually));
    assert_eq!(stopped.cycles, 6);
    assert_eq!(session.status(), SessionState::Stopped);
    assert_eq!(session.snapshot(), stopped);

    assert!(matches!(session.step_over(), Err(EngineError::NoActiveSession)));
}

#[test]
fn test_step_over_walks_to_the_end() {
    let mut session = session();
    session.start([0]).unwrap();

    let mut steps = 0;
    let mut result = session.snapshot();
    while session.is_live() {
        result = session.step_over().unwrap();
        steps += 1;
    }
    // 1 assignment + 2 loop iterations of 4 + the final jump
    assert_eq!(steps, 10);
    assert_eq!(result.halt_reason, Some(HaltReason::Finished));
    assert_eq!(result.cycles, 16);
    assert!(matches!(session.resume(), Err(EngineError::NoActiveSession)));
}

#[test]
fn test_step_back_restores_everything() {
    let mut session = session();
    session.start([3]).unwrap();

    let back = session.step_back().unwrap();
    assert_eq!(back.debug_pointer, Some(2));
    assert_eq!(back.cycles, 6);
    assert_eq!(back.value(Variable::Input(2)), Some(2));
    assert_eq!(session.status(), SessionState::Paused);

    session.step_back().unwrap();
    let start = session.step_back().unwrap();
    assert_eq!(start.debug_pointer, Some(0));
    assert_eq!(start.cycles, 0);
    assert_eq!(start.y, 0);

    let err = session.step_back().unwrap_err();
    assert!(matches!(err, EngineError::NothingToUndo));
    assert!(err.is_usage_error());
    assert!(session.is_live());
    assert_eq!(session.snapshot().debug_pointer, Some(0));
}

#[test]
fn test_step_back_over_a_jump() {
    let mut session = session();
    let paused = session.start([4]).unwrap();
    assert_eq!(paused.cycles, 8);

    let jumped = session.step_over().unwrap();
    assert_eq!(jumped.debug_pointer, Some(1));
    assert_eq!(jumped.cycles, 9);

    let back = session.step_back().unwrap();
    assert_eq!(back, paused);
    assert_eq!(session.status(), SessionState::PausedAtBreakpoint);
}

#[test]
fn test_breakpoints_can_change_while_paused() {
    let mut session = session();
    session.start([1]).unwrap();

    session.set_breakpoint(4).unwrap();
    assert!(session.remove_breakpoint(1));
    assert!(!session.remove_breakpoint(1));
    assert_eq!(session.breakpoints().iter().copied().collect::<Vec<_>>(), vec![4]);

    let result = session.resume().unwrap();
    assert_eq!(result.debug_pointer, Some(4));
    assert_eq!(result.y, 4);
}

#[test]
fn test_usage_errors_leave_the_session_alone() {
    let mut session = session();
    assert!(matches!(session.step_over(), Err(EngineError::NoActiveSession)));
    assert!(matches!(
        session.start([5]),
        Err(EngineError::BreakpointOutOfRange { index: 5, len: 5 })
    ));
    assert_eq!(session.status(), SessionState::Idle);

    session.start([2]).unwrap();
    assert!(matches!(session.start([]), Err(EngineError::SessionAlreadyActive)));
    assert!(matches!(
        session.set_breakpoint(9),
        Err(EngineError::BreakpointOutOfRange { index: 9, .. })
    ));
    assert_eq!(session.snapshot().debug_pointer, Some(2));
}
