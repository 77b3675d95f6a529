//! Core interpreter functionality

use super::result::{HaltReason, RunResult};
use super::state::ExecutionState;
use crate::program::Program;
use tracing::trace;

/// Steps one program over a borrowed execution state
pub struct Interpreter<'a> {
    program: &'a Program,
    state: &'a mut ExecutionState,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program, state: &'a mut ExecutionState) -> Self {
        Self { program, state }
    }

    /// Execute the instruction at the pointer; false if the run was already over
    pub fn step(&mut self) -> bool {
        if self.state.is_finished() {
            return false;
        }
        let pointer = self.state.pointer();
        let instruction = &self.program.instructions()[pointer];
        instruction.execute(self.program, self.state);
        trace!(
            program = %self.program.name(),
            pointer,
            next = self.state.pointer(),
            cycles = self.state.cycles(),
            "executed {}",
            instruction
        );
        true
    }

    /// Step until the program ends
    pub fn run(&mut self) -> HaltReason {
        while self.step() {}
        HaltReason::Finished
    }

    /// Step until the program ends or the cycle count reaches `budget`
    pub fn run_with_budget(&mut self, budget: u64) -> HaltReason {
        while !self.state.is_finished() {
            if self.state.cycles() >= budget {
                return HaltReason::InsufficientResources;
            }
            self.step();
        }
        HaltReason::Finished
    }

    /// Step at least once, then until `stop` holds or the program ends
    pub fn run_until(&mut self, mut stop: impl FnMut(&ExecutionState) -> bool) {
        if !self.step() {
            return;
        }
        while !self.state.is_finished() && !stop(self.state) {
            self.step();
        }
    }

    pub fn state(&self) -> &ExecutionState {
        self.state
    }
}

impl Program {
    /// Run to completion on `input`
    pub fn execute(&self, input: &[u64]) -> RunResult {
        let mut state = ExecutionState::new(self, input);
        let reason = Interpreter::new(self, &mut state).run();
        RunResult::finished(&state, reason)
    }

    /// Run on `input`, giving up once `budget` cycles have been spent
    pub fn execute_with_budget(&self, input: &[u64], budget: u64) -> RunResult {
        let mut state = ExecutionState::new(self, input);
        let reason = Interpreter::new(self, &mut state).run_with_budget(budget);
        RunResult::finished(&state, reason)
    }
}
