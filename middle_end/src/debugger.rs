//! Debug sessions
//!
//! A session binds one already-expanded program and one input vector for
//! its whole lifetime. Every step records a delta, so any step can be
//! reverted with [`DebugSession::step_back`].

use crate::error::{EngineError, Result};
use crate::interpreter::{ExecutionState, HaltReason, Interpreter, RunResult};
use crate::program::Program;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Lifecycle of a debug session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Idle,
    Paused,
    PausedAtBreakpoint,
    Finished,
    Stopped,
}

impl SessionState {
    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Paused | SessionState::PausedAtBreakpoint)
    }
}

#[derive(Debug, Clone)]
pub struct DebugSession {
    program: Program,
    input: Vec<u64>,
    state: ExecutionState,
    breakpoints: BTreeSet<usize>,
    status: SessionState,
}

impl DebugSession {
    /// A session that has not run anything yet
    pub fn new(program: Program, input: Vec<u64>) -> Self {
        let state = ExecutionState::new(&program, &input).with_history();
        Self {
            program,
            input,
            state,
            breakpoints: BTreeSet::new(),
            status: SessionState::Idle,
        }
    }

    /// Run from the first instruction until a breakpoint or the end
    pub fn start(&mut self, breakpoints: impl IntoIterator<Item = usize>) -> Result<RunResult> {
        if self.status != SessionState::Idle {
            return Err(EngineError::SessionAlreadyActive);
        }
        for index in breakpoints {
            self.check_index(index)?;
            self.breakpoints.insert(index);
        }
        info!(
            program = %self.program.name(),
            input = ?self.input,
            breakpoints = ?self.breakpoints,
            "debug session started"
        );

        if self.at_breakpoint() {
            self.status = SessionState::PausedAtBreakpoint;
            return Ok(RunResult::paused(&self.state));
        }
        self.status = SessionState::Paused;
        self.run_to_breakpoint()
    }

    /// Execute exactly one instruction
    pub fn step_over(&mut self) -> Result<RunResult> {
        self.ensure_live()?;
        Interpreter::new(&self.program, &mut self.state).step();
        self.status = if self.at_breakpoint() {
            SessionState::PausedAtBreakpoint
        } else {
            SessionState::Paused
        };
        Ok(self.settle())
    }

    /// Execute at least one instruction, then run to the next breakpoint or the end
    pub fn resume(&mut self) -> Result<RunResult> {
        self.ensure_live()?;
        self.run_to_breakpoint()
    }

    /// Revert the most recent step
    pub fn step_back(&mut self) -> Result<RunResult> {
        self.ensure_live()?;
        let delta = self.state.undo()?;
        debug!(pointer = delta.pointer.0, cycles = delta.cycles.0, "stepped back");
        self.status = if self.at_breakpoint() {
            SessionState::PausedAtBreakpoint
        } else {
            SessionState::Paused
        };
        Ok(RunResult::paused(&self.state))
    }

    /// End the session, keeping the cycles spent so far
    pub fn stop(&mut self) -> Result<RunResult> {
        self.ensure_live()?;
        self.status = SessionState::Stopped;
        info!(program = %self.program.name(), cycles = self.state.cycles(), "debug session stopped");
        Ok(RunResult::finished(&self.state, HaltReason::StoppedManually))
    }

    pub fn set_breakpoint(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if self.breakpoints.insert(index) {
            info!(index, "breakpoint added");
        }
        Ok(())
    }

    pub fn remove_breakpoint(&mut self, index: usize) -> bool {
        let removed = self.breakpoints.remove(&index);
        if removed {
            info!(index, "breakpoint removed");
        }
        removed
    }

    pub fn breakpoints(&self) -> &BTreeSet<usize> {
        &self.breakpoints
    }

    pub fn status(&self) -> SessionState {
        self.status
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn input(&self) -> &[u64] {
        &self.input
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Snapshot of the session as it stands
    pub fn snapshot(&self) -> RunResult {
        match self.status {
            SessionState::Finished => RunResult::finished(&self.state, HaltReason::Finished),
            SessionState::Stopped => RunResult::finished(&self.state, HaltReason::StoppedManually),
            _ => RunResult::paused(&self.state),
        }
    }

    fn run_to_breakpoint(&mut self) -> Result<RunResult> {
        let breakpoints = &self.breakpoints;
        Interpreter::new(&self.program, &mut self.state)
            .run_until(|state| breakpoints.contains(&state.pointer()));
        self.status = if self.at_breakpoint() {
            SessionState::PausedAtBreakpoint
        } else {
            SessionState::Paused
        };
        Ok(self.settle())
    }

    /// Switch to `Finished` once the pointer ran off the end
    fn settle(&mut self) -> RunResult {
        if self.state.is_finished() {
            self.status = SessionState::Finished;
            info!(
                program = %self.program.name(),
                cycles = self.state.cycles(),
                "debug session finished"
            );
            RunResult::finished(&self.state, HaltReason::Finished)
        } else {
            RunResult::paused(&self.state)
        }
    }

    fn at_breakpoint(&self) -> bool {
        !self.state.is_finished() && self.breakpoints.contains(&self.state.pointer())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.status.is_live() {
            Ok(())
        } else {
            Err(EngineError::NoActiveSession)
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.program.len() {
            Ok(())
        } else {
            Err(EngineError::BreakpointOutOfRange {
                index,
                len: self.program.len(),
            })
        }
    }
}
