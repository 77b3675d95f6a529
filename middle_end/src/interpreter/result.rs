//! Run results

use super::state::ExecutionState;
use front_end::types::Variable;
use serde::Serialize;
use std::fmt;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HaltReason {
    Finished,
    StoppedManually,
    InsufficientResources,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            HaltReason::Finished => "FINISHED",
            HaltReason::StoppedManually => "STOPPED_MANUALLY",
            HaltReason::InsufficientResources => "INSUFFICIENT_RESOURCES",
        };
        write!(f, "{}", text)
    }
}

/// Snapshot of a finished run, or of a paused debug session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub cycles: u64,
    pub y: u64,
    /// Every variable except `y`, sorted by letter then number
    pub variables: Vec<(Variable, u64)>,
    /// `None` while a debug session is paused
    pub halt_reason: Option<HaltReason>,
    /// Pointer at which a debug session stopped
    pub debug_pointer: Option<usize>,
}

impl RunResult {
    pub fn finished(state: &ExecutionState, reason: HaltReason) -> Self {
        Self::snapshot(state, Some(reason), None)
    }

    pub fn paused(state: &ExecutionState) -> Self {
        Self::snapshot(state, None, Some(state.pointer()))
    }

    fn snapshot(state: &ExecutionState, halt_reason: Option<HaltReason>, debug_pointer: Option<usize>) -> Self {
        Self {
            cycles: state.cycles(),
            y: state.value(Variable::Output),
            variables: state
                .variables()
                .filter(|(v, _)| *v != Variable::Output)
                .collect(),
            halt_reason,
            debug_pointer,
        }
    }

    /// Produced while a debug session was still live
    pub fn is_debug(&self) -> bool {
        self.debug_pointer.is_some()
    }

    pub fn value(&self, variable: Variable) -> Option<u64> {
        if variable == Variable::Output {
            return Some(self.y);
        }
        self.variables
            .iter()
            .find(|(v, _)| *v == variable)
            .map(|(_, value)| *value)
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "y = {}", self.y)?;
        for (variable, value) in &self.variables {
            writeln!(f, "{} = {}", variable, value)?;
        }
        write!(f, "cycles: {}", self.cycles)?;
        match (self.halt_reason, self.debug_pointer) {
            (Some(reason), _) => write!(f, " ({})", reason),
            (None, Some(pointer)) => write!(f, " (paused before #{})", pointer + 1),
            (None, None) => Ok(()),
        }
    }
}
