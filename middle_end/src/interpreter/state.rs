//! Execution state and reversible step deltas

use crate::error::{EngineError, Result};
use crate::program::Program;
use front_end::types::{Label, Variable};
use serde::Serialize;
use std::collections::BTreeMap;

/// A variable write recorded by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariableChange {
    pub variable: Variable,
    pub old: u64,
    pub new: u64,
}

/// Everything one executed instruction changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDelta {
    pub variable: Option<VariableChange>,
    pub pointer: (usize, usize),
    pub cycles: (u64, u64),
}

/// Outcome of one instruction before it is applied
#[derive(Debug, Clone, Copy)]
pub(crate) struct Effect {
    write: Option<(Variable, u64)>,
    jump: Option<Label>,
    cycles: u64,
}

impl Effect {
    pub(crate) fn advance(cycles: u64) -> Self {
        Self {
            write: None,
            jump: None,
            cycles,
        }
    }

    pub(crate) fn write(variable: Variable, value: u64, cycles: u64) -> Self {
        Self {
            write: Some((variable, value)),
            ..Self::advance(cycles)
        }
    }

    pub(crate) fn jump_if(condition: bool, target: Label, cycles: u64) -> Self {
        Self {
            jump: condition.then_some(target),
            ..Self::advance(cycles)
        }
    }
}

/// Variable bindings, instruction pointer and cycle counter of one run
///
/// The run is over once the pointer is past the last instruction; a jump
/// to `EXIT` moves it there directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionState {
    variables: BTreeMap<Variable, u64>,
    pointer: usize,
    cycles: u64,
    length: usize,
    history: Option<Vec<StepDelta>>,
}

impl ExecutionState {
    /// Bind `y` and every referenced variable to 0, then the inputs to `x1..xn`
    pub fn new(program: &Program, input: &[u64]) -> Self {
        let mut variables: BTreeMap<Variable, u64> =
            program.variables().iter().map(|v| (*v, 0)).collect();
        variables.insert(Variable::Output, 0);
        for (index, value) in input.iter().enumerate() {
            variables.insert(Variable::Input(index as u32 + 1), *value);
        }

        Self {
            variables,
            pointer: 0,
            cycles: 0,
            length: program.len(),
            history: None,
        }
    }

    /// Record a delta for every step from now on
    pub fn with_history(mut self) -> Self {
        self.history = Some(Vec::new());
        self
    }

    pub fn value(&self, variable: Variable) -> u64 {
        self.variables.get(&variable).copied().unwrap_or(0)
    }

    /// All bound variables in letter-then-number order
    pub fn variables(&self) -> impl Iterator<Item = (Variable, u64)> + '_ {
        self.variables.iter().map(|(v, value)| (*v, *value))
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_finished(&self) -> bool {
        self.pointer >= self.length
    }

    pub fn history(&self) -> &[StepDelta] {
        self.history.as_deref().unwrap_or(&[])
    }

    pub(crate) fn commit(&mut self, effect: Effect, program: &Program) {
        let change = effect.write.map(|(variable, new)| {
            let old = self.variables.insert(variable, new).unwrap_or(0);
            VariableChange { variable, old, new }
        });

        let old_pointer = self.pointer;
        self.pointer = match effect.jump {
            Some(target) => program.jump_destination(target),
            None => self.pointer + 1,
        };

        let old_cycles = self.cycles;
        self.cycles = self.cycles.saturating_add(effect.cycles);

        if let Some(history) = self.history.as_mut() {
            history.push(StepDelta {
                variable: change,
                pointer: (old_pointer, self.pointer),
                cycles: (old_cycles, self.cycles),
            });
        }
    }

    /// Revert the most recent step exactly
    pub fn undo(&mut self) -> Result<StepDelta> {
        let delta = self
            .history
            .as_mut()
            .and_then(Vec::pop)
            .ok_or(EngineError::NothingToUndo)?;

        if let Some(change) = delta.variable {
            self.variables.insert(change.variable, change.old);
        }
        self.pointer = delta.pointer.0;
        self.cycles = delta.cycles.0;
        Ok(delta)
    }
}
