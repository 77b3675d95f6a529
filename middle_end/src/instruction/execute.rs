//! Direct execution of every instruction kind

use super::argument::invoke;
use super::{Instruction, InstructionKind};
use crate::interpreter::{Effect, ExecutionState};
use crate::program::Program;

impl Instruction {
    /// Execute against `state`; the only place execution mutates state
    pub fn execute(&self, program: &Program, state: &mut ExecutionState) {
        let effect = self.effect(state);
        state.commit(effect, program);
    }

    fn effect(&self, state: &ExecutionState) -> Effect {
        let cost = self.cost();
        match &self.kind {
            InstructionKind::Neutral { .. } => Effect::advance(cost),
            InstructionKind::Increase { variable } => {
                Effect::write(*variable, state.value(*variable).saturating_add(1), cost)
            }
            InstructionKind::Decrease { variable } => {
                Effect::write(*variable, state.value(*variable).saturating_sub(1), cost)
            }
            InstructionKind::JumpNotZero { variable, target } => {
                Effect::jump_if(state.value(*variable) != 0, *target, cost)
            }
            InstructionKind::ZeroVariable { variable } => Effect::write(*variable, 0, cost),
            InstructionKind::GotoLabel { target } => Effect::jump_if(true, *target, cost),
            InstructionKind::Assignment { variable, source } => {
                Effect::write(*variable, state.value(*source), cost)
            }
            InstructionKind::ConstantAssignment { variable, value } => {
                Effect::write(*variable, *value, cost)
            }
            InstructionKind::JumpZero { variable, target } => {
                Effect::jump_if(state.value(*variable) == 0, *target, cost)
            }
            InstructionKind::JumpEqualConstant { variable, value, target } => {
                Effect::jump_if(state.value(*variable) == *value, *target, cost)
            }
            InstructionKind::JumpEqualVariable { variable, other, target } => {
                Effect::jump_if(state.value(*variable) == state.value(*other), *target, cost)
            }
            InstructionKind::Quotation { variable, function, args } => {
                let (y, cycles) = invoke(function, args, state);
                Effect::write(*variable, y, cost + cycles)
            }
            InstructionKind::JumpEqualFunction { variable, function, args, target } => {
                let (y, cycles) = invoke(function, args, state);
                Effect::jump_if(state.value(*variable) == y, *target, cost + cycles)
            }
        }
    }
}
