//! Instruction lowering
//!
//! Each synthetic instruction rewrites into a short sequence of simpler
//! instructions. Fresh labels and work variables come from per-pass
//! counters seeded past the highest index already in the program, so one
//! pass never collides with names it did not introduce.

use crate::instruction::{Argument, Instruction, InstructionKind, Label, OriginId, Variable};
use crate::program::Program;
use std::collections::HashMap;
use std::sync::Arc;

/// Fresh-name counters for one expansion pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionContext {
    next_label: u32,
    next_work: u32,
}

impl ExpansionContext {
    /// Seed past every label and work variable the instructions mention
    pub fn seeded_from(instructions: &[Instruction]) -> Self {
        let max_label = instructions
            .iter()
            .flat_map(|i| [i.label, i.target_label()])
            .filter_map(|label| label.number())
            .max()
            .unwrap_or(0);
        let max_work = instructions
            .iter()
            .flat_map(Instruction::present_variables)
            .filter_map(|v| v.work_index())
            .max()
            .unwrap_or(0);

        Self {
            next_label: max_label + 1,
            next_work: max_work + 1,
        }
    }

    pub fn fresh_label(&mut self) -> Label {
        let label = Label::Numbered(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn fresh_work(&mut self) -> Variable {
        let variable = Variable::Work(self.next_work);
        self.next_work += 1;
        variable
    }
}

/// Substitution used when a callee body is inlined
#[derive(Debug, Clone, Default)]
pub struct Renaming {
    variables: HashMap<Variable, Variable>,
    labels: HashMap<Label, Label>,
}

impl Renaming {
    pub fn variable(&self, variable: Variable) -> Variable {
        self.variables.get(&variable).copied().unwrap_or(variable)
    }

    /// `Label::None` always maps to itself
    pub fn label(&self, label: Label) -> Label {
        self.labels.get(&label).copied().unwrap_or(label)
    }

    fn bind_variable(&mut self, variable: Variable, ctx: &mut ExpansionContext) -> Variable {
        *self
            .variables
            .entry(variable)
            .or_insert_with(|| ctx.fresh_work())
    }
}

/// Collects the children of one expanded instruction
struct Emitter {
    out: Vec<Instruction>,
    pending_label: Label,
    origin: OriginId,
}

impl Emitter {
    fn new(label: Label, origin: OriginId) -> Self {
        Self {
            out: Vec::new(),
            pending_label: label,
            origin,
        }
    }

    /// Emit unlabelled; the first instruction takes the original's label
    fn emit(&mut self, kind: InstructionKind) {
        let label = std::mem::take(&mut self.pending_label);
        self.emit_at(label, kind);
    }

    fn emit_at(&mut self, label: Label, kind: InstructionKind) {
        self.out.push(Instruction::labelled(label, kind).with_origin(self.origin));
    }

    fn finish(self) -> Vec<Instruction> {
        self.out
    }
}

impl Instruction {
    /// Structurally identical instruction with substituted names and a new origin
    pub fn copy(&self, renaming: &Renaming, origin: OriginId) -> Instruction {
        let kind = match &self.kind {
            InstructionKind::Neutral { variable } => InstructionKind::Neutral {
                variable: renaming.variable(*variable),
            },
            InstructionKind::Increase { variable } => InstructionKind::Increase {
                variable: renaming.variable(*variable),
            },
            InstructionKind::Decrease { variable } => InstructionKind::Decrease {
                variable: renaming.variable(*variable),
            },
            InstructionKind::JumpNotZero { variable, target } => InstructionKind::JumpNotZero {
                variable: renaming.variable(*variable),
                target: renaming.label(*target),
            },
            InstructionKind::ZeroVariable { variable } => InstructionKind::ZeroVariable {
                variable: renaming.variable(*variable),
            },
            InstructionKind::GotoLabel { target } => InstructionKind::GotoLabel {
                target: renaming.label(*target),
            },
            InstructionKind::Assignment { variable, source } => InstructionKind::Assignment {
                variable: renaming.variable(*variable),
                source: renaming.variable(*source),
            },
            InstructionKind::ConstantAssignment { variable, value } => {
                InstructionKind::ConstantAssignment {
                    variable: renaming.variable(*variable),
                    value: *value,
                }
            }
            InstructionKind::JumpZero { variable, target } => InstructionKind::JumpZero {
                variable: renaming.variable(*variable),
                target: renaming.label(*target),
            },
            InstructionKind::JumpEqualConstant { variable, value, target } => {
                InstructionKind::JumpEqualConstant {
                    variable: renaming.variable(*variable),
                    value: *value,
                    target: renaming.label(*target),
                }
            }
            InstructionKind::JumpEqualVariable { variable, other, target } => {
                InstructionKind::JumpEqualVariable {
                    variable: renaming.variable(*variable),
                    other: renaming.variable(*other),
                    target: renaming.label(*target),
                }
            }
            InstructionKind::Quotation { variable, function, args } => InstructionKind::Quotation {
                variable: renaming.variable(*variable),
                function: Arc::clone(function),
                args: args.iter().map(|a| a.rename(renaming)).collect(),
            },
            InstructionKind::JumpEqualFunction { variable, function, args, target } => {
                InstructionKind::JumpEqualFunction {
                    variable: renaming.variable(*variable),
                    function: Arc::clone(function),
                    args: args.iter().map(|a| a.rename(renaming)).collect(),
                    target: renaming.label(*target),
                }
            }
        };

        Instruction {
            kind,
            label: renaming.label(self.label),
            origin: Some(origin),
        }
    }

    /// Lower one level. Primitive instructions come back unchanged.
    pub fn expand(&self, ctx: &mut ExpansionContext, origin: OriginId) -> Vec<Instruction> {
        let mut e = Emitter::new(self.label, origin);
        match &self.kind {
            InstructionKind::ZeroVariable { variable } => {
                let v = *variable;
                let l1 = ctx.fresh_label();
                e.emit(InstructionKind::Neutral { variable: v });
                e.emit_at(l1, InstructionKind::Decrease { variable: v });
                e.emit(InstructionKind::JumpNotZero { variable: v, target: l1 });
            }
            InstructionKind::GotoLabel { target } => {
                let z = ctx.fresh_work();
                e.emit(InstructionKind::Increase { variable: z });
                e.emit(InstructionKind::JumpNotZero { variable: z, target: *target });
            }
            InstructionKind::Assignment { variable, source } if variable == source => {
                e.emit(InstructionKind::Neutral { variable: *variable });
            }
            InstructionKind::Assignment { variable, source } => {
                let (v, v2) = (*variable, *source);
                let (l1, l2, l3) = (ctx.fresh_label(), ctx.fresh_label(), ctx.fresh_label());
                let z = ctx.fresh_work();
                e.emit(InstructionKind::ZeroVariable { variable: v });
                e.emit(InstructionKind::JumpNotZero { variable: v2, target: l1 });
                e.emit(InstructionKind::GotoLabel { target: l3 });
                // move v2 into z
                e.emit_at(l1, InstructionKind::Decrease { variable: v2 });
                e.emit(InstructionKind::Increase { variable: z });
                e.emit(InstructionKind::JumpNotZero { variable: v2, target: l1 });
                // copy z back into both v and v2
                e.emit_at(l2, InstructionKind::Decrease { variable: z });
                e.emit(InstructionKind::Increase { variable: v });
                e.emit(InstructionKind::Increase { variable: v2 });
                e.emit(InstructionKind::JumpNotZero { variable: z, target: l2 });
                e.emit_at(l3, InstructionKind::Neutral { variable: v });
            }
            InstructionKind::ConstantAssignment { variable, value } => {
                e.emit(InstructionKind::ZeroVariable { variable: *variable });
                for _ in 0..*value {
                    e.emit(InstructionKind::Increase { variable: *variable });
                }
            }
            InstructionKind::JumpZero { variable, target } => {
                let l1 = ctx.fresh_label();
                e.emit(InstructionKind::JumpNotZero { variable: *variable, target: l1 });
                e.emit(InstructionKind::GotoLabel { target: *target });
                e.emit_at(l1, InstructionKind::Neutral { variable: *variable });
            }
            InstructionKind::JumpEqualConstant { variable, value, target } => {
                let z = ctx.fresh_work();
                let l1 = ctx.fresh_label();
                e.emit(InstructionKind::Assignment { variable: z, source: *variable });
                for _ in 0..*value {
                    e.emit(InstructionKind::JumpZero { variable: z, target: l1 });
                    e.emit(InstructionKind::Decrease { variable: z });
                }
                e.emit(InstructionKind::JumpNotZero { variable: z, target: l1 });
                e.emit(InstructionKind::GotoLabel { target: *target });
                e.emit_at(l1, InstructionKind::Neutral { variable: *variable });
            }
            InstructionKind::JumpEqualVariable { variable, other, target } => {
                let (z1, z2) = (ctx.fresh_work(), ctx.fresh_work());
                let (l1, l2, l3) = (ctx.fresh_label(), ctx.fresh_label(), ctx.fresh_label());
                e.emit(InstructionKind::Assignment { variable: z1, source: *variable });
                e.emit(InstructionKind::Assignment { variable: z2, source: *other });
                e.emit_at(l2, InstructionKind::JumpZero { variable: z1, target: l3 });
                e.emit(InstructionKind::JumpZero { variable: z2, target: l1 });
                e.emit(InstructionKind::Decrease { variable: z1 });
                e.emit(InstructionKind::Decrease { variable: z2 });
                e.emit(InstructionKind::GotoLabel { target: l2 });
                e.emit_at(l3, InstructionKind::JumpZero { variable: z2, target: *target });
                e.emit_at(l1, InstructionKind::Neutral { variable: *variable });
            }
            InstructionKind::Quotation { variable, function, args } => {
                inline_call(&mut e, ctx, *variable, function, args);
            }
            InstructionKind::JumpEqualFunction { variable, function, args, target } => {
                let z = ctx.fresh_work();
                e.emit(InstructionKind::Quotation {
                    variable: z,
                    function: Arc::clone(function),
                    args: args.clone(),
                });
                e.emit(InstructionKind::JumpEqualVariable {
                    variable: *variable,
                    other: z,
                    target: *target,
                });
            }
            InstructionKind::Neutral { .. }
            | InstructionKind::Increase { .. }
            | InstructionKind::Decrease { .. }
            | InstructionKind::JumpNotZero { .. } => return vec![self.clone()],
        }
        e.finish()
    }
}

/// Inline `target <- (function, args)` with every callee name renamed fresh
fn inline_call(
    e: &mut Emitter,
    ctx: &mut ExpansionContext,
    target: Variable,
    function: &Program,
    args: &[Argument],
) {
    let mut renaming = Renaming::default();
    let result = renaming.bind_variable(Variable::Output, ctx);
    for variable in function.variables() {
        renaming.bind_variable(*variable, ctx);
    }
    for label in function.labels() {
        if label.number().is_some() {
            let fresh = ctx.fresh_label();
            renaming.labels.insert(*label, fresh);
        }
    }
    let end = ctx.fresh_label();
    renaming.labels.insert(Label::Exit, end);

    e.emit(InstructionKind::Neutral { variable: target });

    let bound: Vec<Variable> = (0..args.len())
        .map(|i| renaming.bind_variable(Variable::Input(i as u32 + 1), ctx))
        .collect();

    // locals start from zero on every entry
    let mut locals: Vec<Variable> = renaming
        .variables
        .values()
        .copied()
        .filter(|v| !bound.contains(v))
        .collect();
    locals.sort();
    for local in locals {
        e.emit(InstructionKind::ZeroVariable { variable: local });
    }

    for (inner, arg) in bound.iter().zip(args) {
        match arg {
            Argument::Variable(source) => e.emit(InstructionKind::Assignment {
                variable: *inner,
                source: *source,
            }),
            Argument::Call { function, args } => e.emit(InstructionKind::Quotation {
                variable: *inner,
                function: Arc::clone(function),
                args: args.clone(),
            }),
        }
    }

    for instruction in function.instructions() {
        let copy = instruction.copy(&renaming, e.origin);
        e.out.push(copy);
    }

    e.emit_at(end, InstructionKind::Assignment {
        variable: target,
        source: result,
    });
}
