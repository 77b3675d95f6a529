//! Instruction model
//!
//! Four primitive instructions plus synthetic ones. Every synthetic
//! instruction executes directly with its own cost and can also be
//! lowered one level by [`Instruction::expand`](crate::lowering).

mod argument;
mod execute;
mod pretty_print;

pub use argument::{quotation_depth, Argument};
pub use front_end::types::{Label, Variable};

use crate::program::Program;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Index of an ancestor instruction in the owning program's lineage arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginId(pub usize);

/// The least capable machine able to run an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Architecture {
    I,
    II,
    III,
    IV,
}

impl Architecture {
    pub const ALL: [Architecture; 4] = [
        Architecture::I,
        Architecture::II,
        Architecture::III,
        Architecture::IV,
    ];
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Architecture::I => "I",
            Architecture::II => "II",
            Architecture::III => "III",
            Architecture::IV => "IV",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" | "1" => Ok(Architecture::I),
            "II" | "2" => Ok(Architecture::II),
            "III" | "3" => Ok(Architecture::III),
            "IV" | "4" => Ok(Architecture::IV),
            other => Err(format!("unknown architecture `{}`", other)),
        }
    }
}

/// What an instruction does, with its operands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    /// `v <- v`
    Neutral { variable: Variable },
    /// `v <- v + 1`
    Increase { variable: Variable },
    /// `v <- v - 1`, saturating at zero
    Decrease { variable: Variable },
    /// `IF v != 0 GOTO L`
    JumpNotZero { variable: Variable, target: Label },
    /// `v <- 0`
    ZeroVariable { variable: Variable },
    /// `GOTO L`
    GotoLabel { target: Label },
    /// `v <- v2`
    Assignment { variable: Variable, source: Variable },
    /// `v <- k`
    ConstantAssignment { variable: Variable, value: u64 },
    /// `IF v = 0 GOTO L`
    JumpZero { variable: Variable, target: Label },
    /// `IF v = k GOTO L`
    JumpEqualConstant {
        variable: Variable,
        value: u64,
        target: Label,
    },
    /// `IF v = v2 GOTO L`
    JumpEqualVariable {
        variable: Variable,
        other: Variable,
        target: Label,
    },
    /// `v <- (F, args)`
    Quotation {
        variable: Variable,
        function: Arc<Program>,
        args: Vec<Argument>,
    },
    /// `IF v = (F, args) GOTO L`
    JumpEqualFunction {
        variable: Variable,
        function: Arc<Program>,
        args: Vec<Argument>,
        target: Label,
    },
}

/// One instruction: a kind, an optional label and where it was expanded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub kind: InstructionKind,
    pub label: Label,
    pub origin: Option<OriginId>,
}

impl Instruction {
    pub fn new(kind: InstructionKind) -> Self {
        Self {
            kind,
            label: Label::None,
            origin: None,
        }
    }

    pub fn labelled(label: Label, kind: InstructionKind) -> Self {
        Self::new(kind).with_label(label)
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    pub fn with_origin(mut self, origin: OriginId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Opcode name as written in program documents
    pub fn name(&self) -> &'static str {
        match &self.kind {
            InstructionKind::Neutral { .. } => "NEUTRAL",
            InstructionKind::Increase { .. } => "INCREASE",
            InstructionKind::Decrease { .. } => "DECREASE",
            InstructionKind::JumpNotZero { .. } => "JUMP_NOT_ZERO",
            InstructionKind::ZeroVariable { .. } => "ZERO_VARIABLE",
            InstructionKind::GotoLabel { .. } => "GOTO_LABEL",
            InstructionKind::Assignment { .. } => "ASSIGNMENT",
            InstructionKind::ConstantAssignment { .. } => "CONSTANT_ASSIGNMENT",
            InstructionKind::JumpZero { .. } => "JUMP_ZERO",
            InstructionKind::JumpEqualConstant { .. } => "JUMP_EQUAL_CONSTANT",
            InstructionKind::JumpEqualVariable { .. } => "JUMP_EQUAL_VARIABLE",
            InstructionKind::Quotation { .. } => "QUOTE",
            InstructionKind::JumpEqualFunction { .. } => "JUMP_EQUAL_FUNCTION",
        }
    }

    /// Fixed cycle cost; call-based kinds add the cycles of their calls at run time
    pub fn cost(&self) -> u64 {
        match &self.kind {
            InstructionKind::Neutral { .. } => 0,
            InstructionKind::Increase { .. }
            | InstructionKind::Decrease { .. }
            | InstructionKind::ZeroVariable { .. }
            | InstructionKind::GotoLabel { .. } => 1,
            InstructionKind::JumpNotZero { .. }
            | InstructionKind::ConstantAssignment { .. }
            | InstructionKind::JumpZero { .. }
            | InstructionKind::JumpEqualConstant { .. }
            | InstructionKind::JumpEqualVariable { .. } => 2,
            InstructionKind::Assignment { .. } => 4,
            InstructionKind::Quotation { .. } => 5,
            InstructionKind::JumpEqualFunction { .. } => 6,
        }
    }

    pub fn is_basic(&self) -> bool {
        self.architecture() == Architecture::I
    }

    pub fn architecture(&self) -> Architecture {
        match &self.kind {
            InstructionKind::Neutral { .. }
            | InstructionKind::Increase { .. }
            | InstructionKind::Decrease { .. }
            | InstructionKind::JumpNotZero { .. } => Architecture::I,
            InstructionKind::ZeroVariable { .. }
            | InstructionKind::ConstantAssignment { .. }
            | InstructionKind::GotoLabel { .. } => Architecture::II,
            InstructionKind::Assignment { .. }
            | InstructionKind::JumpZero { .. }
            | InstructionKind::JumpEqualConstant { .. }
            | InstructionKind::JumpEqualVariable { .. } => Architecture::III,
            InstructionKind::Quotation { .. } | InstructionKind::JumpEqualFunction { .. } => {
                Architecture::IV
            }
        }
    }

    /// Number of expansion passes needed before this instruction is all primitive
    pub fn depth(&self) -> usize {
        match &self.kind {
            InstructionKind::Neutral { .. }
            | InstructionKind::Increase { .. }
            | InstructionKind::Decrease { .. }
            | InstructionKind::JumpNotZero { .. } => 0,
            InstructionKind::ZeroVariable { .. } | InstructionKind::GotoLabel { .. } => 1,
            InstructionKind::Assignment { .. }
            | InstructionKind::ConstantAssignment { .. }
            | InstructionKind::JumpZero { .. } => 2,
            InstructionKind::JumpEqualConstant { .. } | InstructionKind::JumpEqualVariable { .. } => 3,
            InstructionKind::Quotation { function, args, .. } => quotation_depth(function, args),
            InstructionKind::JumpEqualFunction { function, args, .. } => {
                1 + quotation_depth(function, args).max(3)
            }
        }
    }

    /// The variable the instruction is about; `GOTO` has none
    pub fn variable(&self) -> Option<Variable> {
        match &self.kind {
            InstructionKind::Neutral { variable }
            | InstructionKind::Increase { variable }
            | InstructionKind::Decrease { variable }
            | InstructionKind::JumpNotZero { variable, .. }
            | InstructionKind::ZeroVariable { variable }
            | InstructionKind::Assignment { variable, .. }
            | InstructionKind::ConstantAssignment { variable, .. }
            | InstructionKind::JumpZero { variable, .. }
            | InstructionKind::JumpEqualConstant { variable, .. }
            | InstructionKind::JumpEqualVariable { variable, .. }
            | InstructionKind::Quotation { variable, .. }
            | InstructionKind::JumpEqualFunction { variable, .. } => Some(*variable),
            InstructionKind::GotoLabel { .. } => None,
        }
    }

    /// Jump target, or `Label::None` for instructions that never jump
    pub fn target_label(&self) -> Label {
        match &self.kind {
            InstructionKind::JumpNotZero { target, .. }
            | InstructionKind::GotoLabel { target }
            | InstructionKind::JumpZero { target, .. }
            | InstructionKind::JumpEqualConstant { target, .. }
            | InstructionKind::JumpEqualVariable { target, .. }
            | InstructionKind::JumpEqualFunction { target, .. } => *target,
            _ => Label::None,
        }
    }

    /// Every variable the instruction mentions, including inside argument expressions
    pub fn present_variables(&self) -> Vec<Variable> {
        let mut vars: Vec<Variable> = self.variable().into_iter().collect();
        match &self.kind {
            InstructionKind::Assignment { source, .. } => vars.push(*source),
            InstructionKind::JumpEqualVariable { other, .. } => vars.push(*other),
            InstructionKind::Quotation { args, .. } | InstructionKind::JumpEqualFunction { args, .. } => {
                vars.extend(args.iter().flat_map(Argument::variables));
            }
            _ => {}
        }
        vars
    }

    /// Names of the functions this instruction calls, nested calls included
    pub fn called_functions(&self) -> Vec<String> {
        match &self.kind {
            InstructionKind::Quotation { function, args, .. }
            | InstructionKind::JumpEqualFunction { function, args, .. } => {
                let mut names = vec![function.name().to_string()];
                names.extend(args.iter().flat_map(Argument::called_functions));
                names
            }
            _ => Vec::new(),
        }
    }
}
