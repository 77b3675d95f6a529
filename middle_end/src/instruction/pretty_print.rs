//! Text rendering of instructions

use super::{Argument, Instruction, InstructionKind};
use std::fmt;

fn call(function: &str, args: &[Argument]) -> String {
    if args.is_empty() {
        format!("({})", function)
    } else {
        let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
        format!("({},{})", function, rendered.join(","))
    }
}

impl Instruction {
    /// The instruction body without label or cost, e.g. `IF x1 != 0 GOTO L2`
    pub fn body(&self) -> String {
        match &self.kind {
            InstructionKind::Neutral { variable } => format!("{v} <- {v}", v = variable),
            InstructionKind::Increase { variable } => format!("{v} <- {v} + 1", v = variable),
            InstructionKind::Decrease { variable } => format!("{v} <- {v} - 1", v = variable),
            InstructionKind::JumpNotZero { variable, target } => {
                format!("IF {} != 0 GOTO {}", variable, target)
            }
            InstructionKind::ZeroVariable { variable } => format!("{} <- 0", variable),
            InstructionKind::GotoLabel { target } => format!("GOTO {}", target),
            InstructionKind::Assignment { variable, source } => format!("{} <- {}", variable, source),
            InstructionKind::ConstantAssignment { variable, value } => {
                format!("{} <- {}", variable, value)
            }
            InstructionKind::JumpZero { variable, target } => {
                format!("IF {} = 0 GOTO {}", variable, target)
            }
            InstructionKind::JumpEqualConstant { variable, value, target } => {
                format!("IF {} = {} GOTO {}", variable, value, target)
            }
            InstructionKind::JumpEqualVariable { variable, other, target } => {
                format!("IF {} = {} GOTO {}", variable, other, target)
            }
            InstructionKind::Quotation { variable, function, args } => {
                format!("{} <- {}", variable, call(function.name(), args))
            }
            InstructionKind::JumpEqualFunction { variable, function, args, target } => {
                format!("IF {} = {} GOTO {}", variable, call(function.name(), args), target)
            }
        }
    }

    /// One listing line: `#3 (B) [ L1    ] x1 <- x1 - 1 (1)`
    pub fn render(&self, position: usize) -> String {
        format!(
            "#{} ({}) [ {:<5} ] {} ({})",
            position,
            if self.is_basic() { "B" } else { "S" },
            self.label.to_string(),
            self.body(),
            self.cost()
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.label.is_none() {
            write!(f, "{}", self.body())
        } else {
            write!(f, "{}: {}", self.label, self.body())
        }
    }
}
