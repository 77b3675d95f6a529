//! Resolved argument expressions of call-based instructions

use crate::interpreter::ExecutionState;
use crate::lowering::Renaming;
use crate::program::Program;
use front_end::types::Variable;
use std::fmt;
use std::sync::Arc;

/// A variable or a nested call whose callee is already compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Variable(Variable),
    Call {
        function: Arc<Program>,
        args: Vec<Argument>,
    },
}

impl Argument {
    /// Value of the argument and the cycles spent computing it
    pub fn evaluate(&self, state: &ExecutionState) -> (u64, u64) {
        match self {
            Argument::Variable(variable) => (state.value(*variable), 0),
            Argument::Call { function, args } => invoke(function, args, state),
        }
    }

    pub fn variables(&self) -> Vec<Variable> {
        match self {
            Argument::Variable(variable) => vec![*variable],
            Argument::Call { args, .. } => args.iter().flat_map(Argument::variables).collect(),
        }
    }

    pub fn called_functions(&self) -> Vec<String> {
        match self {
            Argument::Variable(_) => Vec::new(),
            Argument::Call { function, args } => {
                let mut names = vec![function.name().to_string()];
                names.extend(args.iter().flat_map(Argument::called_functions));
                names
            }
        }
    }

    /// Depth of the binding this argument becomes when a quotation is lowered
    pub fn depth(&self) -> usize {
        match self {
            // bound with an Assignment
            Argument::Variable(_) => 2,
            Argument::Call { function, args } => quotation_depth(function, args),
        }
    }

    pub fn rename(&self, renaming: &Renaming) -> Argument {
        match self {
            Argument::Variable(variable) => Argument::Variable(renaming.variable(*variable)),
            Argument::Call { function, args } => Argument::Call {
                function: Arc::clone(function),
                args: args.iter().map(|arg| arg.rename(renaming)).collect(),
            },
        }
    }
}

/// Expansion depth of `v <- (function, args)`
///
/// At least 3, even for a callee that is already primitive: the bindings a
/// quotation emits are `Assignment`s, which take two more passes to lower.
/// So `max_expansion_level` of a program calling a primitive function is 3,
/// not `callee depth + 1`, and the passes it reports always end primitive.
pub fn quotation_depth(function: &Program, args: &[Argument]) -> usize {
    let nested = args.iter().map(Argument::depth).max().unwrap_or(0);
    1 + function.max_expansion_level().max(2).max(nested)
}

/// Run `function` on the evaluated arguments; returns its `y` and the total cycles
pub(crate) fn invoke(function: &Program, args: &[Argument], state: &ExecutionState) -> (u64, u64) {
    let mut spent = 0;
    let input: Vec<u64> = args
        .iter()
        .map(|arg| {
            let (value, cycles) = arg.evaluate(state);
            spent += cycles;
            value
        })
        .collect();

    let result = function.execute(&input);
    (result.y, result.cycles + spent)
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Argument::Variable(variable) => write!(f, "{}", variable),
            Argument::Call { function, args } if args.is_empty() => write!(f, "{}", function.name()),
            Argument::Call { function, args } => {
                write!(f, "({}", function.name())?;
                for arg in args {
                    write!(f, ",{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
