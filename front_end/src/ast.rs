use crate::source_location::Span;
use crate::types::Variable;
use std::fmt;

/// One element of an argument expression, before function names are resolved
#[derive(Debug, Clone, PartialEq)]
pub enum ArgExpr {
    Variable {
        variable: Variable,
        span: Span,
    },
    Call {
        name: String,
        args: Vec<ArgExpr>,
        span: Span,
    },
}

impl ArgExpr {
    pub fn span(&self) -> Span {
        match self {
            ArgExpr::Variable { span, .. } | ArgExpr::Call { span, .. } => *span,
        }
    }

    /// Variables referenced anywhere in this element, left to right
    pub fn variables(&self) -> Vec<Variable> {
        let mut found = Vec::new();
        self.collect_variables(&mut found);
        found
    }

    fn collect_variables(&self, found: &mut Vec<Variable>) {
        match self {
            ArgExpr::Variable { variable, .. } => found.push(*variable),
            ArgExpr::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(found);
                }
            }
        }
    }

    /// Names of every function called in this element, outermost first
    pub fn call_names(&self) -> Vec<&str> {
        match self {
            ArgExpr::Variable { .. } => Vec::new(),
            ArgExpr::Call { name, args, .. } => {
                let mut names = vec![name.as_str()];
                for arg in args {
                    names.extend(arg.call_names());
                }
                names
            }
        }
    }
}

impl fmt::Display for ArgExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArgExpr::Variable { variable, .. } => write!(f, "{}", variable),
            ArgExpr::Call { name, args, .. } if args.is_empty() => write!(f, "{}", name),
            ArgExpr::Call { name, args, .. } => {
                write!(f, "({}", name)?;
                for arg in args {
                    write!(f, ",{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Render a top-level argument list the way it is written in documents
pub fn render_arguments(args: &[ArgExpr]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Highest `x<n>` index referenced by the arguments, 0 if none
pub fn max_input_index(args: &[ArgExpr]) -> u32 {
    args.iter()
        .flat_map(ArgExpr::variables)
        .filter_map(|v| v.input_index())
        .max()
        .unwrap_or(0)
}
