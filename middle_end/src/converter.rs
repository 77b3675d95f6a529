//! Document to program conversion
//!
//! Turns raw instruction records into a checked [`Program`]. Function names
//! are resolved through a [`FunctionResolver`], which is how the registry
//! compiles callees on demand while it holds its own lock.

use crate::error::{EngineError, Result};
use crate::instruction::{Argument, Instruction, InstructionKind, Label, Variable};
use crate::program::Program;
use front_end::ast::ArgExpr;
use front_end::document::{self as doc, InstructionDocument, Opcode};
use front_end::error::DocumentError;
use front_end::parser::parse_arguments;
use std::sync::Arc;

/// Source of compiled callees during conversion
pub trait FunctionResolver {
    /// Compiled program for `name`
    fn resolve(&mut self, name: &str) -> Result<Arc<Program>>;

    /// Number of inputs `name` takes
    fn arity(&mut self, name: &str) -> Result<usize>;
}

/// Convert a full instruction list and verify its jump targets
pub fn build_program(
    name: &str,
    instructions: &[InstructionDocument],
    resolver: &mut dyn FunctionResolver,
) -> Result<Program> {
    let converted = instructions
        .iter()
        .map(|record| build_instruction(record, resolver))
        .collect::<Result<Vec<_>>>()?;
    Program::checked(name, converted)
}

pub fn build_instruction(
    record: &InstructionDocument,
    resolver: &mut dyn FunctionResolver,
) -> Result<Instruction> {
    let opcode = record.validate()?;
    let label = Label::parse_optional(record.label.as_deref())?;

    let variable = if opcode.requires_variable() {
        record.variable.as_deref().unwrap_or_default().trim().parse::<Variable>()?
    } else {
        // never read for GOTO_LABEL
        Variable::Output
    };

    let kind = match opcode {
        Opcode::Neutral => InstructionKind::Neutral { variable },
        Opcode::Increase => InstructionKind::Increase { variable },
        Opcode::Decrease => InstructionKind::Decrease { variable },
        Opcode::JumpNotZero => InstructionKind::JumpNotZero {
            variable,
            target: target(record, doc::JNZ_LABEL)?,
        },
        Opcode::ZeroVariable => InstructionKind::ZeroVariable { variable },
        Opcode::GotoLabel => InstructionKind::GotoLabel {
            target: target(record, doc::GOTO_LABEL)?,
        },
        Opcode::Assignment => InstructionKind::Assignment {
            variable,
            source: record.required(doc::ASSIGNED_VARIABLE)?.parse()?,
        },
        Opcode::ConstantAssignment => InstructionKind::ConstantAssignment {
            variable,
            value: constant(record)?,
        },
        Opcode::JumpZero => InstructionKind::JumpZero {
            variable,
            target: target(record, doc::JZ_LABEL)?,
        },
        Opcode::JumpEqualConstant => InstructionKind::JumpEqualConstant {
            variable,
            value: constant(record)?,
            target: target(record, doc::JE_CONSTANT_LABEL)?,
        },
        Opcode::JumpEqualVariable => InstructionKind::JumpEqualVariable {
            variable,
            other: record.required(doc::VARIABLE_NAME)?.parse()?,
            target: target(record, doc::JE_VARIABLE_LABEL)?,
        },
        Opcode::Quote => {
            let (function, args) = call(record, resolver)?;
            InstructionKind::Quotation {
                variable,
                function,
                args,
            }
        }
        Opcode::JumpEqualFunction => {
            let target = target(record, doc::JE_FUNCTION_LABEL)?;
            let (function, args) = call(record, resolver)?;
            InstructionKind::JumpEqualFunction {
                variable,
                function,
                args,
                target,
            }
        }
    };

    Ok(Instruction::labelled(label, kind))
}

fn target(record: &InstructionDocument, key: &'static str) -> Result<Label> {
    Ok(record.required(key)?.parse()?)
}

fn constant(record: &InstructionDocument) -> Result<u64> {
    let text = record.required(doc::CONSTANT_VALUE)?;
    text.parse::<u64>().map_err(|_| {
        EngineError::from(DocumentError::InvalidConstant {
            opcode: record.opcode.clone(),
            value: text.to_string(),
        })
    })
}

/// Resolve the callee and its argument expression
fn call(
    record: &InstructionDocument,
    resolver: &mut dyn FunctionResolver,
) -> Result<(Arc<Program>, Vec<Argument>)> {
    let name = record.required(doc::FUNCTION_NAME)?;
    let expression = record.argument(doc::FUNCTION_ARGUMENTS).unwrap_or("");

    let arity = resolver.arity(name)?;
    let parsed = parse_arguments(expression, arity).map_err(|source| EngineError::ArgumentSyntax {
        function: name.to_string(),
        expression: expression.to_string(),
        source,
    })?;
    check_arity(name, arity, parsed.len())?;

    let function = resolver.resolve(name)?;
    let args = parsed
        .iter()
        .map(|arg| resolve_argument(arg, resolver))
        .collect::<Result<Vec<_>>>()?;
    Ok((function, args))
}

fn resolve_argument(arg: &ArgExpr, resolver: &mut dyn FunctionResolver) -> Result<Argument> {
    match arg {
        ArgExpr::Variable { variable, .. } => Ok(Argument::Variable(*variable)),
        ArgExpr::Call { name, args, .. } => {
            check_arity(name, resolver.arity(name)?, args.len())?;
            Ok(Argument::Call {
                function: resolver.resolve(name)?,
                args: args
                    .iter()
                    .map(|inner| resolve_argument(inner, resolver))
                    .collect::<Result<Vec<_>>>()?,
            })
        }
    }
}

fn check_arity(function: &str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(EngineError::ArityMismatch {
            function: function.to_string(),
            expected,
            found,
        })
    }
}

/// Resolver over a fixed set of already compiled programs
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    programs: std::collections::HashMap<String, Arc<Program>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, program: Program) -> Self {
        self.insert(program);
        self
    }

    pub fn insert(&mut self, program: Program) -> Arc<Program> {
        let program = Arc::new(program);
        self.programs
            .insert(program.name().to_string(), Arc::clone(&program));
        program
    }
}

impl FunctionResolver for StaticResolver {
    fn resolve(&mut self, name: &str) -> Result<Arc<Program>> {
        self.programs
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownName(name.to_string()))
    }

    fn arity(&mut self, name: &str) -> Result<usize> {
        self.resolve(name).map(|program| program.arity())
    }
}
