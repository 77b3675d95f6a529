//! Program documents used across the tests

use crate::converter::{build_program, StaticResolver};
use crate::program::Program;
use front_end::document::*;

pub fn ins(opcode: &str) -> InstructionDocument {
    InstructionDocument::new(opcode)
}

/// `y <- x1 + x2` by counting x2 down
pub fn addition() -> ProgramDocument {
    ProgramDocument::new(
        "addition",
        vec![
            ins("ASSIGNMENT").with_variable("y").with_argument(ASSIGNED_VARIABLE, "x1"),
            ins("JUMP_ZERO").with_variable("x2").with_label("L1").with_argument(JZ_LABEL, "EXIT"),
            ins("DECREASE").with_variable("x2"),
            ins("INCREASE").with_variable("y"),
            ins("GOTO_LABEL").with_argument(GOTO_LABEL, "L1"),
        ],
    )
}

pub fn successor() -> FunctionDocument {
    FunctionDocument::new(
        "Successor",
        vec![
            ins("ASSIGNMENT").with_variable("y").with_argument(ASSIGNED_VARIABLE, "x1"),
            ins("INCREASE").with_variable("y"),
        ],
    )
}

pub fn const7() -> FunctionDocument {
    FunctionDocument::new(
        "CONST7",
        vec![ins("CONSTANT_ASSIGNMENT").with_variable("y").with_argument(CONSTANT_VALUE, "7")],
    )
}

pub fn plus() -> FunctionDocument {
    FunctionDocument::new(
        "Plus",
        vec![
            ins("ASSIGNMENT").with_variable("y").with_argument(ASSIGNED_VARIABLE, "x1"),
            ins("ASSIGNMENT").with_variable("z1").with_argument(ASSIGNED_VARIABLE, "x2"),
            ins("JUMP_ZERO").with_variable("z1").with_label("L1").with_argument(JZ_LABEL, "EXIT"),
            ins("INCREASE").with_variable("y"),
            ins("DECREASE").with_variable("z1"),
            ins("GOTO_LABEL").with_argument(GOTO_LABEL, "L1"),
        ],
    )
}

/// Accumulates into `y` without clearing it first
pub fn double() -> FunctionDocument {
    FunctionDocument::new(
        "Double",
        vec![
            ins("JUMP_ZERO").with_variable("x1").with_label("L1").with_argument(JZ_LABEL, "EXIT"),
            ins("DECREASE").with_variable("x1"),
            ins("INCREASE").with_variable("y"),
            ins("INCREASE").with_variable("y"),
            ins("GOTO_LABEL").with_argument(GOTO_LABEL, "L1"),
        ],
    )
}

pub fn quote(variable: &str, function: &str, args: &str) -> InstructionDocument {
    ins("QUOTE")
        .with_variable(variable)
        .with_argument(FUNCTION_NAME, function)
        .with_argument(FUNCTION_ARGUMENTS, args)
}

/// `y <- x1 * (2 * x2)`, calling `Double` once per loop iteration
pub fn repeated_double() -> ProgramDocument {
    ProgramDocument::new(
        "repeated_double",
        vec![
            ins("ASSIGNMENT").with_variable("z1").with_argument(ASSIGNED_VARIABLE, "x1"),
            ins("JUMP_ZERO").with_variable("z1").with_label("L1").with_argument(JZ_LABEL, "EXIT"),
            quote("z2", "Double", "x2"),
            quote("y", "Plus", "y,z2"),
            ins("DECREASE").with_variable("z1"),
            ins("GOTO_LABEL").with_argument(GOTO_LABEL, "L1"),
        ],
    )
    .with_function(double())
    .with_function(plus())
}

/// `y <- (x1 + 1) + 7`, with a nested call and a bare call
pub fn nested_calls() -> ProgramDocument {
    ProgramDocument::new("nested_calls", vec![quote("y", "Plus", "(Successor, x1), CONST7")])
        .with_function(successor())
        .with_function(const7())
        .with_function(plus())
}

/// `y = 2` when `x1 = x2 + 1`, otherwise `y = 1`
pub fn jump_on_successor() -> ProgramDocument {
    ProgramDocument::new(
        "jump_on_successor",
        vec![
            ins("JUMP_EQUAL_FUNCTION")
                .with_variable("x1")
                .with_argument(FUNCTION_NAME, "Successor")
                .with_argument(FUNCTION_ARGUMENTS, "x2")
                .with_argument(JE_FUNCTION_LABEL, "L1"),
            ins("INCREASE").with_variable("y"),
            ins("GOTO_LABEL").with_argument(GOTO_LABEL, "EXIT"),
            ins("INCREASE").with_variable("y").with_label("L1"),
            ins("INCREASE").with_variable("y"),
        ],
    )
    .with_function(successor())
}

/// Every synthetic kind in one program:
/// `x1 = 2` gives `x2 + 1`, `x2 = 0` gives 0 when `x1 = 1` and 1 otherwise,
/// anything else gives `x1 + x2`
pub fn mixed_kinds() -> ProgramDocument {
    ProgramDocument::new(
        "mixed_kinds",
        vec![
            ins("CONSTANT_ASSIGNMENT").with_variable("z1").with_argument(CONSTANT_VALUE, "2"),
            ins("JUMP_EQUAL_VARIABLE")
                .with_variable("x1")
                .with_argument(VARIABLE_NAME, "z1")
                .with_argument(JE_VARIABLE_LABEL, "L1"),
            ins("JUMP_EQUAL_CONSTANT")
                .with_variable("x2")
                .with_argument(CONSTANT_VALUE, "0")
                .with_argument(JE_CONSTANT_LABEL, "L2"),
            quote("y", "Plus", "x1,x2"),
            ins("GOTO_LABEL").with_argument(GOTO_LABEL, "EXIT"),
            quote("y", "Successor", "x2").with_label("L1"),
            ins("ZERO_VARIABLE").with_variable("z1"),
            ins("GOTO_LABEL").with_argument(GOTO_LABEL, "EXIT"),
            ins("JUMP_EQUAL_FUNCTION")
                .with_variable("x1")
                .with_label("L2")
                .with_argument(FUNCTION_NAME, "Successor")
                .with_argument(FUNCTION_ARGUMENTS, "x2")
                .with_argument(JE_FUNCTION_LABEL, "EXIT"),
            ins("INCREASE").with_variable("y"),
        ],
    )
    .with_function(successor())
    .with_function(plus())
}

/// Compile a document whose functions are listed callees first
pub fn compile(document: &ProgramDocument) -> Program {
    let mut resolver = StaticResolver::new();
    for function in &document.functions {
        let program = build_program(&function.name, &function.instructions, &mut resolver)
            .expect("function should compile");
        resolver.insert(program);
    }
    build_program(&document.name, &document.instructions, &mut resolver)
        .expect("program should compile")
}

pub fn bodies(program: &Program) -> Vec<String> {
    program.instructions().iter().map(ToString::to_string).collect()
}
